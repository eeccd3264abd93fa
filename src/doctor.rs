//! Applet shell doctor: diagnostics for the host configuration
//!
//! Lints `applets.toml` for access-control mistakes that parse cleanly but
//! hide routes or grant nothing. Returns a structured report with categories:
//! errors (must fix), warnings (should fix), info (suggestions).

use std::collections::HashSet;

use crate::access::resolver::RoleConfig;
use crate::access::routes::shortcut_divergence;
use crate::host::config::HostConfig;

/// Severity level for a diagnostic finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Must fix: some route can never be shown
    Error,
    /// Should fix: suspicious access configuration
    Warning,
    /// Informational
    Info,
}

/// A single diagnostic finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Severity of the finding
    pub severity: Severity,
    /// Short code for the finding (e.g., "A001")
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Suggested fix (optional)
    pub suggestion: Option<String>,
}

/// Diagnostic report from `applet-shell doctor`
#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    /// All findings, in order of severity (errors first)
    pub findings: Vec<Finding>,
}

impl DiagnosticReport {
    /// Returns true if the report has no findings at all
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns the number of errors
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Returns the number of warnings
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Returns the number of info items
    #[must_use]
    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}

/// Run all diagnostic checks and return a report.
#[must_use]
pub fn diagnose(config: &HostConfig, roles: &RoleConfig) -> DiagnosticReport {
    let mut findings = Vec::new();

    check_undeclared_requirements(config, &mut findings);
    check_unassigned_permissions(config, &mut findings);
    check_empty_roles(roles, &mut findings);
    check_shortcut_divergence(config, roles, &mut findings);
    check_open_routes(config, &mut findings);
    check_applets_without_permissions(config, &mut findings);

    // Stable sort keeps check order within a severity
    findings.sort_by_key(|f| match f.severity {
        Severity::Error => 0,
        Severity::Warning => 1,
        Severity::Info => 2,
    });

    DiagnosticReport { findings }
}

/// A001: routes requiring a permission no applet declares are never visible
/// through the role config.
fn check_undeclared_requirements(config: &HostConfig, findings: &mut Vec<Finding>) {
    let declared: HashSet<&str> = config
        .applets
        .iter()
        .flat_map(|a| a.permissions.iter().map(|p| p.key.as_str()))
        .collect();

    for applet in &config.applets {
        for route in &applet.routes {
            let missing: Vec<&str> = route
                .required_permissions
                .iter()
                .map(String::as_str)
                .filter(|k| !declared.contains(k))
                .collect();
            if missing.is_empty() {
                continue;
            }
            findings.push(Finding {
                severity: Severity::Error,
                code: "A001".to_string(),
                message: format!(
                    "Route '{}' in applet '{}' requires undeclared permission(s): {}",
                    route.path,
                    applet.id,
                    missing.join(", ")
                ),
                suggestion: Some(format!(
                    "Declare {} under an [[applet.permission]] table or fix the route",
                    missing.join(", ")
                )),
            });
        }
    }
}

/// A002: declared permissions that no role holds
fn check_unassigned_permissions(config: &HostConfig, findings: &mut Vec<Finding>) {
    for applet in &config.applets {
        for perm in applet.permissions.iter().filter(|p| p.roles.is_empty()) {
            findings.push(Finding {
                severity: Severity::Warning,
                code: "A002".to_string(),
                message: format!("Permission '{}' is not assigned to any role", perm.key),
                suggestion: Some(format!(
                    "Run `applet-shell grant --role <ROLE> --permission {}`",
                    perm.key
                )),
            });
        }
    }
}

/// A003: roles that hold no permission key at all
fn check_empty_roles(roles: &RoleConfig, findings: &mut Vec<Finding>) {
    for role in roles.roles() {
        if roles.permissions_for(role).is_empty() {
            findings.push(Finding {
                severity: Severity::Warning,
                code: "A003".to_string(),
                message: format!("Role '{role}' is granted no permissions"),
                suggestion: Some(
                    "Grant it a permission or remove it from [host] roles".to_string(),
                ),
            });
        }
    }
}

/// A004: shortcut mapping and role config disagree on route visibility
fn check_shortcut_divergence(
    config: &HostConfig,
    roles: &RoleConfig,
    findings: &mut Vec<Finding>,
) {
    for applet in &config.applets {
        let diverging = shortcut_divergence(applet, roles);
        if diverging.is_empty() {
            continue;
        }
        findings.push(Finding {
            severity: Severity::Warning,
            code: "A004".to_string(),
            message: format!(
                "Applet '{}' permission_mapping disagrees with role assignments for: {}",
                applet.id,
                diverging.join(", ")
            ),
            suggestion: Some(
                "Mapped roles bypass the role assignments for this applet's routes; \
                 align the mapping with the permission roles or remove it"
                    .to_string(),
            ),
        });
    }
}

/// A005: routes with no requirements are shown to every role
fn check_open_routes(config: &HostConfig, findings: &mut Vec<Finding>) {
    for applet in &config.applets {
        for route in applet
            .routes
            .iter()
            .filter(|r| r.required_permissions.is_empty())
        {
            findings.push(Finding {
                severity: Severity::Info,
                code: "A005".to_string(),
                message: format!(
                    "Route '{}' in applet '{}' requires no permissions and is always visible",
                    route.path, applet.id
                ),
                suggestion: None,
            });
        }
    }
}

/// A006: applets that declare no permissions
fn check_applets_without_permissions(config: &HostConfig, findings: &mut Vec<Finding>) {
    for applet in config.applets.iter().filter(|a| a.permissions.is_empty()) {
        findings.push(Finding {
            severity: Severity::Info,
            code: "A006".to_string(),
            message: format!("Applet '{}' declares no permissions", applet.id),
            suggestion: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::SAMPLE_HOST;

    fn run(content: &str) -> DiagnosticReport {
        let config = HostConfig::parse(content).unwrap();
        let roles = config.role_config().unwrap();
        diagnose(&config, &roles)
    }

    fn codes(report: &DiagnosticReport) -> Vec<&str> {
        report.findings.iter().map(|f| f.code.as_str()).collect()
    }

    #[test]
    fn test_clean_report_with_no_issues() {
        let report = run(
            r#"
[host]
roles = ["Admin"]

[[applet]]
id = "users"
label = "Users"

[[applet.permission]]
key = "users:VIEW"
label = "View"
roles = ["Admin"]

[[applet.route]]
path = "/users"
label = "Users"
permissions = ["users:VIEW"]
"#,
        );
        assert!(report.is_clean(), "got: {:?}", report.findings);
    }

    #[test]
    fn test_sample_host_only_has_open_route_info() {
        let report = run(SAMPLE_HOST);
        assert_eq!(codes(&report), vec!["A005"]);
        assert_eq!(report.info_count(), 1);
        assert!(report.findings[0].message.contains("/reports/help"));
    }

    #[test]
    fn test_report_counts() {
        let report = DiagnosticReport {
            findings: vec![
                Finding {
                    severity: Severity::Error,
                    code: "A001".to_string(),
                    message: "e".to_string(),
                    suggestion: None,
                },
                Finding {
                    severity: Severity::Warning,
                    code: "A002".to_string(),
                    message: "w".to_string(),
                    suggestion: None,
                },
                Finding {
                    severity: Severity::Warning,
                    code: "A003".to_string(),
                    message: "w".to_string(),
                    suggestion: None,
                },
            ],
        };
        assert!(!report.is_clean());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 2);
        assert_eq!(report.info_count(), 0);
    }

    #[test]
    fn test_a001_detects_undeclared_requirement() {
        let report = run(
            r#"
[host]
roles = ["Admin"]

[[applet]]
id = "users"
label = "Users"

[[applet.permission]]
key = "users:VIEW"
label = "View"
roles = ["Admin"]

[[applet.route]]
path = "/users"
label = "Users"
permissions = ["users:VIEW", "billing:EXPORT"]
"#,
        );
        let a001 = report.findings.iter().find(|f| f.code == "A001").unwrap();
        assert_eq!(a001.severity, Severity::Error);
        assert!(a001.message.contains("billing:EXPORT"), "got: {}", a001.message);
        assert!(!a001.message.contains("users:VIEW"), "got: {}", a001.message);
    }

    #[test]
    fn test_a001_accepts_keys_declared_by_another_applet() {
        let report = run(
            r#"
[host]
roles = ["Admin"]

[[applet]]
id = "users"
label = "Users"

[[applet.permission]]
key = "users:VIEW"
label = "View"
roles = ["Admin"]

[[applet]]
id = "reports"
label = "Reports"

[[applet.route]]
path = "/reports/users"
label = "User report"
permissions = ["users:VIEW"]
"#,
        );
        assert!(!codes(&report).contains(&"A001"));
    }

    #[test]
    fn test_a002_and_a003_for_unassigned_permission() {
        let report = run(
            r#"
[host]
roles = ["Admin", "Guest"]

[[applet]]
id = "users"
label = "Users"

[[applet.permission]]
key = "users:VIEW"
label = "View"
roles = ["Admin"]

[[applet.permission]]
key = "users:AUDIT"
label = "Audit"

[[applet.route]]
path = "/users"
label = "Users"
permissions = ["users:VIEW"]
"#,
        );
        let a002 = report.findings.iter().find(|f| f.code == "A002").unwrap();
        assert!(a002.message.contains("users:AUDIT"));
        assert!(a002
            .suggestion
            .as_deref()
            .is_some_and(|s| s.contains("grant")));

        let a003 = report.findings.iter().find(|f| f.code == "A003").unwrap();
        assert!(a003.message.contains("Guest"), "got: {}", a003.message);
        assert_eq!(report.warning_count(), 2);
    }

    #[test]
    fn test_a004_flags_diverging_shortcut() {
        let report = run(
            r#"
[host]
roles = ["Admin", "User"]

[[applet]]
id = "users"
label = "Users"

[[applet.permission]]
key = "users:VIEW"
label = "View"
roles = ["Admin"]

[[applet.route]]
path = "/users"
label = "Users"
permissions = ["users:VIEW"]

[applet.permission_mapping]
Admin = "users:VIEW"
User = "users:VIEW"
"#,
        );
        let a004 = report.findings.iter().find(|f| f.code == "A004").unwrap();
        assert!(a004.message.contains("User"), "got: {}", a004.message);
        assert!(!a004.message.contains("Admin"), "got: {}", a004.message);
    }

    #[test]
    fn test_a004_silent_when_shortcut_agrees() {
        let report = run(
            r#"
[host]
roles = ["Admin"]

[[applet]]
id = "users"
label = "Users"

[[applet.permission]]
key = "users:VIEW"
label = "View"
roles = ["Admin"]

[[applet.route]]
path = "/users"
label = "Users"
permissions = ["users:VIEW"]

[applet.permission_mapping]
Admin = "users:VIEW"
"#,
        );
        assert!(!codes(&report).contains(&"A004"));
    }

    #[test]
    fn test_a006_applet_without_permissions() {
        let report = run(
            r#"
[host]
roles = ["Admin"]

[[applet]]
id = "users"
label = "Users"

[[applet.permission]]
key = "users:VIEW"
label = "View"
roles = ["Admin"]

[[applet]]
id = "about"
label = "About"
"#,
        );
        let a006 = report.findings.iter().find(|f| f.code == "A006").unwrap();
        assert_eq!(a006.severity, Severity::Info);
        assert!(a006.message.contains("about"));
    }

    #[test]
    fn test_findings_ordered_by_severity() {
        let report = run(
            r#"
[host]
roles = ["Admin", "Guest"]

[[applet]]
id = "about"
label = "About"

[[applet.route]]
path = "/about"
label = "About"

[[applet]]
id = "users"
label = "Users"

[[applet.permission]]
key = "users:VIEW"
label = "View"
roles = ["Admin"]

[[applet.route]]
path = "/users"
label = "Users"
permissions = ["users:MISSING"]
"#,
        );
        let severities: Vec<Severity> = report.findings.iter().map(|f| f.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort_by_key(|s| match s {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        });
        assert_eq!(severities, sorted);
        assert_eq!(report.findings[0].code, "A001");
        assert_eq!(codes(&report), vec!["A001", "A003", "A005", "A006"]);
    }
}
