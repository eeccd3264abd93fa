//! Rich CLI display for the applet shell
//!
//! Renders routes, permission matrices, role selections, doctor reports and
//! role history as human-readable terminal output. Every renderer returns a
//! `String`; the binary decides where it goes.

use std::fmt::Write as _;

use colored::Colorize;

use crate::access::matrix::PermissionGroup;
use crate::access::routes::AppletRoute;
use crate::doctor::{DiagnosticReport, Severity};
use crate::log::RoleChange;

/// Render the visible routes as an aligned table.
#[must_use]
pub fn render_routes(routes: &[AppletRoute<'_>]) -> String {
    if routes.is_empty() {
        return format!("  {}\n", "No routes visible for the active roles".dimmed());
    }

    let width = routes
        .iter()
        .map(|r| r.route.path.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for r in routes {
        let _ = write!(
            out,
            "  {:<width$}  {}",
            r.route.path.bold(),
            r.route.label
        );
        let _ = write!(out, " {}", format!("[{}]", r.applet_id).dimmed());
        if !r.route.required_permissions.is_empty() {
            let _ = write!(
                out,
                " {}",
                r.route.required_permissions.join(" | ").dimmed()
            );
        }
        out.push('\n');
    }
    out
}

/// Render the permission matrix, one block per applet.
#[must_use]
pub fn render_matrix(groups: &[PermissionGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        let granted = group.granted_count();
        let total = group.permissions.iter().filter(|p| !p.is_placeholder()).count();
        let _ = writeln!(
            out,
            "{} {}",
            group.label.bold().cyan(),
            format!("({}) {granted}/{total}", group.applet_id).dimmed()
        );
        for row in &group.permissions {
            if row.is_placeholder() {
                let _ = writeln!(out, "  {}", row.label.dimmed());
                continue;
            }
            let mark = if row.has_access {
                "✓".green().bold()
            } else {
                "✗".red()
            };
            let _ = writeln!(out, "  {mark} {:<28} {}", row.key, row.label.dimmed());
        }
    }
    out
}

/// Render the active selection against the available roles.
#[must_use]
pub fn render_selection(selected: &[String], available: &[String]) -> String {
    let mut out = String::new();
    for role in available {
        if selected.contains(role) {
            let _ = writeln!(out, "  {} {}", "●".green(), role.bold());
        } else {
            let _ = writeln!(out, "  {} {}", "○".dimmed(), role.dimmed());
        }
    }
    if selected.is_empty() {
        let _ = writeln!(out, "  {}", "No roles selected".yellow());
    }
    out
}

/// Render the role change log, oldest first.
#[must_use]
pub fn render_history(changes: &[RoleChange]) -> String {
    if changes.is_empty() {
        return format!("  {}\n", "No role changes recorded".dimmed());
    }

    let mut out = String::new();
    for change in changes {
        let roles = if change.selected.is_empty() {
            "(none)".to_string()
        } else {
            change.selected.join(", ")
        };
        let _ = writeln!(
            out,
            "  {} {} {roles}",
            change
                .timestamp
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed(),
            format!("[{}]", change.storage_key).dimmed(),
        );
    }
    out
}

/// Render a doctor report with a summary line.
#[must_use]
pub fn render_diagnostic_report(report: &DiagnosticReport) -> String {
    if report.is_clean() {
        return format!("{} No issues found\n", "✓".green().bold());
    }

    let mut out = String::new();
    for finding in &report.findings {
        let tag = match finding.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue(),
        };
        let _ = writeln!(out, "{tag} [{}] {}", finding.code, finding.message);
        if let Some(suggestion) = &finding.suggestion {
            let _ = writeln!(out, "  {} {suggestion}", "→".dimmed());
        }
    }
    let _ = writeln!(
        out,
        "\n{} error(s), {} warning(s), {} info",
        report.error_count(),
        report.warning_count(),
        report.info_count()
    );
    out
}
