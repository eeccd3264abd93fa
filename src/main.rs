//! Applet shell - role-scoped navigation for a micro-frontend host
//!
//! CLI entry point for inspecting and administering `applets.toml`.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use applet_shell::access::matrix::build_matrix;
use applet_shell::access::resolver::RoleConfig;
use applet_shell::access::routes::visible_routes;
use applet_shell::access::selection::RoleSelection;
use applet_shell::cli::{
    render_diagnostic_report, render_history, render_matrix, render_routes, render_selection,
};
use applet_shell::doctor::diagnose;
use applet_shell::host::config::HostConfig;
use applet_shell::host::edit::{edit_assignment_in_file, Assignment};
use applet_shell::log::{FileRoleStore, RoleHistory};

/// Role-scoped navigation for a micro-frontend host
///
/// Resolves which applet routes and permissions the active roles grant,
/// persists the role selection, and lints the host configuration.
#[derive(Parser, Debug)]
#[command(name = "applet-shell", version, about)]
struct Cli {
    /// Path to the applets.toml configuration file
    #[arg(long, global = true, default_value = "applets.toml")]
    config: PathBuf,

    /// Directory for the persisted selection and role history
    #[arg(long, global = true, default_value = ".applet-shell")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the routes visible to the active roles
    Routes {
        /// Evaluate these roles instead of the persisted selection
        #[arg(long = "role")]
        roles: Vec<String>,
        /// Print JSON to stdout
        #[arg(long)]
        json: bool,
    },
    /// Show the permission matrix for the active roles
    Matrix {
        /// Evaluate these roles instead of the persisted selection
        #[arg(long = "role")]
        roles: Vec<String>,
        /// Print JSON to stdout
        #[arg(long)]
        json: bool,
    },
    /// Show the current role selection
    Roles,
    /// Toggle a role in the persisted selection
    Toggle {
        /// Role to add or remove
        role: String,
    },
    /// Print the role change history
    History,
    /// Assign a role to a declared permission
    Grant {
        /// Role to assign
        #[arg(long)]
        role: String,
        /// Namespaced permission key
        #[arg(long)]
        permission: String,
    },
    /// Remove a role from a declared permission
    Revoke {
        /// Role to remove
        #[arg(long)]
        role: String,
        /// Namespaced permission key
        #[arg(long)]
        permission: String,
    },
    /// Diagnose the host configuration
    Doctor,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// The configured user's roles that the host offers, or none without a user.
fn user_roles(config: &HostConfig, role_config: &RoleConfig) -> Vec<String> {
    config
        .current_user(role_config)
        .map(|user| {
            user.available_roles(&config.host.roles)
                .into_iter()
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn load_selection(
    config: &HostConfig,
    role_config: &RoleConfig,
    state_dir: &Path,
) -> Result<RoleSelection<FileRoleStore>> {
    let store = FileRoleStore::new(state_dir).context("Failed to open role store")?;
    Ok(RoleSelection::initialize(
        &user_roles(config, role_config),
        config.host.roles.clone(),
        &config.host.storage_key,
        store,
    ))
}

/// Explicit `--role` arguments win over the persisted selection.
fn active_roles(
    config: &HostConfig,
    role_config: &RoleConfig,
    state_dir: &Path,
    explicit: Vec<String>,
) -> Result<Vec<String>> {
    if !explicit.is_empty() {
        return Ok(explicit);
    }
    Ok(load_selection(config, role_config, state_dir)?
        .selected()
        .to_vec())
}

fn toggle(
    config: &HostConfig,
    role_config: &RoleConfig,
    state_dir: &Path,
    role: &str,
) -> Result<()> {
    if !config.host.roles.iter().any(|r| r == role) {
        bail!(
            "Unknown role '{role}'. Available roles: {}",
            config.host.roles.join(", ")
        );
    }

    let history = RoleHistory::open(state_dir).context("Failed to open role history")?;
    let storage_key = config.host.storage_key.clone();
    let mut selection =
        load_selection(config, role_config, state_dir)?.on_roles_change(move |selected| {
            if let Err(err) = history.record(&storage_key, selected) {
                tracing::warn!(error = %err, "failed to record role change");
            }
        });

    selection.toggle(role);
    if selection.last_write_failed() {
        eprintln!("Warning: role selection could not be saved; it applies to this run only.");
    }
    eprint!("{}", render_selection(selection.selected(), selection.available()));
    Ok(())
}

fn edit(cli: &Cli, role: &str, permission: &str, assignment: Assignment) -> Result<()> {
    let changed = edit_assignment_in_file(&cli.config, permission, role, assignment)
        .with_context(|| format!("Failed to update '{}'", cli.config.display()))?;
    let verb = match assignment {
        Assignment::Grant => "granted to",
        Assignment::Revoke => "revoked from",
    };
    if changed {
        eprintln!("Permission '{permission}' {verb} role '{role}'");
    } else {
        eprintln!("No change: permission '{permission}' already {verb} role '{role}'");
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = HostConfig::from_path(&cli.config)
        .with_context(|| format!("Failed to load config from '{}'", cli.config.display()))?;
    let role_config = config
        .role_config()
        .context("Failed to build role configuration")?;

    match &cli.command {
        Command::Routes { roles, json } => {
            let roles = active_roles(&config, &role_config, &cli.state_dir, roles.clone())?;
            let routes = visible_routes(&config.applets, &roles, &role_config);
            if *json {
                println!("{}", serde_json::to_string_pretty(&routes)?);
            } else {
                eprint!("{}", render_routes(&routes));
            }
        }
        Command::Matrix { roles, json } => {
            let roles = active_roles(&config, &role_config, &cli.state_dir, roles.clone())?;
            let groups = build_matrix(&config.applets, &role_config, &roles);
            if *json {
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else {
                eprint!("{}", render_matrix(&groups));
            }
        }
        Command::Roles => {
            let selection = load_selection(&config, &role_config, &cli.state_dir)?;
            if let Some(user) = config.current_user(&role_config) {
                eprintln!("{} <{}>", user.name, user.email);
            }
            eprint!("{}", render_selection(selection.selected(), selection.available()));
        }
        Command::Toggle { role } => toggle(&config, &role_config, &cli.state_dir, role)?,
        Command::History => {
            let history =
                RoleHistory::open(&cli.state_dir).context("Failed to open role history")?;
            let changes = history
                .changes_for(&config.host.storage_key)
                .context("Failed to read role history")?;
            eprint!("{}", render_history(&changes));
        }
        Command::Grant { role, permission } => edit(&cli, role, permission, Assignment::Grant)?,
        Command::Revoke { role, permission } => edit(&cli, role, permission, Assignment::Revoke)?,
        Command::Doctor => {
            let report = diagnose(&config, &role_config);
            eprint!("{}", render_diagnostic_report(&report));
            if report.error_count() > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
