//! Route filtering for the active role selection
//!
//! Routes are flattened across applets in declaration order and filtered
//! stably: surviving routes keep their relative order. An applet may supply a
//! role → key shortcut. A role listed in it resolves through the shortcut for
//! that applet's routes; any other role falls back to the full role config.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::access::resolver::{has_any_permission, RoleConfig};
use crate::host::config::{AppletMount, Route, ShortcutMapping};

/// A route tagged with the applet that declares it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppletRoute<'a> {
    /// Declaring applet id
    pub applet_id: &'a str,
    /// The route itself
    pub route: &'a Route,
}

/// Per-applet shortcut mappings consulted during filtering
#[derive(Debug, Clone, Default)]
pub struct AppletContext<'a> {
    shortcuts: HashMap<&'a str, &'a ShortcutMapping>,
}

impl<'a> AppletContext<'a> {
    /// A context with no shortcuts: every route resolves through the role config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the shortcut mappings declared by `mounts`.
    #[must_use]
    pub fn from_mounts(mounts: &'a [AppletMount]) -> Self {
        let shortcuts = mounts
            .iter()
            .filter_map(|m| m.permission_mapping.as_ref().map(|s| (m.id.as_str(), s)))
            .collect();
        Self { shortcuts }
    }

    /// Register a shortcut for one applet, replacing any previous one.
    #[must_use]
    pub fn with_shortcut(mut self, applet_id: &'a str, mapping: &'a ShortcutMapping) -> Self {
        self.shortcuts.insert(applet_id, mapping);
        self
    }

    /// The shortcut registered for `applet_id`, if any.
    #[must_use]
    pub fn shortcut(&self, applet_id: &str) -> Option<&'a ShortcutMapping> {
        self.shortcuts.get(applet_id).copied()
    }
}

/// Flatten mounts into one route list, applet order then route order.
#[must_use]
pub fn flatten_routes(mounts: &[AppletMount]) -> Vec<AppletRoute<'_>> {
    mounts
        .iter()
        .flat_map(|m| {
            m.routes.iter().map(|route| AppletRoute {
                applet_id: m.id.as_str(),
                route,
            })
        })
        .collect()
}

/// Whether a single route is visible to `active_roles`.
#[must_use]
pub fn is_route_visible<S: AsRef<str>>(
    route: &AppletRoute<'_>,
    active_roles: &[S],
    config: &RoleConfig,
    context: &AppletContext<'_>,
) -> bool {
    let required = &route.route.required_permissions;
    if required.is_empty() {
        return true;
    }

    match context.shortcut(route.applet_id) {
        Some(mapping) => {
            // Roles absent from the shortcut resolve through the role config.
            let granted: BTreeSet<&str> = active_roles
                .iter()
                .flat_map(|role| match mapping.get(role.as_ref()) {
                    Some(key) => std::slice::from_ref(key),
                    None => config.permissions_for(role.as_ref()),
                })
                .map(String::as_str)
                .collect();
            required.iter().any(|k| granted.contains(k.as_str()))
        }
        None => has_any_permission(required.as_slice(), active_roles, config),
    }
}

/// Keep the routes visible to `active_roles`, preserving input order.
#[must_use]
pub fn filter_routes<'a, S: AsRef<str>>(
    routes: &[AppletRoute<'a>],
    active_roles: &[S],
    config: &RoleConfig,
    context: &AppletContext<'_>,
) -> Vec<AppletRoute<'a>> {
    routes
        .iter()
        .filter(|r| is_route_visible(r, active_roles, config, context))
        .copied()
        .collect()
}

/// Flatten, build the shortcut context and filter in one step.
#[must_use]
pub fn visible_routes<'a, S: AsRef<str>>(
    mounts: &'a [AppletMount],
    active_roles: &[S],
    config: &RoleConfig,
) -> Vec<AppletRoute<'a>> {
    let context = AppletContext::from_mounts(mounts);
    filter_routes(&flatten_routes(mounts), active_roles, config, &context)
}

/// Roles for which an applet's shortcut and the role config disagree on the
/// visibility of at least one of its routes.
///
/// Each role is checked alone. Only roles listed in the shortcut can diverge,
/// and an applet without a shortcut never does.
#[must_use]
pub fn shortcut_divergence<'a>(mount: &AppletMount, config: &'a RoleConfig) -> Vec<&'a str> {
    let Some(mapping) = mount.permission_mapping.as_ref() else {
        return Vec::new();
    };
    let with_shortcut = AppletContext::new().with_shortcut(&mount.id, mapping);
    let without = AppletContext::new();
    let routes: Vec<AppletRoute<'_>> = mount
        .routes
        .iter()
        .map(|route| AppletRoute {
            applet_id: &mount.id,
            route,
        })
        .collect();

    config
        .roles()
        .iter()
        .filter(|role| {
            let roles = [role.as_str()];
            routes.iter().any(|r| {
                is_route_visible(r, &roles, config, &with_shortcut)
                    != is_route_visible(r, &roles, config, &without)
            })
        })
        .map(String::as_str)
        .collect()
}
