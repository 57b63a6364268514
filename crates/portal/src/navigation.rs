//! Header navigation.
//!
//! The menu a user sees is a function of their [`Role`] alone. Each role is
//! matched exhaustively so adding a role forces a decision about its menu.

use courier_core::Role;

use crate::models::SessionContext;

/// A link in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

/// The dropdown under the user's name.
#[derive(Debug, Clone)]
pub struct AccountMenu {
    pub display_name: String,
    pub role_label: &'static str,
    pub items: Vec<NavItem>,
}

/// Everything the base layout needs to draw the header.
#[derive(Debug, Clone)]
pub struct Navigation {
    pub brand_href: &'static str,
    pub items: Vec<NavItem>,
    /// `None` for visitors who are not logged in.
    pub account: Option<AccountMenu>,
}

const LOGIN: (&str, &str) = ("Log in", "/auth/login");
const PROFILE: (&str, &str) = ("Profile", "/profile");
const SETTINGS: (&str, &str) = ("Settings", "/settings");
const DASHBOARD: (&str, &str) = ("Dashboard", "/admin/profile");
const ADMIN_SETTINGS: (&str, &str) = ("Settings", "/admin/settings");
const CUSTOMERS: (&str, &str) = ("Customers", "/admin/profile#customers");
const VERIFICATIONS: (&str, &str) = ("Verifications", "/admin/profile#verifications");

impl Navigation {
    /// Build the header for a visitor, marking the link for `current_path` active.
    #[must_use]
    pub fn for_session(session: Option<&SessionContext>, current_path: &str) -> Self {
        match session {
            None => Self::guest(current_path),
            Some(session) => {
                let items = primary_links(session.role)
                    .into_iter()
                    .map(|link| nav_item(link, current_path))
                    .collect();

                let account = AccountMenu {
                    display_name: session.display_name.clone(),
                    role_label: session.role.label(),
                    items: account_links(session.role)
                        .into_iter()
                        .map(|link| nav_item(link, current_path))
                        .collect(),
                };

                Self {
                    brand_href: session.landing_path(),
                    items,
                    account: Some(account),
                }
            }
        }
    }

    /// Header for visitors who are not logged in.
    #[must_use]
    pub fn guest(current_path: &str) -> Self {
        Self {
            brand_href: LOGIN.1,
            items: vec![nav_item(LOGIN, current_path)],
            account: None,
        }
    }
}

/// Settings page for a role.
#[must_use]
pub const fn settings_path(role: Role) -> &'static str {
    match role {
        Role::Customer => SETTINGS.1,
        Role::Staff | Role::Admin | Role::SuperAdmin => ADMIN_SETTINGS.1,
    }
}

fn primary_links(role: Role) -> Vec<(&'static str, &'static str)> {
    match role {
        Role::Customer => vec![PROFILE, SETTINGS],
        Role::Staff => vec![DASHBOARD, ADMIN_SETTINGS],
        Role::Admin => vec![DASHBOARD, ADMIN_SETTINGS, CUSTOMERS],
        Role::SuperAdmin => vec![DASHBOARD, ADMIN_SETTINGS, CUSTOMERS, VERIFICATIONS],
    }
}

fn account_links(role: Role) -> Vec<(&'static str, &'static str)> {
    let change_password = match role {
        Role::Customer => "/settings#password",
        Role::Staff | Role::Admin | Role::SuperAdmin => "/admin/settings#password",
    };
    vec![("Change password", change_password)]
}

fn nav_item((label, href): (&'static str, &'static str), current_path: &str) -> NavItem {
    NavItem {
        label,
        href,
        active: href == current_path,
    }
}
