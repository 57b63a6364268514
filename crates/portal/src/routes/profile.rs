//! Profile pages.
//!
//! Customers see their mailbox address and package counts; staff roles see
//! company-wide counts. Both pages show the account's identity.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use courier_core::Role;
use tower_sessions::Session;
use tracing::instrument;

use super::session_expired;
use crate::api::{AdminStats, ApiError, CustomerStats, UserProfile};
use crate::filters;
use crate::middleware::RequireSession;
use crate::navigation::{Navigation, settings_path};
use crate::state::AppState;

const CUSTOMER_PROFILE_PATH: &str = "/profile";
const ADMIN_PROFILE_PATH: &str = "/admin/profile";

const STATS_UNAVAILABLE: &str = "Package counts are unavailable right now.";

/// Customer profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/customer.html")]
pub struct CustomerProfileTemplate {
    pub nav: Navigation,
    pub profile: Option<UserProfile>,
    pub stats: Option<CustomerStats>,
    pub settings_href: &'static str,
    pub error: Option<String>,
}

/// Staff dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/admin.html")]
pub struct AdminProfileTemplate {
    pub nav: Navigation,
    pub role_label: &'static str,
    pub profile: Option<UserProfile>,
    pub stats: Option<AdminStats>,
    pub show_customers: bool,
    pub show_verifications: bool,
    pub settings_href: &'static str,
    pub error: Option<String>,
}

/// Split a profile fetch into the page's profile and error slots.
fn profile_or_error(result: Result<UserProfile, ApiError>) -> (Option<UserProfile>, Option<String>) {
    match result {
        Ok(profile) => (Some(profile), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load profile");
            (None, Some(e.user_message()))
        }
    }
}

fn stats_or_notice<T>(result: Result<T, ApiError>, error: &mut Option<String>) -> Option<T> {
    match result {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load stats");
            error.get_or_insert_with(|| STATS_UNAVAILABLE.to_string());
            None
        }
    }
}

/// Display the customer profile page.
#[instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn customer(
    State(state): State<AppState>,
    session: Session,
    RequireSession(ctx): RequireSession,
) -> Response {
    if ctx.role.is_staff() {
        return Redirect::to(ADMIN_PROFILE_PATH).into_response();
    }

    let (profile, stats) = tokio::join!(state.api().profile(&ctx), state.api().customer_stats(&ctx));

    if matches!(profile, Err(ApiError::Unauthorized)) || matches!(stats, Err(ApiError::Unauthorized))
    {
        return session_expired(&session).await;
    }

    let (profile, mut error) = profile_or_error(profile);
    let stats = stats_or_notice(stats, &mut error);

    CustomerProfileTemplate {
        nav: Navigation::for_session(Some(&ctx), CUSTOMER_PROFILE_PATH),
        profile,
        stats,
        settings_href: settings_path(ctx.role),
        error,
    }
    .into_response()
}

/// Display the staff dashboard.
///
/// Customers who guess the URL are sent to their own profile.
#[instrument(skip_all, fields(user_id = %ctx.user_id, role = %ctx.role))]
pub async fn admin(
    State(state): State<AppState>,
    session: Session,
    RequireSession(ctx): RequireSession,
) -> Response {
    if !ctx.role.is_staff() {
        return Redirect::to(CUSTOMER_PROFILE_PATH).into_response();
    }

    let (profile, stats) = tokio::join!(state.api().profile(&ctx), state.api().admin_stats(&ctx));

    if matches!(profile, Err(ApiError::Unauthorized)) || matches!(stats, Err(ApiError::Unauthorized))
    {
        return session_expired(&session).await;
    }

    let (profile, mut error) = profile_or_error(profile);
    let stats = stats_or_notice(stats, &mut error);

    AdminProfileTemplate {
        nav: Navigation::for_session(Some(&ctx), ADMIN_PROFILE_PATH),
        role_label: ctx.role.label(),
        profile,
        stats,
        show_customers: matches!(ctx.role, Role::Admin | Role::SuperAdmin),
        show_verifications: matches!(ctx.role, Role::SuperAdmin),
        settings_href: settings_path(ctx.role),
        error,
    }
    .into_response()
}
