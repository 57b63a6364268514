//! Account settings.
//!
//! Customers edit name, phone, and home branch; changing the branch
//! regenerates their mailbox address before it is sent to the backend. Staff
//! roles edit name and phone only. Both kinds change their password here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use courier_core::{BranchCode, Role, UserId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::session_expired;
use crate::api::{ApiError, UpdateProfileRequest, UserProfile};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{CspNonce, RequireSession, clear_session_context};
use crate::models::{SessionContext, session_keys};
use crate::navigation::Navigation;
use crate::state::AppState;
use crate::validation;

// =============================================================================
// Page Kinds
// =============================================================================

/// Which settings page a role uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingsKind {
    Customer,
    Admin,
}

impl SettingsKind {
    const fn for_role(role: Role) -> Self {
        match role {
            Role::Customer => Self::Customer,
            Role::Staff | Role::Admin | Role::SuperAdmin => Self::Admin,
        }
    }

    const fn path(self) -> &'static str {
        match self {
            Self::Customer => "/settings",
            Self::Admin => "/admin/settings",
        }
    }

    const fn password_path(self) -> &'static str {
        match self {
            Self::Customer => "/settings/password",
            Self::Admin => "/admin/settings/password",
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Customer settings form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub branch: Option<String>,
}

/// Staff settings form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminSettingsForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Change password form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub password_confirm: String,
}

/// Status codes carried across redirects back to the settings page.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsQuery {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Branch picked in the preview selector.
#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    pub branch: Option<String>,
}

// =============================================================================
// View Models
// =============================================================================

/// Editable profile fields, from the backend or from a rejected submission.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub branch: Option<BranchCode>,
}

impl From<&UserProfile> for ProfileFields {
    fn from(profile: &UserProfile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
            branch: profile.branch,
        }
    }
}

/// An entry in the branch selector.
#[derive(Debug, Clone)]
pub struct BranchOption {
    pub name: &'static str,
    pub selected: bool,
}

fn branch_options(selected: Option<BranchCode>) -> Vec<BranchOption> {
    BranchCode::ALL
        .into_iter()
        .map(|branch| BranchOption {
            name: branch.name(),
            selected: selected == Some(branch),
        })
        .collect()
}

/// Inline messages shown on the settings page.
#[derive(Debug, Default)]
pub struct Notices {
    pub success: Option<String>,
    pub error: Option<String>,
    pub password_success: Option<String>,
    pub password_error: Option<String>,
}

impl Notices {
    fn from_query(query: &SettingsQuery) -> Self {
        let mut notices = Self::default();
        match query.success.as_deref() {
            Some("profile") => notices.success = Some("Your profile has been updated.".into()),
            Some("verification") => {
                notices.success =
                    Some("Verification email sent. Please check your inbox.".into());
            }
            Some("password") => {
                notices.password_success = Some("Your password has been changed.".into());
            }
            _ => {}
        }
        if query.error.as_deref() == Some("verification") {
            notices.error =
                Some("We could not send the verification email. Please try again.".into());
        }
        notices
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    fn password_error(message: impl Into<String>) -> Self {
        Self {
            password_error: Some(message.into()),
            ..Self::default()
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Customer settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "settings/customer.html")]
pub struct SettingsTemplate {
    pub nav: Navigation,
    pub nonce: String,
    pub email: String,
    pub email_verified: bool,
    pub mailbox_address: Option<String>,
    pub fields: ProfileFields,
    pub branches: Vec<BranchOption>,
    pub notices: Notices,
    pub password_action: &'static str,
}

/// Staff settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "settings/admin.html")]
pub struct AdminSettingsTemplate {
    pub nav: Navigation,
    pub email: String,
    pub role_label: &'static str,
    pub fields: ProfileFields,
    pub notices: Notices,
    pub password_action: &'static str,
}

/// Mailbox address preview fragment.
#[derive(Template, WebTemplate)]
#[template(path = "settings/address_preview.html")]
pub struct AddressPreviewTemplate {
    pub address: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// Rendering
// =============================================================================

fn page(
    kind: SettingsKind,
    ctx: &SessionContext,
    nonce: &CspNonce,
    profile: &UserProfile,
    fields: Option<ProfileFields>,
    notices: Notices,
) -> Response {
    let fields = fields.unwrap_or_else(|| ProfileFields::from(profile));
    let nav = Navigation::for_session(Some(ctx), kind.path());
    let email = if profile.email.is_empty() {
        ctx.email.clone()
    } else {
        profile.email.clone()
    };

    match kind {
        SettingsKind::Customer => SettingsTemplate {
            nav,
            nonce: nonce.value().to_string(),
            email,
            email_verified: profile.email_verified,
            mailbox_address: profile
                .mailbox_address
                .clone()
                .filter(|a| !a.trim().is_empty()),
            branches: branch_options(fields.branch),
            fields,
            notices,
            password_action: kind.password_path(),
        }
        .into_response(),
        SettingsKind::Admin => AdminSettingsTemplate {
            nav,
            email,
            role_label: ctx.role.label(),
            fields,
            notices,
            password_action: kind.password_path(),
        }
        .into_response(),
    }
}

/// Load the profile and render the page, folding load failures into the notices.
async fn render(
    state: &AppState,
    session: &Session,
    ctx: &SessionContext,
    nonce: &CspNonce,
    kind: SettingsKind,
    fields: Option<ProfileFields>,
    mut notices: Notices,
) -> Response {
    let profile = match state.api().profile(ctx).await {
        Ok(profile) => profile,
        Err(ApiError::Unauthorized) => return session_expired(session).await,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load profile for settings");
            notices.error.get_or_insert_with(|| e.user_message());
            UserProfile::default()
        }
    };
    page(kind, ctx, nonce, &profile, fields, notices)
}

/// Keep the header name in step with a saved profile.
async fn refresh_display_name(session: &Session, ctx: &SessionContext, first: &str, last: &str) {
    let name = format!("{first} {last}");
    let name = name.trim();
    if name.is_empty() || name == ctx.display_name {
        return;
    }

    let mut updated = ctx.clone();
    updated.display_name = name.to_string();
    if let Err(e) = session
        .insert(session_keys::SESSION_CONTEXT, &updated)
        .await
    {
        tracing::warn!(error = %e, "Failed to refresh session display name");
    }
}

// =============================================================================
// Customer Settings
// =============================================================================

/// Display the customer settings page.
#[instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RequireSession(ctx): RequireSession,
    Query(query): Query<SettingsQuery>,
) -> Response {
    if ctx.role.is_staff() {
        return Redirect::to(SettingsKind::Admin.path()).into_response();
    }

    let notices = Notices::from_query(&query);
    render(&state, &session, &ctx, &nonce, SettingsKind::Customer, None, notices).await
}

/// Save the customer settings form.
///
/// When a branch is chosen, the mailbox address is regenerated from the
/// stored address (keeping its account number) and sent with the update.
#[instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RequireSession(ctx): RequireSession,
    Form(form): Form<SettingsForm>,
) -> Response {
    if ctx.role.is_staff() {
        return Redirect::to(SettingsKind::Admin.path()).into_response();
    }

    let kind = SettingsKind::Customer;
    let submitted = ProfileFields {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        phone: form.phone.as_deref().unwrap_or_default().trim().to_string(),
        branch: None,
    };

    let current = match state.api().profile(&ctx).await {
        Ok(profile) => profile,
        Err(ApiError::Unauthorized) => return session_expired(&session).await,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load profile before update");
            let fields = ProfileFields {
                branch: validation::branch(form.branch.as_deref().unwrap_or_default())
                    .ok()
                    .flatten(),
                ..submitted
            };
            let notices = Notices::error(e.user_message());
            return page(kind, &ctx, &nonce, &UserProfile::default(), Some(fields), notices);
        }
    };

    let branch = match validation::branch(form.branch.as_deref().unwrap_or_default()) {
        Ok(branch) => branch,
        Err(e) => {
            let fields = ProfileFields {
                branch: current.branch,
                ..submitted
            };
            return page(kind, &ctx, &nonce, &current, Some(fields), Notices::error(e.to_string()));
        }
    };
    let submitted = ProfileFields { branch, ..submitted };

    let first_name = match validation::first_name(&submitted.first_name) {
        Ok(name) => name.to_string(),
        Err(e) => {
            return page(kind, &ctx, &nonce, &current, Some(submitted), Notices::error(e.to_string()));
        }
    };

    let mailbox_address = branch.map(|branch| {
        let account = if current.id == UserId::default() {
            ctx.user_id
        } else {
            current.id
        };
        state.mailbox().generate(
            Some(branch),
            current.mailbox_address.as_deref(),
            Some(account),
        )
    });

    let request = UpdateProfileRequest {
        first_name,
        last_name: submitted.last_name.clone(),
        phone: validation::optional(Some(submitted.phone.as_str())),
        branch,
        mailbox_address,
    };

    match state.api().update_profile(&ctx, &request).await {
        Ok(_) => {
            refresh_display_name(&session, &ctx, &request.first_name, &request.last_name).await;
            if let Some(branch) = branch {
                add_breadcrumb("settings", "Changed branch", &[("branch", branch.name())]);
            }
            tracing::info!(branch = ?branch, "Profile updated");
            Redirect::to("/settings?success=profile").into_response()
        }
        Err(ApiError::Unauthorized) => session_expired(&session).await,
        Err(e) => {
            tracing::warn!(error = %e, "Profile update failed");
            page(kind, &ctx, &nonce, &current, Some(submitted), Notices::error(e.user_message()))
        }
    }
}

/// Render the mailbox address a branch would produce.
///
/// Returned as an HTML fragment for the inline preview on the settings page.
#[instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn address_preview(
    State(state): State<AppState>,
    session: Session,
    RequireSession(ctx): RequireSession,
    Query(query): Query<PreviewQuery>,
) -> Response {
    let branch = match validation::branch(query.branch.as_deref().unwrap_or_default()) {
        Ok(branch) => branch,
        Err(e) => {
            return AddressPreviewTemplate {
                address: None,
                error: Some(e.to_string()),
            }
            .into_response();
        }
    };

    let (previous, account) = match state.api().profile(&ctx).await {
        Ok(profile) => {
            let account = if profile.id == UserId::default() {
                ctx.user_id
            } else {
                profile.id
            };
            (profile.mailbox_address, account)
        }
        Err(ApiError::Unauthorized) => {
            // The page script turns this into a redirect to the login page.
            if let Err(e) = clear_session_context(&session).await {
                tracing::error!(error = %e, "Failed to clear expired session");
            }
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load profile for address preview");
            return AddressPreviewTemplate {
                address: None,
                error: Some(e.user_message()),
            }
            .into_response();
        }
    };

    let address = state
        .mailbox()
        .generate(branch, previous.as_deref(), Some(account));

    AddressPreviewTemplate {
        address: Some(address).filter(|a| !a.is_empty()),
        error: None,
    }
    .into_response()
}

/// Ask the backend to send the verification email again.
#[instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn resend_verification(
    State(state): State<AppState>,
    session: Session,
    RequireSession(ctx): RequireSession,
) -> Response {
    match state.api().resend_verification(&ctx).await {
        Ok(_) => Redirect::to("/settings?success=verification").into_response(),
        Err(ApiError::Unauthorized) => session_expired(&session).await,
        Err(e) => {
            tracing::warn!(error = %e, "Resend verification failed");
            Redirect::to("/settings?error=verification").into_response()
        }
    }
}

/// Change password from the customer settings page.
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RequireSession(ctx): RequireSession,
    Form(form): Form<PasswordForm>,
) -> Response {
    change_password_for(&state, &session, &nonce, &ctx, &form).await
}

// =============================================================================
// Staff Settings
// =============================================================================

/// Display the staff settings page.
#[instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn admin_show(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RequireSession(ctx): RequireSession,
    Query(query): Query<SettingsQuery>,
) -> Response {
    if !ctx.role.is_staff() {
        return Redirect::to(SettingsKind::Customer.path()).into_response();
    }

    let notices = Notices::from_query(&query);
    render(&state, &session, &ctx, &nonce, SettingsKind::Admin, None, notices).await
}

/// Save the staff settings form. Staff accounts have no mailbox.
#[instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn admin_update(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RequireSession(ctx): RequireSession,
    Form(form): Form<AdminSettingsForm>,
) -> Response {
    if !ctx.role.is_staff() {
        return Redirect::to(SettingsKind::Customer.path()).into_response();
    }

    let kind = SettingsKind::Admin;
    let submitted = ProfileFields {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        phone: form.phone.as_deref().unwrap_or_default().trim().to_string(),
        branch: None,
    };

    let first_name = match validation::first_name(&submitted.first_name) {
        Ok(name) => name.to_string(),
        Err(e) => {
            let notices = Notices::error(e.to_string());
            return render(&state, &session, &ctx, &nonce, kind, Some(submitted), notices).await;
        }
    };

    let request = UpdateProfileRequest {
        first_name,
        last_name: submitted.last_name.clone(),
        phone: validation::optional(Some(submitted.phone.as_str())),
        branch: None,
        mailbox_address: None,
    };

    match state.api().update_profile(&ctx, &request).await {
        Ok(_) => {
            refresh_display_name(&session, &ctx, &request.first_name, &request.last_name).await;
            tracing::info!("Staff profile updated");
            Redirect::to("/admin/settings?success=profile").into_response()
        }
        Err(ApiError::Unauthorized) => session_expired(&session).await,
        Err(e) => {
            tracing::warn!(error = %e, "Staff profile update failed");
            let notices = Notices::error(e.user_message());
            render(&state, &session, &ctx, &nonce, kind, Some(submitted), notices).await
        }
    }
}

/// Change password from the staff settings page.
pub async fn admin_change_password(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RequireSession(ctx): RequireSession,
    Form(form): Form<PasswordForm>,
) -> Response {
    change_password_for(&state, &session, &nonce, &ctx, &form).await
}

// =============================================================================
// Password
// =============================================================================

/// Shared password change flow; the role decides which page is shown after.
#[instrument(skip_all, fields(user_id = %ctx.user_id))]
async fn change_password_for(
    state: &AppState,
    session: &Session,
    nonce: &CspNonce,
    ctx: &SessionContext,
    form: &PasswordForm,
) -> Response {
    let kind = SettingsKind::for_role(ctx.role);

    let checked = validation::login_password(&form.current_password)
        .and_then(|()| validation::new_password(&form.new_password, &form.password_confirm));
    if let Err(e) = checked {
        let notices = Notices::password_error(e.to_string());
        return render(state, session, ctx, nonce, kind, None, notices).await;
    }

    match state
        .api()
        .change_password(ctx, &form.current_password, &form.new_password)
        .await
    {
        Ok(_) => {
            tracing::info!("Password changed");
            Redirect::to(&format!("{}?success=password#password", kind.path())).into_response()
        }
        Err(ApiError::Unauthorized) => session_expired(session).await,
        Err(e) => {
            tracing::warn!(error = %e, "Password change failed");
            let notices = Notices::password_error(e.user_message());
            render(state, session, ctx, nonce, kind, None, notices).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_role() {
        assert_eq!(SettingsKind::for_role(Role::Customer).path(), "/settings");
        for role in [Role::Staff, Role::Admin, Role::SuperAdmin] {
            assert_eq!(SettingsKind::for_role(role).path(), "/admin/settings");
        }
    }

    #[test]
    fn test_branch_options_mark_selection() {
        let options = branch_options(Some(BranchCode::Kingston));
        assert_eq!(options.len(), BranchCode::ALL.len());
        let selected: Vec<_> = options.iter().filter(|o| o.selected).map(|o| o.name).collect();
        assert_eq!(selected, vec!["Kingston"]);
        assert!(branch_options(None).iter().all(|o| !o.selected));
    }

    #[test]
    fn test_notices_from_query() {
        let notices = Notices::from_query(&SettingsQuery {
            success: Some("password".to_string()),
            error: None,
        });
        assert!(notices.password_success.is_some());
        assert!(notices.success.is_none());

        let notices = Notices::from_query(&SettingsQuery {
            success: Some("<b>hi</b>".to_string()),
            error: Some("verification".to_string()),
        });
        assert!(notices.success.is_none());
        assert!(notices.error.is_some());
    }
}
