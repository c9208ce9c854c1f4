//! Sign-in, registration and profile commands.

use std::path::PathBuf;

use secrecy::SecretString;

use hearth_core::{Email, ExternalProfile};
use hearth_storefront::models::PrincipalPatch;
use hearth_storefront::session::{AuthOutcome, RegistrationForm};

use super::{Context, read_upload};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::output;

/// Sign up details from the command line.
pub struct Registration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub avatar: Option<PathBuf>,
}

fn finish(outcome: AuthOutcome) -> Result<()> {
    match outcome {
        AuthOutcome::Authenticated {
            principal,
            is_admin,
        } => {
            set_sentry_user(&principal.id, Some(principal.email.as_str()));
            output::done(&format!("Signed in as {}", principal.name));
            if is_admin {
                output::done("Administrator tools are available under `hearth admin`.");
            }
            Ok(())
        }
        AuthOutcome::Rejected { message, fields } => Err(AppError::Rejected { message, fields }),
    }
}

/// `hearth login`
pub async fn login(ctx: &Context, email: &str, password: &SecretString) -> Result<()> {
    finish(ctx.session.login(email, password).await)
}

/// `hearth register`
pub async fn register(ctx: &Context, registration: Registration) -> Result<()> {
    let avatar = match &registration.avatar {
        Some(path) => Some(read_upload(path).await?),
        None => None,
    };
    let form = RegistrationForm {
        name: registration.name,
        username: registration.username,
        email: registration.email,
        password: registration.password,
        avatar,
    };
    finish(ctx.session.register(form).await)
}

/// `hearth login-google`
pub async fn login_google(ctx: &Context, id_token: &str) -> Result<()> {
    let profile = ExternalProfile::from_id_token(id_token)?;
    finish(ctx.session.login_with_external_identity(&profile).await)
}

/// `hearth logout`
pub async fn logout(ctx: &Context) {
    ctx.session.logout().await;
    clear_sentry_user();
    output::done("Signed out.");
}

/// `hearth whoami`
pub fn whoami(ctx: &Context) -> Result<()> {
    output::principal(&ctx.principal()?);
    Ok(())
}

/// `hearth profile set`
pub async fn update_profile(
    ctx: &Context,
    name: Option<String>,
    username: Option<String>,
    email: Option<String>,
    avatar: Option<String>,
) -> Result<()> {
    let email = email
        .map(|e| Email::parse(&e).map_err(|err| AppError::InvalidArgument(err.to_string())))
        .transpose()?;
    let patch = PrincipalPatch {
        name,
        username,
        email,
        avatar,
    };
    if patch.is_empty() {
        return Err(AppError::InvalidArgument(
            "nothing to update, pass at least one field".to_string(),
        ));
    }

    let principal = ctx
        .session
        .update_principal(patch)
        .await
        .ok_or(AppError::NotAuthenticated)?;
    output::principal(&principal);
    Ok(())
}
