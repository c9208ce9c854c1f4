//! Credential forms and their pre-network validation.

use reqwest::multipart::Form;
use secrecy::{ExposeSecret, SecretString};

use hearth_core::Email;

use crate::models::Upload;
use crate::validation::FieldErrors;

/// Minimum password length accepted by the backend.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Sign-up details submitted to `/auth/signup`.
pub struct RegistrationForm {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub avatar: Option<Upload>,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("avatar", &self.avatar)
            .finish()
    }
}

impl RegistrationForm {
    /// Check every field. Nothing is sent while this returns errors.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name);
        errors.require("username", &self.username);
        errors.check(
            !self.username.chars().any(char::is_whitespace),
            "username",
            "must not contain spaces",
        );
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        if let Some(avatar) = &self.avatar {
            avatar.check_image(&mut errors, "avatar");
        }
        errors
    }

    /// Build the multipart body.
    pub(crate) fn into_form(self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new()
            .text("name", self.name.trim().to_string())
            .text("username", self.username.trim().to_string())
            .text("email", self.email.trim().to_string())
            .text("password", self.password.expose_secret().to_string());
        if let Some(avatar) = self.avatar {
            form = form.part("avatar", avatar.into_part()?);
        }
        Ok(form)
    }
}

/// Validate a password login.
pub(crate) fn validate_login(identifier: &str, secret: &SecretString) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, identifier);
    errors.check(
        !secret.expose_secret().is_empty(),
        "password",
        "is required",
    );
    errors
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    errors.require("email", email);
    if let Err(e) = Email::parse(email) {
        errors.add("email", e.to_string());
    }
}

fn check_password(errors: &mut FieldErrors, password: &SecretString) {
    let len = password.expose_secret().chars().count();
    errors.check(len > 0, "password", "is required");
    if len < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
}
