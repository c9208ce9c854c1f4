//! Federated identity profiles.
//!
//! The identity provider's hosted widget hands the client a signed ID token
//! (a JWT). The client only needs the public claims to call the backend's
//! federated-login endpoint; the backend verifies the signature itself, so
//! the payload is decoded here without verification.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Errors that can occur while decoding an ID token.
#[derive(thiserror::Error, Debug)]
pub enum IdTokenError {
    /// The token does not have three dot-separated segments.
    #[error("id token must have three segments")]
    Malformed,
    /// The payload segment is not valid base64url.
    #[error("id token payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The payload is not the expected JSON claims object.
    #[error("id token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A required claim is missing or empty.
    #[error("id token is missing the `{0}` claim")]
    MissingClaim(&'static str),
}

/// Public profile claims from a federated identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProfile {
    /// Provider-scoped subject identifier.
    pub sub: String,
    /// Email address asserted by the provider.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub picture: Option<String>,
}

impl ExternalProfile {
    /// Decode the claims of a JWT ID token.
    ///
    /// # Errors
    ///
    /// Returns [`IdTokenError`] if the token is not a three-segment JWT, the
    /// payload cannot be decoded, or `sub`/`email` are missing.
    pub fn from_id_token(token: &str) -> Result<Self, IdTokenError> {
        let mut segments = token.trim().split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(IdTokenError::Malformed);
        };

        // Some providers pad their segments even though JWT forbids it.
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        let profile: Self = serde_json::from_slice(&bytes)?;

        if profile.sub.is_empty() {
            return Err(IdTokenError::MissingClaim("sub"));
        }
        if profile.email.is_empty() {
            return Err(IdTokenError::MissingClaim("email"));
        }

        Ok(profile)
    }

    /// Name to show for this profile, falling back to the email local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or(&self.email))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token_with(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[test]
    fn test_decodes_public_claims() {
        let token = token_with(&serde_json::json!({
            "sub": "1098",
            "email": "ada@hearth.test",
            "name": "Ada",
            "picture": "https://cdn.hearth.test/ada.png",
            "iss": "accounts.example.com"
        }));

        let profile = ExternalProfile::from_id_token(&token).unwrap();
        assert_eq!(profile.sub, "1098");
        assert_eq!(profile.email, "ada@hearth.test");
        assert_eq!(profile.name.as_deref(), Some("Ada"));
        assert_eq!(
            profile.picture.as_deref(),
            Some("https://cdn.hearth.test/ada.png")
        );
    }

    #[test]
    fn test_rejects_wrong_segment_count() {
        assert!(matches!(
            ExternalProfile::from_id_token("abc.def"),
            Err(IdTokenError::Malformed)
        ));
        assert!(matches!(
            ExternalProfile::from_id_token("a.b.c.d"),
            Err(IdTokenError::Malformed)
        ));
    }

    #[test]
    fn test_rejects_missing_email() {
        let token = token_with(&serde_json::json!({ "sub": "1", "email": "" }));
        assert!(matches!(
            ExternalProfile::from_id_token(&token),
            Err(IdTokenError::MissingClaim("email"))
        ));
    }

    #[test]
    fn test_rejects_garbage_payload() {
        assert!(matches!(
            ExternalProfile::from_id_token("a.!!!.c"),
            Err(IdTokenError::Base64(_))
        ));
    }

    #[test]
    fn test_display_name_fallback() {
        let profile = ExternalProfile {
            sub: "1".to_string(),
            email: "grace@hearth.test".to_string(),
            name: None,
            picture: None,
        };
        assert_eq!(profile.display_name(), "grace");
    }
}
