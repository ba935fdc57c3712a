//! Thumbs-up / thumbs-down feedback validation.
//!
//! Feedback arrives as `POST /custom/thumbup` with
//! `Authorization: Bearer <token>` and a JSON body `{"value": bool}`. The
//! token is an HS256 JWT signed with the host's secret; its subject claim
//! must start with the configured session prefix. Validation is pure: no
//! I/O, no state, every call independent.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// JSON body of a feedback request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct FeedbackBody {
    #[serde(default)]
    pub value: Option<bool>,
}

impl FeedbackBody {
    /// Absent or `false` counts as thumbs-down.
    pub fn vote(&self) -> FeedbackVote {
        if self.value == Some(true) {
            FeedbackVote::Up
        } else {
            FeedbackVote::Down
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackVote {
    Up,
    Down,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

/// Validates feedback tokens against one secret and session prefix.
#[derive(Clone)]
pub struct FeedbackValidator {
    secret: Vec<u8>,
    session_prefix: String,
}

impl std::fmt::Debug for FeedbackValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackValidator")
            .field("secret", &"<redacted>")
            .field("session_prefix", &self.session_prefix)
            .finish()
    }
}

impl FeedbackValidator {
    pub fn new(secret: impl Into<Vec<u8>>, session_prefix: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            session_prefix: session_prefix.into(),
        }
    }

    /// Verify `token` and return its session id.
    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        validate(token, &self.secret, &self.session_prefix)
    }

    /// Extract the token from an `Authorization` header, then validate it.
    pub fn validate_header(&self, authorization: Option<&str>) -> Result<String, AuthError> {
        self.validate(bearer_token(authorization)?)
    }
}

/// Strip the `Bearer ` scheme (case-insensitive) from an `Authorization` value.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let value = authorization.map(str::trim).ok_or(AuthError::MissingToken)?;
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingToken)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Verify an HS256 token signed with `secret` and check its subject prefix.
///
/// Malformed tokens, non-HS256 algorithms, and bad signatures are all
/// `InvalidSignature`. A valid token whose subject (`sub`, else `user_id`)
/// is missing or lacks `required_session_prefix` is `PrefixMismatch`.
pub fn validate(
    bearer_token: &str,
    secret: &[u8],
    required_session_prefix: &str,
) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::NotConfigured);
    }

    let mut parts = bearer_token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::InvalidSignature);
    };

    let header: Header = decode_json(header_b64)?;
    if header.alg != "HS256" {
        return Err(AuthError::InvalidSignature);
    }

    let signature = decode_segment(signature_b64)?;
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| AuthError::NotConfigured)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AuthError::InvalidSignature)?;

    let claims: Claims = decode_json(payload_b64)?;
    let subject = claims.sub.or(claims.user_id).unwrap_or_default();
    if subject.is_empty() || !subject.starts_with(required_session_prefix) {
        return Err(AuthError::PrefixMismatch {
            subject,
            prefix: required_session_prefix.to_string(),
        });
    }
    Ok(subject)
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, AuthError> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|_| AuthError::InvalidSignature)
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AuthError> {
    let bytes = decode_segment(segment)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_defaults_to_thumb_down() {
        assert_eq!(FeedbackBody::default().vote(), FeedbackVote::Down);
        let body: FeedbackBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.vote(), FeedbackVote::Down);
        let body: FeedbackBody = serde_json::from_str(r#"{"value": false}"#).unwrap();
        assert_eq!(body.vote(), FeedbackVote::Down);
        let body: FeedbackBody = serde_json::from_str(r#"{"value": true}"#).unwrap();
        assert_eq!(body.vote(), FeedbackVote::Up);
    }

    #[test]
    fn bearer_scheme_is_required() {
        assert_eq!(bearer_token(Some("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(Some("bearer  abc ")), Ok("abc"));
        assert_eq!(bearer_token(Some("Basic abc")), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(Some("Bearer ")), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(None), Err(AuthError::MissingToken));
    }

    #[test]
    fn garbage_tokens_are_invalid_signatures() {
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert_eq!(
                validate(token, b"secret", "user_"),
                Err(AuthError::InvalidSignature),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn empty_secret_is_not_configured() {
        assert_eq!(validate("a.b.c", b"", "user_"), Err(AuthError::NotConfigured));
    }

    #[test]
    fn debug_redacts_secret() {
        let v = FeedbackValidator::new("hunter2", "user_");
        let out = format!("{v:?}");
        assert!(!out.contains("hunter2"));
    }
}
