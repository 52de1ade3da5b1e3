//! Provides the CSRF token carried in the OAuth `state` parameter.
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use tracing::error;

use crate::error::Error;

/// A randomly generated CSRF token created using `OsRng` and Base64URL-encoded.
///
/// The login page stores it in the session and sends it to Google as `state`.
/// The callback accepts the authorization code only when Google echoes the same value.
#[derive(Debug, Clone, PartialEq)]
pub struct CSRFToken(pub(crate) String);

impl CSRFToken {
    /// Generates a new CSRF token using a secure random generator.
    /// Returns an `Error::GenToken` if the random generation fails.
    pub fn new() -> Result<Self, Error> {
        let mut key = [0u8; 32];
        OsRng.try_fill_bytes(&mut key).map_err(|e| {
            error!("Failed to generate CSRF token: {:?}", e);
            Error::GenToken
        })?;
        Ok(Self(URL_SAFE_NO_PAD.encode(key)))
    }

    /// Returns the CSRF token as a string reference.
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// The `state` received on the callback.
///
/// This token **has not been verified yet** and must be checked against the stored `CSRFToken`.
#[derive(Debug, Clone)]
pub struct UnCheckedCSRFToken(pub(crate) String);

impl From<String> for UnCheckedCSRFToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}
