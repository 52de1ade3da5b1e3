//! This module handles the authorization request and the code returned on the callback.
//!
//! It provides the following key functionalities:
//! - Generating an authorization request URL (`CodeRequest`).
//! - Parsing and verifying the authorization code received on the callback (`UnCheckedCodeResponse`).
//!
//! # Flow
//! 1. Generate a CSRF token (`CSRFToken`) and include it in the authorization request as `state`.
//! 2. The login page links the user to Google's consent screen.
//! 3. After consent, Google redirects back with `code` and `state` (`CallbackParams`).
//! 4. `UnCheckedCodeResponse::exchange_with_code()` compares `state` with the stored token.
//! 5. If validation succeeds, a `Code` is obtained, which can be exchanged for tokens.
use std::str::FromStr;

use itertools::Itertools;
use serde::Deserialize;
use tracing::{error, warn};

use crate::{
    config::{AuthEndPoint, ClientID, Config, RedirectURI},
    csrf_token::{CSRFToken, UnCheckedCSRFToken},
    error::Error,
};

/// Scopes requested on the consent screen.
///
/// ## `Email`
/// - Requests the user's **email address**.
///
/// ## `Profile`
/// - Requests the user's **name and profile picture URL**.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Email,
    Profile,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Email => "email",
            Scope::Profile => "profile",
        }
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Scope::Email),
            "profile" => Ok(Scope::Profile),
            other => {
                error!("Unknown scope: {}", other);
                Err(Error::UnknownScope(other.to_string()))
            }
        }
    }
}

/// Represents the value of the `code` query parameter sent by Google.
///
/// A `Code` can only be obtained through `UnCheckedCodeResponse::exchange_with_code`,
/// so holding one means the `state` has already been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Code(pub(crate) String);

impl From<String> for Code {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Generates the URL that sends the user to Google's consent screen.
/// # Example
/// ```rust,no_run
/// use google_login::{code::CodeRequest, config::Config, csrf_token::CSRFToken};
///
/// let config = Config::builder()
///     .client_id("your_client_id")
///     .redirect_uri("http://localhost:8080/google-callback")
///     .build();
///
/// let csrf_token = CSRFToken::new().unwrap();
/// let url = CodeRequest::new(&config, &csrf_token).into_url().unwrap();
/// println!("Auth URL: {}", url);
/// ```
#[derive(Debug, Clone)]
pub struct CodeRequest {
    auth_endpoint: AuthEndPoint,
    client_id: ClientID,
    response_type: String,
    scopes: Vec<Scope>,
    redirect_uri: RedirectURI,
    state: CSRFToken,
}

impl CodeRequest {
    pub fn new(config: &Config, state: &CSRFToken) -> Self {
        Self {
            auth_endpoint: config.auth_endpoint.to_owned(),
            client_id: config.client_id.to_owned(),
            response_type: "code".to_string(),
            scopes: config.scopes.to_owned(),
            redirect_uri: config.redirect_uri.to_owned(),
            state: state.to_owned(),
        }
    }

    /// Scopes as sent to Google: deduplicated, sorted and space separated.
    pub fn scope(&self) -> String {
        self.scopes
            .iter()
            .map(Scope::as_str)
            .unique()
            .sorted()
            .join(" ")
    }

    /// Constructs the authorization URL with percent-encoded query parameters.
    pub fn into_url(&self) -> Result<String, Error> {
        let mut url = url::Url::parse(&self.auth_endpoint.0).map_err(|e| {
            error!("Failed to parse auth endpoint: {}", e);
            Error::URL
        })?;
        url.query_pairs_mut()
            .append_pair("response_type", &self.response_type)
            .append_pair("client_id", &self.client_id.0)
            .append_pair("redirect_uri", &self.redirect_uri.0)
            .append_pair("scope", &self.scope())
            .append_pair("access_type", "online")
            .append_pair("state", self.state.value());
        Ok(url.into())
    }
}

/// Query parameters Google appends to the redirect URI.
///
/// `error` is set instead of `code` when the user declines consent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// A response from Google containing an unverified authorization code and state.
/// Must be validated using a CSRF token before use.
#[derive(Debug, Clone)]
pub struct UnCheckedCodeResponse {
    state: UnCheckedCSRFToken,
    code: Code,
}

impl UnCheckedCodeResponse {
    pub fn from_params(params: CallbackParams) -> Result<Self, Error> {
        let code = params.code.ok_or(Error::Callback("code"))?;
        let state = params.state.ok_or(Error::Callback("state"))?;
        Ok(Self {
            state: state.into(),
            code: code.into(),
        })
    }

    /// Returns the `Code` only if `state` equals the stored CSRF token.
    pub fn exchange_with_code(self, csrf_token_val: &str) -> Result<Code, Error> {
        if constant_time_eq(self.state.0.as_bytes(), csrf_token_val.as_bytes()) {
            Ok(self.code)
        } else {
            warn!("CSRF token did not match on callback");
            Err(Error::CSRFNotMatch)
        }
    }
}

// Visits every byte, so the time taken does not depend on where the values differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
