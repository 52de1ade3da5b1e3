//! Provides the request and response of the authorization code exchange.
//!
//! This module:
//! TokenRequest: A data structure for sending requests to the token endpoint.
//! TokenResponse: A data structure for parsing the response from the token endpoint.
//! AccessToken: A structure representing an access token used to call Google APIs.
use serde::Deserialize;

use crate::{
    code::Code,
    config::{ClientID, ClientSecret, Config, RedirectURI, TokenEndPoint},
};

/// Represents an OAuth 2.0 access token.
/// This token is used to access Google APIs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessToken(pub(crate) String);

impl AccessToken {
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn value_as_str(&self) -> &str {
        &self.0
    }
}

/// A structure used to send a code exchange request to Google's token endpoint.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    token_endpoint: TokenEndPoint,
    code: Code,
    client_id: ClientID,
    client_secret: ClientSecret,
    redirect_uri: RedirectURI,
    grant_type: String,
}

impl TokenRequest {
    /// Creates a new request using parameters from Config.
    pub fn new(config: &Config, code: Code) -> Self {
        Self {
            token_endpoint: config.token_endpoint.to_owned(),
            code,
            client_id: config.client_id.to_owned(),
            client_secret: config.client_secret.to_owned(),
            redirect_uri: config.redirect_uri.to_owned(),
            grant_type: "authorization_code".to_string(),
        }
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint.0
    }

    pub fn code(&self) -> &str {
        &self.code.0
    }

    pub fn client_id(&self) -> &str {
        &self.client_id.0
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret.0
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri.0
    }

    pub fn grant_type(&self) -> &str {
        &self.grant_type
    }
}

/// Represents the response from Google's token endpoint.
///
/// Only the access token is read. Expiry, scope and any refresh token are ignored
/// because the token is used once, right after the exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    access_token: AccessToken,
}

impl TokenResponse {
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }
}
