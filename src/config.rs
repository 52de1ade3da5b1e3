//! Defines structures and builders related to the login server configuration.
//!
//! Provides a structured way to handle credentials, Google endpoints
//! and the socket address the server binds to.
//!
//! ## Structures
//! - `Config`: Stores all the necessary information.
//! - `ConfigBuilder`: A builder for constructing a `Config` instance.
//!
//! # Example
//! ```rust,no_run
//! use google_login::config::Config;
//!
//! let config = Config::builder()
//!     .client_id("your-client-id")
//!     .client_secret("your-client-secret")
//!     .redirect_uri("http://localhost:8080/google-callback")
//!     .build();
//! ```
//!
//! In production, use `Config::from_env()` so credentials never live in source.
use std::net::SocketAddr;

use tracing::error;

use crate::{code::Scope, error::Error};

static DEFAULT_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
static DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
static DEFAULT_USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
static DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/google-callback";

#[derive(Debug, Clone)]
pub(crate) struct AuthEndPoint(pub String);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClientID(pub String);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClientSecret(pub String);

#[derive(Debug, Clone)]
pub(crate) struct TokenEndPoint(pub String);

#[derive(Debug, Clone)]
pub(crate) struct UserInfoEndPoint(pub String);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RedirectURI(pub String);

/// Holds all information the login server needs.
///
/// It is designed to be immutable once constructed.
///
/// # Fields
/// - `auth_endpoint`: The authorization endpoint URL.
/// - `client_id`: The client ID obtained from Google Cloud Console.
/// - `client_secret`: The client secret linked to the client ID.
/// - `token_endpoint`: The token exchange endpoint URL.
/// - `userinfo_endpoint`: The endpoint returning the user's profile.
/// - `redirect_uri`: The redirect URI registered in Google Cloud Console.
/// - `scopes`: The scopes requested on the consent screen.
/// - `bind_addr`: The socket address the server listens on.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) auth_endpoint: AuthEndPoint,
    pub(crate) client_id: ClientID,
    pub(crate) client_secret: ClientSecret,
    pub(crate) token_endpoint: TokenEndPoint,
    pub(crate) userinfo_endpoint: UserInfoEndPoint,
    pub(crate) redirect_uri: RedirectURI,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) bind_addr: SocketAddr,
}

// ==========impl Config==========
impl Config {
    /// Returns a new `ConfigBuilder` instance to create a `Config` object.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reads the configuration from the process environment and an optional `.env` file.
    ///
    /// `client_id` and `client_secret` are required. Every other key falls back to
    /// Google's endpoints and the defaults of `ConfigBuilder`.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_source(|key| dotenvy::var(key).ok())
    }

    pub(crate) fn from_source<F>(read: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            read(key).filter(|v| !v.is_empty()).ok_or_else(|| {
                error!("Missing required environment variable: {}", key);
                Error::Env(key)
            })
        };

        let mut builder = ConfigBuilder::new()
            .client_id(&required("client_id")?)
            .client_secret(&required("client_secret")?);

        if let Some(v) = read("auth_endpoint") {
            builder = builder.auth_endpoint(&v);
        }
        if let Some(v) = read("token_endpoint") {
            builder = builder.token_endpoint(&v);
        }
        if let Some(v) = read("userinfo_endpoint") {
            builder = builder.userinfo_endpoint(&v);
        }
        if let Some(v) = read("redirect_uri") {
            builder = builder.redirect_uri(&v);
        }
        if let Some(v) = read("scopes") {
            let scopes = v
                .split_whitespace()
                .map(str::parse::<Scope>)
                .collect::<Result<Vec<_>, _>>()?;
            builder = builder.scopes(scopes);
        }
        if let Some(v) = read("bind_addr") {
            let addr = v.parse::<SocketAddr>().map_err(|e| {
                error!("Invalid bind_addr {}: {}", v, e);
                Error::Env("bind_addr")
            })?;
            builder = builder.bind_addr(addr);
        }
        Ok(builder.build())
    }

    /// The router path of the OAuth callback, taken from `redirect_uri`.
    ///
    /// Only http(s) redirect URIs map onto a route of this server.
    pub fn callback_path(&self) -> Result<String, Error> {
        let url = url::Url::parse(&self.redirect_uri.0).map_err(|e| {
            error!("Failed to parse redirect_uri: {}", e);
            Error::URL
        })?;
        if !matches!(url.scheme(), "http" | "https") || !url.path().starts_with('/') {
            error!("redirect_uri is not an http(s) URL: {}", self.redirect_uri.0);
            return Err(Error::CallbackPath(self.redirect_uri.0.clone()));
        }
        Ok(url.path().to_string())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

/// Provides a convenient way to create a `Config` instance step by step.
///
/// Starts from Google's endpoints, the `email` and `profile` scopes
/// and `0.0.0.0:8080`.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    auth_endpoint: AuthEndPoint,
    client_id: ClientID,
    client_secret: ClientSecret,
    token_endpoint: TokenEndPoint,
    userinfo_endpoint: UserInfoEndPoint,
    redirect_uri: RedirectURI,
    scopes: Vec<Scope>,
    bind_addr: SocketAddr,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            auth_endpoint: AuthEndPoint(DEFAULT_AUTH_ENDPOINT.to_string()),
            client_id: ClientID(String::new()),
            client_secret: ClientSecret(String::new()),
            token_endpoint: TokenEndPoint(DEFAULT_TOKEN_ENDPOINT.to_string()),
            userinfo_endpoint: UserInfoEndPoint(DEFAULT_USERINFO_ENDPOINT.to_string()),
            redirect_uri: RedirectURI(DEFAULT_REDIRECT_URI.to_string()),
            scopes: vec![Scope::Email, Scope::Profile],
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

// ==========impl ConfigBuilder==========
impl ConfigBuilder {
    /// Creates a new `ConfigBuilder` instance with default values.
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    /// Sets the authorization endpoint URL.
    pub fn auth_endpoint(mut self, auth_endpoint: &str) -> Self {
        self.auth_endpoint = AuthEndPoint(auth_endpoint.to_string());
        self
    }

    /// Sets the client ID obtained from Google Cloud Console.
    pub fn client_id(mut self, client_id: &str) -> Self {
        self.client_id = ClientID(client_id.to_string());
        self
    }

    /// Sets the client secret associated with the client ID.
    pub fn client_secret(mut self, client_secret: &str) -> Self {
        self.client_secret = ClientSecret(client_secret.to_string());
        self
    }

    /// Sets the token exchange endpoint URL.
    pub fn token_endpoint(mut self, token_endpoint: &str) -> Self {
        self.token_endpoint = TokenEndPoint(token_endpoint.to_string());
        self
    }

    /// Sets the userinfo endpoint URL.
    pub fn userinfo_endpoint(mut self, userinfo_endpoint: &str) -> Self {
        self.userinfo_endpoint = UserInfoEndPoint(userinfo_endpoint.to_string());
        self
    }

    /// Sets the redirect URI registered in Google Cloud Console.
    pub fn redirect_uri(mut self, redirect_url: &str) -> Self {
        self.redirect_uri = RedirectURI(redirect_url.to_string());
        self
    }

    /// Replaces the requested scopes.
    pub fn scopes<I>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = Scope>,
    {
        self.scopes = scopes.into_iter().collect();
        self
    }

    pub fn bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    /// Constructs a `Config` instance with the provided values.
    pub fn build(self) -> Config {
        Config {
            auth_endpoint: self.auth_endpoint,
            client_id: self.client_id,
            client_secret: self.client_secret,
            token_endpoint: self.token_endpoint,
            userinfo_endpoint: self.userinfo_endpoint,
            redirect_uri: self.redirect_uri,
            scopes: self.scopes,
            bind_addr: self.bind_addr,
        }
    }
}
