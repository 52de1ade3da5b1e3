//! Provides an asynchronous execution framework for sending HTTP requests to Google.
//!
//! This module:
//! - Defines the Executer trait, which provides a unified interface for making HTTP requests.
//! - Implements executers for the code exchange and the userinfo lookup.

use std::{collections::HashMap, error::Error, pin::Pin};

use crate::{
    token::{TokenRequest, TokenResponse},
    user::{UserInfo, UserInfoRequest},
};
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::error;

/// generic asynchronous execution interface for sending HTTP requests.
/// Key Components:
/// - Req: The request type that the executer will handle.
/// - Response: The expected response type.
/// - Error: The error type that will be returned on failure.
/// - Future: The asynchronous execution result, returning either Response or Error
pub trait Executer<'a, Req>
where
    Req: Send,
{
    type Response;
    type Error: Error;
    type Future: Future<Output = Result<Self::Response, Self::Error>> + Send + 'a;

    fn execute(&'a self, req: &'a Req) -> Self::Future;
}

/// Defines possible errors that can occur during request execution.
#[derive(Debug, Clone, Error)]
pub enum ExecuteError {
    #[error("Google responded with an error status")]
    Failed,
    #[error("Failed to parse data")]
    Parse,
    #[error("Failed to send request")]
    Send,
    #[error("Failed to parse url")]
    URL,
}

fn parse_url(url: &str) -> Result<Url, ExecuteError> {
    Url::parse(url).map_err(|e| {
        error!("Failed to parse url: {:?}", e);
        ExecuteError::URL
    })
}

/// Exchanges an authorization code for an access token.
pub struct TokenExe {
    client: Client,
}

impl TokenExe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Request Workflow
/// 1. Parse the token endpoint URL.
/// 2. Prepare the form parameters.
/// 3. Send an HTTP POST request.
/// 4. Parse and return the response as TokenResponse.
impl<'a> Executer<'a, TokenRequest> for TokenExe {
    type Response = TokenResponse;
    type Error = ExecuteError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'a>>;

    fn execute(&'a self, req: &'a TokenRequest) -> Self::Future {
        Box::pin(async move {
            let url = parse_url(req.token_endpoint())?;

            let mut params = HashMap::new();
            params.insert("code", req.code());
            params.insert("client_id", req.client_id());
            params.insert("client_secret", req.client_secret());
            params.insert("redirect_uri", req.redirect_uri());
            params.insert("grant_type", req.grant_type());

            let res = self
                .client
                .post(url)
                .form(&params)
                .send()
                .await
                .map_err(|e| {
                    error!("Failed to send request: {:?}", e);
                    ExecuteError::Send
                })?;
            if !res.status().is_success() {
                error!("Token endpoint responded with {}", res.status());
                return Err(ExecuteError::Failed);
            }
            let res_json = res.json::<TokenResponse>().await.map_err(|e| {
                error!("Failed to parse JSON: {:?}", e);
                ExecuteError::Parse
            })?;
            Ok(res_json)
        })
    }
}

/// Fetches the signed-in user's profile.
pub struct UserInfoExe {
    client: Client,
}

impl UserInfoExe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Request Workflow
/// 1. Parse the userinfo endpoint URL.
/// 2. Send an HTTP GET request with the access token as bearer.
/// 3. Parse and return the response as UserInfo.
impl<'a> Executer<'a, UserInfoRequest> for UserInfoExe {
    type Response = UserInfo;
    type Error = ExecuteError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'a>>;

    fn execute(&'a self, req: &'a UserInfoRequest) -> Self::Future {
        Box::pin(async move {
            let url = parse_url(req.userinfo_endpoint())?;

            let res = self
                .client
                .get(url)
                .bearer_auth(req.access_token())
                .send()
                .await
                .map_err(|e| {
                    error!("Failed to send request: {:?}", e);
                    ExecuteError::Send
                })?;
            if !res.status().is_success() {
                error!("Userinfo endpoint responded with {}", res.status());
                return Err(ExecuteError::Failed);
            }
            let res_json = res.json::<UserInfo>().await.map_err(|e| {
                error!("Failed to parse JSON: {:?}", e);
                ExecuteError::Parse
            })?;
            Ok(res_json)
        })
    }
}
