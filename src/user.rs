//! The signed-in user and the userinfo request that fills it in.
use serde::Deserialize;

use crate::{
    config::{Config, UserInfoEndPoint},
    token::AccessToken,
};

/// The `user` record kept in the session after a successful login.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct User {
    pub name: String,
    pub email: String,
    /// Profile picture URL
    pub picture: String,
}

/// A GET request to Google's userinfo endpoint, authorized with the access token.
#[derive(Debug, Clone)]
pub struct UserInfoRequest {
    userinfo_endpoint: UserInfoEndPoint,
    access_token: AccessToken,
}

impl UserInfoRequest {
    pub fn new(config: &Config, access_token: &AccessToken) -> Self {
        Self {
            userinfo_endpoint: config.userinfo_endpoint.to_owned(),
            access_token: access_token.to_owned(),
        }
    }

    pub fn userinfo_endpoint(&self) -> &str {
        &self.userinfo_endpoint.0
    }

    pub fn access_token(&self) -> &str {
        self.access_token.value_as_str()
    }
}

/// Profile returned by the userinfo endpoint.
/// Fields that were not granted by the requested scopes are absent.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

impl From<UserInfo> for User {
    fn from(info: UserInfo) -> Self {
        Self {
            name: info.name.unwrap_or_default(),
            email: info.email.unwrap_or_default(),
            picture: info.picture.unwrap_or_default(),
        }
    }
}
