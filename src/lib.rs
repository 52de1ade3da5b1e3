//! Minimal Google login server.
//!
//! A landing page links to Google's OAuth consent screen, and a dashboard shows the
//! signed-in user's profile. Everything past the landing page is gated on the session.
//! [google document](https://developers.google.com/identity/protocols/oauth2/web-server)
//! # Feature
//! - Generate a CSRF token and an authorization request URL for Google
//! - Verify the callback `state` and exchange the code for an access token (using reqwest)
//! - Fetch the user's name, email and picture from the userinfo endpoint
//! - Keep the user in a server-side session keyed by an opaque cookie
//! - Redirect requests without a signed-in session back to the login page
//! # Routes
//! - `GET /`: login page
//! - `GET /dashboard`: session-gated page
//! - `GET /logout`: clears the session
//! - `GET <path of redirect_uri>`: OAuth callback
pub mod code;
pub mod config;
pub mod csrf_token;
pub mod error;
pub mod executer;
pub mod handler;
pub mod page;
pub mod session;
pub mod token;
pub mod user;
