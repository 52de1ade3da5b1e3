//! HTTP surface of the login server.
//!
//! - `/`: login page linking to Google's consent screen
//! - `/dashboard`: shows the signed-in user, otherwise redirects to `/`
//! - `/logout`: destroys the session
//! - path of `redirect_uri`: receives the authorization code from Google
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use reqwest::Client;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::{
    code::{CallbackParams, CodeRequest, UnCheckedCodeResponse},
    config::Config,
    csrf_token::CSRFToken,
    error::Error,
    executer::{Executer, TokenExe, UserInfoExe},
    page,
    session::{SESSION_COOKIE_KEY, Session, SessionID, SessionStore},
    token::TokenRequest,
    user::{User, UserInfoRequest},
};

/// Context handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<dyn SessionStore>,
    pub http: Client,
}

impl AppState {
    pub fn new(config: Config, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            http: Client::new(),
        }
    }
}

pub fn router(state: AppState) -> Result<Router, Error> {
    let callback_path = state.config.callback_path()?;
    if ["/", "/dashboard", "/logout"].contains(&callback_path.as_str()) {
        error!("redirect_uri path collides with a page route: {}", callback_path);
        return Err(Error::CallbackPath(callback_path));
    }
    let app = Router::new()
        .route("/", get(login))
        .route("/dashboard", get(dashboard))
        .route("/logout", get(logout))
        .route(&callback_path, get(callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    Ok(app)
}

fn session_cookie(id: &SessionID) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_KEY, id.value().to_string()))
        .same_site(SameSite::Lax)
        .http_only(true)
        .path("/")
        .build()
}

// Session named by the cookie, if the store still knows it.
fn current_session(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Option<(SessionID, Session)>, Error> {
    let Some(cookie) = jar.get(SESSION_COOKIE_KEY) else {
        return Ok(None);
    };
    let id = SessionID::from(cookie.value());
    Ok(state.sessions.load(&id)?.map(|session| (id, session)))
}

async fn login(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse, Error> {
    // Generate CSRF Token for each request
    let csrf_token = CSRFToken::new()?;
    let url = CodeRequest::new(&state.config, &csrf_token).into_url()?;

    // A signed-in session keeps its user and expiry, anything else restarts as pending
    let (id, session) = match current_session(&state, &jar)? {
        Some((id, session)) if session.user.is_some() => (
            id,
            Session {
                csrf_token: Some(csrf_token),
                ..session
            },
        ),
        Some((id, _)) => (id, Session::pending(csrf_token)),
        None => (SessionID::new(), Session::pending(csrf_token)),
    };
    state.sessions.save(&id, session)?;

    Ok((jar.add(session_cookie(&id)), Html(page::login(&url))))
}

/// Renders the signed-in user. Without a `user` in the session nothing is rendered.
async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> Result<Response, Error> {
    let user = current_session(&state, &jar)?.and_then(|(_, session)| session.user);
    match user {
        Some(user) => Ok(Html(page::dashboard(&user)).into_response()),
        None => Ok(Redirect::to("/").into_response()),
    }
}

async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<Response, Error> {
    let Some((id, mut session)) = current_session(&state, &jar)? else {
        return Ok(Redirect::to("/").into_response());
    };
    if let Some(reason) = params.error.as_deref() {
        warn!("Authorization was not granted: {}", reason);
        return Ok(Redirect::to("/").into_response());
    }

    // The state is single use, so it is consumed before talking to Google
    let expected = session.csrf_token.take();
    state.sessions.save(&id, session)?;
    let expected = expected.ok_or(Error::CSRFNotMatch)?;
    let code = UnCheckedCodeResponse::from_params(params)?.exchange_with_code(expected.value())?;

    let token_exe = TokenExe::new(state.http.clone());
    let token_req = TokenRequest::new(&state.config, code);
    let token_res = token_exe.execute(&token_req).await?;

    let userinfo_exe = UserInfoExe::new(state.http.clone());
    let userinfo_req = UserInfoRequest::new(&state.config, token_res.access_token());
    let user = User::from(userinfo_exe.execute(&userinfo_req).await?);
    info!("User logged in: {}", user.email);

    // New id after login so a token planted before login is useless
    state.sessions.destroy(&id)?;
    let new_id = SessionID::new();
    state.sessions.save(&new_id, Session::signed_in(user))?;

    Ok((jar.add(session_cookie(&new_id)), Redirect::to("/dashboard")).into_response())
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse, Error> {
    if let Some((id, session)) = current_session(&state, &jar)? {
        state.sessions.destroy(&id)?;
        if let Some(user) = session.user {
            info!("User logged out: {}", user.email);
        }
    }
    let removal = Cookie::build(SESSION_COOKIE_KEY).path("/").build();
    Ok((jar.remove(removal), Redirect::to("/")))
}
