//! E2E tests for the login page, the OAuth callback, the dashboard and logout.
//!
//! Google is replaced by a local axum server serving the token and userinfo endpoints.
use std::{collections::HashMap, sync::Arc, time::Instant};

use axum::{
    Form, Json, Router,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
    routing::{get, post},
};
use google_login::{
    config::Config,
    handler::{AppState, router},
    session::{MemoryStore, Session, SessionID, SessionStore},
    user::User,
};
use serde_json::json;
use tokio::net::TcpListener;

static CLIENT_ID: &str = "test-client-id";
static CLIENT_SECRET: &str = "test-client-secret";
static ACCESS_TOKEN: &str = "test-access-token";
static GOOD_CODE: &str = "good-code";

struct TestServer {
    addr: String,
    sessions: Arc<MemoryStore>,
    client: reqwest::Client,
}

impl TestServer {
    async fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new())).await
    }

    async fn with_store(sessions: Arc<MemoryStore>) -> Self {
        let google = spawn(fake_google()).await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());

        let config = Config::builder()
            .auth_endpoint("https://accounts.example.com/o/oauth2/auth")
            .client_id(CLIENT_ID)
            .client_secret(CLIENT_SECRET)
            .token_endpoint(&format!("{}/token", google))
            .userinfo_endpoint(&format!("{}/userinfo", google))
            .redirect_uri(&format!("{}/google-callback", addr))
            .build();
        let app = router(AppState::new(config, sessions.clone())).unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            addr,
            sessions,
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            req = req.header("cookie", cookie);
        }
        req.send().await.expect("request succeeds")
    }

    fn insert_session(&self, session: Session) -> String {
        let id = SessionID::new();
        self.sessions.save(&id, session).unwrap();
        format!("session={}", id.value())
    }

    // Opens the login page and returns the session cookie and the authorization link
    async fn start_login(&self) -> (String, url::Url) {
        let res = self.get("/", None).await;
        assert_eq!(res.status(), 200);
        let cookie = session_cookie(&res).expect("session cookie");
        let body = res.text().await.unwrap();
        (cookie, auth_link(&body))
    }
}

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn fake_google() -> Router {
    async fn token(Form(form): Form<HashMap<String, String>>) -> impl IntoResponse {
        let valid = form.get("code").map(String::as_str) == Some(GOOD_CODE)
            && form.get("client_id").map(String::as_str) == Some(CLIENT_ID)
            && form.get("client_secret").map(String::as_str) == Some(CLIENT_SECRET)
            && form.get("grant_type").map(String::as_str) == Some("authorization_code");
        if !valid {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"})));
        }
        (
            StatusCode::OK,
            Json(json!({
                "access_token": ACCESS_TOKEN,
                "expires_in": 3599,
                "token_type": "Bearer",
                "scope": "email profile"
            })),
        )
    }

    async fn userinfo(headers: HeaderMap) -> impl IntoResponse {
        let expected = format!("Bearer {}", ACCESS_TOKEN);
        if headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
            return (StatusCode::UNAUTHORIZED, Json(json!({})));
        }
        (
            StatusCode::OK,
            Json(json!({
                "id": "1234",
                "email": "a@b.com",
                "verified_email": true,
                "name": "A&B",
                "picture": "http://x/y.png"
            })),
        )
    }

    Router::new()
        .route("/token", post(token))
        .route("/userinfo", get(userinfo))
}

fn session_cookie(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

fn auth_link(body: &str) -> url::Url {
    let start = body.find("href=\"").expect("link in login page") + "href=\"".len();
    let end = start + body[start..].find('"').unwrap();
    let href = html_escape::decode_html_entities(&body[start..end]);
    url::Url::parse(&href).unwrap()
}

fn query(url: &url::Url) -> HashMap<String, String> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn location(res: &reqwest::Response) -> &str {
    res.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header")
}

#[tokio::test]
async fn test_dashboard_without_session_redirects_to_login() {
    let server = TestServer::new().await;

    let res = server.get("/dashboard", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    assert!(res.text().await.unwrap().is_empty());

    let res = server.get("/dashboard", Some("session=unknown")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn test_dashboard_session_without_user_redirects() {
    let server = TestServer::new().await;
    let (cookie, _) = server.start_login().await;

    let res = server.get("/dashboard", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_renders_escaped_user() {
    let server = TestServer::new().await;
    let cookie = server.insert_session(Session::signed_in(User {
        name: "A&B".to_string(),
        email: "a@b.com".to_string(),
        picture: "http://x/y.png".to_string(),
    }));

    let res = server.get("/dashboard", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("A&amp;B"));
    assert!(body.contains("a@b.com"));
    assert!(body.contains(r#"src="http://x/y.png""#));
    assert!(body.contains(r#"href="/logout""#));
}

#[tokio::test]
async fn test_dashboard_escapes_script() {
    let server = TestServer::new().await;
    let cookie = server.insert_session(Session::signed_in(User {
        name: "<script>".to_string(),
        ..Default::default()
    }));

    let body = server
        .get("/dashboard", Some(&cookie))
        .await
        .text()
        .await
        .unwrap();
    assert!(!body.contains("<script>"));
    assert!(body.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn test_login_page_links_to_consent_screen() {
    let server = TestServer::new().await;
    let (_, link) = server.start_login().await;

    assert_eq!(link.host_str(), Some("accounts.example.com"));
    assert_eq!(link.path(), "/o/oauth2/auth");
    let params = query(&link);
    assert_eq!(params["scope"], "email profile");
    assert_eq!(params["redirect_uri"], server.url("/google-callback"));
    assert_eq!(params["client_id"], CLIENT_ID);
    assert_eq!(params["response_type"], "code");
    assert!(!params["state"].is_empty());
}

#[tokio::test]
async fn test_login_page_keeps_existing_session() {
    let server = TestServer::new().await;
    let (cookie, first) = server.start_login().await;

    let res = server.get("/", Some(&cookie)).await;
    assert_eq!(session_cookie(&res).as_deref(), Some(cookie.as_str()));
    let second = auth_link(&res.text().await.unwrap());
    assert_ne!(query(&first)["state"], query(&second)["state"]);
}

#[tokio::test]
async fn test_full_login_flow() {
    let server = TestServer::new().await;
    let (cookie, link) = server.start_login().await;
    let state = query(&link)["state"].clone();

    let res = server
        .get(
            &format!("/google-callback?code={}&state={}", GOOD_CODE, state),
            Some(&cookie),
        )
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/dashboard");
    let logged_in = session_cookie(&res).expect("new session cookie");
    assert_ne!(logged_in, cookie);

    let res = server.get("/dashboard", Some(&logged_in)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("Welcome, A&amp;B!"));
    assert!(body.contains("a@b.com"));
    assert!(body.contains(r#"src="http://x/y.png""#));

    // The pre-login session does not carry the user
    let res = server.get("/dashboard", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_callback_rejects_forged_state() {
    let server = TestServer::new().await;
    let (cookie, link) = server.start_login().await;
    let state = query(&link)["state"].clone();

    let res = server
        .get(
            &format!("/google-callback?code={}&state=forged", GOOD_CODE),
            Some(&cookie),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // The state was consumed by the failed attempt
    let res = server
        .get(
            &format!("/google-callback?code={}&state={}", GOOD_CODE, state),
            Some(&cookie),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_without_session_redirects() {
    let server = TestServer::new().await;

    let res = server
        .get("/google-callback?code=good-code&state=any", None)
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn test_callback_consent_denied_redirects() {
    let server = TestServer::new().await;
    let (cookie, _) = server.start_login().await;

    let res = server
        .get("/google-callback?error=access_denied", Some(&cookie))
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn test_callback_missing_code_is_bad_request() {
    let server = TestServer::new().await;
    let (cookie, link) = server.start_login().await;
    let state = query(&link)["state"].clone();

    let res = server
        .get(&format!("/google-callback?state={}", state), Some(&cookie))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_token_failure_is_server_error() {
    let server = TestServer::new().await;
    let (cookie, link) = server.start_login().await;
    let state = query(&link)["state"].clone();

    let res = server
        .get(
            &format!("/google-callback?code=bad-code&state={}", state),
            Some(&cookie),
        )
        .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_logout_clears_user() {
    let server = TestServer::new().await;
    let cookie = server.insert_session(Session::signed_in(User::default()));
    assert_eq!(
        server.get("/dashboard", Some(&cookie)).await.status(),
        StatusCode::OK
    );

    let res = server.get("/logout", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    let removal = res
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .expect("removal cookie");
    assert!(removal.contains("Max-Age=0"));

    let res = server.get("/dashboard", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn test_expired_session_redirects_and_is_purged() {
    let server = TestServer::new().await;
    let cookie = server.insert_session(Session {
        expires_at: Instant::now(),
        ..Session::signed_in(User::default())
    });
    assert_eq!(server.sessions.len().unwrap(), 1);

    let res = server.get("/dashboard", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    assert!(res.text().await.unwrap().is_empty());
    assert!(server.sessions.is_empty().unwrap());
}

#[tokio::test]
async fn test_anonymous_login_pages_stay_bounded() {
    let server = TestServer::with_store(Arc::new(MemoryStore::with_limit(10))).await;
    let signed_in = server.insert_session(Session::signed_in(User::default()));

    for _ in 0..50 {
        assert_eq!(server.get("/", None).await.status(), StatusCode::OK);
    }

    assert_eq!(server.sessions.len().unwrap(), 10);
    // Pending logins are evicted before signed-in sessions
    assert_eq!(
        server.get("/dashboard", Some(&signed_in)).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_login_page_reuses_anonymous_session() {
    let server = TestServer::new().await;
    let (cookie, _) = server.start_login().await;

    for _ in 0..5 {
        server.get("/", Some(&cookie)).await;
    }
    assert_eq!(server.sessions.len().unwrap(), 1);
}
