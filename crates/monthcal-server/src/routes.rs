//! HTTP routes.
//!
//! | Route       | Behaviour                                                   |
//! |-------------|-------------------------------------------------------------|
//! | `/`         | Home page with the login link                               |
//! | `/auth`     | Issue OAuth state, redirect to the consent page             |
//! | `/callback` | Verify state, exchange code, store token, go to `/events`   |
//! | `/events`   | List next month's events or send the user back to `/`       |

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use chrono::Utc;
use monthcal_providers::google::{GoogleCalendarClient, OAuthClient, OAuthConfig, StateToken};
use monthcal_providers::{AuthError, AuthenticatedFetcher, SessionStore};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::render;
use crate::session::CookieSessionStore;

/// Shared, read-only state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    oauth: OAuthClient,
    fetcher: AuthenticatedFetcher,
    secure_cookies: bool,
}

impl AppState {
    /// Creates the state from its parts. Cookies are `Secure` by default.
    pub fn new(oauth: OAuthClient, fetcher: AuthenticatedFetcher) -> Self {
        Self {
            oauth,
            fetcher,
            secure_cookies: true,
        }
    }

    /// Builder: set cookie `Secure` flag.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Loads the credentials and builds the Google clients.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Credentials`](crate::ServerError::Credentials)
    /// if the credentials file is missing or invalid.
    pub fn from_config(config: &ServerConfig, cancel: CancellationToken) -> ServerResult<Self> {
        let timeout = config.request_timeout();
        let oauth_config = Arc::new(OAuthConfig::from_file(&config.credentials_path)?);
        info!(
            client_id = %oauth_config.client_id,
            redirect_uri = %oauth_config.redirect_uri,
            "loaded OAuth client credentials"
        );

        let oauth = OAuthClient::new(oauth_config, timeout)?;
        let calendar = GoogleCalendarClient::new(timeout)?;
        let fetcher = AuthenticatedFetcher::new(Arc::new(calendar))
            .with_calendar_id(&config.calendar_id)
            .with_timeout(timeout)
            .with_cancellation(cancel);

        Ok(Self::new(oauth, fetcher).with_secure_cookies(config.secure_cookies))
    }

    fn session(&self, headers: &HeaderMap) -> CookieSessionStore {
        CookieSessionStore::from_headers(headers, self.secure_cookies)
    }
}

/// Builds the application router.
///
/// A panicking handler answers 500 and the connection stays up.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/auth", get(auth))
        .route("/callback", get(callback))
        .route("/events", get(events))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home() -> Html<String> {
    Html(render::home_page())
}

async fn auth(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut session = state.session(&headers);
    let oauth_state = StateToken::generate();
    session.set_state(&oauth_state);

    let url = state.oauth.config().build_authorization_url(&oauth_state);
    session.apply(Redirect::temporary(url.as_str()).into_response())
}

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let mut session = state.session(&headers);
    let issued = session.take_state();

    if let Some(ref reason) = params.error {
        warn!("authorization denied by provider: {}", reason);
        return session.apply(Redirect::to("/").into_response());
    }

    let Some(code) = params.code.filter(|c| !c.trim().is_empty()) else {
        info!("callback without authorization code");
        return session.apply(Redirect::to("/").into_response());
    };

    let received = params.state.as_deref().unwrap_or_default();
    let verified = match issued {
        Some(issued) => issued.verify(received),
        None => Err(AuthError::StateMismatch),
    };
    if let Err(e) = verified {
        warn!(code = %e.code(), "rejecting callback: {}", e);
        let page = render::error_page(
            "Login failed",
            "This login link is invalid or has expired.",
            ("/auth", "Start again"),
        );
        return session.apply((StatusCode::BAD_REQUEST, Html(page)).into_response());
    }

    match state.oauth.exchange_code_for_token(&code).await {
        Ok(token) => {
            session.store(&token);
            info!("login complete");
            session.apply(Redirect::to("/events").into_response())
        }
        Err(e) => {
            error!(code = %e.code(), "token exchange failed: {}", e);
            let page = render::error_page(
                "Login failed",
                "Could not complete the login. Please log in again.",
                ("/auth", "Log in again"),
            );
            session.apply((StatusCode::INTERNAL_SERVER_ERROR, Html(page)).into_response())
        }
    }
}

async fn events(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut session = state.session(&headers);
    let now = Utc::now();

    let token = match session.load() {
        Some(token) if token.is_usable_at(now) => token,
        Some(_) => {
            info!("session token expired");
            session.clear();
            return session.apply(Redirect::to("/").into_response());
        }
        None => return Redirect::to("/").into_response(),
    };

    match state.fetcher.upcoming_view(&token, now).await {
        Ok(view) => Html(render::events_page(&view)).into_response(),
        Err(e) if e.code().requires_login() => {
            info!("provider rejected session token: {}", e.message());
            session.clear();
            session.apply(Redirect::to("/").into_response())
        }
        Err(e) => {
            error!(code = %e.code(), "failed to load events: {}", e);
            let page = render::error_page(
                "Calendar unavailable",
                "Could not load your events. Please try again.",
                ("/events", "Try again"),
            );
            (StatusCode::BAD_GATEWAY, Html(page)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{STATE_COOKIE, TOKEN_COOKIE, encode_token};
    use axum::body::Body;
    use axum::http::{Request, header};
    use chrono::{DateTime, Duration as ChronoDuration};
    use monthcal_providers::{BoxFuture, CalendarService, EventQuery, FetchError, RawEvent, Token};
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;
    use url::Url;

    enum Reply {
        Events(Vec<RawEvent>),
        Unauthorized,
        Unavailable,
        Panic,
    }

    struct MockCalendar {
        reply: Reply,
        calls: Mutex<usize>,
    }

    impl MockCalendar {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl CalendarService for MockCalendar {
        fn name(&self) -> &str {
            "mock"
        }

        fn list_events<'a>(
            &'a self,
            _token: &'a Token,
            _query: EventQuery,
        ) -> BoxFuture<'a, Result<Vec<RawEvent>, FetchError>> {
            *self.calls.lock().unwrap() += 1;
            Box::pin(async move {
                match &self.reply {
                    Reply::Events(events) => Ok(events.clone()),
                    Reply::Unauthorized => Err(FetchError::unauthenticated("401")),
                    Reply::Unavailable => Err(FetchError::service("API error (503)")),
                    Reply::Panic => panic!("calendar service blew up"),
                }
            })
        }
    }

    fn oauth_client(token_endpoint: &str) -> OAuthClient {
        let config = OAuthConfig::new(
            "client.apps.googleusercontent.com",
            "secret",
            "http://localhost:8080/callback",
        )
        .unwrap()
        .with_token_endpoint(Url::parse(token_endpoint).unwrap());
        OAuthClient::new(Arc::new(config), Duration::from_secs(5)).unwrap()
    }

    fn app_with(calendar: Arc<MockCalendar>, token_endpoint: &str) -> Router {
        let state = AppState::new(
            oauth_client(token_endpoint),
            AuthenticatedFetcher::new(calendar),
        )
        .with_secure_cookies(false);
        router(state)
    }

    fn app(calendar: Arc<MockCalendar>) -> Router {
        app_with(calendar, "http://127.0.0.1:9/token")
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn token_cookie(expiry: DateTime<Utc>) -> String {
        format!(
            "{}={}",
            TOKEN_COOKIE,
            encode_token(&Token::new("ya29.session", expiry))
        )
    }

    mod login {
        use super::*;

        #[tokio::test]
        async fn home_page() {
            let response = app(MockCalendar::new(Reply::Events(vec![])))
                .oneshot(get("/", None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(body_text(response).await.contains("/auth"));
        }

        #[tokio::test]
        async fn auth_redirects_with_state_cookie() {
            let response = app(MockCalendar::new(Reply::Events(vec![])))
                .oneshot(get("/auth", None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

            let url = Url::parse(location(&response)).unwrap();
            assert_eq!(url.host_str(), Some("accounts.google.com"));
            let state = url
                .query_pairs()
                .find(|(k, _)| k == "state")
                .map(|(_, v)| v.into_owned())
                .unwrap();

            let cookies = set_cookies(&response);
            assert_eq!(cookies.len(), 1);
            assert!(cookies[0].starts_with(&format!("{}={}", STATE_COOKIE, state)));
        }

        #[tokio::test]
        async fn missing_code_goes_home() {
            let response = app(MockCalendar::new(Reply::Events(vec![])))
                .oneshot(get("/callback?state=abc", Some("oauth_state=abc")))
                .await
                .unwrap();
            assert!(response.status().is_redirection());
            assert_eq!(location(&response), "/");
        }

        #[tokio::test]
        async fn provider_error_goes_home() {
            let response = app(MockCalendar::new(Reply::Events(vec![])))
                .oneshot(get(
                    "/callback?error=access_denied&state=abc",
                    Some("oauth_state=abc"),
                ))
                .await
                .unwrap();
            assert!(response.status().is_redirection());
            assert_eq!(location(&response), "/");
        }

        #[tokio::test]
        async fn state_mismatch_is_bad_request() {
            let response = app(MockCalendar::new(Reply::Events(vec![])))
                .oneshot(get(
                    "/callback?code=4/abc&state=forged",
                    Some("oauth_state=issued"),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(
                set_cookies(&response)
                    .iter()
                    .all(|c| !c.starts_with("calendar_token="))
            );
        }

        #[tokio::test]
        async fn missing_state_cookie_is_bad_request() {
            let response = app(MockCalendar::new(Reply::Events(vec![])))
                .oneshot(get("/callback?code=4/abc&state=abc", None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        #[tokio::test]
        async fn exchange_failure_is_server_error() {
            // Nothing listens on the discard port, so the exchange fails.
            let response = app(MockCalendar::new(Reply::Events(vec![])))
                .oneshot(get("/callback?code=4/abc&state=abc", Some("oauth_state=abc")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body_text(response).await.contains("log in again"));
        }

        #[tokio::test]
        async fn successful_exchange_stores_token() {
            let token_server = Router::new().route(
                "/token",
                axum::routing::post(|| async {
                    (
                        [(header::CONTENT_TYPE, "application/json")],
                        r#"{"access_token": "ya29.fresh", "expires_in": 3599, "token_type": "Bearer"}"#,
                    )
                }),
            );
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, token_server).await.unwrap();
            });

            let response = app_with(
                MockCalendar::new(Reply::Events(vec![])),
                &format!("http://{}/token", addr),
            )
            .oneshot(get("/callback?code=4/abc&state=abc", Some("oauth_state=abc")))
            .await
            .unwrap();

            assert!(response.status().is_redirection());
            assert_eq!(location(&response), "/events");
            let cookies = set_cookies(&response);
            assert!(cookies.iter().any(|c| c.starts_with("oauth_state=;")));
            let token = cookies
                .iter()
                .find(|c| c.starts_with("calendar_token="))
                .unwrap();
            assert!(token.contains(".ya29.fresh"));
            assert!(token.contains("HttpOnly"));
            assert!(token.contains("SameSite=Strict"));
        }
    }

    mod events {
        use super::*;

        #[tokio::test]
        async fn no_token_goes_home() {
            let calendar = MockCalendar::new(Reply::Events(vec![]));
            let response = app(calendar.clone())
                .oneshot(get("/events", None))
                .await
                .unwrap();
            assert!(response.status().is_redirection());
            assert_eq!(location(&response), "/");
            assert_eq!(calendar.calls(), 0);
        }

        #[tokio::test]
        async fn expired_token_goes_home() {
            let calendar = MockCalendar::new(Reply::Events(vec![]));
            let cookie = token_cookie(Utc::now() - ChronoDuration::minutes(5));
            let response = app(calendar.clone())
                .oneshot(get("/events", Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(location(&response), "/");
            assert!(
                set_cookies(&response)
                    .iter()
                    .any(|c| c.starts_with("calendar_token=;"))
            );
            assert_eq!(calendar.calls(), 0);
        }

        #[tokio::test]
        async fn renders_events() {
            let calendar = MockCalendar::new(Reply::Events(vec![
                RawEvent::new("2024-03-15T09:30:00Z", "Standup"),
                RawEvent::new("2024-03-20", "Company Holiday"),
            ]));
            let cookie = token_cookie(Utc::now() + ChronoDuration::hours(1));
            let response = app(calendar.clone())
                .oneshot(get("/events", Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let html = body_text(response).await;
            assert!(html.contains("<td>2024/03/15 09:30</td><td>Standup</td>"));
            assert!(html.contains("<td>2024/03/20</td><td>Company Holiday</td>"));
            assert_eq!(calendar.calls(), 1);
        }

        #[tokio::test]
        async fn empty_month() {
            let cookie = token_cookie(Utc::now() + ChronoDuration::hours(1));
            let response = app(MockCalendar::new(Reply::Events(vec![])))
                .oneshot(get("/events", Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(body_text(response).await.contains("No upcoming events found."));
        }

        #[tokio::test]
        async fn rejected_token_goes_home() {
            let cookie = token_cookie(Utc::now() + ChronoDuration::hours(1));
            let response = app(MockCalendar::new(Reply::Unauthorized))
                .oneshot(get("/events", Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(location(&response), "/");
            assert!(
                set_cookies(&response)
                    .iter()
                    .any(|c| c.starts_with("calendar_token=;"))
            );
        }

        #[tokio::test]
        async fn service_error_is_bad_gateway() {
            let cookie = token_cookie(Utc::now() + ChronoDuration::hours(1));
            let response = app(MockCalendar::new(Reply::Unavailable))
                .oneshot(get("/events", Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
            assert!(body_text(response).await.contains("try again"));
        }

        #[tokio::test]
        async fn handler_panic_is_server_error() {
            let cookie = token_cookie(Utc::now() + ChronoDuration::hours(1));
            let app = app(MockCalendar::new(Reply::Panic));

            let response = app
                .clone()
                .oneshot(get("/events", Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

            let response = app.oneshot(get("/", None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn missing_credentials_fail_startup() {
        let config = ServerConfig::default().with_credentials_path("/nonexistent/creds.json");
        let err = AppState::from_config(&config, CancellationToken::new()).unwrap_err();
        assert!(matches!(err, crate::ServerError::Credentials(_)));
    }

    #[test]
    fn builds_state_from_credentials_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"web": {{"client_id": "id", "client_secret": "s", "redirect_uris": ["http://localhost:8080/callback"]}}}}"#
        )
        .unwrap();

        let config = ServerConfig::default()
            .with_credentials_path(file.path())
            .with_secure_cookies(false);
        let state = AppState::from_config(&config, CancellationToken::new()).unwrap();
        assert!(!state.secure_cookies);
        assert_eq!(state.fetcher.calendar_id(), "primary");
    }
}
