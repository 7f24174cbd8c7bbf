#![allow(dead_code)]

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use snippetbox::application::{Application, SessionOptions};
use snippetbox::repository::memory::{
    InMemorySessionStore, InMemorySnippetRepository, InMemoryUserRepository,
};
use snippetbox::service::{SnippetService, UserService};

pub const PASSWORD: &str = "pa55word!";

pub struct Fixture {
    pub users: InMemoryUserRepository,
    pub snippets: InMemorySnippetRepository,
    pub sessions: InMemorySessionStore,
    pub state: Application,
    pub session: SessionOptions,
}

pub fn fixture() -> Fixture {
    let users = InMemoryUserRepository::default();
    let snippets = InMemorySnippetRepository::default();
    let state = Application::new(
        UserService::new(Arc::new(users.clone())).with_password_cost(4),
        SnippetService::new(Arc::new(snippets.clone())),
    );
    Fixture {
        users,
        snippets,
        sessions: InMemorySessionStore::default(),
        state,
        session: SessionOptions::new(None, false, 12),
    }
}

static CSRF_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="csrf_token" value="([^"]+)""#).unwrap());

/// Token embedded in the first form of a rendered page.
pub fn csrf_token(html: &str) -> String {
    CSRF_FIELD
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .expect("page carries a csrf token")
}

/// Initialises the full application around a fixture.
macro_rules! spawn_app {
    ($fixture:expr) => {
        actix_web::test::init_service(snippetbox::application::build_app(
            $fixture.state.clone(),
            $fixture.session.clone(),
            $fixture.sessions.clone(),
        ))
        .await
    };
}

/// Sends a request, carrying the session cookie in `$jar` across calls.
macro_rules! send {
    ($app:expr, $jar:expr, $req:expr) => {{
        let mut req: actix_web::test::TestRequest = $req;
        if let Some(cookie) = $jar.clone() {
            req = req.cookie(cookie);
        }
        let resp = actix_web::test::call_service(&$app, req.to_request()).await;
        if let Some(cookie) = resp.response().cookies().find(|c| c.name() == "session") {
            $jar = Some(cookie.into_owned());
        }
        resp
    }};
}

/// Reads a response body as text.
macro_rules! body_text {
    ($resp:expr) => {
        String::from_utf8(actix_web::test::read_body($resp).await.to_vec()).unwrap()
    };
}

/// Signs up and logs in `$email`, leaving the authenticated session in
/// `$jar`. Evaluates to the csrf token of that session.
macro_rules! sign_in {
    ($app:expr, $jar:expr, $email:expr) => {{
        let resp = send!($app, $jar, actix_web::test::TestRequest::get().uri("/user/signup"));
        let token = common::csrf_token(&body_text!(resp));

        let resp = send!(
            $app,
            $jar,
            actix_web::test::TestRequest::post().uri("/user/signup").set_form([
                ("name", "Alice"),
                ("email", $email),
                ("password", common::PASSWORD),
                ("csrf_token", token.as_str()),
            ])
        );
        assert_eq!(resp.status(), actix_web::http::StatusCode::SEE_OTHER);

        let resp = send!(
            $app,
            $jar,
            actix_web::test::TestRequest::post().uri("/user/login").set_form([
                ("email", $email),
                ("password", common::PASSWORD),
                ("csrf_token", token.as_str()),
            ])
        );
        assert_eq!(resp.status(), actix_web::http::StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get("location").unwrap(), "/");
        token
    }};
}
