use std::sync::Arc;

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use fundboard::{
    contact::ContactLog,
    session::SessionStore,
    storage::{MemoryBackend, ProjectBackend, ProjectStore},
    web::{build_router, AppState},
    Config,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const EDIT_AI: &str = "/admin/projects/ai-education/edit";

struct TestApp {
    router: Router,
    backend: Arc<MemoryBackend>,
    state: AppState,
    _dir: TempDir,
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl Reply {
    fn location(&self) -> &str {
        self.headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    fn cookie(&self) -> Option<String> {
        self.headers
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    fn flash_messages(&self) -> Vec<String> {
        self.body["flashes"]
            .as_array()
            .map(|flashes| {
                flashes
                    .iter()
                    .filter_map(|f| f["message"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn app() -> TestApp {
    let dir = TempDir::new().expect("tempdir should be created");
    let backend = Arc::new(MemoryBackend::new());
    let store = ProjectStore::open(backend.clone()).expect("store should open");
    let contacts = ContactLog::new(dir.path().join("contact_submissions.csv"));
    let state = AppState::new(store, contacts, &Config::default());

    TestApp {
        router: build_router(state.clone()),
        backend,
        state,
        _dir: dir,
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    form: Option<&str>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let body = match form {
        Some(form) => {
            builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
            Body::from(form.to_string())
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("request should build");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("response expected");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be valid JSON")
    };
    Reply {
        status,
        headers,
        body,
    }
}

async fn login(app: &TestApp) -> String {
    let reply = send(
        app,
        Method::POST,
        "/admin/login",
        None,
        Some("email=admin%40example.com&password=changeme"),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    let cookie = reply.cookie().expect("login should set a session cookie");

    // Land on the admin page so the welcome flash is consumed.
    let landing = send(app, Method::GET, reply.location(), Some(&cookie), None).await;
    assert_eq!(landing.flash_messages(), vec!["Welcome, admin."]);
    cookie
}

#[tokio::test]
async fn dashboard_shows_progress_and_links() {
    let app = app();

    let reply = send(&app, Method::GET, "/dashboard", None, None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["is_admin"], false);
    assert_eq!(reply.body["organization"]["name"], "Providence Foundation");
    let projects = reply.body["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 4);
    assert_eq!(projects[0]["slug"], "ai-education");
    assert_eq!(projects[0]["percent"], 37);
    assert_eq!(
        projects[0]["donate_url"],
        "https://YOUR_GIVEBUTTER_OR_STRIPE_LINK"
    );
    assert!(reply.cookie().is_none());
}

#[tokio::test]
async fn anonymous_edit_redirects_to_login_with_next() {
    let app = app();

    let reply = send(&app, Method::GET, EDIT_AI, None, None).await;

    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(
        reply.location(),
        "/admin/login?next=%2Fadmin%2Fprojects%2Fai-education%2Fedit"
    );
}

#[tokio::test]
async fn wrong_password_keeps_session_unprivileged() {
    let app = app();

    let reply = send(
        &app,
        Method::POST,
        "/admin/login?next=%2Fadmin%2Fprojects%2Fai-education%2Fedit",
        None,
        Some("email=admin%40example.com&password=wrong"),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(
        reply.location(),
        "/admin/login?next=%2Fadmin%2Fprojects%2Fai-education%2Fedit"
    );
    let cookie = reply.cookie().expect("flash should create a session");

    let reply = send(&app, Method::GET, EDIT_AI, Some(&cookie), None).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert!(reply.location().starts_with("/admin/login?next="));

    let reply = send(&app, Method::GET, "/admin/login", Some(&cookie), None).await;
    assert_eq!(reply.flash_messages(), vec!["Invalid credentials."]);
}

#[tokio::test]
async fn login_returns_to_requested_page() {
    let app = app();

    let reply = send(
        &app,
        Method::POST,
        "/admin/login?next=%2Fadmin%2Fprojects%2Fai-education%2Fedit",
        None,
        Some("email=ADMIN%40Example.com&password=changeme"),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), EDIT_AI);
    let cookie = reply.cookie().unwrap();

    let reply = send(&app, Method::GET, EDIT_AI, Some(&cookie), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["project"]["slug"], "ai-education");
    assert_eq!(reply.body["project"]["raised"], 18_250);
    assert_eq!(reply.body["donation_keys"].as_array().unwrap().len(), 6);
    assert_eq!(reply.flash_messages(), vec!["Welcome, admin."]);
}

#[tokio::test]
async fn login_ignores_unissued_token() {
    let app = app();
    let planted = "fundboard_session=11111111-1111-4111-8111-111111111111";

    let reply = send(
        &app,
        Method::POST,
        "/admin/login",
        Some(planted),
        Some("email=admin%40example.com&password=changeme"),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    let cookie = reply.cookie().expect("login should issue its own token");
    assert_ne!(cookie, planted);

    let reply = send(&app, Method::GET, "/admin", Some(planted), None).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), "/admin/login?next=%2Fadmin");

    let reply = send(&app, Method::GET, "/admin", Some(&cookie), None).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn login_replaces_existing_token() {
    let app = app();

    // A token issued to someone else before the admin logs in.
    let reply = send(
        &app,
        Method::POST,
        "/admin/login",
        None,
        Some("email=admin%40example.com&password=wrong"),
    )
    .await;
    let issued = reply.cookie().unwrap();

    let reply = send(
        &app,
        Method::POST,
        "/admin/login",
        Some(&issued),
        Some("email=admin%40example.com&password=changeme"),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    let renewed = reply.cookie().expect("login should renew the token");
    assert_ne!(renewed, issued);

    let reply = send(&app, Method::GET, "/admin", Some(&issued), None).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);

    let reply = send(&app, Method::GET, "/admin", Some(&renewed), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.flash_messages().last().map(String::as_str),
        Some("Welcome, admin.")
    );
}

#[tokio::test]
async fn anonymous_sessions_stay_bounded() {
    let mut app = app();
    app.state.sessions = Arc::new(SessionStore::with_anonymous_limit(16));
    app.router = build_router(app.state.clone());
    let admin = login(&app).await;

    for _ in 0..100 {
        let reply = send(
            &app,
            Method::POST,
            "/admin/login",
            None,
            Some("email=admin%40example.com&password=wrong"),
        )
        .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
    }

    // Sixteen anonymous sessions plus the admin's.
    assert_eq!(app.state.sessions.len().unwrap(), 17);
    let reply = send(&app, Method::GET, "/admin", Some(&admin), None).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn offsite_next_is_ignored() {
    let app = app();

    let reply = send(
        &app,
        Method::POST,
        "/admin/login?next=https%3A%2F%2Fevil.example",
        None,
        Some("email=admin%40example.com&password=changeme"),
    )
    .await;
    assert_eq!(reply.location(), "/admin");
}

#[tokio::test]
async fn invalid_numbers_leave_record_unchanged() {
    let app = app();
    let cookie = login(&app).await;
    let saves = app.backend.save_count();

    let reply = send(
        &app,
        Method::POST,
        EDIT_AI,
        Some(&cookie),
        Some("title=Changed&target=abc&raised=100"),
    )
    .await;

    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), EDIT_AI);
    assert_eq!(app.backend.save_count(), saves);

    let project = app.state.store.find("ai-education").unwrap();
    assert_eq!(project.title, "Personalized Education with AI");
    assert_eq!(project.target, 50_000);

    let reply = send(&app, Method::GET, EDIT_AI, Some(&cookie), None).await;
    assert_eq!(
        reply.flash_messages(),
        vec!["Target and Raised must be numbers."]
    );
}

#[tokio::test]
async fn valid_edit_is_persisted() {
    let app = app();
    let cookie = login(&app).await;

    let reply = send(
        &app,
        Method::POST,
        EDIT_AI,
        Some(&cookie),
        Some("title=AI+Tutors&target=60000.9&raised=30000&donation_key=&donation_url=https%3A%2F%2Fgive.example%2Fai"),
    )
    .await;

    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), "/admin");

    let persisted = app.backend.load().unwrap();
    let project = persisted.iter().find(|p| p.slug == "ai-education").unwrap();
    assert_eq!(project.title, "AI Tutors");
    assert_eq!(project.target, 60_000);
    assert_eq!(project.raised, 30_000);
    assert_eq!(project.donation_key.as_deref(), Some("pilots"));

    let reply = send(&app, Method::GET, "/dashboard", None, None).await;
    assert_eq!(reply.body["projects"][0]["percent"], 50);
    assert_eq!(reply.body["projects"][0]["donate_url"], "https://give.example/ai");
}

#[tokio::test]
async fn unknown_slug_is_not_found_without_save() {
    let app = app();
    let cookie = login(&app).await;
    let saves = app.backend.save_count();

    let reply = send(
        &app,
        Method::POST,
        "/admin/projects/no-such-project/edit",
        Some(&cookie),
        Some("raised=10"),
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(app.backend.save_count(), saves);

    let reply = send(
        &app,
        Method::GET,
        "/admin/projects/no-such-project/edit",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logout_drops_privilege() {
    let app = app();
    let cookie = login(&app).await;

    let reply = send(&app, Method::GET, "/admin", Some(&cookie), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["admin"], "admin@example.com");
    assert_eq!(reply.body["projects"].as_array().unwrap().len(), 4);

    let reply = send(&app, Method::GET, "/admin/logout", Some(&cookie), None).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), "/");

    let reply = send(&app, Method::GET, "/admin", Some(&cookie), None).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), "/admin/login?next=%2Fadmin");
}

#[tokio::test]
async fn contact_form_validates_and_records() {
    let app = app();

    let reply = send(
        &app,
        Method::POST,
        "/contact",
        None,
        Some("name=Ana&email=&message=Hi"),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), "/contact");
    let cookie = reply.cookie().unwrap();
    assert!(!app.state.contacts.path().exists());

    let reply = send(&app, Method::GET, "/contact", Some(&cookie), None).await;
    assert_eq!(
        reply.flash_messages(),
        vec!["Please fill out name, email, and message."]
    );

    let reply = send(
        &app,
        Method::POST,
        "/contact",
        Some(&cookie),
        Some("name=Ana&email=ana%40example.org&message=Hello+there"),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);

    let text = std::fs::read_to_string(app.state.contacts.path()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("timestamp,name,email,message"));
    assert!(lines.next().unwrap().ends_with(",Ana,ana@example.org,Hello there"));
}

#[tokio::test]
async fn health_is_ok() {
    let app = app();
    let reply = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "ok");
}
