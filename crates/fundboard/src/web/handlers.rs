//! HTTP handlers.
//!
//! Pages answer with JSON view models; form posts answer with `303 See Other`
//! and leave a flash message in the session, like a classic server-rendered
//! site.

use axum::{
    extract::{Path, Query, State},
    http::Uri,
    response::{Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::login_url;
use super::session::SessionContext;
use super::state::AppState;
use crate::config::OrganizationConfig;
use crate::contact::ContactForm;
use crate::dashboard::{project_views, ProjectView};
use crate::edit::{apply_update, form_view, EditForm, EditView};
use crate::error::{Error, Result};
use crate::guard::{post_login_destination, ADMIN_HOME};
use crate::project::Project;
use crate::session::{Flash, FlashLevel};

/// Path of the public contact page.
pub const CONTACT_PATH: &str = "/contact";

/// Optional post-login destination.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    /// Path to return to after logging in.
    pub next: Option<String>,
}

/// Login form fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    /// Admin identifier.
    pub email: String,
    /// Admin password.
    pub password: String,
}

#[derive(Debug, Serialize)]
struct DashboardPage {
    organization: OrganizationConfig,
    projects: Vec<ProjectView>,
    is_admin: bool,
    flashes: Vec<Flash>,
}

#[derive(Debug, Serialize)]
struct FlashPage {
    flashes: Vec<Flash>,
}

#[derive(Debug, Serialize)]
struct LoginPage {
    next: Option<String>,
    flashes: Vec<Flash>,
}

#[derive(Debug, Serialize)]
struct AdminPage {
    admin: Option<String>,
    projects: Vec<Project>,
    flashes: Vec<Flash>,
}

#[derive(Debug, Serialize)]
struct EditPage {
    #[serde(flatten)]
    view: EditView,
    flashes: Vec<Flash>,
}

/// Path of the edit page for `slug`.
#[must_use]
pub fn edit_path(slug: &str) -> String {
    format!("/admin/projects/{slug}/edit")
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Public fundraising dashboard.
pub async fn dashboard(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response> {
    let page = DashboardPage {
        organization: state.organization.as_ref().clone(),
        projects: project_views(&state.store, &state.links)?,
        is_admin: state.guard.is_admin(&ctx.session),
        flashes: ctx.session.take_flashes(),
    };
    ctx.finish(&state, Json(page))
}

/// Contact page.
pub async fn contact_page(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response> {
    let page = FlashPage {
        flashes: ctx.session.take_flashes(),
    };
    ctx.finish(&state, Json(page))
}

/// Contact form submission.
pub async fn submit_contact(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    Form(form): Form<ContactForm>,
) -> Result<Response> {
    match state.contacts.submit(&form) {
        Ok(_) => ctx.session.flash(
            FlashLevel::Success,
            "Thanks for your message. We'll get back to you soon.",
        ),
        Err(Error::Validation { message }) => ctx.session.flash(FlashLevel::Error, message),
        Err(err) => return Err(err),
    }
    ctx.finish(&state, Redirect::to(CONTACT_PATH))
}

/// Login page.
pub async fn login_page(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    Query(query): Query<NextQuery>,
) -> Result<Response> {
    let page = LoginPage {
        next: query.next,
        flashes: ctx.session.take_flashes(),
    };
    ctx.finish(&state, Json(page))
}

/// Login form submission.
pub async fn login(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match state.guard.login(&mut ctx.session, &form.email, &form.password) {
        Ok(()) => {
            ctx.renew_token(&state)?;
            ctx.session.flash(FlashLevel::Success, "Welcome, admin.");
            let destination = post_login_destination(query.next.as_deref());
            ctx.finish(&state, Redirect::to(destination))
        }
        Err(Error::InvalidCredentials) => {
            ctx.session.flash(FlashLevel::Error, "Invalid credentials.");
            ctx.finish(&state, Redirect::to(&login_url(query.next.as_deref())))
        }
        Err(err) => Err(err),
    }
}

/// Log out and return to the home page.
pub async fn logout(State(state): State<AppState>, mut ctx: SessionContext) -> Result<Response> {
    state.guard.logout(&mut ctx.session);
    ctx.session.flash(FlashLevel::Success, "Signed out.");
    ctx.finish(&state, Redirect::to("/"))
}

/// Admin overview of every project.
pub async fn admin_home(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    uri: Uri,
) -> Result<Response> {
    state.guard.require_privileged(&ctx.session, uri.path())?;

    let page = AdminPage {
        admin: ctx.session.admin_identifier().map(str::to_string),
        projects: state.store.all()?,
        flashes: ctx.session.take_flashes(),
    };
    ctx.finish(&state, Json(page))
}

/// Edit form for one project.
pub async fn edit_page(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    uri: Uri,
    Path(slug): Path<String>,
) -> Result<Response> {
    state.guard.require_privileged(&ctx.session, uri.path())?;

    let page = EditPage {
        view: form_view(&state.store, &state.links, &slug)?,
        flashes: ctx.session.take_flashes(),
    };
    ctx.finish(&state, Json(page))
}

/// Edit form submission for one project.
pub async fn edit_project(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    uri: Uri,
    Path(slug): Path<String>,
    Form(form): Form<EditForm>,
) -> Result<Response> {
    state.guard.require_privileged(&ctx.session, uri.path())?;

    match apply_update(&state.store, &slug, &form) {
        Ok(_) => {
            ctx.session.flash(FlashLevel::Success, "Project updated.");
            ctx.finish(&state, Redirect::to(ADMIN_HOME))
        }
        Err(Error::Validation { message }) => {
            ctx.session.flash(FlashLevel::Error, message);
            ctx.finish(&state, Redirect::to(&edit_path(&slug)))
        }
        Err(err) => Err(err),
    }
}
