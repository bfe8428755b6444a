//! Session cookie handling.
//!
//! The cookie carries only an opaque token; the session itself stays in the
//! server's [`SessionStore`](crate::session::SessionStore).

use axum::{
    extract::FromRequestParts,
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderValue,
    },
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use super::state::AppState;
use crate::error::{Error, Result};
use crate::session::{Session, SessionStore};

/// Name of the session cookie.
pub const COOKIE_NAME: &str = "fundboard_session";

/// The current visitor's session, extracted from the request cookie.
///
/// Handlers that change the session must hand it back with
/// [`SessionContext::finish`] so the change is stored.
#[derive(Debug)]
pub struct SessionContext {
    token: Uuid,
    fresh: bool,
    /// The session value.
    pub session: Session,
}

impl SessionContext {
    /// Store the session and attach the cookie if the visitor has no valid
    /// token yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store lock is poisoned.
    pub fn finish(self, state: &AppState, response: impl IntoResponse) -> Result<Response> {
        let keep = self.session != Session::default();
        state.sessions.save(self.token, self.session)?;

        let mut response = response.into_response();
        if self.fresh && keep {
            let cookie = format!("{COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax", self.token);
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| Error::internal(format!("bad cookie header: {e}")))?;
            response.headers_mut().append(SET_COOKIE, value);
        }
        Ok(response)
    }

    /// Move the session to a newly minted token and drop the old one.
    ///
    /// Called when privilege changes, so a token known before login is
    /// worthless after it. The new cookie is sent by [`finish`](Self::finish).
    ///
    /// # Errors
    ///
    /// Returns an error if the session store lock is poisoned.
    pub fn renew_token(&mut self, state: &AppState) -> Result<()> {
        state.sessions.remove(&self.token)?;
        self.token = SessionStore::new_token();
        self.fresh = true;
        Ok(())
    }
}

impl FromRequestParts<AppState> for SessionContext {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(token_from_cookie_header);

        // Tokens the store does not hold are never adopted.
        if let Some(token) = token {
            if let Some(session) = state.sessions.get(&token)? {
                return Ok(Self {
                    token,
                    fresh: false,
                    session,
                });
            }
        }

        Ok(Self {
            token: SessionStore::new_token(),
            fresh: true,
            session: Session::new(),
        })
    }
}

/// Find our token in a `Cookie` header value.
fn token_from_cookie_header(header: &str) -> Option<Uuid> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}
