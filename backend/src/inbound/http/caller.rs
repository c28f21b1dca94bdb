//! Caller identity extracted from trusted gateway headers.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user as `X-User-Id`, `X-Hierarchy-Level` and `X-Role`. A missing user id
//! or an unparseable hierarchy level is answered with `401 Unauthorized`.

use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::{CallerContext, Error, HierarchyLevel, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const HIERARCHY_LEVEL_HEADER: &str = "x-hierarchy-level";
pub const ROLE_HEADER: &str = "x-role";

/// Extractor wrapping the domain caller context.
#[derive(Debug, Clone)]
pub struct Caller(CallerContext);

impl Caller {
    pub fn into_inner(self) -> CallerContext {
        self.0
    }

    pub fn context(&self) -> &CallerContext {
        &self.0
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, Error> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|text| Some(text.trim()).filter(|text| !text.is_empty()))
            .map_err(|_| Error::unauthorized(format!("{name} header is not valid text"))),
    }
}

pub(crate) fn caller_from_headers(headers: &HeaderMap) -> Result<CallerContext, Error> {
    let user_id = header_text(headers, USER_ID_HEADER)?
        .ok_or_else(|| Error::unauthorized("caller identity is required"))?;
    let user_id = UserId::new(user_id).map_err(|err| {
        debug!(error = %err, "rejected caller id");
        Error::unauthorized("caller identity is invalid")
    })?;
    let level = header_text(headers, HIERARCHY_LEVEL_HEADER)?
        .map(str::parse::<HierarchyLevel>)
        .transpose()
        .map_err(|err| Error::unauthorized(err.to_string()))?;
    let role = header_text(headers, ROLE_HEADER)?.unwrap_or_default();

    Ok(CallerContext::new(user_id, level).with_role(role))
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(caller_from_headers(req.headers()).map(Caller))
    }
}
