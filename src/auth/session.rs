use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use cookie::{time::Duration as CookieDuration, Cookie, CookieJar, SameSite};
use tracing::warn;

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_MAX_AGE_DAYS: i64 = 7;

/// Per-request state handed to actions and the route guard: the requested
/// path plus the cookie jar. Changes to the jar become `Set-Cookie` headers.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub path: String,
    pub cookies: CookieJar,
}

impl RequestContext {
    pub fn new(path: impl Into<String>, headers: &HeaderMap) -> Self {
        Self {
            path: path.into(),
            cookies: jar_from_headers(headers),
        }
    }

    /// Raw value of the session cookie as sent by the browser.
    pub fn session_value(&self) -> Option<&str> {
        self.cookies.get(SESSION_COOKIE).map(|c| c.value())
    }

    pub fn start_session(&mut self, user_id: i64) {
        self.cookies.add(session_cookie(user_id));
    }

    /// Always emits a removal, whether or not the browser sent the cookie.
    pub fn end_session(&mut self) {
        self.cookies.add(removal_cookie());
    }

    pub fn write_cookies(&self, headers: &mut HeaderMap) {
        for c in self.cookies.delta() {
            match HeaderValue::from_str(&c.to_string()) {
                Ok(v) => {
                    headers.append(header::SET_COOKIE, v);
                }
                Err(e) => warn!(error = %e, cookie = c.name(), "unencodable cookie dropped"),
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new(parts.uri.path(), &parts.headers))
    }
}

/// Reads a user id from a session value the way a lenient integer parse
/// does: leading whitespace and an optional sign, then the longest run of
/// digits. Anything after the digits is ignored. `None` when no digit leads
/// or the number does not fit in `i64`.
pub fn parse_session_id(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = rest[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

pub fn jar_from_headers(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for part in raw.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Ok(parsed) = Cookie::parse(part.to_string()) {
                jar.add_original(parsed);
            }
        }
    }
    jar
}

/// Session cookie: the bare user id, unsigned. Not marked `Secure`.
pub fn session_cookie(user_id: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, user_id.to_string()))
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(SESSION_MAX_AGE_DAYS))
        .path("/")
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut c = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    c.make_removal();
    c
}
