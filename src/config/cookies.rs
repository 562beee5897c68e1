//! `Set-Cookie` builders carrying the resolved cookie flags.

use axum_extra::extract::cookie::{Cookie, SameSite};

use super::origin::{OriginPolicy, SameSitePolicy};

/// CSRF cookie name. Readable from JavaScript so the frontend can echo it back.
pub const CSRF_COOKIE_NAME: &str = "XSRF-TOKEN";

/// Header the frontend echoes the CSRF cookie value in.
pub const CSRF_HEADER_NAME: &str = "x-xsrf-token";

// No route issues a session yet; the login flow will build it with `session_cookie`.
#[cfg_attr(not(test), allow(dead_code))]
pub(crate) const SESSION_COOKIE_NAME: &str = "sessionid";

impl From<SameSitePolicy> for SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        }
    }
}

pub fn csrf_cookie(policy: &OriginPolicy, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::build((CSRF_COOKIE_NAME, token))
        .path("/")
        .http_only(false)
        .secure(policy.cookie_secure)
        .same_site(policy.effective_same_site().into());
    if let Some(domain) = &policy.csrf_cookie_domain {
        cookie = cookie.domain(domain.clone());
    }
    cookie.build()
}

#[cfg_attr(not(test), allow(dead_code))]
pub(crate) fn session_cookie(policy: &OriginPolicy, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .secure(policy.cookie_secure)
        .same_site(policy.effective_same_site().into());
    if let Some(domain) = &policy.cookie_domain {
        cookie = cookie.domain(domain.clone());
    }
    cookie.build()
}
