//! Cookie builders for the session token.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name for the session token.
pub const BOOKLY_SESSION: &str = "bookly_session";

/// Session lifetime in seconds (7 days). Used for both the JWT `exp` and the cookie Max-Age.
pub const SESSION_EXP: u64 = 604800;

/// Deployment-specific cookie attributes.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub domain: String,
    pub secure: bool,
}

/// Set the session cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use bookly_auth_types::cookie::{set_session_cookie, CookieSettings, BOOKLY_SESSION};
///
/// let settings = CookieSettings { domain: "example.com".to_string(), secure: true };
/// let jar = set_session_cookie(CookieJar::new(), "token_value".to_string(), &settings);
/// let cookie = jar.get(BOOKLY_SESSION).unwrap();
/// assert_eq!(cookie.value(), "token_value");
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.domain(), Some("example.com"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604800)));
/// assert!(cookie.http_only().unwrap_or(false));
/// assert!(cookie.secure().unwrap_or(false));
/// ```
pub fn set_session_cookie(jar: CookieJar, value: String, settings: &CookieSettings) -> CookieJar {
    let cookie = Cookie::build((BOOKLY_SESSION, value))
        .path("/")
        .domain(settings.domain.clone())
        .max_age(Duration::seconds(SESSION_EXP as i64))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

/// Clear the session cookie by setting Max-Age to 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use bookly_auth_types::cookie::{
///     clear_session_cookie, set_session_cookie, CookieSettings, BOOKLY_SESSION,
/// };
///
/// let settings = CookieSettings { domain: "example.com".to_string(), secure: false };
/// let jar = set_session_cookie(CookieJar::new(), "s".to_string(), &settings);
/// let jar = clear_session_cookie(jar, &settings);
/// let cookie = jar.get(BOOKLY_SESSION).unwrap();
/// assert_eq!(cookie.value(), "");
/// assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_session_cookie(jar: CookieJar, settings: &CookieSettings) -> CookieJar {
    let cookie = Cookie::build((BOOKLY_SESSION, ""))
        .path("/")
        .domain(settings.domain.clone())
        .max_age(Duration::ZERO)
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}
