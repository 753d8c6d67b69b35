//! Session cookie handling.
use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Builds the session cookie with the attributes every response shares
#[derive(Debug, Clone, Copy)]
pub struct SessionCookies {
    max_age: Duration,
    secure: bool,
}

impl SessionCookies {
    /// `max_age` should match the token lifetime; `secure` is set in production
    pub fn new(max_age: Duration, secure: bool) -> Self {
        Self { max_age, secure }
    }

    /// Attach an HTTP-only cookie that lives as long as the session
    pub fn set(&self, jar: CookieJar, name: &str, value: impl Into<String>) -> CookieJar {
        let secs = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        let mut cookie = self.base(name.to_string(), value.into());
        cookie.set_max_age(time::Duration::seconds(secs));
        jar.add(cookie)
    }

    /// Expire the cookie now, whether or not the request carried it
    pub fn clear(&self, jar: CookieJar, name: &str) -> CookieJar {
        let mut cookie = self.base(name.to_string(), String::new());
        cookie.make_removal();
        jar.add(cookie)
    }

    fn base(&self, name: String, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .build()
    }
}
