//! Session cookie construction and parsing.
//!
//! Both tokens travel as HttpOnly, SameSite=Strict cookies; the `Secure`
//! attribute is configurable so local development over plain HTTP works.

use std::time::Duration;

pub const ACCESS_COOKIE_NAME: &str = "accessToken";
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";
pub const COOKIE_PATH: &str = "/";

#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    pub secure: bool,
}

pub fn build_auth_cookie(
    name: &str,
    value: &str,
    max_age: Duration,
    options: CookieOptions,
) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Strict",
        name,
        value,
        COOKIE_PATH,
        max_age.as_secs(),
    );
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Cleared with the same flags it was set with, Max-Age=0.
pub fn build_clear_cookie(name: &str, options: CookieOptions) -> String {
    let mut cookie = format!(
        "{}=; Path={}; Max-Age=0; HttpOnly; SameSite=Strict",
        name, COOKIE_PATH,
    );
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn extract_cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        (key == name).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_cookie_carries_security_attributes() {
        let cookie = build_auth_cookie(
            ACCESS_COOKIE_NAME,
            "abc",
            Duration::from_secs(900),
            CookieOptions { secure: true },
        );
        assert!(cookie.contains("accessToken=abc"));
        assert!(cookie.contains("Max-Age=900"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn clear_cookie_zeroes_max_age_with_same_flags() {
        let cookie = build_clear_cookie(REFRESH_COOKIE_NAME, CookieOptions { secure: false });
        assert!(cookie.starts_with("refreshToken="));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn extract_cookie_value_finds_named_cookie() {
        let header = "theme=dark; accessToken=tok-123; other=1";
        assert_eq!(
            extract_cookie_value(header, "accessToken").as_deref(),
            Some("tok-123")
        );
        assert!(extract_cookie_value(header, "refreshToken").is_none());
    }
}
