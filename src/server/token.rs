//! Browser token carried in the `persistent_token` cookie

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::fmt;
use uuid::Uuid;

/// Name of the cookie holding the client token
pub const TOKEN_COOKIE: &str = "persistent_token";

/// Opaque identifier of one browser across requests and restarts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientToken(String);

impl ClientToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a client-supplied token if it looks like one we issued
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= 64
            && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Token from the request cookies, issuing a new cookie when absent
    ///
    /// Returns the jar to send back with the response.
    pub fn from_jar(jar: CookieJar, secure: bool) -> (CookieJar, Self) {
        if let Some(token) = jar.get(TOKEN_COOKIE).and_then(|c| Self::parse(c.value())) {
            return (jar, token);
        }

        let token = Self::generate();
        let cookie = Cookie::build((TOKEN_COOKIE, token.0.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .permanent();
        tracing::debug!("issued new client token");
        (jar.add(cookie), token)
    }
}

impl fmt::Display for ClientToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ClientToken::parse("").is_none());
        assert!(ClientToken::parse("a b").is_none());
        assert!(ClientToken::parse(&"x".repeat(65)).is_none());
        assert_eq!(
            ClientToken::parse("abc-123").map(|t| t.to_string()),
            Some("abc-123".to_string())
        );
    }

    #[test]
    fn test_from_jar_reuses_existing_cookie() {
        let jar = CookieJar::new().add(Cookie::new(TOKEN_COOKIE, "known-token"));
        let (_, token) = ClientToken::from_jar(jar, false);
        assert_eq!(token.as_str(), "known-token");
    }

    #[test]
    fn test_from_jar_issues_cookie() {
        let (jar, token) = ClientToken::from_jar(CookieJar::new(), true);
        let cookie = jar.get(TOKEN_COOKIE).expect("cookie should be set");
        assert_eq!(cookie.value(), token.as_str());
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
    }
}
