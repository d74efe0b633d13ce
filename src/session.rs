//! Session boundary.
//!
//! Credential checks and session storage live outside the gateway. The
//! gateway only needs their verdict, resolved once per request from the
//! inbound headers and carried to the transformers.

use axum::http::HeaderMap;

/// What the gateway knows about the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub logged_in: bool,
    pub roles: Vec<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Resolves the session for an inbound request.
pub trait SessionProvider: Send + Sync + std::fmt::Debug {
    fn resolve(&self, headers: &HeaderMap) -> Session;
}

/// Treats every caller as logged out.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSessions;

impl SessionProvider for AnonymousSessions {
    fn resolve(&self, _headers: &HeaderMap) -> Session {
        Session::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_sessions() {
        let session = AnonymousSessions.resolve(&HeaderMap::new());
        assert!(!session.logged_in);
        assert!(session.roles.is_empty());
    }
}
