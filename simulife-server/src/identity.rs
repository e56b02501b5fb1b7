//! Player identity.
//!
//! The hosting platform owns authentication; the backend only ever asks
//! "who is this request from?". [`HeaderIdentity`] reads a trusted header
//! set by the platform's proxy, falling back to anonymous.

use axum::http::HeaderMap;

/// Who a request came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerIdentity {
    Anonymous,
    Player(String),
}

impl PlayerIdentity {
    /// The player's name, if signed in.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Player(name) => Some(name),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Display name; anonymous players render as `"anonymous"`.
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or("anonymous")
    }
}

/// Resolves the player behind a request.
pub trait IdentityProvider: Send + Sync {
    fn identify(&self, headers: &HeaderMap) -> PlayerIdentity;
}

/// Default header carrying the signed-in player name.
pub const PLAYER_HEADER: &str = "x-simulife-user";

/// Header-based [`IdentityProvider`].
pub struct HeaderIdentity {
    header: String,
}

impl HeaderIdentity {
    pub fn new() -> Self {
        Self {
            header: PLAYER_HEADER.to_string(),
        }
    }

    /// Read the player name from a different header.
    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl Default for HeaderIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for HeaderIdentity {
    fn identify(&self, headers: &HeaderMap) -> PlayerIdentity {
        match headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
        {
            Some(name) if !name.is_empty() => PlayerIdentity::Player(name.to_string()),
            _ => PlayerIdentity::Anonymous,
        }
    }
}
