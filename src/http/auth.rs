//! Credentials attached to outgoing requests.

/// How requests authenticate against the API.
///
/// A bearer token and a session cookie are mutually exclusive; picking one
/// replaces the other.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credential {
    #[default]
    None,
    /// Sent as `Authorization: Bearer <token>`.
    Bearer(String),
    /// Stored in the cookie jar as the `conch` cookie.
    Session(String),
}

impl Credential {
    /// Resolves a token and a session from configuration. The token wins when
    /// both are present; blank values count as absent.
    pub fn from_parts(token: Option<String>, session: Option<String>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        let session = session.filter(|s| !s.trim().is_empty());
        match (token, session) {
            (Some(token), _) => Credential::Bearer(token),
            (None, Some(session)) => Credential::Session(session),
            (None, None) => Credential::None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Credential::None)
    }

    /// A loggable rendering that never exposes the full secret.
    pub fn masked(&self) -> String {
        match self {
            Credential::None => "none".to_string(),
            Credential::Bearer(token) => format!("bearer {}", mask(token)),
            Credential::Session(session) => format!("session {}", mask(session)),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.masked())
    }
}

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
