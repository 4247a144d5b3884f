use std::fmt;

pub const READ_CHAPTERS_KEY: &str = "read_chapters";
pub const CURRENTLY_READING_KEY: &str = "currently_reading";
pub const SEARCH_FILTERS_KEY: &str = "search_filters";

const GUEST_KEY: &str = "guest";
const DEVICE_PREFIX: &str = "guest:";
const USER_PREFIX: &str = "user:";
const MAX_DEVICE_ID_LEN: usize = 64;

/// Identity-derived namespace under which every persisted record is keyed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Scope {
    /// The one anonymous identity of a single-device session.
    Guest,
    /// An anonymous client that identifies itself with its own device id.
    Device(String),
    User(String),
}

impl Scope {
    /// Empty ids are treated as no identity.
    pub fn from_identity(user_id: Option<&str>) -> Self {
        match user_id {
            Some(id) if !id.is_empty() => Scope::User(id.to_string()),
            _ => Scope::Guest,
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self::from_identity(Some(&id))
    }

    /// Accepts ids of ASCII letters, digits, `-` and `_`, up to 64 chars.
    pub fn device(id: &str) -> Option<Self> {
        let valid = !id.is_empty()
            && id.len() <= MAX_DEVICE_ID_LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

        valid.then(|| Scope::Device(id.to_string()))
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Scope::Guest | Scope::Device(_))
    }

    /// Namespace string. The guest sentinel and user keys never overlap.
    pub fn key(&self) -> String {
        match self {
            Scope::Guest => GUEST_KEY.to_string(),
            Scope::Device(id) => format!("{}{}", DEVICE_PREFIX, id),
            Scope::User(id) => format!("{}{}", USER_PREFIX, id),
        }
    }

    pub fn storage_key(&self, base: &str) -> String {
        format!("{}:{}", base, self.key())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
