use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity provider that issued a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local demo account.
    Demo,
    /// Google account (mocked).
    Google,
}

impl Provider {
    /// Tag used in session records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(Self::Demo),
            "google" => Ok(Self::Google),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Authenticated user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Provider-scoped user identifier.
    pub id: String,
    /// Contact email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Issuing provider.
    pub provider: Provider,
    /// Last profile edit.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl Session {
    /// Build a session with a fresh `<provider>_<uuid>` identifier.
    #[must_use]
    pub fn issue(provider: Provider, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: format!("{provider}_{}", Uuid::now_v7().simple()),
            email: email.into(),
            name: name.into(),
            avatar: None,
            provider,
            updated_at: None,
        }
    }

    /// Merge a profile patch and stamp `updated_at`.
    pub fn apply(&mut self, patch: ProfilePatch, now: OffsetDateTime) {
        let ProfilePatch {
            name,
            email,
            avatar,
        } = patch;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(avatar) = avatar {
            self.avatar = Some(avatar);
        }
        self.updated_at = Some(now);
    }
}

/// Profile fields a user may edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    /// New display name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New avatar URL.
    pub avatar: Option<String>,
}
