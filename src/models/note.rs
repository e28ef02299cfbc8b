use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::user::Lifecycle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteStatus {
    Open,
    InProgress,
    Closed,
}

impl Default for NoteStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl NoteStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            other => Err(format!("Unknown status: {other}")),
        }
    }
}

/// Domain note. `owner_name` is resolved at query time and is None when the
/// owner row was soft-deleted (orphaned references are tolerated).
#[derive(Debug, Clone)]
pub struct Note {
    pub id: i32,
    pub owner_id: i32,
    pub owner_name: Option<String>,
    pub title: String,
    pub body: String,
    pub status: NoteStatus,
    pub ticket: i64,
    pub lifecycle: Lifecycle,
    pub created_at: String,
    pub updated_at: String,
}
