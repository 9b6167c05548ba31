use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Ok,
    Err,
    Muted,
}

/// Short user-facing status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

impl Status {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Ok,
            message: message.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Err,
            message: message.into(),
        }
    }

    pub fn muted(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Muted,
            message: message.into(),
        }
    }

    /// `Error: <message>` status for any failure reaching the UI boundary.
    pub fn from_error(err: &dyn fmt::Display) -> Self {
        Self::err(format!("Error: {err}"))
    }

    pub fn is_err(&self) -> bool {
        self.level == StatusLevel::Err
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::muted("")
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
