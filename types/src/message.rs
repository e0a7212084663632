//! Chat message domain model.
//!
//! Constructors take `SystemTime` explicitly; callers own the clock.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::NonEmptyString;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// A single chat entry.
///
/// Every message carries a timestamp, including bot replies and error
/// notices. Fields are private so an appended message cannot be edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    text: String,
    sender: Sender,
    timestamp: SystemTime,
}

impl Message {
    /// User messages are validated upstream; the type keeps the non-empty proof.
    #[must_use]
    pub fn user(text: NonEmptyString, timestamp: SystemTime) -> Self {
        Self {
            text: text.into_inner(),
            sender: Sender::User,
            timestamp,
        }
    }

    /// Bot text is remote output or a locally built notice and may be anything.
    #[must_use]
    pub fn bot(text: impl Into<String>, timestamp: SystemTime) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            timestamp,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn sender(&self) -> Sender {
        self.sender
    }

    #[must_use]
    pub const fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}
