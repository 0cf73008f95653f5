//! decision.rs: value types produced by the escalation policy.
//!
//! A `Decision` is derived per notification and never persisted; only the
//! `InfractionEntry` it may carry ends up in the ledger.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify::Classification;

/// Moderation action against an author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    None,
    Warn,
    Mute,
    Block,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::None => "none",
            Action::Warn => "warn",
            Action::Mute => "mute",
            Action::Block => "block",
        }
    }

    /// Past tense for log lines and warning text.
    pub fn past_tense(self) -> &'static str {
        match self {
            Action::None => "left alone",
            Action::Warn => "warned",
            Action::Mute => "muted",
            Action::Block => "blocked",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which gate of the policy produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPath {
    Neutral,
    LowConfidence,
    Allowlisted,
    NewAccountBlock,
    Escalation,
}

/// One entry of an author's infraction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfractionEntry {
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub classification: Classification,
    pub reason: String,
}

impl InfractionEntry {
    pub fn new(at: DateTime<Utc>, classification: Classification, reason: impl Into<String>) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            classification,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub path: DecisionPath,
    /// A warning notice should accompany the action.
    pub warn: bool,
    /// Ledger update to commit for the author; `None` leaves the ledger untouched.
    pub infraction: Option<InfractionEntry>,
    /// Infraction count including `infraction`; 0 when nothing is recorded.
    pub infraction_count: u32,
}

impl Decision {
    /// No action, no ledger update.
    pub fn skip(path: DecisionPath) -> Self {
        Self {
            action: Action::None,
            path,
            warn: false,
            infraction: None,
            infraction_count: 0,
        }
    }

    /// Calls to make against the social network, in order. The warning goes
    /// first so it is delivered before a block makes replying impossible.
    pub fn effects(&self) -> Vec<Action> {
        let mut out = Vec::with_capacity(2);
        if self.action == Action::None {
            return out;
        }
        if self.warn {
            out.push(Action::Warn);
        }
        if matches!(self.action, Action::Mute | Action::Block) {
            out.push(self.action);
        }
        out
    }
}
