//! Recipient selection for dispatched messages.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{message::Envelope, registry::RegistryEntry};

/// Which registered connections receive a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingPolicy {
    /// Everyone except the originating connection.
    #[default]
    ExcludeSender,
    /// Everyone whose display name differs from the message's `user`.
    ///
    /// Connections sharing the sender's name are excluded as well, and a
    /// sender that has not been named yet receives its own message.
    ExcludeSenderName,
    /// Every registered connection, the sender included.
    All,
}

impl RoutingPolicy {
    /// Whether `entry` should receive `envelope`.
    pub fn is_recipient(&self, entry: &RegistryEntry, envelope: &Envelope) -> bool {
        match self {
            Self::ExcludeSender => entry.id() != envelope.origin,
            Self::ExcludeSenderName => entry.name.as_ref() != Some(envelope.message.user()),
            Self::All => true,
        }
    }

    /// Filter a registry snapshot down to the recipients of `envelope`.
    pub fn recipients(
        &self,
        snapshot: Vec<RegistryEntry>,
        envelope: &Envelope,
    ) -> Vec<RegistryEntry> {
        snapshot
            .into_iter()
            .filter(|entry| self.is_recipient(entry, envelope))
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExcludeSender => "exclude-sender",
            Self::ExcludeSenderName => "exclude-sender-name",
            Self::All => "all",
        }
    }
}

impl fmt::Display for RoutingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exclude-sender" => Ok(Self::ExcludeSender),
            "exclude-sender-name" => Ok(Self::ExcludeSenderName),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown routing policy '{other}' (expected exclude-sender, exclude-sender-name or all)"
            )),
        }
    }
}
