use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(GuildId);
id_newtype!(FolderId);

/// Unread state of a guild as reported by the read-state tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadIndicator {
    #[default]
    Read,
    Unread,
    Mentioned(u32),
}

impl ReadIndicator {
    pub fn is_unread(self) -> bool {
        !matches!(self, ReadIndicator::Read)
    }

    pub fn mentions(self) -> u32 {
        match self {
            ReadIndicator::Mentioned(count) => count,
            _ => 0,
        }
    }

    /// Combines two indicators the way a folder shows its children: mentions
    /// add up, otherwise any unread child makes the whole group unread.
    pub fn merge(self, other: ReadIndicator) -> ReadIndicator {
        match (self, other) {
            (ReadIndicator::Mentioned(a), ReadIndicator::Mentioned(b)) => {
                ReadIndicator::Mentioned(a.saturating_add(b))
            }
            (ReadIndicator::Mentioned(n), _) | (_, ReadIndicator::Mentioned(n)) => {
                ReadIndicator::Mentioned(n)
            }
            (ReadIndicator::Unread, _) | (_, ReadIndicator::Unread) => ReadIndicator::Unread,
            (ReadIndicator::Read, ReadIndicator::Read) => ReadIndicator::Read,
        }
    }
}
