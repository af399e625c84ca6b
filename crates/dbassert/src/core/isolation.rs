//! Transaction isolation levels.
//!
//! Backends report isolation as the numeric codes used by most client
//! libraries (0, 1, 2, 4, 8). Codes outside that set are not an error; they
//! simply have no symbolic name.

use std::fmt;
use std::str::FromStr;

const PREFIX: &str = "TRANSACTION_";

/// Symbolic transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    None,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub const NONE_CODE: i32 = 0;
    pub const READ_UNCOMMITTED_CODE: i32 = 1;
    pub const READ_COMMITTED_CODE: i32 = 2;
    pub const REPEATABLE_READ_CODE: i32 = 4;
    pub const SERIALIZABLE_CODE: i32 = 8;

    /// Map a numeric isolation code; unknown codes yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::NONE_CODE => Some(IsolationLevel::None),
            Self::READ_UNCOMMITTED_CODE => Some(IsolationLevel::ReadUncommitted),
            Self::READ_COMMITTED_CODE => Some(IsolationLevel::ReadCommitted),
            Self::REPEATABLE_READ_CODE => Some(IsolationLevel::RepeatableRead),
            Self::SERIALIZABLE_CODE => Some(IsolationLevel::Serializable),
            _ => None,
        }
    }

    /// Numeric code for this level.
    pub fn code(&self) -> i32 {
        match self {
            IsolationLevel::None => Self::NONE_CODE,
            IsolationLevel::ReadUncommitted => Self::READ_UNCOMMITTED_CODE,
            IsolationLevel::ReadCommitted => Self::READ_COMMITTED_CODE,
            IsolationLevel::RepeatableRead => Self::REPEATABLE_READ_CODE,
            IsolationLevel::Serializable => Self::SERIALIZABLE_CODE,
        }
    }

    /// Full symbolic name, e.g. `TRANSACTION_READ_COMMITTED`.
    pub fn name(&self) -> &'static str {
        match self {
            IsolationLevel::None => "TRANSACTION_NONE",
            IsolationLevel::ReadUncommitted => "TRANSACTION_READ_UNCOMMITTED",
            IsolationLevel::ReadCommitted => "TRANSACTION_READ_COMMITTED",
            IsolationLevel::RepeatableRead => "TRANSACTION_REPEATABLE_READ",
            IsolationLevel::Serializable => "TRANSACTION_SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts `TRANSACTION_READ_COMMITTED`, `READ_COMMITTED` or `read committed`,
/// case-insensitively.
impl FromStr for IsolationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase().replace([' ', '-'], "_");
        let bare = upper.strip_prefix(PREFIX).unwrap_or(&upper);
        match bare {
            "NONE" => Ok(IsolationLevel::None),
            "READ_UNCOMMITTED" => Ok(IsolationLevel::ReadUncommitted),
            "READ_COMMITTED" => Ok(IsolationLevel::ReadCommitted),
            "REPEATABLE_READ" => Ok(IsolationLevel::RepeatableRead),
            "SERIALIZABLE" => Ok(IsolationLevel::Serializable),
            _ => Err(format!("unknown transaction isolation level '{}'", s)),
        }
    }
}
