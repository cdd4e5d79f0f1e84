//! Error Types
//!
//! Program-level findings reported by the checkers, plus configuration
//! errors. Consistency violations are not errors: they are a plain `false`
//! from `is_consistent` and mean "prune this execution".

use super::config::ModelType;
use crate::domain::graph::Event;
use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Verification Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bug found in the checked program
///
/// Hard errors (everything but [`VerificationError::WwRace`]) make the
/// explored execution erroneous. Whether exploration stops is the driver's
/// call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Access to memory that was never allocated, or whose allocation is not
    /// ordered before the access
    #[error("access to non-allocated memory at {event}")]
    AccessNonMalloc {
        /// The offending access or free
        event: Event,
    },

    /// Second deallocation of the same block
    #[error("double free at {event} (first free at {other})")]
    DoubleFree {
        /// The second free
        event: Event,
        /// The other free of the block
        other: Event,
    },

    /// Access racing with or following a free
    #[error("access to freed memory at {event} (free at {other})")]
    AccessFreed {
        /// The access (or the free, when the access came first)
        event: Event,
        /// The conflicting free or access
        other: Event,
    },

    /// Unordered conflicting accesses, at least one of them non-atomic
    #[error("non-atomic race between {event} and {other}")]
    RaceNotAtomic {
        /// The newly added access
        event: Event,
        /// The racing access
        other: Event,
    },

    /// Unordered writes to the same location
    #[error("write-write race between {event} and {other}")]
    WwRace {
        /// The newly added write
        event: Event,
        /// The racing write
        other: Event,
    },
}

impl VerificationError {
    /// Category of the finding
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AccessNonMalloc { .. } => ErrorKind::AccessNonMalloc,
            Self::DoubleFree { .. } => ErrorKind::DoubleFree,
            Self::AccessFreed { .. } => ErrorKind::AccessFreed,
            Self::RaceNotAtomic { .. } => ErrorKind::RaceNotAtomic,
            Self::WwRace { .. } => ErrorKind::WwRace,
        }
    }

    /// Soft finding that does not make the execution erroneous
    pub const fn is_warning(&self) -> bool {
        self.kind().is_warning()
    }

    /// The event the error was reported at
    pub const fn event(&self) -> Event {
        match self {
            Self::AccessNonMalloc { event }
            | Self::DoubleFree { event, .. }
            | Self::AccessFreed { event, .. }
            | Self::RaceNotAtomic { event, .. }
            | Self::WwRace { event, .. } => *event,
        }
    }

    /// The racing or otherwise conflicting event, if any
    pub const fn offending_event(&self) -> Option<Event> {
        match self {
            Self::AccessNonMalloc { .. } => None,
            Self::DoubleFree { other, .. }
            | Self::AccessFreed { other, .. }
            | Self::RaceNotAtomic { other, .. }
            | Self::WwRace { other, .. } => Some(*other),
        }
    }
}

/// Category of a [`VerificationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`VerificationError::AccessNonMalloc`]
    AccessNonMalloc,
    /// See [`VerificationError::DoubleFree`]
    DoubleFree,
    /// See [`VerificationError::AccessFreed`]
    AccessFreed,
    /// See [`VerificationError::RaceNotAtomic`]
    RaceNotAtomic,
    /// See [`VerificationError::WwRace`]
    WwRace,
}

impl ErrorKind {
    /// Soft findings
    pub const fn is_warning(self) -> bool {
        matches!(self, Self::WwRace)
    }

    /// Stable numeric code for reports
    ///
    /// - 1000-1099: memory-safety errors
    /// - 2000-2099: races
    pub const fn code(self) -> u32 {
        match self {
            Self::AccessNonMalloc => 1000,
            Self::DoubleFree => 1001,
            Self::AccessFreed => 1002,
            Self::RaceNotAtomic => 2000,
            Self::WwRace => 2001,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AccessNonMalloc => "access-non-malloc",
            Self::DoubleFree => "double-free",
            Self::AccessFreed => "access-freed",
            Self::RaceNotAtomic => "race-not-atomic",
            Self::WwRace => "ww-race",
        };
        f.write_str(s)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Configuration Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Invalid checker configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Model name not recognised
    #[error("unknown memory model: {0} (expected one of sc, tso, ra, rc11, imm)")]
    UnknownModel(String),

    /// Library-refinement mode requested on a model without it
    #[error("library refinement checking is not supported under {0}")]
    RelincheUnsupported(ModelType),
}
