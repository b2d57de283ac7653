use std::fmt;

/// Which raw input list (or scalar) a malformed entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Feeding,
    Sleep,
    Milestone,
    Measurement,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Feeding => "feeding",
            EntryKind::Sleep => "sleep",
            EntryKind::Milestone => "milestone",
            EntryKind::Measurement => "measurement",
        };
        f.write_str(name)
    }
}

/// Errors raised by the analytics core.
///
/// `InvalidReferenceData` is fatal: the reference tables are configuration and
/// a bad table must never be interpolated against. `MalformedInputData` is
/// reported per offending entry while the remaining entries are still scored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Invalid reference data: {0}")]
    InvalidReferenceData(String),

    #[error("Malformed {kind} entry at index {index}: {reason}")]
    MalformedInputData {
        kind: EntryKind,
        index: usize,
        reason: String,
    },

    #[error("Unknown timeframe: {0} (expected week, month or all)")]
    UnknownTimeframe(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

impl AnalyticsError {
    pub fn malformed(kind: EntryKind, index: usize, reason: impl Into<String>) -> Self {
        AnalyticsError::MalformedInputData {
            kind,
            index,
            reason: reason.into(),
        }
    }

    pub fn reference(reason: impl Into<String>) -> Self {
        AnalyticsError::InvalidReferenceData(reason.into())
    }
}
