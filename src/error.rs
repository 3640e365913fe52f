//! Error types surfaced by the map and its cursors.

use thiserror::Error;

/// Failures reported by [`ChainMap`](crate::ChainMap) constructors and
/// [`Cursor`](crate::Cursor) operations.
///
/// None of these are transient: each one reflects a caller contract
/// violation, so nothing is retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Rejected construction parameters (load factor, eviction bound).
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Which parameter was rejected and why.
        reason: String,
    },

    /// The map changed structurally since the cursor last synchronized.
    #[error("concurrent structural change: cursor expected modification {expected}, map is at {found}")]
    ConcurrentModification {
        /// Modification count captured by the cursor.
        expected: u64,
        /// Modification count observed on the map.
        found: u64,
    },

    /// A cursor was driven against a map other than the one that created it.
    #[error("cursor used with a map it was not created from")]
    ForeignCursor,

    /// `Cursor::remove` was called without a preceding successful `next`.
    #[error("cursor has no current entry to remove")]
    NoCurrentEntry,
}

impl MapError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        MapError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// A broken structural invariant found by
/// [`ChainMap::check_invariants`](crate::ChainMap::check_invariants).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invariant violated in bucket {bucket:?}: {message}")]
pub struct InvariantViolation {
    /// Bucket the violation was found in, if it is bucket-local.
    pub bucket: Option<usize>,
    /// Description of the broken property.
    pub message: String,
}

impl InvariantViolation {
    pub(crate) fn global(message: impl Into<String>) -> Self {
        Self {
            bucket: None,
            message: message.into(),
        }
    }

    pub(crate) fn in_bucket(bucket: usize, message: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let e = MapError::invalid("load factor must be positive, got 0");
        assert_eq!(
            e.to_string(),
            "invalid configuration: load factor must be positive, got 0"
        );
        let e = MapError::ConcurrentModification {
            expected: 3,
            found: 5,
        };
        assert!(e.to_string().contains("expected modification 3"));
        let v = InvariantViolation::in_bucket(7, "red node with red child");
        assert_eq!(
            v.to_string(),
            "invariant violated in bucket Some(7): red node with red child"
        );
    }
}
