//! Per-item outcomes and batch completion events.

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Description recorded when a failure carries no message.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Result of running the operation on a single item.
///
/// Serialized flat, as `{"success": true, "result": ..}` or
/// `{"success": false, "error": ".."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome<R> {
    Success { result: R },
    Failure { error: String },
}

impl<R> ItemOutcome<R> {
    pub fn success(result: R) -> Self {
        ItemOutcome::Success { result }
    }

    /// Build a failure; an empty description becomes [`UNKNOWN_ERROR`].
    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        if error.is_empty() {
            ItemOutcome::Failure {
                error: UNKNOWN_ERROR.to_string(),
            }
        } else {
            ItemOutcome::Failure { error }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Success { .. })
    }

    pub fn result(&self) -> Option<&R> {
        match self {
            ItemOutcome::Success { result } => Some(result),
            ItemOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ItemOutcome::Success { .. } => None,
            ItemOutcome::Failure { error } => Some(error),
        }
    }

    pub fn into_result(self) -> std::result::Result<R, String> {
        match self {
            ItemOutcome::Success { result } => Ok(result),
            ItemOutcome::Failure { error } => Err(error),
        }
    }
}

impl<R, E: std::fmt::Display> From<std::result::Result<R, E>> for ItemOutcome<R> {
    fn from(r: std::result::Result<R, E>) -> Self {
        match r {
            Ok(v) => ItemOutcome::success(v),
            Err(e) => ItemOutcome::failure(e.to_string()),
        }
    }
}

impl<R: Serialize> Serialize for ItemOutcome<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("ItemOutcome", 2)?;
        match self {
            ItemOutcome::Success { result } => {
                record.serialize_field("success", &true)?;
                record.serialize_field("result", result)?;
            }
            ItemOutcome::Failure { error } => {
                record.serialize_field("success", &false)?;
                record.serialize_field("error", error)?;
            }
        }
        record.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OutcomeRecord<R> {
    Failure { success: bool, error: String },
    Success { success: bool, result: R },
}

impl<'de, R: Deserialize<'de>> Deserialize<'de> for ItemOutcome<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match OutcomeRecord::deserialize(deserializer)? {
            OutcomeRecord::Success {
                success: true,
                result,
            } => Ok(ItemOutcome::Success { result }),
            OutcomeRecord::Failure {
                success: false,
                error,
            } => Ok(ItemOutcome::failure(error)),
            OutcomeRecord::Success { .. } => Err(D::Error::custom(
                "outcome with a result must have success = true",
            )),
            OutcomeRecord::Failure { .. } => Err(D::Error::custom(
                "outcome with an error must have success = false",
            )),
        }
    }
}

/// Reported after each batch settles. Purely observational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCompletion {
    /// 1-based
    pub batch_number: usize,
    pub total_batches: usize,
    pub succeeded: usize,
    pub failed: usize,
}
