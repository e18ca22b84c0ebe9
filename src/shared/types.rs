use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the user performing the current operation.
///
/// Passed explicitly into every mutating call; this crate never reads
/// ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
}

impl CurrentUser {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}
