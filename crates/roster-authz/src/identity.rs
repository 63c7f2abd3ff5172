use crate::Rank;
use roster_common::ids::OfficerId;
use serde::{Deserialize, Serialize};

/// A caller resolved from a credential.
///
/// Read-only input to the authorizer; the phone number is the key officer
/// routes address records by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub officer_id: OfficerId,
    pub phone: String,
    pub rank: Rank,
}
