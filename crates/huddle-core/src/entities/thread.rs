//! Thread entity - a direct-message thread between users

use crate::value_objects::Snowflake;

/// DM thread entity (the slice of the row the gateway reads)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: Snowflake,
}
