use serde::{Deserialize, Serialize};

use crate::error::InvalidRecord;
use crate::ingest::providers::json::JsonArrayFetcher;
use crate::ingest::types::{JsonRecord, Validate};
use crate::ingest::validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupportData {
    pub topic: String,
    pub active_tickets: i32,
}

pub type SupportFetcher = JsonArrayFetcher<SupportData>;

impl Validate for SupportData {
    fn validate(&self) -> Result<(), InvalidRecord> {
        validate::non_empty("topic", &self.topic)?;
        if self.active_tickets < -1 {
            return Err(InvalidRecord::new(
                "active_tickets",
                format!("{} is below -1", self.active_tickets),
            ));
        }
        Ok(())
    }
}

impl JsonRecord for SupportData {
    const KIND: &'static str = "Support";
}
