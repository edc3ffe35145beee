use serde::{Deserialize, Serialize};

use crate::error::InvalidRecord;
use crate::ingest::providers::json::JsonArrayFetcher;
use crate::ingest::types::{JsonRecord, Validate};
use crate::ingest::validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncidentData {
    pub topic: String,
    pub status: String,
}

impl IncidentData {
    pub fn is_active(&self) -> bool {
        self.status == validate::INCIDENT_ACTIVE
    }
}

pub type IncidentFetcher = JsonArrayFetcher<IncidentData>;

impl Validate for IncidentData {
    fn validate(&self) -> Result<(), InvalidRecord> {
        validate::non_empty("topic", &self.topic)?;
        validate::incident_status(&self.status)
    }
}

impl JsonRecord for IncidentData {
    const KIND: &'static str = "Incident";
}
