use serde::{Deserialize, Serialize};

use crate::error::InvalidRecord;
use crate::ingest::providers::json::JsonArrayFetcher;
use crate::ingest::types::{JsonRecord, Validate};
use crate::ingest::validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MmsData {
    pub country: String,
    pub provider: String,
    pub bandwidth: String,
    pub response_time: String,
}

pub type MmsFetcher = JsonArrayFetcher<MmsData>;

impl Validate for MmsData {
    fn validate(&self) -> Result<(), InvalidRecord> {
        validate::country(&self.country)?;
        validate::provider(&self.provider, validate::MMS_PROVIDERS)?;
        validate::bandwidth(&self.bandwidth)?;
        validate::response_time(&self.response_time)
    }
}

impl JsonRecord for MmsData {
    const KIND: &'static str = "MMS";
}
