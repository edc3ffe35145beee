use serde::Serialize;

use crate::error::InvalidRecord;
use crate::ingest::providers::line::LineFetcher;
use crate::ingest::types::{LineRecord, Validate};
use crate::ingest::validate;

/// `country;bandwidth;response_time;provider`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsData {
    pub country: String,
    pub bandwidth: String,
    pub response_time: String,
    pub provider: String,
}

pub type SmsFetcher = LineFetcher<SmsData>;

impl Validate for SmsData {
    fn validate(&self) -> Result<(), InvalidRecord> {
        validate::country(&self.country)?;
        validate::bandwidth(&self.bandwidth)?;
        validate::response_time(&self.response_time)?;
        validate::provider(&self.provider, validate::SMS_PROVIDERS)
    }
}

impl LineRecord for SmsData {
    const KIND: &'static str = "SMS";

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [country, bandwidth, response_time, provider] = fields else {
            return None;
        };
        Some(Self {
            country: country.to_string(),
            bandwidth: bandwidth.to_string(),
            response_time: response_time.to_string(),
            provider: provider.to_string(),
        })
    }
}
