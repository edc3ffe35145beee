use serde::Serialize;

use crate::error::InvalidRecord;
use crate::ingest::providers::line::LineFetcher;
use crate::ingest::types::{LineRecord, Validate};
use crate::ingest::validate;

/// `country;provider;delivery_time`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailData {
    pub country: String,
    pub provider: String,
    pub delivery_time: i32,
}

pub type EmailFetcher = LineFetcher<EmailData>;

impl Validate for EmailData {
    fn validate(&self) -> Result<(), InvalidRecord> {
        validate::country(&self.country)?;
        validate::provider(&self.provider, validate::EMAIL_PROVIDERS)?;
        validate::non_zero("delivery_time", self.delivery_time)
    }
}

impl LineRecord for EmailData {
    const KIND: &'static str = "Email";

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [country, provider, delivery_time] = fields else {
            return None;
        };
        Some(Self {
            country: country.to_string(),
            provider: provider.to_string(),
            delivery_time: delivery_time.parse().ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::line::parse_lines;

    #[test]
    fn delivery_time_must_be_non_zero_integer() {
        let content = "RU;Gmail;23\nRU;Gmail;0\nRU;Gmail;x\nRU;Outlook;5\nRU;Mail.ru;-7\n";
        let got: Vec<EmailData> = parse_lines(content, 3);
        let times: Vec<_> = got.iter().map(|r| r.delivery_time).collect();
        assert_eq!(times, vec![23, -7]);
    }
}
