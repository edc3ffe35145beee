use serde::Serialize;

use crate::error::InvalidRecord;
use crate::ingest::providers::line::LineFetcher;
use crate::ingest::types::{LineRecord, Validate};
use crate::ingest::validate;

/// `country;bandwidth;response_time;provider;connection_stability;ttfb;voice_purity;median_of_calls_time`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceCallData {
    pub country: String,
    pub bandwidth: String,
    pub response_time: String,
    pub provider: String,
    pub connection_stability: f32,
    pub ttfb: i32,
    pub voice_purity: i32,
    pub median_of_calls_time: i32,
}

pub type VoiceFetcher = LineFetcher<VoiceCallData>;

impl Validate for VoiceCallData {
    fn validate(&self) -> Result<(), InvalidRecord> {
        validate::country(&self.country)?;
        validate::bandwidth(&self.bandwidth)?;
        validate::response_time(&self.response_time)?;
        validate::provider(&self.provider, validate::VOICE_PROVIDERS)?;
        validate::non_zero("connection_stability", self.connection_stability)?;
        validate::non_zero("ttfb", self.ttfb)?;
        validate::non_zero("voice_purity", self.voice_purity)?;
        validate::non_zero("median_of_calls_time", self.median_of_calls_time)
    }
}

impl LineRecord for VoiceCallData {
    const KIND: &'static str = "Voice";

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [country, bandwidth, response_time, provider, stability, ttfb, purity, median] = fields
        else {
            return None;
        };
        Some(Self {
            country: country.to_string(),
            bandwidth: bandwidth.to_string(),
            response_time: response_time.to_string(),
            provider: provider.to_string(),
            connection_stability: stability.parse().ok()?,
            ttfb: ttfb.parse().ok()?,
            voice_purity: purity.parse().ok()?,
            median_of_calls_time: median.parse().ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::line::parse_lines;

    #[test]
    fn parses_typed_columns_and_drops_bad_ones() {
        let content = "RU;86;297;TransparentCalls;0.9;120;40;10\n\
                       US;86;297;E-Voice;abc;120;40;10\n\
                       US;86;297;E-Voice;0.5;0;40;10\n\
                       DE;86;297;SkypeLike;0.5;1;40;10\n\
                       GB;1;2;JustPhone;0.75;3;4;5\n";
        let got: Vec<VoiceCallData> = parse_lines(content, 8);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].country, "RU");
        assert!((got[0].connection_stability - 0.9).abs() < f32::EPSILON);
        assert_eq!(got[1].provider, "JustPhone");
        assert_eq!(got[1].median_of_calls_time, 5);
    }
}
