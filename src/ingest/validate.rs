//! Field-level rules shared by the record validators.

use crate::error::InvalidRecord;
use crate::ingest::countries;

pub const SMS_PROVIDERS: &[&str] = &["Topolo", "Rond", "Kildy"];
pub const MMS_PROVIDERS: &[&str] = SMS_PROVIDERS;
pub const VOICE_PROVIDERS: &[&str] = &["TransparentCalls", "E-Voice", "JustPhone"];
pub const EMAIL_PROVIDERS: &[&str] = &[
    "Gmail",
    "Yahoo",
    "Hotmail",
    "MSN",
    "Orange",
    "Comcast",
    "AOL",
    "Live",
    "RediffMail",
    "GMX",
    "Protonmail",
    "Yandex",
    "Mail.ru",
];

pub const INCIDENT_ACTIVE: &str = "active";
pub const INCIDENT_CLOSED: &str = "closed";

pub fn country(code: &str) -> Result<(), InvalidRecord> {
    if countries::is_alpha2(code) {
        Ok(())
    } else {
        Err(InvalidRecord::new("country", format!("{code:?} is not an alpha-2 code")))
    }
}

/// Percentage string in `0..=100`.
pub fn bandwidth(value: &str) -> Result<(), InvalidRecord> {
    match value.parse::<i64>() {
        Ok(n) if (0..=100).contains(&n) => Ok(()),
        Ok(n) => Err(InvalidRecord::new("bandwidth", format!("{n} out of 0..=100"))),
        Err(_) => Err(InvalidRecord::new("bandwidth", format!("{value:?} is not an integer"))),
    }
}

/// Non-empty, ASCII digits only.
pub fn response_time(value: &str) -> Result<(), InvalidRecord> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(InvalidRecord::new("response_time", format!("{value:?} is not numeric")))
    }
}

pub fn provider(value: &str, allowed: &[&str]) -> Result<(), InvalidRecord> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(InvalidRecord::new("provider", format!("{value:?} is not supported")))
    }
}

pub fn non_empty(field: &'static str, value: &str) -> Result<(), InvalidRecord> {
    if value.is_empty() {
        Err(InvalidRecord::new(field, "must not be empty"))
    } else {
        Ok(())
    }
}

pub fn non_zero<T: Default + PartialEq>(field: &'static str, value: T) -> Result<(), InvalidRecord> {
    if value == T::default() {
        Err(InvalidRecord::new(field, "must not be zero"))
    } else {
        Ok(())
    }
}

pub fn incident_status(value: &str) -> Result<(), InvalidRecord> {
    match value {
        INCIDENT_ACTIVE | INCIDENT_CLOSED => Ok(()),
        other => Err(InvalidRecord::new("status", format!("{other:?} is not active|closed"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bandwidth_bounds() {
        assert!(bandwidth("0").is_ok());
        assert!(bandwidth("100").is_ok());
        assert!(bandwidth("101").is_err());
        assert!(bandwidth("-1").is_err());
        assert!(bandwidth("abc").is_err());
        assert!(bandwidth("").is_err());
    }

    #[test]
    fn response_time_digits_only() {
        assert!(response_time("1861").is_ok());
        assert!(response_time("").is_err());
        assert!(response_time("12a").is_err());
        assert!(response_time("-5").is_err());
    }

    #[test]
    fn providers_are_exact_match() {
        assert!(provider("Topolo", SMS_PROVIDERS).is_ok());
        assert!(provider("topolo", SMS_PROVIDERS).is_err());
        assert!(provider("E-Voice", VOICE_PROVIDERS).is_ok());
        assert!(provider("Mail.ru", EMAIL_PROVIDERS).is_ok());
    }

    #[test]
    fn zero_and_status_rules() {
        assert!(non_zero("stability", 0.0f32).is_err());
        assert!(non_zero("stability", 0.5f32).is_ok());
        assert!(non_zero("ttfb", 0i64).is_err());
        assert!(incident_status("active").is_ok());
        assert!(incident_status("Active").is_err());
        assert!(country("RU").is_ok());
        assert!(country("ru").is_err());
    }
}
