// src/ingest/providers/mod.rs
pub mod billing;
pub mod email;
pub mod incident;
pub mod json;
pub mod line;
pub mod mms;
pub mod sms;
pub mod support;
pub mod voice;

pub use billing::{BillingData, BillingFetcher, BillingFlag};
pub use email::{EmailData, EmailFetcher};
pub use incident::{IncidentData, IncidentFetcher};
pub use json::JsonArrayFetcher;
pub use line::LineFetcher;
pub use mms::{MmsData, MmsFetcher};
pub use sms::{SmsData, SmsFetcher};
pub use support::{SupportData, SupportFetcher};
pub use voice::{VoiceCallData, VoiceFetcher};
