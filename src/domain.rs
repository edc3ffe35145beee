//! Telemetry categories collected by the service.

use serde::Serialize;
use std::fmt;

/// One telemetry category. Each owns exactly one slot of the `ResultSet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Sms,
    Mms,
    Voice,
    Email,
    Billing,
    Support,
    Incident,
}

impl Domain {
    /// Validation order of the merged result.
    pub const ALL: [Domain; 7] = [
        Domain::Sms,
        Domain::Mms,
        Domain::Voice,
        Domain::Email,
        Domain::Billing,
        Domain::Support,
        Domain::Incident,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Sms => "sms",
            Domain::Mms => "mms",
            Domain::Voice => "voice_call",
            Domain::Email => "email",
            Domain::Billing => "billing",
            Domain::Support => "support",
            Domain::Incident => "incident",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
