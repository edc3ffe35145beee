//! # Result Set
//! Per-domain slots filled concurrently by collection tasks, the completeness
//! check run once they finish, and the pass/fail `Verdict` handed to callers.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::domain::Domain;
use crate::error::IncompleteError;
use crate::ingest::providers::{BillingData, IncidentData, MmsData, SmsData, VoiceCallData};
use crate::projection::{EmailRanking, SortedPair, SupportLoad};

/// Error text of every failed verdict.
pub const INCOMPLETE_MESSAGE: &str = "collection incomplete";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub sms: SortedPair<SmsData>,
    pub mms: SortedPair<MmsData>,
    pub voice_call: Vec<VoiceCallData>,
    pub email: BTreeMap<String, EmailRanking>,
    pub billing: BillingData,
    pub support: Option<SupportLoad>,
    pub incident: Vec<IncidentData>,
}

impl ResultSet {
    /// Number of items in one domain's slot (0 when not collected).
    pub fn count(&self, domain: Domain) -> usize {
        match domain {
            Domain::Sms => self.sms.len(),
            Domain::Mms => self.mms.len(),
            Domain::Voice => self.voice_call.len(),
            Domain::Email => self.email.len(),
            Domain::Billing => usize::from(!self.billing.is_zero()),
            Domain::Support => usize::from(self.support.is_some()),
            Domain::Incident => self.incident.len(),
        }
    }
}

/// Check every domain slot in [`Domain::ALL`] order; the first gap wins.
pub fn validate(rs: &ResultSet) -> Result<(), IncompleteError> {
    let missing = |domain, detail| Err(IncompleteError { domain, detail });

    if rs.sms.is_empty() {
        return missing(Domain::Sms, "empty");
    }
    if rs.sms.by_provider.is_empty() || rs.sms.by_country.is_empty() {
        return missing(Domain::Sms, "has empty batch");
    }
    if rs.mms.is_empty() {
        return missing(Domain::Mms, "empty");
    }
    if rs.mms.by_provider.is_empty() || rs.mms.by_country.is_empty() {
        return missing(Domain::Mms, "has empty batch");
    }
    if rs.voice_call.is_empty() {
        return missing(Domain::Voice, "empty");
    }
    if rs.email.is_empty() {
        return missing(Domain::Email, "empty");
    }
    if rs
        .email
        .values()
        .any(|r| r.fastest.is_empty() || r.slowest.is_empty())
    {
        return missing(Domain::Email, "has empty bucket");
    }
    if rs.billing.is_zero() {
        return missing(Domain::Billing, "is zero");
    }
    if rs.support.is_none() {
        return missing(Domain::Support, "empty");
    }
    if rs.incident.is_empty() {
        return missing(Domain::Incident, "empty");
    }
    Ok(())
}

/// What callers receive: the full result set, or nothing and a reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Verdict {
    pub status: bool,
    pub data: ResultSet,
    pub error: String,
}

impl Verdict {
    pub fn from_result_set(rs: ResultSet) -> Self {
        match validate(&rs) {
            Ok(()) => Verdict {
                status: true,
                data: rs,
                error: String::new(),
            },
            Err(e) => {
                tracing::info!(reason = %e, "result set incomplete");
                Verdict {
                    status: false,
                    data: ResultSet::default(),
                    error: INCOMPLETE_MESSAGE.to_string(),
                }
            }
        }
    }
}

/// `ResultSet` behind its own lock. Each setter writes exactly one slot.
#[derive(Debug, Default)]
pub struct SharedResultSet {
    inner: Mutex<ResultSet>,
}

impl SharedResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ResultSet> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_sms(&self, v: SortedPair<SmsData>) {
        self.lock().sms = v;
    }

    pub fn set_mms(&self, v: SortedPair<MmsData>) {
        self.lock().mms = v;
    }

    pub fn set_voice(&self, v: Vec<VoiceCallData>) {
        self.lock().voice_call = v;
    }

    pub fn set_email(&self, v: BTreeMap<String, EmailRanking>) {
        self.lock().email = v;
    }

    pub fn set_billing(&self, v: BillingData) {
        self.lock().billing = v;
    }

    pub fn set_support(&self, v: SupportLoad) {
        self.lock().support = Some(v);
    }

    pub fn set_incident(&self, v: Vec<IncidentData>) {
        self.lock().incident = v;
    }

    pub fn snapshot(&self) -> ResultSet {
        self.lock().clone()
    }

    pub fn into_inner(self) -> ResultSet {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
