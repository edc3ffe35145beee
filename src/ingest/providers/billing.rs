//! Billing state: a six character `0`/`1` mask, first character most
//! significant.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::ingest::source::read_source;
use crate::ingest::types::Fetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingFlag {
    CreateCustomer,
    Purchase,
    Payout,
    Recurring,
    FraudControl,
    CheckoutPage,
}

/// Character position in the mask → flag it sets.
pub const FLAG_LAYOUT: [(usize, BillingFlag); 6] = [
    (0, BillingFlag::CheckoutPage),
    (1, BillingFlag::FraudControl),
    (2, BillingFlag::Recurring),
    (3, BillingFlag::Payout),
    (4, BillingFlag::Purchase),
    (5, BillingFlag::CreateCustomer),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BillingData {
    pub create_customer: bool,
    pub purchase: bool,
    pub payout: bool,
    pub recurring: bool,
    pub fraud_control: bool,
    pub checkout_page: bool,
}

impl BillingData {
    pub fn set(&mut self, flag: BillingFlag, on: bool) {
        let slot = match flag {
            BillingFlag::CreateCustomer => &mut self.create_customer,
            BillingFlag::Purchase => &mut self.purchase,
            BillingFlag::Payout => &mut self.payout,
            BillingFlag::Recurring => &mut self.recurring,
            BillingFlag::FraudControl => &mut self.fraud_control,
            BillingFlag::CheckoutPage => &mut self.checkout_page,
        };
        *slot = on;
    }

    /// All flags false. Treated as "not collected" by the result validator.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Decode a mask. Characters past the sixth are ignored.
pub fn decode_mask(mask: &str) -> Result<BillingData, String> {
    let bytes = mask.as_bytes();
    if bytes.len() < FLAG_LAYOUT.len() {
        return Err(format!(
            "expected {} flags, got {} characters",
            FLAG_LAYOUT.len(),
            bytes.len()
        ));
    }
    let mut out = BillingData::default();
    for (pos, flag) in FLAG_LAYOUT {
        let on = match bytes[pos] {
            b'0' => false,
            b'1' => true,
            other => {
                return Err(format!(
                    "unexpected {:?} at position {pos}",
                    char::from(other)
                ))
            }
        };
        out.set(flag, on);
    }
    Ok(out)
}

pub struct BillingFetcher {
    path: PathBuf,
    max_bytes: u64,
}

impl BillingFetcher {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            path: path.into(),
            max_bytes,
        }
    }
}

#[async_trait]
impl Fetcher for BillingFetcher {
    type Output = BillingData;

    async fn fetch(&self, ctx: &FetchContext) -> Result<BillingData, FetchError> {
        let content = read_source(&self.path, self.max_bytes, ctx).await?;
        decode_mask(&content)
            .map_err(|reason| FetchError::malformed(self.path.display().to_string(), reason))
    }

    fn name(&self) -> &'static str {
        "Billing"
    }
}
