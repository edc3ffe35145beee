//! # Projections
//! Pure builders turning a domain's valid records into the shape published in
//! the result set. None of them fail; empty input gives an empty projection.
//!
//! All string ordering is byte order and every sort is stable.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ingest::countries::country_name;
use crate::ingest::providers::{EmailData, IncidentData, MmsData, SmsData, SupportData};

/// Number of entries in each email ranking bucket.
pub const RANK_SIZE: usize = 3;

/// Tickets the whole support team closes per hour.
pub const SUPPORT_THROUGHPUT_PER_HOUR: u32 = 18;

/// Records carrying a country code and a provider name.
pub trait CountryRecord: Clone {
    fn country(&self) -> &str;
    fn provider(&self) -> &str;
    fn set_country(&mut self, country: String);
}

impl CountryRecord for SmsData {
    fn country(&self) -> &str {
        &self.country
    }
    fn provider(&self) -> &str {
        &self.provider
    }
    fn set_country(&mut self, country: String) {
        self.country = country;
    }
}

impl CountryRecord for MmsData {
    fn country(&self) -> &str {
        &self.country
    }
    fn provider(&self) -> &str {
        &self.provider
    }
    fn set_country(&mut self, country: String) {
        self.country = country;
    }
}

/// The same records ordered two ways.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortedPair<T> {
    pub by_provider: Vec<T>,
    pub by_country: Vec<T>,
}

impl<T> Default for SortedPair<T> {
    fn default() -> Self {
        Self {
            by_provider: Vec::new(),
            by_country: Vec::new(),
        }
    }
}

impl<T> SortedPair<T> {
    pub fn len(&self) -> usize {
        self.by_provider.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_provider.is_empty() && self.by_country.is_empty()
    }
}

/// Replace country codes by full names, then sort once by provider and once
/// by country name.
pub fn sort_by_provider_and_country<T: CountryRecord>(records: &[T]) -> SortedPair<T> {
    let normalized: Vec<T> = records
        .iter()
        .cloned()
        .map(|mut r| {
            let name = country_name(r.country()).to_string();
            r.set_country(name);
            r
        })
        .collect();

    let mut by_provider = normalized.clone();
    by_provider.sort_by(|a, b| a.provider().cmp(b.provider()));

    let mut by_country = normalized;
    by_country.sort_by(|a, b| a.country().cmp(b.country()));

    SortedPair {
        by_provider,
        by_country,
    }
}

/// Fastest and slowest providers of one country, each ascending by the mean
/// delivery time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmailRanking {
    pub fastest: Vec<EmailData>,
    pub slowest: Vec<EmailData>,
}

/// Group by country (trimmed, upper-cased) and provider, average the delivery
/// time, and keep the [`RANK_SIZE`] fastest and slowest providers per country.
/// With fewer providers both buckets hold the full sorted list.
pub fn rank_email(records: &[EmailData]) -> BTreeMap<String, EmailRanking> {
    // country -> provider -> (sum, count); inner map iterates in byte order
    let mut groups: BTreeMap<String, BTreeMap<&str, (i64, i64)>> = BTreeMap::new();
    for r in records {
        let key = r.country.trim().to_uppercase();
        let slot = groups
            .entry(key)
            .or_default()
            .entry(r.provider.as_str())
            .or_insert((0, 0));
        slot.0 += i64::from(r.delivery_time);
        slot.1 += 1;
    }

    groups
        .into_iter()
        .map(|(country, providers)| {
            let mut averaged: Vec<EmailData> = providers
                .into_iter()
                .map(|(provider, (sum, count))| EmailData {
                    country: country.clone(),
                    provider: provider.to_string(),
                    delivery_time: mean_rounded(sum, count),
                })
                .collect();
            averaged.sort_by_key(|e| e.delivery_time);

            let ranking = if averaged.len() < RANK_SIZE {
                EmailRanking {
                    fastest: averaged.clone(),
                    slowest: averaged,
                }
            } else {
                EmailRanking {
                    fastest: averaged[..RANK_SIZE].to_vec(),
                    slowest: averaged[averaged.len() - RANK_SIZE..].to_vec(),
                }
            };
            (country, ranking)
        })
        .collect()
}

/// Mean rounded half away from zero.
fn mean_rounded(sum: i64, count: i64) -> i32 {
    if count == 0 {
        return 0;
    }
    let mean = (sum as f64 / count as f64).round();
    mean.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Active incidents first, each group in input order.
pub fn prioritize_incidents(records: &[IncidentData]) -> Vec<IncidentData> {
    let (mut active, rest): (Vec<_>, Vec<_>) =
        records.iter().cloned().partition(IncidentData::is_active);
    active.extend(rest);
    active
}

/// Support pressure derived from the open ticket count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportLoad {
    /// 1 below 9 open tickets, 2 up to 16, 3 above.
    pub load_level: u8,
    /// Expected wait for a new ticket, rounded up.
    pub wait_minutes: u32,
}

pub fn support_load(records: &[SupportData]) -> SupportLoad {
    let open: u32 = records
        .iter()
        .filter(|r| r.active_tickets > 0)
        .map(|r| r.active_tickets.unsigned_abs())
        .fold(0u32, u32::saturating_add);

    let load_level = match open {
        0..=8 => 1,
        9..=16 => 2,
        _ => 3,
    };
    let wait_minutes = (u64::from(open) * 60).div_ceil(u64::from(SUPPORT_THROUGHPUT_PER_HOUR));

    SupportLoad {
        load_level,
        wait_minutes: u32::try_from(wait_minutes).unwrap_or(u32::MAX),
    }
}
