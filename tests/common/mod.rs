// tests/common/mod.rs
// Shared fakes and fixtures for integration tests.
#![allow(dead_code)]

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use state_collector::ingest::providers::{
    BillingData, EmailData, IncidentData, MmsData, SmsData, SupportData, VoiceCallData,
};
use state_collector::ingest::Fetcher;
use state_collector::projection;
use state_collector::{CollectTask, Domain, DomainTask, FetchContext, FetchError, SharedResultSet};

/// Returns a fixed value after an optional delay, counting calls.
pub struct StaticFetcher<T> {
    value: T,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl<T> StaticFetcher<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn counting(mut self, calls: Arc<AtomicUsize>) -> Self {
        self.calls = calls;
        self
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Fetcher for StaticFetcher<T> {
    type Output = T;

    async fn fetch(&self, _ctx: &FetchContext) -> Result<T, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.value.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Always fails with `SourceUnavailable`.
pub struct FailingFetcher<T>(PhantomData<fn() -> T>);

impl<T> FailingFetcher<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<T: Send + 'static> Fetcher for FailingFetcher<T> {
    type Output = T;

    async fn fetch(&self, _ctx: &FetchContext) -> Result<T, FetchError> {
        Err(FetchError::unavailable("fake", "connection refused"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

pub fn sms_records() -> Vec<SmsData> {
    vec![
        SmsData {
            country: "US".into(),
            bandwidth: "36".into(),
            response_time: "1576".into(),
            provider: "Rond".into(),
        },
        SmsData {
            country: "GB".into(),
            bandwidth: "28".into(),
            response_time: "511".into(),
            provider: "Kildy".into(),
        },
    ]
}

pub fn mms_records() -> Vec<MmsData> {
    vec![MmsData {
        country: "FR".into(),
        provider: "Topolo".into(),
        bandwidth: "60".into(),
        response_time: "200".into(),
    }]
}

pub fn voice_records() -> Vec<VoiceCallData> {
    vec![VoiceCallData {
        country: "RU".into(),
        bandwidth: "86".into(),
        response_time: "297".into(),
        provider: "TransparentCalls".into(),
        connection_stability: 0.9,
        ttfb: 120,
        voice_purity: 40,
        median_of_calls_time: 10,
    }]
}

pub fn email_records() -> Vec<EmailData> {
    ["Gmail", "Yahoo", "Hotmail", "MSN"]
        .iter()
        .enumerate()
        .map(|(i, p)| EmailData {
            country: "RU".into(),
            provider: p.to_string(),
            delivery_time: 10 * (i as i32 + 1),
        })
        .collect()
}

pub fn billing_record() -> BillingData {
    BillingData {
        purchase: true,
        recurring: true,
        checkout_page: true,
        ..Default::default()
    }
}

pub fn support_records() -> Vec<SupportData> {
    vec![
        SupportData {
            topic: "SMS".into(),
            active_tickets: 3,
        },
        SupportData {
            topic: "Billing".into(),
            active_tickets: 5,
        },
    ]
}

pub fn incident_records() -> Vec<IncidentData> {
    vec![
        IncidentData {
            topic: "Checkout page is down".into(),
            status: "closed".into(),
        },
        IncidentData {
            topic: "SMS delivery in EU".into(),
            status: "active".into(),
        },
    ]
}

fn task<T, P>(
    domain: Domain,
    value: T,
    delay: Duration,
    build: fn(T) -> P,
    publish: fn(&SharedResultSet, P),
) -> Arc<dyn CollectTask>
where
    T: Clone + Send + Sync + 'static,
    P: state_collector::collector::RecordCount + std::fmt::Debug + Send + 'static,
{
    Arc::new(DomainTask::new(
        domain,
        StaticFetcher::new(value).delayed(delay),
        build,
        publish,
    ))
}

/// One succeeding task per domain, each taking `delay` to fetch.
pub fn complete_tasks(delay: Duration) -> Vec<Arc<dyn CollectTask>> {
    vec![
        task(
            Domain::Sms,
            sms_records(),
            delay,
            |v| projection::sort_by_provider_and_country(&v),
            SharedResultSet::set_sms,
        ),
        task(
            Domain::Mms,
            mms_records(),
            delay,
            |v| projection::sort_by_provider_and_country(&v),
            SharedResultSet::set_mms,
        ),
        task(
            Domain::Voice,
            voice_records(),
            delay,
            |v| v,
            SharedResultSet::set_voice,
        ),
        task(
            Domain::Email,
            email_records(),
            delay,
            |v| projection::rank_email(&v),
            SharedResultSet::set_email,
        ),
        task(
            Domain::Billing,
            billing_record(),
            delay,
            |v| v,
            SharedResultSet::set_billing,
        ),
        task(
            Domain::Support,
            support_records(),
            delay,
            |v| projection::support_load(&v),
            SharedResultSet::set_support,
        ),
        task(
            Domain::Incident,
            incident_records(),
            delay,
            |v| projection::prioritize_incidents(&v),
            SharedResultSet::set_incident,
        ),
    ]
}

/// Serves fixture JSON for the HTTP sources on an ephemeral port and
/// returns its base URL.
pub async fn spawn_source_server() -> String {
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    let app = Router::new()
        .route(
            "/mms",
            get(|| async {
                Json(json!([
                    {"country": "US", "provider": "Rond", "bandwidth": "36", "response_time": "1576"},
                    {"country": "GB", "provider": "Topolo", "bandwidth": "58", "response_time": "930"},
                    {"country": "XX", "provider": "Rond", "bandwidth": "1", "response_time": "1"},
                    {"country": "FR", "provider": "Kildy", "bandwidth": "1", "response_time": "1", "extra": 1},
                    {"country": "DE", "provider": "Kildy", "bandwidth": "120", "response_time": "1"}
                ]))
            }),
        )
        .route(
            "/support",
            get(|| async {
                Json(json!([
                    {"topic": "SMS", "active_tickets": 3},
                    {"topic": "MMS", "active_tickets": 5},
                    {"topic": "", "active_tickets": 40},
                    {"topic": "Voice", "active_tickets": -1}
                ]))
            }),
        )
        .route(
            "/incident",
            get(|| async {
                Json(json!([
                    {"topic": "Billing isn't allowed in US", "status": "closed"},
                    {"topic": "Wrong SMS delivery time", "status": "active"},
                    {"topic": "Support overload", "status": "unknown"}
                ]))
            }),
        )
        .route(
            "/large",
            get(|| async {
                let rows: Vec<_> = (0..200)
                    .map(|_| json!({"topic": "SMS", "active_tickets": 1}))
                    .collect();
                Json(json!(rows))
            }),
        )
        .route(
            "/not-array",
            get(|| async { Json(json!({"topic": "x", "status": "active"})) }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Json(json!([]))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
