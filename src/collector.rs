//! # Collector
//! Fan-out of one task per domain under a shared context.
//!
//! Every task fetches, builds its projection and publishes into its own slot
//! of a [`SharedResultSet`]. A task never fails the run: fetch errors and
//! cancellations are logged and the slot stays empty. Once all tasks are done
//! (or the caller's context is), the merged set is validated into a
//! [`Verdict`].

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::CollectorConfig;
use crate::context::FetchContext;
use crate::domain::Domain;
use crate::error::CancelReason;
use crate::ingest::providers::{
    BillingData, BillingFetcher, EmailData, EmailFetcher, IncidentData, IncidentFetcher, MmsData,
    MmsFetcher, SmsData, SmsFetcher, SupportData, SupportFetcher, VoiceCallData, VoiceFetcher,
};
use crate::ingest::Fetcher;
use crate::projection::{self, EmailRanking, SortedPair, SupportLoad};
use crate::result::{ResultSet, SharedResultSet, Verdict};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "collector_task_outcomes_total",
            "Finished collection tasks by domain and outcome."
        );
        describe_counter!(
            "collector_records_published_total",
            "Records published into the result set by domain."
        );
        describe_histogram!(
            "collector_run_duration_ms",
            "Wall time of one full collection in milliseconds."
        );
    });
}

/// Terminal state of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    /// Context cancelled or deadline hit; nothing published.
    Cancelled,
    /// Fetch returned an error; nothing published.
    Failed,
    Published,
}

impl TaskOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskOutcome::Cancelled => "cancelled",
            TaskOutcome::Failed => "failed",
            TaskOutcome::Published => "published",
        }
    }
}

/// Size of a projection, for logs and metrics.
pub trait RecordCount {
    fn record_count(&self) -> usize;
}

impl<T> RecordCount for Vec<T> {
    fn record_count(&self) -> usize {
        self.len()
    }
}

impl<T> RecordCount for SortedPair<T> {
    fn record_count(&self) -> usize {
        self.len()
    }
}

impl RecordCount for BTreeMap<String, EmailRanking> {
    fn record_count(&self) -> usize {
        self.len()
    }
}

impl RecordCount for BillingData {
    fn record_count(&self) -> usize {
        usize::from(!self.is_zero())
    }
}

impl RecordCount for SupportLoad {
    fn record_count(&self) -> usize {
        1
    }
}

/// Uniform contract the collector schedules.
#[async_trait]
pub trait CollectTask: Send + Sync {
    fn domain(&self) -> Domain;

    /// Run to a terminal state. Never panics on source errors and never
    /// writes any slot but its own.
    async fn run(&self, parent: &FetchContext, results: &SharedResultSet) -> TaskOutcome;
}

/// A fetcher, the builder for its projection and the setter of its slot.
pub struct DomainTask<F: Fetcher, P> {
    domain: Domain,
    fetcher: F,
    build: fn(F::Output) -> P,
    publish: fn(&SharedResultSet, P),
    timeout: Duration,
}

impl<F: Fetcher, P> DomainTask<F, P> {
    pub fn new(
        domain: Domain,
        fetcher: F,
        build: fn(F::Output) -> P,
        publish: fn(&SharedResultSet, P),
    ) -> Self {
        Self {
            domain,
            fetcher,
            build,
            publish,
            timeout: Duration::ZERO,
        }
    }

    /// Own deadline on top of the parent's. Zero inherits the parent only.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn finish(&self, outcome: TaskOutcome) -> TaskOutcome {
        counter!(
            "collector_task_outcomes_total",
            "domain" => self.domain.as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        outcome
    }
}

#[async_trait]
impl<F, P> CollectTask for DomainTask<F, P>
where
    F: Fetcher + 'static,
    P: RecordCount + Debug + Send + 'static,
{
    fn domain(&self) -> Domain {
        self.domain
    }

    async fn run(&self, parent: &FetchContext, results: &SharedResultSet) -> TaskOutcome {
        let domain = self.domain;
        let ctx = parent.with_timeout(self.timeout);
        let start = Instant::now();
        let elapsed_ms = || start.elapsed().as_millis() as u64;

        let fetched = match ctx.run(self.fetcher.fetch(&ctx)).await.and_then(|r| r) {
            Ok(v) => v,
            Err(e) if e.is_cancelled() => {
                tracing::info!(%domain, elapsed_ms = elapsed_ms(), reason = %e, "cancelled");
                return self.finish(TaskOutcome::Cancelled);
            }
            Err(e) => {
                tracing::info!(
                    %domain,
                    source = self.fetcher.name(),
                    error = %e,
                    elapsed_ms = elapsed_ms(),
                    "not fetched"
                );
                return self.finish(TaskOutcome::Failed);
            }
        };

        if ctx.is_done() {
            tracing::info!(%domain, elapsed_ms = elapsed_ms(), "cancelled before publish");
            return self.finish(TaskOutcome::Cancelled);
        }

        let projection = (self.build)(fetched);
        let count = projection.record_count();
        tracing::debug!(%domain, ?projection, "projection built");

        if ctx.is_done() {
            tracing::info!(%domain, elapsed_ms = elapsed_ms(), "cancelled before publish");
            return self.finish(TaskOutcome::Cancelled);
        }
        (self.publish)(results, projection);

        counter!("collector_records_published_total", "domain" => domain.as_str())
            .increment(count as u64);
        tracing::info!(%domain, count, elapsed_ms = elapsed_ms(), "fetched");
        self.finish(TaskOutcome::Published)
    }
}

/// Everything one collection produced.
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    pub verdict: Verdict,
    /// Merged slots as published, before the completeness check.
    pub result_set: ResultSet,
    pub outcomes: BTreeMap<Domain, TaskOutcome>,
    pub collected_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Set when the caller's context cut the run short. Fixed when `collect`
    /// returns, so a deadline passing afterwards does not change it.
    #[serde(skip)]
    pub interrupted: Option<CancelReason>,
}

pub struct Collector {
    tasks: Vec<Arc<dyn CollectTask>>,
    concurrency_limit: usize,
}

impl Collector {
    /// Collector over an explicit task list; a limit of 0 is treated as 1.
    pub fn new(tasks: Vec<Arc<dyn CollectTask>>, concurrency_limit: usize) -> Self {
        Self {
            tasks,
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// The seven production tasks wired from configuration, sharing one
    /// HTTP client.
    pub fn from_config(cfg: &CollectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.collect.http_timeout())
            .build()
            .context("building http client")?;
        let src = &cfg.sources;
        let max = src.max_file_bytes;
        let fail_fast = cfg.collect.json_fail_fast;
        let timeout = cfg.collect.task_timeout();

        let tasks: Vec<Arc<dyn CollectTask>> = vec![
            Arc::new(
                DomainTask::new(
                    Domain::Sms,
                    SmsFetcher::new(&src.sms.path, src.sms.columns, max),
                    |v: Vec<SmsData>| projection::sort_by_provider_and_country(&v),
                    SharedResultSet::set_sms,
                )
                .with_timeout(timeout),
            ),
            Arc::new(
                DomainTask::new(
                    Domain::Mms,
                    MmsFetcher::new(client.clone(), &src.mms_url)
                        .fail_fast(fail_fast)
                        .max_body_bytes(src.max_body_bytes),
                    |v: Vec<MmsData>| projection::sort_by_provider_and_country(&v),
                    SharedResultSet::set_mms,
                )
                .with_timeout(timeout),
            ),
            Arc::new(
                DomainTask::new(
                    Domain::Voice,
                    VoiceFetcher::new(&src.voice.path, src.voice.columns, max),
                    |v: Vec<VoiceCallData>| v,
                    SharedResultSet::set_voice,
                )
                .with_timeout(timeout),
            ),
            Arc::new(
                DomainTask::new(
                    Domain::Email,
                    EmailFetcher::new(&src.email.path, src.email.columns, max),
                    |v: Vec<EmailData>| projection::rank_email(&v),
                    SharedResultSet::set_email,
                )
                .with_timeout(timeout),
            ),
            Arc::new(
                DomainTask::new(
                    Domain::Billing,
                    BillingFetcher::new(&src.billing, max),
                    |v: BillingData| v,
                    SharedResultSet::set_billing,
                )
                .with_timeout(timeout),
            ),
            Arc::new(
                DomainTask::new(
                    Domain::Support,
                    SupportFetcher::new(client.clone(), &src.support_url)
                        .fail_fast(fail_fast)
                        .max_body_bytes(src.max_body_bytes),
                    |v: Vec<SupportData>| projection::support_load(&v),
                    SharedResultSet::set_support,
                )
                .with_timeout(timeout),
            ),
            Arc::new(
                DomainTask::new(
                    Domain::Incident,
                    IncidentFetcher::new(client, &src.incident_url)
                        .fail_fast(fail_fast)
                        .max_body_bytes(src.max_body_bytes),
                    |v: Vec<IncidentData>| projection::prioritize_incidents(&v),
                    SharedResultSet::set_incident,
                )
                .with_timeout(timeout),
            ),
        ];

        Ok(Self::new(tasks, cfg.collect.concurrency_limit))
    }

    pub fn domains(&self) -> Vec<Domain> {
        self.tasks.iter().map(|t| t.domain()).collect()
    }

    /// Run every task once and return the merged result.
    ///
    /// Returns when all tasks reached a terminal state or `ctx` is done; in
    /// the latter case unfinished tasks are aborted and reported as
    /// cancelled.
    pub async fn collect(&self, ctx: &FetchContext) -> Collection {
        ensure_metrics_described();
        let start = Instant::now();

        let results = Arc::new(SharedResultSet::new());
        let permits = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut set = JoinSet::new();

        for task in &self.tasks {
            let task = Arc::clone(task);
            let ctx = ctx.clone();
            let results = Arc::clone(&results);
            let permits = Arc::clone(&permits);
            set.spawn(async move {
                let domain = task.domain();
                let _permit = tokio::select! {
                    permit = permits.acquire_owned() => match permit {
                        Ok(p) => p,
                        Err(_) => return (domain, TaskOutcome::Cancelled),
                    },
                    _ = ctx.done() => return (domain, TaskOutcome::Cancelled),
                };
                let outcome = task.run(&ctx, &results).await;
                (domain, outcome)
            });
        }

        let mut outcomes = BTreeMap::new();
        let mut interrupted = None;
        loop {
            tokio::select! {
                joined = set.join_next() => match joined {
                    Some(Ok((domain, outcome))) => {
                        outcomes.insert(domain, outcome);
                    }
                    Some(Err(e)) => tracing::warn!(error = %e, "collection task did not finish"),
                    None => break,
                },
                _ = ctx.done() => {
                    interrupted = Some(ctx.err().unwrap_or(CancelReason::DeadlineExceeded));
                    set.abort_all();
                    while let Some(joined) = set.join_next().await {
                        if let Ok((domain, outcome)) = joined {
                            outcomes.insert(domain, outcome);
                        }
                    }
                    break;
                }
            }
        }
        for task in &self.tasks {
            let fallback = if ctx.is_done() {
                TaskOutcome::Cancelled
            } else {
                TaskOutcome::Failed
            };
            outcomes.entry(task.domain()).or_insert(fallback);
        }
        // a task only reports a cancel from the caller's context once that
        // context is done, so the reason is already readable here
        if interrupted.is_none() && outcomes.values().any(|o| *o == TaskOutcome::Cancelled) {
            interrupted = ctx.err();
        }

        let result_set = match Arc::try_unwrap(results) {
            Ok(shared) => shared.into_inner(),
            Err(shared) => shared.snapshot(),
        };
        let verdict = Verdict::from_result_set(result_set.clone());

        let elapsed_ms = start.elapsed().as_millis() as u64;
        histogram!("collector_run_duration_ms").record(elapsed_ms as f64);
        tracing::info!(
            status = verdict.status,
            elapsed_ms,
            published = outcomes
                .values()
                .filter(|o| **o == TaskOutcome::Published)
                .count(),
            "collection finished"
        );

        Collection {
            verdict,
            result_set,
            outcomes,
            collected_at: Utc::now(),
            elapsed_ms,
            interrupted,
        }
    }
}
