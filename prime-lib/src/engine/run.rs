use super::fetch::fetch_source;
use super::{AnalysisConfig, Corpus, LOG_TARGET, RunError, SourceProvenance, SourceStatus};
use crate::events::{Event, EventKind};
use crate::metrics::{InsufficientDataWarning, Metric, MetricComputationError, MetricOutcome, MetricResult};
use crate::report::Report;
use crate::sources::Source;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

/// Runs a complete analysis.
///
/// Every adapter is fetched concurrently, the events are merged into a corpus, and every
/// metric is evaluated concurrently against that corpus. `now` is the run's notion of the
/// current time, used for timestamp validation and stamped into the report.
///
/// # Errors
///
/// Fails when the run is cancelled through `cancel`, when adapters disagree about the kind
/// of an event, or when `config` is inconsistent. Adapter and metric failures don't fail
/// the run; they are recorded in the report.
pub async fn run_analysis(
    sources: &[Arc<dyn Source>],
    metrics: &[Arc<dyn Metric>],
    config: &AnalysisConfig,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Result<Report, RunError> {
    let start_time = std::time::Instant::now();

    config.validate().map_err(RunError::InvalidConfig)?;
    let window = config.window().map_err(RunError::InvalidConfig)?;
    let policy = config.validation_policy(now);

    log::info!(target: LOG_TARGET, "Fetching from {} source(s)", sources.len());

    let fetches = sources
        .iter()
        .map(|source| tokio::spawn(fetch_source(Arc::clone(source), config.clone(), window, policy, cancel.clone())));
    let fetched = join_all(fetches).await;

    if cancel.is_cancelled() {
        return Err(RunError::Cancelled);
    }

    let mut provenance = Vec::with_capacity(sources.len());
    let mut batches = Vec::with_capacity(sources.len());
    for (source, result) in sources.iter().zip(fetched) {
        match result {
            Ok(Some(outcome)) => {
                provenance.push(outcome.provenance);
                batches.push(outcome.events);
            }
            Ok(None) => return Err(RunError::Cancelled),
            Err(e) => {
                log::error!(target: LOG_TARGET, "Fetch task for '{}' failed: {e}", source.identity());
                provenance.push(SourceProvenance {
                    name: source.identity().into(),
                    family: source.family(),
                    status: SourceStatus::Failed {
                        reason: format!("adapter crashed: {}", join_error_message(e)),
                    },
                    attempts: 1,
                    events_accepted: 0,
                    events_rejected: 0,
                });
            }
        }
    }

    let corpus = Arc::new(Corpus::merge(batches)?);
    for p in &mut provenance {
        p.events_accepted = corpus.count_from(&p.name);
    }

    let kinds = corpus.kinds();
    log::info!(target: LOG_TARGET, "Evaluating {} metric(s) over {} events", metrics.len(), corpus.len());

    let mut names = HashSet::new();
    let evaluations = metrics
        .iter()
        .filter(|m| {
            let unique = names.insert(m.name().to_string());
            if !unique {
                log::warn!(target: LOG_TARGET, "Ignoring duplicate metric '{}'", m.name());
            }
            unique
        })
        .map(|m| evaluate(Arc::clone(m), Arc::clone(&corpus), &kinds));

    let results = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(RunError::Cancelled),
        results = join_all(evaluations) => results,
    };

    log::info!(target: LOG_TARGET, "Analysis completed in {:.3}s", start_time.elapsed().as_secs_f64());

    Ok(Report::new(now, window, provenance, &corpus, results))
}

async fn evaluate(metric: Arc<dyn Metric>, corpus: Arc<Corpus>, kinds: &BTreeSet<EventKind>) -> MetricResult {
    let name = metric.name().into();
    let description = metric.description().into();

    let missing_kinds: BTreeSet<EventKind> = metric.required_kinds().difference(kinds).cloned().collect();
    if !missing_kinds.is_empty() {
        log::warn!(
            target: LOG_TARGET,
            "Skipping metric '{}': no {} events",
            metric.name(),
            missing_kinds.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );

        return MetricResult {
            name,
            description,
            outcome: MetricOutcome::Skipped(InsufficientDataWarning { missing_kinds }),
        };
    }

    let task_metric = Arc::clone(&metric);
    let computation = tokio::task::spawn_blocking(move || {
        let selected: Vec<&Event> = corpus.events().iter().filter(|e| task_metric.accepts(e)).collect();
        let events_used = selected.iter().map(|e| e.key().clone()).collect::<Vec<_>>();
        task_metric.compute(&selected).map(|value| (value, events_used))
    });

    let outcome = match computation.await {
        Ok(Ok((value, events_used))) => MetricOutcome::Computed { value, events_used },
        Ok(Err(e)) => {
            log::warn!(target: LOG_TARGET, "Metric '{}' failed: {e}", metric.name());
            MetricOutcome::Failed(e)
        }
        Err(e) => {
            let message = format!("metric crashed: {}", join_error_message(e));
            log::error!(target: LOG_TARGET, "Metric '{}' {message}", metric.name());
            MetricOutcome::Failed(MetricComputationError::new(message))
        }
    };

    MetricResult { name, description, outcome }
}

fn join_error_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }

    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panicked".to_string())
}
