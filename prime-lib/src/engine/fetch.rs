use super::{AnalysisConfig, LOG_TARGET, SourceProvenance, SourceStatus};
use crate::events::{Event, TimeWindow, ValidationPolicy};
use crate::sources::{Source, SourceError};
use core::sync::atomic::{AtomicU32, Ordering};
use futures::StreamExt;
use layered::{Execute, Service, Stack};
use seatbelt::retry::{Backoff, Retry};
use seatbelt::{RecoveryInfo, ResilienceContext};
use std::sync::Arc;
use tick::Clock;
use tokio_util::sync::CancellationToken;

/// Everything one adapter produced during a run.
#[derive(Debug)]
pub(super) struct FetchOutcome {
    pub events: Vec<Event>,
    pub provenance: SourceProvenance,
}

/// The result of a single attempt at draining an adapter's stream.
#[derive(Debug)]
struct Attempt {
    events: Vec<Event>,
    rejected: u64,
    error: Option<SourceError>,
}

/// Fetches all events of one adapter, retrying transient failures.
///
/// Each retry waits [`AnalysisConfig::backoff_delay`]. Returns `None` when the run is
/// cancelled first.
pub(super) async fn fetch_source(
    source: Arc<dyn Source>,
    config: AnalysisConfig,
    window: TimeWindow,
    policy: ValidationPolicy,
    cancel: CancellationToken,
) -> Option<FetchOutcome> {
    let name = source.identity().to_string();
    let attempts = Arc::new(AtomicU32::new(0));

    let clock = Clock::new_tokio();
    let context = ResilienceContext::new(&clock).name("source_fetch");

    let recovery_attempts = Arc::clone(&attempts);
    let recovery_config = config.clone();
    let retry_name = name.clone();
    let attempt_source = Arc::clone(&source);
    let attempt_counter = Arc::clone(&attempts);

    let service = (
        Retry::layer("retry", &context)
            .clone_input()
            .recovery_with(move |attempt: &Attempt, _| match &attempt.error {
                Some(SourceError::Unavailable(_)) => {
                    RecoveryInfo::retry().delay(recovery_config.backoff_delay(recovery_attempts.load(Ordering::Relaxed)))
                }
                _ => RecoveryInfo::never(),
            })
            .max_retry_attempts(config.retry_count)
            .base_delay(config.retry_backoff_base)
            .backoff(Backoff::Exponential)
            .on_retry(move |_output, args| {
                log::warn!(
                    target: LOG_TARGET,
                    "Source '{retry_name}' unavailable, retrying in {}ms (attempt {})",
                    args.retry_delay().as_millis(),
                    args.attempt().index() + 1,
                );
            }),
        Execute::new(move |window: TimeWindow| {
            let source = Arc::clone(&attempt_source);
            let attempt = attempt_counter.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                log::debug!(target: LOG_TARGET, "Fetching from '{}' (attempt {attempt})", source.identity());
                drain(source.as_ref(), window, &policy).await
            }
        }),
    )
        .into_service();

    let attempt = tokio::select! {
        biased;
        () = cancel.cancelled() => return None,
        attempt = service.execute(window) => attempt,
    };
    let attempts = attempts.load(Ordering::Relaxed);

    let status = match attempt.error {
        None => {
            log::info!(target: LOG_TARGET, "Fetched {} events from '{name}'", attempt.events.len());
            SourceStatus::Succeeded
        }
        Some(e) => {
            log::error!(target: LOG_TARGET, "Giving up on '{name}' after {attempts} attempt(s): {e}");
            SourceStatus::Failed { reason: e.to_string() }
        }
    };

    Some(FetchOutcome {
        provenance: SourceProvenance {
            name: source.identity().into(),
            family: source.family(),
            status,
            attempts,
            events_accepted: 0,
            events_rejected: attempt.rejected,
        },
        events: attempt.events,
    })
}

async fn drain(source: &dyn Source, window: TimeWindow, policy: &ValidationPolicy) -> Attempt {
    let mut attempt = Attempt {
        events: Vec::new(),
        rejected: 0,
        error: None,
    };

    let mut stream = source.fetch(window);
    while let Some(item) = stream.next().await {
        let draft = match item {
            Ok(draft) => draft,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Fetch from '{}' failed: {e}", source.identity());
                attempt.error = Some(e);
                break;
            }
        };

        if draft.get_source_system() != Some(source.identity()) {
            log::warn!(
                target: LOG_TARGET,
                "Dropping event from '{}' stamped with source system '{}'",
                source.identity(),
                draft.get_source_system().unwrap_or_default()
            );
            attempt.rejected += 1;
            continue;
        }

        match draft.build(policy) {
            Ok(event) if window.contains(event.timestamp()) => attempt.events.push(event),
            Ok(event) => {
                log::warn!(target: LOG_TARGET, "Dropping event '{}' outside of the analysis window", event.key());
                attempt.rejected += 1;
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Dropping event from '{}': {e}", source.identity());
                attempt.rejected += 1;
            }
        }
    }

    attempt
}
