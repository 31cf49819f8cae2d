//! Issues and pull requests from the GitHub REST API.

mod client;
mod issues;
mod pulls;

pub use issues::GitHubIssuesSource;
pub use pulls::GitHubPullsSource;

use super::{EventStream, SourceError};
use crate::events::{EventDraft, TimeWindow};
use chrono::{DateTime, Utc};
use client::Client;
use futures::{StreamExt, stream};
use serde::de::DeserializeOwned;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const LOG_TARGET: &str = "    github";
const PAGE_SIZE: usize = 100;
const MAX_PAGES: u32 = 100;

/// A record returned by one of the GitHub list endpoints.
trait GitHubRecord: DeserializeOwned + Send {
    fn created_at(&self) -> DateTime<Utc>;

    /// Converts the record into a draft, or `None` when the record should be ignored.
    fn into_draft(self, source_name: &str) -> Option<EventDraft>;
}

/// Walks a list endpoint sorted by ascending creation date, one page at a time.
///
/// Paging stops at the first short page, at the first record created after the end of
/// the window, or after [`MAX_PAGES`] pages.
fn paged_stream<'a, R: GitHubRecord + 'a>(client: &'a Client, source_name: &'a str, path: String, window: TimeWindow) -> EventStream<'a> {
    stream::unfold(Some(1_u32), move |page| {
        let path = path.clone();
        async move {
            let page = page?;
            let url = format!("{path}&per_page={PAGE_SIZE}&page={page}");

            let records: Vec<R> = match client.get_json(&url).await {
                Ok(records) => records,
                Err(e) => return Some((vec![Err(e)], None)),
            };

            let full_page = records.len() == PAGE_SIZE;
            let mut past_window = false;
            let mut drafts: Vec<Result<EventDraft, SourceError>> = Vec::with_capacity(records.len());

            for record in records {
                let created_at = record.created_at();
                if window.is_after(created_at) {
                    past_window = true;
                    break;
                }

                if window.contains(created_at)
                    && let Some(draft) = record.into_draft(source_name)
                {
                    drafts.push(Ok(draft));
                }
            }

            let next = if full_page && !past_window && page < MAX_PAGES {
                Some(page + 1)
            } else {
                if full_page && page >= MAX_PAGES {
                    log::warn!(target: LOG_TARGET, "Stopped paging '{path}' after {MAX_PAGES} pages");
                }
                None
            };

            log::debug!(target: LOG_TARGET, "Fetched page {page} of '{path}' with {} records in window", drafts.len());
            Some((drafts, next))
        }
    })
    .flat_map(stream::iter)
    .boxed()
}
