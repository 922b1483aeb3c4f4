// UI layer: runs the search, then fetches and prints the detail record of
// every business found. Calls are strictly sequential. A spinner on stderr
// shows which request is in flight; program output goes to the writer.

use std::io::Write;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::api::{BusinessApi, SearchQuery, SearchResult};
use crate::error::{error_chain, QueryError};

/// What happened to each business from the search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySummary {
    /// Ids whose detail record was fetched and printed, in order.
    pub fetched: Vec<String>,
    /// Ids whose detail fetch failed, with the error message.
    pub failed: Vec<(String, String)>,
    /// Entries without a usable `id`.
    pub skipped: usize,
}

impl QuerySummary {
    pub fn attempted(&self) -> usize {
        self.fetched.len() + self.failed.len()
    }
}

/// Spinner on stderr, drawn once and cleared when the call returns. Hidden
/// automatically when stderr is not a terminal.
fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message);
    pb.tick();
    pb
}

/// Search, then fetch the detail record of every business found.
///
/// A search that fails or returns non-JSON ends the flow with an error and
/// no detail fetch is made. A failed detail fetch is reported to `out` and
/// recorded in the summary; the remaining businesses are still fetched.
pub fn query_api<A>(
    api: &A,
    query: &SearchQuery,
    out: &mut dyn Write,
) -> Result<QuerySummary, QueryError>
where
    A: BusinessApi + ?Sized,
{
    let pb = spinner(format!("Searching for \"{}\" in {}", query.term, query.location));
    let searched = api.search_businesses(&query.term, &query.location, &query.limit);
    pb.finish_and_clear();
    let body = searched?;

    let parsed: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(source) => return Err(QueryError::Parse { body, source }),
    };
    let result = SearchResult::from_value(&parsed);
    info!(count = result.businesses.len(), "search returned businesses");

    let mut summary = QuerySummary::default();
    for business in &result.businesses {
        let Some(id) = business.id.as_deref() else {
            warn!(entry = %business.fields, "business entry has no id; skipping");
            summary.skipped += 1;
            continue;
        };

        writeln!(out, "Querying business info for the \"{id}\" ID ...")?;
        let pb = spinner(format!("Fetching {id}"));
        let detail = api.get_business_detail(id);
        pb.finish_and_clear();

        match detail {
            Ok(body) => {
                writeln!(out, "Result for business \"{id}\" found:")?;
                writeln!(out, "{body}")?;
                summary.fetched.push(id.to_string());
            }
            Err(e) => {
                let reason = error_chain(&e);
                warn!(%id, error = %reason, "detail fetch failed; continuing");
                writeln!(out, "Failed to fetch business \"{id}\": {reason}")?;
                summary.failed.push((id.to_string(), reason));
            }
        }
    }

    Ok(summary)
}
