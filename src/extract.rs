//! The extraction pipeline.
//!
//! [`run_extraction`] takes a list of group links, a search configuration
//! and a set of authorized sessions, and returns every matching message
//! across all groups:
//!
//! 1. the pattern is compiled and the configuration validated
//! 2. links are parsed; unparseable lines are reported, not fatal
//! 3. groups are spread round-robin over the sessions
//! 4. one task per session walks its groups sequentially; all tasks run
//!    interleaved on the caller's task
//! 5. per-task results are merged newest-first
//!
//! A group that cannot be read becomes a [`GroupFailure`] in the report and
//! never affects other groups. Sessions are closed when the run ends,
//! whatever the outcome.
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "export-source")]
//! # async fn example() -> chatgrep::Result<()> {
//! use chatgrep::prelude::*;
//!
//! let provider = ExportHistorySource::new("exports");
//! let accounts = vec![AccountConfig::new("1", "hash", "+100")];
//! let auth = authorize_accounts(&provider, &accounts, &NoCodes).await;
//!
//! let request = ExtractionRequest::new("@rustlang\nhttps://t.me/tokio_rs", SearchConfig::new("async"));
//! let progress = ProgressEstimator::new();
//! let report = run_extraction(&provider, &request, auth.sessions, &progress).await?;
//!
//! for m in &report.matches {
//!     println!("{} | {} | {}", m.group, m.sender, m.text);
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::MatchRecord;
use crate::config::SearchConfig;
use crate::core::aggregate::ResultAggregator;
use crate::core::distribute::distribute;
use crate::core::filter::KeywordFilter;
use crate::core::pager::{RateLimitedPager, retry_rate_limited};
use crate::core::sender::SenderResolver;
use crate::error::{ChatgrepError, FetchError, GroupFailure, Result};
use crate::link::{GroupTarget, parse_links};
use crate::progress::ProgressEstimator;
use crate::session::{Session, SessionLifecycle};
use crate::source::HistorySource;

/// A client that can both read history and manage sessions.
pub trait Provider: HistorySource + SessionLifecycle {}

impl<T: HistorySource + SessionLifecycle + ?Sized> Provider for T {}

/// What to search and where.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Newline-separated group links
    pub links: String,
    pub search: SearchConfig,
}

impl ExtractionRequest {
    pub fn new(links: impl Into<String>, search: SearchConfig) -> Self {
        Self {
            links: links.into(),
            search,
        }
    }

    /// Builds a request from individual link lines.
    pub fn from_links<I, S>(links: I, search: SearchConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let links = links
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(links, search)
    }
}

/// Counters describing one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub groups_total: usize,
    pub groups_failed: usize,
    pub sessions: usize,
    pub messages_processed: usize,
    pub matches: usize,
    pub elapsed: Duration,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Matches, newest first
    pub matches: Vec<MatchRecord>,
    /// Groups that could not be read completely
    pub failures: Vec<GroupFailure>,
    /// Link lines that did not parse
    pub rejected_links: Vec<String>,
    pub stats: RunStats,
}

impl ExtractionReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Runs one search over all linked groups.
///
/// Every session passed in is closed before this returns, on success and on
/// error alike. Sessions that are not authorized are closed without being
/// used.
///
/// # Errors
///
/// Fatal errors only: an empty or invalid pattern, invalid configuration,
/// no parseable link ([`ChatgrepError::NoTargets`]) or no authorized session
/// ([`ChatgrepError::NoActiveSessions`]). None of them starts any fetch.
pub async fn run_extraction<P>(
    provider: &P,
    request: &ExtractionRequest,
    sessions: Vec<Session>,
    progress: &ProgressEstimator,
) -> Result<ExtractionReport>
where
    P: Provider + ?Sized,
{
    let started = Instant::now();

    let (active, inactive): (Vec<Session>, Vec<Session>) =
        sessions.into_iter().partition(Session::is_authorized);
    close_all(provider, &inactive).await;

    let plan = match prepare(request, active.len()) {
        Ok(plan) => plan,
        Err(err) => {
            close_all(provider, &active).await;
            return Err(err);
        }
    };

    let Plan {
        filter,
        targets,
        rejected_links,
    } = plan;
    let groups_total = targets.len();
    let session_count = active.len();

    for line in &rejected_links {
        warn!(link = %line, "skipping unparseable link");
    }
    info!(
        groups = groups_total,
        sessions = session_count,
        keyword = %request.search.keyword,
        "starting extraction"
    );

    let indexed: Vec<(usize, GroupTarget)> = targets.into_iter().enumerate().collect();
    let buckets = distribute(indexed, session_count)?;
    progress.start(groups_total, request.search.message_cap);

    let ctx = RunContext {
        search: &request.search,
        filter: &filter,
        progress,
    };
    let tasks = active
        .into_iter()
        .zip(buckets)
        .map(|(session, groups)| run_session(provider, session, groups, &ctx));
    let outcomes = join_all(tasks).await;

    let mut aggregator = ResultAggregator::new();
    let mut failures = Vec::new();
    let mut messages_processed = 0;
    for outcome in outcomes {
        aggregator.extend(outcome.matches);
        failures.extend(outcome.failures);
        messages_processed += outcome.messages_processed;
    }
    let matches = aggregator.finish();

    let stats = RunStats {
        groups_total,
        groups_failed: failures.len(),
        sessions: session_count,
        messages_processed,
        matches: matches.len(),
        elapsed: started.elapsed(),
    };
    info!(
        matches = stats.matches,
        failed = stats.groups_failed,
        messages = stats.messages_processed,
        "extraction finished"
    );

    Ok(ExtractionReport {
        matches,
        failures,
        rejected_links,
        stats,
    })
}

struct Plan {
    filter: KeywordFilter,
    targets: Vec<GroupTarget>,
    rejected_links: Vec<String>,
}

/// Fatal checks, in the order they are reported.
fn prepare(request: &ExtractionRequest, active_sessions: usize) -> Result<Plan> {
    let filter = KeywordFilter::from_config(&request.search)?;
    request.search.validate()?;

    let parsed = parse_links(&request.links);
    if parsed.targets.is_empty() {
        return Err(ChatgrepError::NoTargets);
    }
    if active_sessions == 0 {
        return Err(ChatgrepError::NoActiveSessions);
    }

    Ok(Plan {
        filter,
        targets: parsed.targets,
        rejected_links: parsed.rejected,
    })
}

async fn close_all<P: Provider + ?Sized>(provider: &P, sessions: &[Session]) {
    for session in sessions {
        provider.close(session).await;
    }
}

struct RunContext<'a> {
    search: &'a SearchConfig,
    filter: &'a KeywordFilter,
    progress: &'a ProgressEstimator,
}

#[derive(Default)]
struct SessionOutcome {
    matches: Vec<MatchRecord>,
    failures: Vec<GroupFailure>,
    messages_processed: usize,
}

/// Processes one session's groups in order, then closes the session.
async fn run_session<P>(
    provider: &P,
    session: Session,
    groups: Vec<(usize, GroupTarget)>,
    ctx: &RunContext<'_>,
) -> SessionOutcome
where
    P: Provider + ?Sized,
{
    let mut outcome = SessionOutcome::default();
    let mut resolver = SenderResolver::new(provider, &session, ctx.search.locale);

    for (index, target) in groups {
        info!(session = %session.label, group = %target.raw, "processing group");
        let scan = scan_group(provider, &session, &target, index, ctx, &mut resolver).await;

        outcome.messages_processed += scan.processed;
        info!(
            group = %target.raw,
            matches = scan.matches.len(),
            processed = scan.processed,
            "group done"
        );
        outcome.matches.extend(scan.matches);

        if let Some(err) = scan.error {
            match &err {
                FetchError::Fatal(_) => error!(group = %target.raw, error = %err, "group aborted"),
                _ => warn!(group = %target.raw, error = %err, "group skipped"),
            }
            outcome.failures.push(GroupFailure {
                link: target.raw.clone(),
                session: session.label.clone(),
                reason: err.to_string(),
            });
        }
        ctx.progress.complete_group(index);
    }

    provider.close(&session).await;
    outcome
}

struct GroupScan {
    matches: Vec<MatchRecord>,
    processed: usize,
    error: Option<FetchError>,
}

/// Pages one group and collects its matches.
///
/// Matches found before a failure are kept.
async fn scan_group<P>(
    provider: &P,
    session: &Session,
    target: &GroupTarget,
    index: usize,
    ctx: &RunContext<'_>,
    resolver: &mut SenderResolver<'_, P>,
) -> GroupScan
where
    P: Provider + ?Sized,
{
    let mut scan = GroupScan {
        matches: Vec::new(),
        processed: 0,
        error: None,
    };

    let group = match retry_rate_limited("resolve_group", move || provider.resolve_group(session, target)).await {
        Ok(group) => group,
        Err(err) => {
            scan.error = Some(err);
            return scan;
        }
    };
    let title = group
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| ctx.search.locale.unknown_group().to_string());
    let window = ctx.search.date_range;

    let mut pager = RateLimitedPager::new(provider, session, &group, ctx.search);
    loop {
        let batch = match pager.fetch_next_batch().await {
            Ok(Some(batch)) => batch,
            Ok(None) => break,
            Err(err) => {
                scan.error = Some(err);
                break;
            }
        };

        let before = scan.matches.len();
        let mut past_window = false;
        for msg in &batch {
            if window.is_before(msg.timestamp) {
                past_window = true;
                continue;
            }
            if !window.contains(msg.timestamp) || !ctx.filter.matches(msg) {
                continue;
            }

            let sender = resolver.resolve(msg.sender.as_ref()).await;
            scan.matches.push(MatchRecord {
                group: title.clone(),
                group_link: target.raw.clone(),
                sender,
                message_id: msg.id,
                timestamp: msg.timestamp,
                text: msg.text().unwrap_or_default().to_string(),
                url: group.permalink(msg.id),
                views: msg.views,
                forwards: msg.forwards,
                replies: msg.replies,
                reactions: msg.reactions,
            });
        }

        let counted = pager.cursor().processed - scan.processed;
        scan.processed = pager.cursor().processed;
        ctx.progress
            .record_batch(index, scan.processed, counted, scan.matches.len() - before);

        // Newest-first: nothing older can fall inside the window
        if past_window {
            pager.finish();
        }
    }

    scan
}
