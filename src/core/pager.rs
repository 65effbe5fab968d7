//! Rate-limited history pagination.
//!
//! [`RateLimitedPager`] walks one group's history from the newest message
//! backwards in batches of at most `batch_size`, for one session.
//!
//! # Behavior Notes
//!
//! - The cursor only moves toward older messages; a batch that does not move
//!   it ends pagination
//! - `RateLimited { seconds }` suspends for exactly `seconds` and reissues the
//!   identical request (same offset, same limit)
//! - A fixed delay follows every non-empty batch
//! - The cap counts messages inside the date window only; a batch is cut
//!   right after the message that reaches it
//! - `Unavailable` and `Fatal` end pagination for this group only

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::MessageRecord;
use crate::config::SearchConfig;
use crate::core::filter::DateRange;
use crate::error::FetchError;
use crate::session::Session;
use crate::source::{GroupInfo, HistorySource};

/// Pagination state for one (session, group) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchCursor {
    /// Id of the oldest message seen so far; 0 = start from the newest.
    pub offset: u64,
    /// In-window messages handed out so far, counted against `cap`.
    pub processed: usize,
    /// All messages handed out so far, in or out of the window.
    pub fetched: usize,
    /// Message cap, 0 = unbounded.
    pub cap: usize,
    /// Non-empty batches handed out so far.
    pub batches: usize,
    exhausted: bool,
}

impl FetchCursor {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            ..Self::default()
        }
    }

    /// Returns `true` once pagination for this pair is over.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Messages still allowed under the cap, `None` when unbounded.
    pub fn remaining(&self) -> Option<usize> {
        (self.cap > 0).then(|| self.cap.saturating_sub(self.processed))
    }

    fn cap_reached(&self) -> bool {
        self.remaining() == Some(0)
    }
}

/// Runs `op` until it returns something other than `RateLimited`,
/// sleeping the advertised number of seconds between attempts.
pub(crate) async fn retry_rate_limited<T, F, Fut>(what: &str, mut op: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    loop {
        match op().await {
            Err(FetchError::RateLimited { seconds }) => {
                warn!(request = what, seconds, "rate limited, waiting before retry");
                tokio::time::sleep(Duration::from_secs(seconds)).await;
            }
            other => return other,
        }
    }
}

/// Pages one group's history through one session.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example(source: &dyn chatgrep::source::HistorySource,
/// #                  session: &chatgrep::session::Session,
/// #                  group: &chatgrep::source::GroupInfo) -> Result<(), chatgrep::error::FetchError> {
/// use chatgrep::config::SearchConfig;
/// use chatgrep::core::pager::RateLimitedPager;
///
/// let config = SearchConfig::new("rust").with_batch_size(50).with_message_cap(200);
/// let mut pager = RateLimitedPager::new(source, session, group, &config);
///
/// while let Some(batch) = pager.fetch_next_batch().await? {
///     println!("{} messages, cursor at {}", batch.len(), pager.cursor().offset);
/// }
/// # Ok(())
/// # }
/// ```
pub struct RateLimitedPager<'a, S: HistorySource + ?Sized> {
    source: &'a S,
    session: &'a Session,
    group: &'a GroupInfo,
    cursor: FetchCursor,
    window: DateRange,
    batch_size: usize,
    delay: Duration,
}

impl<'a, S: HistorySource + ?Sized> RateLimitedPager<'a, S> {
    pub fn new(source: &'a S, session: &'a Session, group: &'a GroupInfo, config: &SearchConfig) -> Self {
        Self {
            source,
            session,
            group,
            cursor: FetchCursor::new(config.message_cap),
            window: config.date_range,
            batch_size: config.batch_size.max(1),
            delay: config.delay(),
        }
    }

    pub fn cursor(&self) -> &FetchCursor {
        &self.cursor
    }

    /// Stops pagination early, e.g. once the date window has been passed.
    pub fn finish(&mut self) {
        self.cursor.exhausted = true;
    }

    /// Fetches the next batch, newest first.
    ///
    /// Returns `Ok(None)` once pagination is over. After an error the pager
    /// is exhausted as well.
    pub async fn fetch_next_batch(&mut self) -> Result<Option<Vec<MessageRecord>>, FetchError> {
        if self.cursor.exhausted || self.cursor.cap_reached() {
            self.cursor.exhausted = true;
            return Ok(None);
        }

        // Messages newer than the window do not count, so only shorten the
        // request when every fetched message could count
        let limit = match self.cursor.remaining() {
            Some(left) if self.window.to.is_none() => left.min(self.batch_size),
            _ => self.batch_size,
        };
        let offset = self.cursor.offset;
        let (source, session, group) = (self.source, self.session, self.group);

        let fetched = retry_rate_limited("get_history", move || {
            source.get_history(session, group, offset, limit)
        })
        .await;

        let mut batch = match fetched {
            Ok(batch) => batch,
            Err(err) => {
                self.cursor.exhausted = true;
                return Err(err);
            }
        };

        // Anything not strictly older than the cursor was already seen
        if offset > 0 {
            batch.retain(|m| m.id < offset);
        }
        batch.truncate(limit);
        let counted = self.cut_at_cap(&mut batch);

        let Some(oldest) = batch.iter().map(|m| m.id).min() else {
            debug!(group = self.group.id, offset, "history exhausted");
            self.cursor.exhausted = true;
            return Ok(None);
        };

        self.cursor.offset = oldest;
        self.cursor.processed += counted;
        self.cursor.fetched += batch.len();
        self.cursor.batches += 1;

        // Id 0 would restart from the newest message
        if oldest == 0 || self.cursor.cap_reached() {
            self.cursor.exhausted = true;
        }

        debug!(
            group = self.group.id,
            session = %self.session.label,
            batch = batch.len(),
            offset = self.cursor.offset,
            processed = self.cursor.processed,
            fetched = self.cursor.fetched,
            "fetched batch"
        );

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(Some(batch))
    }

    /// Truncates `batch` after the in-window message that reaches the cap.
    /// Returns the number of in-window messages kept.
    fn cut_at_cap(&self, batch: &mut Vec<MessageRecord>) -> usize {
        let left = self.cursor.remaining().unwrap_or(usize::MAX);
        let mut counted = 0;
        for (i, msg) in batch.iter().enumerate() {
            if !self.window.contains(msg.timestamp) {
                continue;
            }
            counted += 1;
            if counted == left {
                batch.truncate(i + 1);
                break;
            }
        }
        counted
    }
}
