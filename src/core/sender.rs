//! Best-effort sender name resolution.
//!
//! Author lookups are a convenience, not a correctness requirement: a failed
//! lookup never aborts a batch. It degrades to the locale placeholder
//! ("Unknown" / "Неизвестно").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Locale;
use crate::core::pager::retry_rate_limited;
use crate::message::SenderRef;
use crate::session::Session;
use crate::source::HistorySource;

/// Name fields of a message author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl SenderProfile {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_first_name(mut self, name: impl Into<String>) -> Self {
        self.first_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_last_name(mut self, name: impl Into<String>) -> Self {
        self.last_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Formats `"First Last (@handle)"`, leaving out missing parts.
    ///
    /// Returns `None` when every part is missing or blank.
    ///
    /// ```
    /// use chatgrep::core::sender::SenderProfile;
    ///
    /// let full = SenderProfile::new().with_first_name("Ada").with_last_name("Lovelace").with_username("ada");
    /// assert_eq!(full.display_name().as_deref(), Some("Ada Lovelace (@ada)"));
    ///
    /// let handle_only = SenderProfile::new().with_username("ada");
    /// assert_eq!(handle_only.display_name().as_deref(), Some("@ada"));
    ///
    /// assert_eq!(SenderProfile::new().display_name(), None);
    /// ```
    pub fn display_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let handle = self
            .username
            .as_deref()
            .map(|u| u.trim().trim_start_matches('@'))
            .filter(|u| !u.is_empty());

        match (name.is_empty(), handle) {
            (false, Some(handle)) => Some(format!("{} (@{})", name, handle)),
            (false, None) => Some(name),
            (true, Some(handle)) => Some(format!("@{}", handle)),
            (true, None) => None,
        }
    }
}

/// Resolves and caches sender names for one session.
///
/// Lives as long as one session's task, so each author costs at most one
/// lookup per run on that session.
pub struct SenderResolver<'a, S: HistorySource + ?Sized> {
    source: &'a S,
    session: &'a Session,
    locale: Locale,
    cache: HashMap<SenderRef, String>,
}

impl<'a, S: HistorySource + ?Sized> SenderResolver<'a, S> {
    pub fn new(source: &'a S, session: &'a Session, locale: Locale) -> Self {
        Self {
            source,
            session,
            locale,
            cache: HashMap::new(),
        }
    }

    /// Returns the sender's display name or the locale placeholder.
    ///
    /// Flood waits are honored; every other failure yields the placeholder
    /// and is cached like a success.
    pub async fn resolve(&mut self, sender: Option<&SenderRef>) -> String {
        let Some(sender) = sender else {
            return self.locale.unknown_sender().to_string();
        };
        if let Some(name) = self.cache.get(sender) {
            return name.clone();
        }

        let (source, session) = (self.source, self.session);
        let name = match retry_rate_limited("get_sender", move || source.get_sender(session, sender)).await {
            Ok(profile) => profile.display_name(),
            Err(err) => {
                debug!(sender = %sender, error = %err, "sender lookup failed");
                None
            }
        }
        .unwrap_or_else(|| self.locale.unknown_sender().to_string());

        self.cache.insert(sender.clone(), name.clone());
        name
    }

    /// Number of distinct senders looked up so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageRecord;
    use crate::error::FetchError;
    use crate::link::GroupTarget;
    use crate::source::GroupInfo;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Directory {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl HistorySource for Directory {
        async fn resolve_group(&self, _: &Session, _: &GroupTarget) -> Result<GroupInfo, FetchError> {
            Ok(GroupInfo::new(1))
        }

        async fn get_history(
            &self,
            _: &Session,
            _: &GroupInfo,
            _: u64,
            _: usize,
        ) -> Result<Vec<MessageRecord>, FetchError> {
            Ok(Vec::new())
        }

        async fn get_sender(&self, _: &Session, sender: &SenderRef) -> Result<SenderProfile, FetchError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            match sender.as_str() {
                "user1" => Ok(SenderProfile::new().with_first_name("Ivan").with_username("ivan")),
                "user2" => Ok(SenderProfile::new()),
                _ => Err(FetchError::fatal("lookup exploded")),
            }
        }
    }

    fn directory() -> Directory {
        Directory {
            lookups: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_display_name_variants() {
        let last_only = SenderProfile::new().with_last_name("Smith");
        assert_eq!(last_only.display_name().as_deref(), Some("Smith"));

        let blank = SenderProfile::new().with_first_name("  ").with_username("");
        assert_eq!(blank.display_name(), None);

        let sigil = SenderProfile::new().with_first_name("A").with_username("@a");
        assert_eq!(sigil.display_name().as_deref(), Some("A (@a)"));
    }

    #[tokio::test]
    async fn test_resolve_and_cache() {
        let source = directory();
        let session = Session::authorized(1, "a");
        let mut resolver = SenderResolver::new(&source, &session, Locale::En);
        let user1 = SenderRef::new("user1");

        assert_eq!(resolver.resolve(Some(&user1)).await, "Ivan (@ivan)");
        assert_eq!(resolver.resolve(Some(&user1)).await, "Ivan (@ivan)");
        assert_eq!(source.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached(), 1);
    }

    #[tokio::test]
    async fn test_placeholders() {
        let source = directory();
        let session = Session::authorized(1, "a");
        let mut resolver = SenderResolver::new(&source, &session, Locale::Ru);

        assert_eq!(resolver.resolve(None).await, "Неизвестно");
        assert_eq!(resolver.resolve(Some(&SenderRef::new("user2"))).await, "Неизвестно");
        assert_eq!(resolver.resolve(Some(&SenderRef::new("broken"))).await, "Неизвестно");
    }
}
