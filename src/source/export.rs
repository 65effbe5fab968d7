//! Offline history provider over Telegram Desktop exports.
//!
//! The export directory holds one JSON export per group:
//!
//! - `<username>.json` for public groups, matched case-insensitively
//! - `invite_<hash>.json` for groups joined through an invite link
//!
//! Exports are loaded on first use and kept in memory for the lifetime of the
//! source. Sessions are authorized as soon as they are created.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::config::AccountConfig;
use crate::core::sender::SenderProfile;
use crate::error::{ChatgrepError, FetchError, Result};
use crate::link::{GroupRef, GroupTarget};
use crate::message::{MessageRecord, SenderRef};
use crate::parsing::telegram::{TelegramExport, parse_telegram_message};
use crate::session::{AuthState, Session, SessionLifecycle};
use crate::source::{GroupInfo, HistorySource};

/// One loaded export.
#[derive(Debug)]
struct ExportedChat {
    /// Ascending by id
    messages: Vec<MessageRecord>,
}

/// [`HistorySource`] and [`SessionLifecycle`] backed by a directory of exports.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example() -> chatgrep::Result<()> {
/// use chatgrep::source::ExportHistorySource;
///
/// // Every 5th history request answers with a 3 second flood wait
/// let source = ExportHistorySource::new("exports").with_flood_every(5, 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExportHistorySource {
    dir: PathBuf,
    flood: Option<(usize, u64)>,
    history_calls: AtomicUsize,
    next_session: AtomicU64,
    closed: AtomicUsize,
    chats: Mutex<HashMap<i64, Arc<ExportedChat>>>,
    senders: Mutex<HashMap<String, String>>,
}

impl ExportHistorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            flood: None,
            history_calls: AtomicUsize::new(0),
            next_session: AtomicU64::new(1),
            closed: AtomicUsize::new(0),
            chats: Mutex::new(HashMap::new()),
            senders: Mutex::new(HashMap::new()),
        }
    }

    /// Answers every `every`-th history request with a flood wait of `seconds`.
    ///
    /// `every` is at least 2 so the retried request always goes through.
    #[must_use]
    pub fn with_flood_every(mut self, every: usize, seconds: u64) -> Self {
        self.flood = Some((every.max(2), seconds));
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of sessions closed so far.
    pub fn closed_sessions(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    async fn find_export(&self, reference: &GroupRef) -> std::result::Result<PathBuf, FetchError> {
        let name = match reference {
            GroupRef::Invite(hash) => {
                let path = self.dir.join(format!("invite_{}.json", hash));
                return if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    Ok(path)
                } else {
                    Err(FetchError::unavailable(format!("invite link {} is invalid or expired", reference)))
                };
            }
            GroupRef::Username(name) => name,
        };

        let exact = self.dir.join(format!("{}.json", name));
        if tokio::fs::try_exists(&exact).await.unwrap_or(false) {
            return Ok(exact);
        }

        let wanted = format!("{}.json", name.to_lowercase());
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_to_fetch)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_to_fetch)? {
            if entry.file_name().to_string_lossy().to_lowercase() == wanted {
                return Ok(entry.path());
            }
        }

        Err(FetchError::unavailable(format!("no group with username {}", reference)))
    }

    fn remember(&self, id: i64, chat: ExportedChat, names: Vec<(String, String)>) -> Arc<ExportedChat> {
        let chat = Arc::new(chat);
        lock(&self.chats).insert(id, Arc::clone(&chat));
        lock(&self.senders).extend(names);
        chat
    }

    fn chat(&self, id: i64) -> Option<Arc<ExportedChat>> {
        lock(&self.chats).get(&id).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn io_to_fetch(err: io::Error) -> FetchError {
    if err.kind() == io::ErrorKind::NotFound {
        FetchError::unavailable(err.to_string())
    } else {
        FetchError::fatal(err.to_string())
    }
}

/// Stable id for exports that carry none.
fn fallback_id(path: &Path) -> i64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    path.hash(&mut hasher);
    -((hasher.finish() >> 1) as i64)
}

#[async_trait]
impl HistorySource for ExportHistorySource {
    async fn resolve_group(
        &self,
        _session: &Session,
        target: &GroupTarget,
    ) -> std::result::Result<GroupInfo, FetchError> {
        let path = self.find_export(&target.reference).await?;
        let content = tokio::fs::read_to_string(&path).await.map_err(io_to_fetch)?;
        let export: TelegramExport = serde_json::from_str(&content)
            .map_err(|e| FetchError::fatal(format!("{}: {}", path.display(), e)))?;

        let id = export.id.unwrap_or_else(|| fallback_id(&path));
        let mut names = Vec::new();
        let mut messages: Vec<MessageRecord> = Vec::with_capacity(export.messages.len());
        for raw in &export.messages {
            let Some(record) = parse_telegram_message(raw) else {
                continue;
            };
            if let (Some(sender), Some(name)) = (&record.sender, &raw.from) {
                names.push((sender.as_str().to_string(), name.clone()));
            }
            messages.push(record);
        }
        messages.sort_by_key(|m| m.id);
        messages.dedup_by_key(|m| m.id);

        debug!(path = %path.display(), messages = messages.len(), "export loaded");
        self.remember(id, ExportedChat { messages }, names);

        let mut info = GroupInfo::new(id);
        if let Some(name) = export.name {
            info = info.with_title(name);
        }
        if let Some(username) = target.reference.username() {
            info = info.with_username(username);
        }
        Ok(info)
    }

    async fn get_history(
        &self,
        _session: &Session,
        group: &GroupInfo,
        before_id: u64,
        limit: usize,
    ) -> std::result::Result<Vec<MessageRecord>, FetchError> {
        if let Some((every, seconds)) = self.flood {
            let call = self.history_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call % every == 0 {
                return Err(FetchError::RateLimited { seconds });
            }
        }

        let chat = self
            .chat(group.id)
            .ok_or_else(|| FetchError::unavailable(format!("group {} was never resolved", group.id)))?;

        Ok(chat
            .messages
            .iter()
            .rev()
            .filter(|m| before_id == 0 || m.id < before_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_sender(
        &self,
        _session: &Session,
        sender: &SenderRef,
    ) -> std::result::Result<SenderProfile, FetchError> {
        lock(&self.senders)
            .get(sender.as_str())
            .map(|name| SenderProfile::new().with_first_name(name.clone()))
            .ok_or_else(|| FetchError::unavailable(format!("unknown sender {}", sender)))
    }
}

#[async_trait]
impl SessionLifecycle for ExportHistorySource {
    async fn create_session(&self, account: &AccountConfig) -> Result<Session> {
        if !account.is_complete() {
            return Err(ChatgrepError::auth(account.label(), "missing api_id, api_hash or phone"));
        }
        let id = self.next_session.fetch_add(1, Ordering::SeqCst);
        Ok(Session::authorized(id, account.label()))
    }

    async fn submit_code(&self, session: Session, _code: &str) -> Result<Session> {
        Ok(session.with_state(AuthState::Authorized))
    }

    async fn submit_password(&self, session: Session, _password: &str) -> Result<Session> {
        Ok(session.with_state(AuthState::Authorized))
    }

    async fn close(&self, session: &Session) {
        debug!(session = %session.label, "session closed");
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::parse_link;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_export(dir: &Path, file: &str, count: u64) {
        let messages: Vec<_> = (1..=count)
            .map(|id| {
                json!({
                    "id": id,
                    "type": "message",
                    "date_unixtime": (1_700_000_000 + id * 60).to_string(),
                    "from": "Ivan Petrov",
                    "from_id": "user7",
                    "text": format!("message {}", id),
                })
            })
            .collect();
        let export = json!({"name": "Rust Chat", "type": "public_supergroup", "id": 99, "messages": messages});
        std::fs::write(dir.join(file), export.to_string()).unwrap();
    }

    #[tokio::test]
    async fn test_resolve_and_page() {
        let dir = TempDir::new().unwrap();
        write_export(dir.path(), "RustChat.json", 5);
        let source = ExportHistorySource::new(dir.path());
        let session = Session::authorized(1, "a");

        let group = source
            .resolve_group(&session, &parse_link("https://t.me/rustchat").unwrap())
            .await
            .unwrap();
        assert_eq!(group.id, 99);
        assert_eq!(group.title.as_deref(), Some("Rust Chat"));
        assert_eq!(group.permalink(3).as_deref(), Some("https://t.me/rustchat/3"));

        let first = source.get_history(&session, &group, 0, 2).await.unwrap();
        assert_eq!(first.iter().map(|m| m.id).collect::<Vec<_>>(), vec![5, 4]);
        let rest = source.get_history(&session, &group, 4, 10).await.unwrap();
        assert_eq!(rest.iter().map(|m| m.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        let profile = source.get_sender(&session, &SenderRef::new("user7")).await.unwrap();
        assert_eq!(profile.display_name().as_deref(), Some("Ivan Petrov"));
    }

    #[tokio::test]
    async fn test_missing_group_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let source = ExportHistorySource::new(dir.path());
        let session = Session::authorized(1, "a");

        let err = source
            .resolve_group(&session, &parse_link("@nobody").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unavailable(_)));

        let err = source
            .resolve_group(&session, &parse_link("t.me/joinchat/XyZ").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_invite_export_and_broken_json() {
        let dir = TempDir::new().unwrap();
        write_export(dir.path(), "invite_XyZ.json", 1);
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        let source = ExportHistorySource::new(dir.path());
        let session = Session::authorized(1, "a");

        let group = source
            .resolve_group(&session, &parse_link("https://t.me/+XyZ").unwrap())
            .await
            .unwrap();
        assert_eq!(group.permalink(1), None);

        let err = source
            .resolve_group(&session, &parse_link("@broken").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Fatal(_)));
    }

    #[tokio::test]
    async fn test_flood_simulation() {
        let dir = TempDir::new().unwrap();
        write_export(dir.path(), "g.json", 3);
        let source = ExportHistorySource::new(dir.path()).with_flood_every(2, 4);
        let session = Session::authorized(1, "a");
        let group = source.resolve_group(&session, &parse_link("@g").unwrap()).await.unwrap();

        assert!(source.get_history(&session, &group, 0, 1).await.is_ok());
        assert_eq!(
            source.get_history(&session, &group, 0, 1).await,
            Err(FetchError::RateLimited { seconds: 4 })
        );
        assert!(source.get_history(&session, &group, 0, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_sessions_authorize_immediately() {
        let source = ExportHistorySource::new(".");
        let session = source
            .create_session(&AccountConfig::new("1", "hash", "+100"))
            .await
            .unwrap();
        assert!(session.is_authorized());

        source.close(&session).await;
        assert_eq!(source.closed_sessions(), 1);

        assert!(source.create_session(&AccountConfig::new("", "", "")).await.is_err());
    }
}
