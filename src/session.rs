//! Session lifecycle boundary.
//!
//! Signing in, answering verification challenges and disconnecting belong to
//! the messaging client, not to this crate. [`SessionLifecycle`] is the seam a
//! client implements; the rest of the crate only looks at a session's
//! [`AuthState`] tag.
//!
//! [`authorize_accounts`] walks every configured account through the flow and
//! returns the sessions that ended up authorized.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::AccountConfig;
use crate::error::{ChatgrepError, Result};

/// Authorization state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthState {
    Unauthenticated,
    /// A login code was sent and must be submitted
    AwaitingCode,
    /// Two-step verification password required
    AwaitingPassword,
    Authorized,
    Banned,
    Expired,
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::AwaitingCode => "awaiting code",
            AuthState::AwaitingPassword => "awaiting 2FA password",
            AuthState::Authorized => "authorized",
            AuthState::Banned => "banned",
            AuthState::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Handle to one account identity.
///
/// `id` is whatever the client needs to find its connection again; the
/// pipeline never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    pub id: u64,
    pub label: String,
    pub state: AuthState,
}

impl Session {
    pub fn new(id: u64, label: impl Into<String>, state: AuthState) -> Self {
        Self {
            id,
            label: label.into(),
            state,
        }
    }

    /// Creates an already authorized session.
    pub fn authorized(id: u64, label: impl Into<String>) -> Self {
        Self::new(id, label, AuthState::Authorized)
    }

    pub fn is_authorized(&self) -> bool {
        self.state == AuthState::Authorized
    }

    #[must_use]
    pub fn with_state(mut self, state: AuthState) -> Self {
        self.state = state;
        self
    }
}

/// Sign-in and disconnect operations of a messaging client.
#[async_trait]
pub trait SessionLifecycle: Send + Sync {
    /// Connects with the account's credentials.
    ///
    /// The returned session is either authorized or waiting on a challenge.
    async fn create_session(&self, account: &AccountConfig) -> Result<Session>;

    /// Answers an [`AuthState::AwaitingCode`] challenge.
    async fn submit_code(&self, session: Session, code: &str) -> Result<Session>;

    /// Answers an [`AuthState::AwaitingPassword`] challenge.
    async fn submit_password(&self, session: Session, password: &str) -> Result<Session>;

    /// Disconnects. Must be safe to call on any state.
    async fn close(&self, session: &Session);
}

/// Supplies login codes during [`authorize_accounts`].
#[async_trait]
pub trait CodeSource: Send + Sync {
    /// Returns the code sent to `account`, or `None` to give up on it.
    async fn code_for(&self, account: &AccountConfig) -> Option<String>;
}

/// A [`CodeSource`] that never has a code.
///
/// Useful with providers whose sessions are authorized on creation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCodes;

#[async_trait]
impl CodeSource for NoCodes {
    async fn code_for(&self, _account: &AccountConfig) -> Option<String> {
        None
    }
}

/// Sessions that signed in, and the accounts that did not.
#[derive(Debug, Default)]
pub struct AuthOutcome {
    pub sessions: Vec<Session>,
    pub failures: Vec<ChatgrepError>,
}

/// Drives each complete account through sign-in.
///
/// Accounts with missing credentials are skipped. Failed accounts have their
/// half-open session closed and are reported in [`AuthOutcome::failures`];
/// they never abort the other accounts.
pub async fn authorize_accounts<L, C>(lifecycle: &L, accounts: &[AccountConfig], codes: &C) -> AuthOutcome
where
    L: SessionLifecycle + ?Sized,
    C: CodeSource + ?Sized,
{
    let mut outcome = AuthOutcome::default();

    for account in accounts.iter().filter(|a| a.is_complete()) {
        match authorize_one(lifecycle, account, codes).await {
            Ok(session) => {
                info!(account = account.label(), "session authorized");
                outcome.sessions.push(session);
            }
            Err(err) => {
                warn!(account = account.label(), error = %err, "account skipped");
                outcome.failures.push(err);
            }
        }
    }

    outcome
}

async fn authorize_one<L, C>(lifecycle: &L, account: &AccountConfig, codes: &C) -> Result<Session>
where
    L: SessionLifecycle + ?Sized,
    C: CodeSource + ?Sized,
{
    let mut session = lifecycle.create_session(account).await?;

    if session.state == AuthState::AwaitingCode {
        let Some(code) = codes.code_for(account).await else {
            lifecycle.close(&session).await;
            return Err(ChatgrepError::auth(account.label(), "verification code required"));
        };
        let submit = lifecycle.submit_code(session.clone(), &code);
        session = submit_or_close(lifecycle, &session, submit).await?;
    }

    if session.state == AuthState::AwaitingPassword {
        let Some(password) = account.password.as_deref().filter(|p| !p.is_empty()) else {
            lifecycle.close(&session).await;
            return Err(ChatgrepError::auth(
                account.label(),
                "two-step verification password required",
            ));
        };
        let submit = lifecycle.submit_password(session.clone(), password);
        session = submit_or_close(lifecycle, &session, submit).await?;
    }

    if session.is_authorized() {
        Ok(session)
    } else {
        lifecycle.close(&session).await;
        Err(ChatgrepError::auth(account.label(), format!("session is {}", session.state)))
    }
}

/// Awaits a challenge answer, closing `pending` if the client rejects it.
async fn submit_or_close<L, F>(lifecycle: &L, pending: &Session, submit: F) -> Result<Session>
where
    L: SessionLifecycle + ?Sized,
    F: std::future::Future<Output = Result<Session>>,
{
    match submit.await {
        Ok(session) => Ok(session),
        Err(err) => {
            lifecycle.close(pending).await;
            Err(err)
        }
    }
}
