// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Server-side session store. One task owns the session map; handlers talk to it
//! over a channel. Each session holds a JSON snapshot of the caller's [`Identity`].

use crate::config::SessionConfig;
use crate::iam::Identity;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

const SESSION_CHANNEL_DEPTH: usize = 256;

#[derive(Debug)]
pub enum SessionError {
    Unavailable,
    Snapshot(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Unavailable => write!(f, "Session store is not running"),
            SessionError::Snapshot(msg) => write!(f, "Failed to snapshot identity: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Clone)]
pub struct SessionStore {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionStore {
    /// Spawns the owning task; must be called from inside a tokio runtime.
    pub fn new(config: &SessionConfig) -> Self {
        let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_DEPTH);
        let idle_timeout = Duration::from_secs(config.idle_timeout_minutes.saturating_mul(60));
        let max_sessions = config.max_sessions;
        tokio::spawn(async move {
            let mut state = SessionState::new(idle_timeout, max_sessions);
            state.run(receiver).await;
        });
        Self { sender }
    }

    /// Starts a new session for `identity` and returns its id. The previous session
    /// of the same browser, if any, stops being valid.
    pub async fn establish(
        &self,
        previous: Option<String>,
        identity: &Identity,
    ) -> Result<String, SessionError> {
        let snapshot =
            serde_json::to_string(identity).map_err(|e| SessionError::Snapshot(e.to_string()))?;
        let (reply, receive) = oneshot::channel();
        let command = SessionCommand::Establish {
            previous,
            account_id: identity.account_id,
            snapshot,
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return Err(SessionError::Unavailable);
        }
        receive.await.map_err(|_| SessionError::Unavailable)
    }

    /// The identity held by a live session. Reading counts as activity.
    pub async fn current(&self, session_id: &str) -> Option<Identity> {
        let (reply, receive) = oneshot::channel();
        let command = SessionCommand::Current {
            session_id: session_id.to_string(),
            reply,
        };
        self.sender.send(command).await.ok()?;
        let snapshot = receive.await.ok()??;
        match serde_json::from_str(&snapshot) {
            Ok(identity) => Some(identity),
            Err(err) => {
                log::warn!("Discarding unreadable session snapshot: {}", err);
                if let Err(err) = self.clear(session_id).await {
                    log::warn!("Could not drop unreadable session: {}", err);
                }
                None
            }
        }
    }

    /// Rewrites the snapshot of every session belonging to the account.
    pub async fn refresh_account(&self, identity: &Identity) -> Result<usize, SessionError> {
        let snapshot =
            serde_json::to_string(identity).map_err(|e| SessionError::Snapshot(e.to_string()))?;
        let (reply, receive) = oneshot::channel();
        let command = SessionCommand::Refresh {
            account_id: identity.account_id,
            snapshot,
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return Err(SessionError::Unavailable);
        }
        receive.await.map_err(|_| SessionError::Unavailable)
    }

    /// Waits for queue room rather than dropping the command when the store is busy.
    pub async fn clear(&self, session_id: &str) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Clear {
                session_id: session_id.to_string(),
            })
            .await
            .map_err(|_| SessionError::Unavailable)
    }

    /// Ends every session of a deleted account.
    pub async fn revoke_account(&self, account_id: i16) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Revoke { account_id })
            .await
            .map_err(|_| SessionError::Unavailable)
    }
}

enum SessionCommand {
    Establish {
        previous: Option<String>,
        account_id: i16,
        snapshot: String,
        reply: oneshot::Sender<String>,
    },
    Current {
        session_id: String,
        reply: oneshot::Sender<Option<String>>,
    },
    Refresh {
        account_id: i16,
        snapshot: String,
        reply: oneshot::Sender<usize>,
    },
    Clear {
        session_id: String,
    },
    Revoke {
        account_id: i16,
    },
}

struct SessionRecord {
    account_id: i16,
    snapshot: String,
    last_seen: Instant,
}

struct SessionState {
    sessions: HashMap<String, SessionRecord>,
    session_order: VecDeque<String>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl SessionState {
    fn new(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            session_order: VecDeque::new(),
            idle_timeout,
            max_sessions,
        }
    }

    async fn run(&mut self, mut receiver: mpsc::Receiver<SessionCommand>) {
        while let Some(command) = receiver.recv().await {
            let now = Instant::now();
            match command {
                SessionCommand::Establish {
                    previous,
                    account_id,
                    snapshot,
                    reply,
                } => {
                    let _ = reply.send(self.establish(previous, account_id, snapshot, now));
                }
                SessionCommand::Current { session_id, reply } => {
                    let _ = reply.send(self.current(&session_id, now));
                }
                SessionCommand::Refresh {
                    account_id,
                    snapshot,
                    reply,
                } => {
                    let _ = reply.send(self.refresh(account_id, &snapshot));
                }
                SessionCommand::Clear { session_id } => {
                    self.clear(&session_id);
                }
                SessionCommand::Revoke { account_id } => {
                    self.revoke(account_id);
                }
            }
        }
    }

    fn establish(
        &mut self,
        previous: Option<String>,
        account_id: i16,
        snapshot: String,
        now: Instant,
    ) -> String {
        self.cleanup_expired(now);
        if let Some(previous) = previous {
            self.clear(&previous);
        }

        let session_id = generate_session_id();
        self.sessions.insert(
            session_id.clone(),
            SessionRecord {
                account_id,
                snapshot,
                last_seen: now,
            },
        );
        self.session_order.push_back(session_id.clone());
        self.prune_overflow();
        session_id
    }

    fn current(&mut self, session_id: &str, now: Instant) -> Option<String> {
        let expired = match self.sessions.get_mut(session_id) {
            Some(record) if now.duration_since(record.last_seen) < self.idle_timeout => {
                record.last_seen = now;
                return Some(record.snapshot.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.clear(session_id);
        }
        None
    }

    fn refresh(&mut self, account_id: i16, snapshot: &str) -> usize {
        let mut updated = 0;
        for record in self.sessions.values_mut() {
            if record.account_id == account_id {
                record.snapshot = snapshot.to_string();
                updated += 1;
            }
        }
        updated
    }

    fn clear(&mut self, session_id: &str) {
        if self.sessions.remove(session_id).is_some() {
            self.session_order.retain(|id| id != session_id);
        }
    }

    fn revoke(&mut self, account_id: i16) {
        self.sessions
            .retain(|_, record| record.account_id != account_id);
        self.session_order
            .retain(|id| self.sessions.contains_key(id));
    }

    fn cleanup_expired(&mut self, now: Instant) {
        let idle_timeout = self.idle_timeout;
        self.sessions
            .retain(|_, record| now.duration_since(record.last_seen) < idle_timeout);
        self.session_order
            .retain(|id| self.sessions.contains_key(id));
    }

    fn prune_overflow(&mut self) {
        while self.sessions.len() > self.max_sessions {
            if let Some(oldest) = self.session_order.pop_front() {
                self.sessions.remove(&oldest);
            } else {
                break;
            }
        }
    }
}

fn generate_session_id() -> String {
    let mut bytes = [0u8; 24];
    OsRng.fill_bytes(&mut bytes);
    format!("nds_{}", URL_SAFE_NO_PAD.encode(bytes))
}
