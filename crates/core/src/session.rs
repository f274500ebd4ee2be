//! Per-session state: the loaded document context and the conversation so far.

use crate::models::{ConversationTurn, SessionContext};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    context: Option<SessionContext>,
    history: Vec<ConversationTurn>,
    in_flight: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            context: None,
            history: Vec::new(),
            in_flight: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Stores `context` only if none is loaded yet. Returns whether it was stored.
    pub fn set_context_once(&mut self, context: SessionContext) -> bool {
        if self.context.is_some() {
            return false;
        }
        self.context = Some(context);
        true
    }

    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn append_turn(&mut self, turn: ConversationTurn) {
        self.history.push(turn);
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Drops the loaded document and the conversation.
    pub fn reset(&mut self) {
        self.context = None;
        self.history.clear();
    }

    /// Marks an action as running. Returns false if one already is.
    pub fn try_begin_action(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn finish_action(&mut self) {
        self.in_flight = false;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }
}

/// Sessions keyed by id, for hosts that serve more than one user at a time.
///
/// Closures passed to [`SessionRegistry::with_session`] run while the entry is
/// locked, so they must not block or await.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> SessionId {
        let session = Session::new();
        let id = session.id();
        self.sessions.insert(id, session);
        id
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn with_session<R>(&self, id: &SessionId, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    /// Removes the session unless an action is running on it. Returns `None`
    /// for an unknown id and `Some(false)` when the session is busy.
    pub fn remove_idle(&self, id: &SessionId) -> Option<bool> {
        if self
            .sessions
            .remove_if(id, |_, session| !session.is_busy())
            .is_some()
        {
            return Some(true);
        }
        self.contains(id).then_some(false)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
