//! In-memory registry of selection sessions.
//!
//! Each session is one user's tree and selection. Nothing is persisted; a
//! restart starts from an empty registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use selector_core::{Selection, SelectionPolicy, Session};

use crate::client::RequestSlots;

/// A session plus its registry metadata.
#[derive(Debug)]
pub struct SessionEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub session: Session,
    /// In-flight backend requests started for this session.
    pub requests: RequestSlots,
}

/// What the API reports about a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub enforce_xor: bool,
    /// Root feature id, if a tree is loaded.
    pub root: Option<String>,
    pub feature_count: usize,
    pub selection: Selection,
    pub expanded: Vec<String>,
    pub constraints: Vec<Value>,
    /// `constraints` in propositional form, where they parse.
    pub constraint_logic: Vec<String>,
}

impl From<&SessionEntry> for SessionView {
    fn from(entry: &SessionEntry) -> Self {
        let session = &entry.session;
        Self {
            id: entry.id,
            created_at: entry.created_at,
            enforce_xor: session.policy().enforce_xor,
            root: session.tree().map(|tree| tree.root().id.clone()),
            feature_count: session.tree().map_or(0, |tree| tree.len()),
            selection: session.selection().clone(),
            expanded: session.expanded().iter().cloned().collect(),
            constraints: session.constraints().to_vec(),
            constraint_logic: session.constraint_logic(),
        }
    }
}

pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    policy: SelectionPolicy,
}

impl SessionStore {
    /// New sessions start with `policy`.
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            policy,
        }
    }

    pub fn create(&self) -> SessionView {
        let entry = SessionEntry {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            session: Session::new(self.policy),
            requests: RequestSlots::default(),
        };
        let view = SessionView::from(&entry);
        tracing::info!(session = %entry.id, "Created session");
        self.sessions
            .lock()
            .expect("session store lock poisoned")
            .insert(entry.id, entry);
        view
    }

    /// Run `f` against a session. `None` if the id is unknown.
    pub fn with_session<T>(&self, id: Uuid, f: impl FnOnce(&mut SessionEntry) -> T) -> Option<T> {
        let mut sessions = self.sessions.lock().expect("session store lock poisoned");
        sessions.get_mut(&id).map(f)
    }

    pub fn view(&self, id: Uuid) -> Option<SessionView> {
        self.with_session(id, |entry| SessionView::from(&*entry))
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.sessions
            .lock()
            .expect("session store lock poisoned")
            .remove(&id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            policy: self.policy,
        }
    }
}
