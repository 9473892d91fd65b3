//! Inbound event and per-request context handed to gates

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use scopegate_common::MANAGER_STATE_KEY;

use crate::control::Control;

/// Role of the sender within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenderRole {
    Owner,
    Admin,
    #[default]
    Member,
}

impl SenderRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, SenderRole::Owner | SenderRole::Admin)
    }
}

/// Inbound chat event, reduced to what toggle resolution needs
#[derive(Debug, Clone, Default)]
pub struct Event {
    /// Group id, `0` for private conversations
    pub group_id: i64,
    pub user_id: i64,
    pub sender_role: SenderRole,
    /// Whether the message is addressed to the bot
    pub to_me: bool,
}

impl Event {
    pub fn group(group_id: i64, user_id: i64) -> Self {
        Self {
            group_id,
            user_id,
            ..Default::default()
        }
    }

    pub fn private(user_id: i64) -> Self {
        Self {
            group_id: 0,
            user_id,
            to_me: true,
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: SenderRole) -> Self {
        self.sender_role = role;
        self
    }

    pub fn with_to_me(mut self, to_me: bool) -> Self {
        self.to_me = to_me;
        self
    }

    pub fn is_group(&self) -> bool {
        self.group_id != 0
    }
}

/// Per-request context shared by every rule and handler an event passes through
#[derive(Default)]
pub struct EventContext {
    pub event: Event,
    state: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl EventContext {
    pub fn new(event: Event) -> Self {
        Self {
            event,
            state: HashMap::new(),
        }
    }

    pub fn insert_state<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: Arc<T>) {
        self.state.insert(key.into(), value);
    }

    /// Typed state lookup; `None` when absent or stored with another type
    pub fn state<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.state
            .get(key)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// The control whose gate last admitted or rejected this event
    pub fn control(&self) -> Option<Arc<Control>> {
        self.state::<Control>(MANAGER_STATE_KEY)
    }
}

impl std::fmt::Debug for EventContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventContext")
            .field("event", &self.event)
            .field("state_keys", &self.state.keys().collect::<Vec<_>>())
            .finish()
    }
}
