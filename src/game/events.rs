use bevy::prelude::*;

use super::modifiers::{ModifierHandle, ModifierKind};
use super::options::NetData;

/// Modifier lifecycle transitions, in the order they happened.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum ModifierEvent {
    Added {
        handle: ModifierHandle,
        kind: ModifierKind,
    },
    Removed {
        handle: ModifierHandle,
        kind: ModifierKind,
    },
    TimerCompleted {
        handle: ModifierHandle,
        kind: ModifierKind,
    },
}

impl ModifierEvent {
    pub fn handle(&self) -> ModifierHandle {
        match self {
            ModifierEvent::Added { handle, .. }
            | ModifierEvent::Removed { handle, .. }
            | ModifierEvent::TimerCompleted { handle, .. } => *handle,
        }
    }
}

// ── Option sync ─────────────────────────────────────────────────────

/// Ask for every option value to be sent to `target` (`None` = every peer).
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptionSync {
    pub target: Option<Entity>,
}

/// One outgoing chunk. The transport picks these up and delivers them.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct SyncOptions {
    pub target: Option<Entity>,
    pub chunk: Vec<NetData>,
}

/// One chunk delivered by the transport.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct ReceivedOptions {
    pub data: Vec<NetData>,
}

/// Option values changed after a sync was applied.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionsChanged {
    pub applied: usize,
}
