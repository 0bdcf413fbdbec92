use bevy::prelude::*;

use super::types::RoleId;

// ── Marker components ───────────────────────────────────────────────

#[derive(Component)]
pub struct Player;

/// Authority marker: this peer drives gameplay state for the entity.
///
/// Timers only advance, and movement only changes, on entities carrying it.
#[derive(Component)]
pub struct LocalControl;

#[derive(Component)]
pub struct Dead;

// ── Player state ────────────────────────────────────────────────────

/// Movement permission. Authoritative state, only mutated under local control.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movable(pub bool);

impl Default for Movable {
    fn default() -> Self {
        Self(true)
    }
}

/// Cosmetic outline. Every peer may toggle it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Outline(pub Option<Color>);

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerRole(pub RoleId);

/// Display name shown next to the player.
#[derive(Component, Debug, Clone)]
pub struct PlayerName(pub String);
