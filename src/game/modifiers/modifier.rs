use std::any::{Any, TypeId};
use std::fmt;

use bevy::prelude::*;

use super::context::ModifierContext;
use super::error::ModifierResult;
use super::timer::ModifierTimer;
use crate::game::types::ModifierId;

/// A single effect attached to one entity.
///
/// Hooks run synchronously inside the collection that owns the modifier. Anything that
/// changes authoritative entity state (movement and the like) must check
/// [`ModifierContext::is_local`] first; cosmetic changes may run on every peer.
pub trait Modifier: Any + Send + Sync {
    fn name(&self) -> &str;

    /// Excluded from the HUD summary when true.
    fn hide_on_ui(&self) -> bool {
        false
    }

    /// Runs exactly once, right after the modifier is attached.
    fn on_activate(&mut self, _ctx: &mut ModifierContext) {}

    /// Runs exactly once, right before the modifier is detached. Must undo every
    /// persistent effect of `on_activate`.
    fn on_deactivate(&mut self, _ctx: &mut ModifierContext) {}

    fn fixed_update(&mut self, _ctx: &mut ModifierContext) -> ModifierResult<()> {
        Ok(())
    }

    fn update(&mut self, _ctx: &mut ModifierContext) -> ModifierResult<()> {
        Ok(())
    }

    /// Timed modifiers return their countdown here.
    fn timer(&self) -> Option<&ModifierTimer> {
        None
    }

    fn timer_mut(&mut self) -> Option<&mut ModifierTimer> {
        None
    }

    /// Runs once when the countdown reaches its duration.
    fn on_timer_complete(&mut self, _ctx: &mut ModifierContext) {}
}

impl dyn Modifier {
    pub fn downcast_ref<M: Modifier>(&self) -> Option<&M> {
        (self as &dyn Any).downcast_ref::<M>()
    }

    pub fn downcast_mut<M: Modifier>(&mut self) -> Option<&mut M> {
        (self as &mut dyn Any).downcast_mut::<M>()
    }
}

/// Type-like key of a modifier kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifierKind {
    type_id: TypeId,
    name: &'static str,
}

impl ModifierKind {
    pub fn of<M: Modifier>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            name: short_type_name(std::any::type_name::<M>()),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}

/// Addresses one attached instance. Stale once that instance is detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifierHandle {
    pub entity: Entity,
    pub id: ModifierId,
    pub instance: u64,
}

/// A modifier attached to a collection, with the identity assigned at attach time.
pub struct ActiveModifier {
    pub(crate) id: ModifierId,
    pub(crate) kind: ModifierKind,
    pub(crate) owner: Entity,
    pub(crate) instance: u64,
    pub(crate) modifier: Box<dyn Modifier>,
}

impl ActiveModifier {
    pub fn id(&self) -> ModifierId {
        self.id
    }

    pub fn kind(&self) -> ModifierKind {
        self.kind
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn handle(&self) -> ModifierHandle {
        ModifierHandle {
            entity: self.owner,
            id: self.id,
            instance: self.instance,
        }
    }

    pub fn name(&self) -> &str {
        self.modifier.name()
    }

    pub fn hide_on_ui(&self) -> bool {
        self.modifier.hide_on_ui()
    }

    pub fn timer(&self) -> Option<&ModifierTimer> {
        self.modifier.timer()
    }

    pub fn modifier(&self) -> &dyn Modifier {
        self.modifier.as_ref()
    }

    pub fn downcast_ref<M: Modifier>(&self) -> Option<&M> {
        self.modifier.downcast_ref::<M>()
    }

    pub fn downcast_mut<M: Modifier>(&mut self) -> Option<&mut M> {
        self.modifier.downcast_mut::<M>()
    }
}

impl fmt::Debug for ActiveModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveModifier")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("owner", &self.owner)
            .field("instance", &self.instance)
            .field("name", &self.modifier.name())
            .finish()
    }
}
