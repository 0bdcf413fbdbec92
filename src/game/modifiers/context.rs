use bevy::ecs::component::Mutable;
use bevy::prelude::*;

use crate::game::components::{LocalControl, Movable, Outline, Player, PlayerRole};
use crate::game::roles::RoleRegistry;

/// What a modifier hook can see and touch while it runs.
///
/// Hooks get the whole world, so a capability taken away in `on_activate` can be given
/// back synchronously in `on_deactivate`. The owning collection is busy for the
/// duration of the hook; add/remove requests against it are queued until the hook
/// returns.
pub struct ModifierContext<'w> {
    world: &'w mut World,
    entity: Entity,
    local: bool,
    remove_requested: bool,
}

impl<'w> ModifierContext<'w> {
    pub(crate) fn new(world: &'w mut World, entity: Entity, local: bool) -> Self {
        Self {
            world,
            entity,
            local,
            remove_requested: false,
        }
    }

    /// The entity the modifier is attached to.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// True when this peer is authoritative for the owning entity.
    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn world(&self) -> &World {
        self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }

    pub fn get<C: Component>(&self) -> Option<&C> {
        self.world.get::<C>(self.entity)
    }

    pub fn get_mut<C: Component<Mutability = Mutable>>(&mut self) -> Option<Mut<'_, C>> {
        self.world.get_mut::<C>(self.entity)
    }

    /// Grant or revoke movement. Ignored on peers without authority.
    pub fn set_movable(&mut self, movable: bool) {
        if !self.local {
            debug!("Ignoring movement change on remote entity {}", self.entity);
            return;
        }
        if let Some(mut m) = self.world.get_mut::<Movable>(self.entity) {
            m.0 = movable;
        }
    }

    /// Show or hide the cosmetic outline. Allowed on every peer.
    pub fn set_outline(&mut self, color: Option<Color>) {
        let Ok(mut entity) = self.world.get_entity_mut(self.entity) else {
            return;
        };
        if let Some(mut outline) = entity.get_mut::<Outline>() {
            if outline.0 != color {
                outline.0 = color;
            }
            return;
        }
        entity.insert(Outline(color));
    }

    /// Role key of the player this peer controls, if it has one.
    pub fn local_player_role(&mut self) -> Option<&'static str> {
        let role = self
            .world
            .query_filtered::<&PlayerRole, (With<Player>, With<LocalControl>)>()
            .iter(self.world)
            .next()
            .copied()?;
        let registry = self.world.get_resource::<RoleRegistry>()?;
        registry.get(role.0).map(|r| r.key)
    }

    /// Detach this modifier once the running pass is over. `on_deactivate` still runs.
    pub fn request_removal(&mut self) {
        self.remove_requested = true;
    }

    pub(crate) fn removal_requested(&self) -> bool {
        self.remove_requested
    }
}
