use std::time::Duration;

use bevy::prelude::*;

use super::collection::{ModifierCollection, deactivate_detached, fixed_tick, frame_tick};
use crate::config::tuning::Tuning;
use crate::game::components::LocalControl;

fn collection_owners(world: &mut World) -> Vec<Entity> {
    world
        .query_filtered::<Entity, With<ModifierCollection>>()
        .iter(world)
        .collect()
}

/// FixedUpdate: one step of every collection, timers advance by `Tuning::dt`.
pub fn fixed_update_modifiers(world: &mut World) {
    let dt = world
        .get_resource::<Tuning>()
        .map_or_else(|| Tuning::default().dt, |t| t.dt);
    for entity in collection_owners(world) {
        fixed_tick(world, entity, dt);
    }
}

/// Keeps `Time<Fixed>` stepping at `Tuning::dt`, so timers stay in wall-clock seconds
/// after the tuning changes.
pub fn sync_fixed_timestep(tuning: Res<Tuning>, time: Option<ResMut<Time<Fixed>>>) {
    let Some(mut time) = time else {
        return;
    };
    if !tuning.dt.is_finite() || tuning.dt <= 0.0 {
        return;
    }
    let step = Duration::from_secs_f32(tuning.dt);
    if time.timestep() != step {
        time.set_timestep(step);
        debug!("Fixed timestep set to {:.4}s", tuning.dt);
    }
}

/// Update: per-frame hooks and the HUD summary.
pub fn update_modifiers(world: &mut World) {
    for entity in collection_owners(world) {
        frame_tick(world, entity);
    }
}

/// Entity destroyed (or collection removed): deactivate whatever is still attached.
pub fn deactivate_on_remove(
    remove: On<Remove, ModifierCollection>,
    mut collections: Query<(&mut ModifierCollection, Has<LocalControl>)>,
    mut commands: Commands,
) {
    let entity = remove.entity;
    let Ok((mut collection, local)) = collections.get_mut(entity) else {
        return;
    };
    let modifiers = collection.take_all();
    if modifiers.is_empty() {
        return;
    }
    debug!("Deactivating {} modifiers of removed entity {entity}", modifiers.len());
    commands.queue(move |world: &mut World| {
        deactivate_detached(world, entity, local, modifiers);
    });
}
