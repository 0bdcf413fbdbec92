use bevy::prelude::*;

use crate::game::events::ModifierEvent;
use crate::game::modifiers::ModifierRegistry;
use crate::game::modifiers::registry::seal_registry;
use crate::config::tuning::Tuning;
use crate::game::modifiers::systems::{
    deactivate_on_remove, fixed_update_modifiers, sync_fixed_timestep, update_modifiers,
};

/// Where the modifier passes run. Gameplay that reacts to modifiers orders against these.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModifierSet {
    /// FixedUpdate: `fixed_update` hooks and timers.
    Tick,
    /// Update: `update` hooks and the HUD summary.
    Frame,
}

pub struct ModifierPlugin;

impl Plugin for ModifierPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModifierRegistry>();
        app.add_message::<ModifierEvent>();

        app.add_systems(FixedUpdate, fixed_update_modifiers.in_set(ModifierSet::Tick));
        app.add_systems(Update, update_modifiers.in_set(ModifierSet::Frame));
        app.add_systems(
            Update,
            sync_fixed_timestep
                .run_if(resource_exists_and_changed::<Tuning>)
                .before(ModifierSet::Frame),
        );

        // Kinds register while the app is built; ids are final once startup is over.
        app.add_systems(PostStartup, seal_registry);

        app.add_observer(deactivate_on_remove);
    }
}
