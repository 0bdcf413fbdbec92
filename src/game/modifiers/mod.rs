pub mod collection;
pub mod context;
pub mod error;
pub mod modifier;
pub mod registry;
pub mod systems;
pub mod timer;

use bevy::prelude::*;

pub use collection::{ModifierCollection, ModifierCommandsExt, ModifierWorldExt, RemoveTarget};
pub use context::ModifierContext;
pub use error::{ModifierError, ModifierResult};
pub use modifier::{ActiveModifier, Modifier, ModifierHandle, ModifierKind};
pub use registry::ModifierRegistry;
pub use timer::{ModifierTimer, TimerState};

use crate::game::types::ModifierId;

/// Status panel text of the local player. Present only when something renders it.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct ModifierHud {
    pub text: String,
    /// Set whenever the local modifier set changes; the renderer decides when to hide.
    pub visible: bool,
}

impl ModifierHud {
    /// Replace the text, clearing it when there is nothing to show.
    pub fn set_summary(&mut self, summary: Option<String>) {
        let text = summary.unwrap_or_default();
        if self.text != text {
            self.text = text;
        }
    }
}

/// Registration of modifier kinds during app setup.
pub trait ModifierAppExt {
    /// Register `M` so it can be attached by instance, kind and id.
    fn register_modifier<M: Modifier + Default>(&mut self) -> &mut Self;

    /// Register `M` for attach-by-instance only.
    fn register_modifier_instance<M: Modifier>(&mut self) -> &mut Self;
}

impl ModifierAppExt for App {
    fn register_modifier<M: Modifier + Default>(&mut self) -> &mut Self {
        let result = self
            .world_mut()
            .get_resource_or_init::<ModifierRegistry>()
            .register::<M>();
        report_registration(result);
        self
    }

    fn register_modifier_instance<M: Modifier>(&mut self) -> &mut Self {
        let result = self
            .world_mut()
            .get_resource_or_init::<ModifierRegistry>()
            .register_instance_only::<M>();
        report_registration(result);
        self
    }
}

fn report_registration(result: ModifierResult<ModifierId>) {
    if let Err(e) = result {
        error!("{e}");
    }
}
