use bevy::log::LogPlugin;
use bevy::prelude::*;

use effect_sync::config::tuning::Tuning;
use effect_sync::plugins::{
    game_plugin::GamePlugin, modifier_plugin::ModifierPlugin, options_plugin::OptionsPlugin,
    ui_plugin::UiPlugin,
};

fn main() {
    let tuning = Tuning::load_or_default();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Effect Sync".into(),
                        resolution: (960u32, 640u32).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: "info,wgpu=error,naga=warn,effect_sync=debug".into(),
                    ..default()
                }),
        )
        .insert_resource(Time::<Fixed>::from_seconds(tuning.dt as f64))
        .insert_resource(tuning)
        .add_plugins(ModifierPlugin)
        .add_plugins(OptionsPlugin::default())
        .add_plugins(UiPlugin)
        .add_plugins(GamePlugin)
        .run();
}
