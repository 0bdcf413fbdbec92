use std::path::PathBuf;

use bevy::prelude::*;

use crate::config::tuning::Tuning;
use crate::game::events::{OptionsChanged, ReceivedOptions, RequestOptionSync, SyncOptions};
use crate::game::options::{OptionGroup, OptionsRegistry, chunk_net_data};

/// Networked options: registry, persistence and the sync messages.
pub struct OptionsPlugin {
    /// RON file the values persist to. `None` keeps them in memory only.
    pub storage: Option<PathBuf>,
}

impl Default for OptionsPlugin {
    fn default() -> Self {
        Self {
            storage: Some(Tuning::data_dir().join("options.ron")),
        }
    }
}

impl OptionsPlugin {
    pub fn in_memory() -> Self {
        Self { storage: None }
    }
}

impl Plugin for OptionsPlugin {
    fn build(&self, app: &mut App) {
        app.world_mut()
            .get_resource_or_init::<OptionsRegistry>()
            .set_storage(self.storage.clone());

        app.add_message::<RequestOptionSync>();
        app.add_message::<SyncOptions>();
        app.add_message::<ReceivedOptions>();
        app.add_message::<OptionsChanged>();

        app.add_systems(PostStartup, load_stored_options);
        app.add_systems(Update, (send_option_sync, receive_option_sync).chain());
    }
}

/// Registration of option groups during app setup.
pub trait OptionsAppExt {
    fn register_option_group(&mut self, group: OptionGroup) -> &mut Self;
}

impl OptionsAppExt for App {
    fn register_option_group(&mut self, group: OptionGroup) -> &mut Self {
        let result = self
            .world_mut()
            .get_resource_or_init::<OptionsRegistry>()
            .register_group(group);
        if let Err(e) = result {
            error!("{e}");
        }
        self
    }
}

fn load_stored_options(mut registry: ResMut<OptionsRegistry>) {
    match registry.load() {
        Ok(0) => {}
        Ok(n) => info!("Loaded {n} stored option values"),
        Err(e) => warn!("Failed to load options: {e}, using defaults"),
    }
}

fn send_option_sync(
    mut requests: MessageReader<RequestOptionSync>,
    registry: Res<OptionsRegistry>,
    tuning: Option<Res<Tuning>>,
    mut out: MessageWriter<SyncOptions>,
) {
    let max_bytes = tuning.map_or(Tuning::default().option_chunk_bytes, |t| t.option_chunk_bytes);
    for request in requests.read() {
        let chunks = chunk_net_data(registry.net_data(), max_bytes);
        debug!(
            "Syncing {} options in {} chunks to {:?}",
            registry.len(),
            chunks.len(),
            request.target
        );
        for chunk in chunks {
            out.write(SyncOptions {
                target: request.target,
                chunk,
            });
        }
    }
}

fn receive_option_sync(
    mut received: MessageReader<ReceivedOptions>,
    mut registry: ResMut<OptionsRegistry>,
    mut changed: MessageWriter<OptionsChanged>,
) {
    for message in received.read() {
        let applied = registry.handle_sync(&message.data);
        changed.write(OptionsChanged { applied });
    }
}
