use bevy::ecs::message::Messages;
use bevy::prelude::*;

use effect_sync::config::tuning::Tuning;
use effect_sync::game::events::{OptionsChanged, ReceivedOptions, RequestOptionSync, SyncOptions};
use effect_sync::game::options::{OptionValue, OptionsRegistry, example_options};
use effect_sync::game::types::OptionId;
use effect_sync::plugins::options_plugin::{OptionsAppExt, OptionsPlugin};

fn peer(chunk_bytes: usize) -> App {
    let mut app = App::new();
    app.insert_resource(Tuning {
        option_chunk_bytes: chunk_bytes,
        ..default()
    });
    app.add_plugins(OptionsPlugin::in_memory());
    app.register_option_group(example_options());
    app.update();
    app
}

fn drain<M: Message>(app: &mut App) -> Vec<M> {
    app.world_mut().resource_mut::<Messages<M>>().drain().collect()
}

#[test]
fn host_values_reach_the_client_in_chunks() {
    let mut host = peer(12);
    {
        let mut registry = host.world_mut().resource_mut::<OptionsRegistry>();
        registry.set_value(OptionId(1), OptionValue::Toggle(true)).unwrap();
        registry.set_value(OptionId(3), OptionValue::Number(6.3)).unwrap();
        registry.set_value(OptionId(4), OptionValue::Enum(1)).unwrap();
    }

    let target = host.world_mut().spawn_empty().id();
    host.world_mut()
        .resource_mut::<Messages<RequestOptionSync>>()
        .write(RequestOptionSync { target: Some(target) });
    host.update();

    let chunks: Vec<SyncOptions> = drain(&mut host);
    // Toggle, toggle (5 bytes each), then number and enum (8 bytes each) alone.
    let sizes: Vec<usize> = chunks.iter().map(|c| c.chunk.len()).collect();
    assert_eq!(sizes, vec![2, 1, 1]);
    assert!(chunks.iter().all(|c| c.target == Some(target)));

    let mut client = peer(12);
    for sync in chunks {
        client
            .world_mut()
            .resource_mut::<Messages<ReceivedOptions>>()
            .write(ReceivedOptions { data: sync.chunk });
    }
    client.update();

    let changed: Vec<OptionsChanged> = drain(&mut client);
    assert_eq!(changed.iter().map(|c| c.applied).sum::<usize>(), 4);

    let client_options = client.world().resource::<OptionsRegistry>();
    let host_options = host.world().resource::<OptionsRegistry>();
    assert_eq!(client_options.to_config(), host_options.to_config());
    assert_eq!(client_options.value(OptionId(3)), Some(OptionValue::Number(6.25)));
}

#[test]
fn synced_values_persist_to_storage() {
    let path = std::env::temp_dir().join(format!("effect_sync_options_{}.ron", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let mut app = App::new();
    app.add_plugins(OptionsPlugin {
        storage: Some(path.clone()),
    });
    app.register_option_group(example_options());
    app.update();

    let applied = app
        .world_mut()
        .resource_mut::<OptionsRegistry>()
        .handle_sync(&[effect_sync::game::options::NetData::new(
            OptionId(2),
            OptionValue::Toggle(false),
        )]);
    assert_eq!(applied, 1);

    let mut reloaded = OptionsRegistry::default();
    reloaded.register_group(example_options()).unwrap();
    reloaded.set_storage(Some(path.clone()));
    assert_eq!(reloaded.load(), Ok(4));
    assert_eq!(reloaded.value(OptionId(2)), Some(OptionValue::Toggle(false)));

    let _ = std::fs::remove_file(&path);
}
