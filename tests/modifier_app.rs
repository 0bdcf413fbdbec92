use std::time::Duration;

use bevy::ecs::message::Messages;
use bevy::prelude::*;

use effect_sync::config::tuning::Tuning;
use effect_sync::game::components::{LocalControl, Movable, Outline, Player};
use effect_sync::game::events::ModifierEvent;
use effect_sync::game::modifiers::{
    Modifier, ModifierAppExt, ModifierCollection, ModifierCommandsExt, ModifierContext,
    ModifierError, ModifierHud, ModifierKind, ModifierRegistry, ModifierWorldExt,
};
use effect_sync::game::status::FreezeModifier;
use effect_sync::game::types::ModifierId;
use effect_sync::plugins::modifier_plugin::ModifierPlugin;

#[derive(Resource, Default)]
struct Deactivations(u32);

#[derive(Default)]
struct Tracked;

impl Modifier for Tracked {
    fn name(&self) -> &str {
        "Tracked"
    }

    fn hide_on_ui(&self) -> bool {
        true
    }

    fn on_deactivate(&mut self, ctx: &mut ModifierContext) {
        ctx.world_mut().resource_mut::<Deactivations>().0 += 1;
    }
}

fn app() -> App {
    let mut app = App::new();
    app.add_plugins(ModifierPlugin);
    app.insert_resource(Tuning {
        dt: 1.0,
        ..default()
    });
    app.init_resource::<ModifierHud>();
    app.init_resource::<Deactivations>();
    app.register_modifier::<FreezeModifier>();
    app.register_modifier::<Tracked>();
    // Startup + PostStartup: seals the registry.
    app.update();
    app
}

fn spawn_local(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((
            Player,
            LocalControl,
            Movable::default(),
            Outline::default(),
            ModifierCollection::new(),
        ))
        .id()
}

fn fixed_tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

#[test]
fn registration_order_defines_ids_and_seals() {
    let mut app = app();
    let registry = app.world().resource::<ModifierRegistry>();
    assert!(registry.is_sealed());
    assert_eq!(registry.id_of_type::<FreezeModifier>(), Some(ModifierId(1)));
    assert_eq!(registry.id_of_type::<Tracked>(), Some(ModifierId(2)));

    #[derive(Default)]
    struct Late;
    impl Modifier for Late {
        fn name(&self) -> &str {
            "Late"
        }
    }
    app.register_modifier::<Late>();
    assert_eq!(app.world().resource::<ModifierRegistry>().id_of_type::<Late>(), None);
}

#[test]
fn freeze_runs_fifteen_fixed_ticks_then_detaches() {
    let mut app = app();
    let player = spawn_local(&mut app);

    app.world_mut().add_modifier_by_id(player, ModifierId(1)).unwrap();
    assert_eq!(app.world().get::<Movable>(player), Some(&Movable(false)));

    for _ in 0..14 {
        fixed_tick(&mut app);
    }
    app.update();
    assert_eq!(
        app.world().resource::<ModifierHud>().text,
        "Modifiers:\nFreezed (14s/15s)"
    );

    fixed_tick(&mut app);
    app.update();
    assert!(app.world().get::<ModifierCollection>(player).unwrap().is_empty());
    assert_eq!(app.world().get::<Movable>(player), Some(&Movable(true)));
    assert_eq!(app.world().resource::<ModifierHud>().text, "");
}

#[test]
fn duplicate_freeze_is_rejected() {
    let mut app = app();
    let player = spawn_local(&mut app);
    let world = app.world_mut();

    world.add_modifier(player, FreezeModifier::default()).unwrap();
    assert!(matches!(
        world.add_modifier(player, FreezeModifier::new(3.0)),
        Err(ModifierError::AlreadyActive { .. })
    ));
    let collection = world.get::<ModifierCollection>(player).unwrap();
    assert_eq!(collection.len(), 1);
    assert_eq!(
        collection.get::<FreezeModifier>().and_then(|f| f.timer()).map(|t| t.duration()),
        Some(15.0)
    );
}

#[test]
fn commands_apply_at_the_next_flush() {
    let mut app = app();
    let player = spawn_local(&mut app);

    app.add_systems(Update, move |mut commands: Commands| {
        commands.add_modifier(player, Tracked);
    });
    app.update();
    let collection = app.world().get::<ModifierCollection>(player).unwrap();
    assert!(collection.has::<Tracked>());
    // Hidden modifiers never reach the HUD.
    assert_eq!(app.world().resource::<ModifierHud>().text, "");

    let kinds: Vec<ModifierKind> = app
        .world_mut()
        .resource_mut::<Messages<ModifierEvent>>()
        .drain()
        .filter_map(|e| match e {
            ModifierEvent::Added { kind, .. } => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![ModifierKind::of::<Tracked>()]);
}

#[test]
fn despawning_the_owner_deactivates_its_modifiers() {
    let mut app = app();
    let player = spawn_local(&mut app);
    app.world_mut().add_modifier_by_type::<Tracked>(player).unwrap();
    app.world_mut().add_modifier_by_type::<FreezeModifier>(player).unwrap();

    app.world_mut().despawn(player);
    app.world_mut().flush();
    assert_eq!(app.world().resource::<Deactivations>().0, 1);

    // Ticking with the owner gone is harmless.
    fixed_tick(&mut app);
    app.update();
}

#[test]
fn fixed_timestep_follows_tuning_changes() {
    let mut app = app();
    app.insert_resource(Time::<Fixed>::from_seconds(1.0));

    app.world_mut().resource_mut::<Tuning>().dt = 0.25;
    app.update();
    assert_eq!(
        app.world().resource::<Time<Fixed>>().timestep(),
        Duration::from_secs_f32(0.25)
    );

    // Unusable values leave the timestep alone.
    app.world_mut().resource_mut::<Tuning>().dt = 0.0;
    app.update();
    assert_eq!(
        app.world().resource::<Time<Fixed>>().timestep(),
        Duration::from_secs_f32(0.25)
    );
}
