use bevy::prelude::*;

use crate::config::tuning::Tuning;
use crate::game::components::{Dead, LocalControl, Movable, Outline, Player, PlayerName, PlayerRole};
use crate::game::events::{
    ModifierEvent, OptionsChanged, ReceivedOptions, RequestOptionSync, SyncOptions,
};
use crate::game::modifiers::{ModifierAppExt, ModifierCollection, ModifierCommandsExt};
use crate::game::options::{OptionError, OptionValue, OptionsRegistry, example_options};
use crate::game::roles::{
    FREEZER, RoleRegistry, TELEPORTER, Viewer, can_see_role, example_roles, name_color,
};
use crate::game::status::FreezeModifier;
use crate::game::types::OptionId;
use crate::plugins::modifier_plugin::ModifierSet;
use crate::plugins::options_plugin::OptionsAppExt;

const PLAYER_RADIUS: f32 = 28.0;

/// Demo session: one local and one remote player, keyboard-driven modifiers and options.
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        let mut roles = RoleRegistry::default();
        for role in example_roles() {
            if let Err(e) = roles.register(role) {
                error!("{e}");
            }
        }
        app.insert_resource(roles);

        // Same order on every peer.
        app.register_modifier::<FreezeModifier>();
        app.register_option_group(example_options());

        app.add_systems(Startup, setup_session);

        app.add_systems(FixedUpdate, move_local_player.before(ModifierSet::Tick));

        app.add_systems(
            Update,
            (
                modifier_input,
                option_input,
                loopback_transport,
                log_modifier_events,
                log_options_changed,
            )
                .chain(),
        );
        app.add_systems(
            Update,
            (sync_outline_rings, sync_name_tags).after(ModifierSet::Frame),
        );

        // ── Always-on ───────────────────────────────────────────────────
        app.add_systems(Update, tuning_reload_input);
    }
}

#[derive(Component)]
struct OutlineRing;

#[derive(Component)]
struct NameTag;

// ── Startup ─────────────────────────────────────────────────────────

fn setup_session(
    mut commands: Commands,
    roles: Res<RoleRegistry>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    commands.spawn(Camera2d);

    let body = meshes.add(Circle::new(PLAYER_RADIUS));
    let ring = meshes.add(Annulus::new(PLAYER_RADIUS + 2.0, PLAYER_RADIUS + 8.0));

    let players = [
        ("You", FREEZER, -120.0, true),
        ("Remote", TELEPORTER, 120.0, false),
    ];
    for (name, role_key, x, local) in players {
        let Some((role_id, role)) = roles.find(role_key) else {
            warn!("Role {role_key} is not registered, skipping player {name}");
            continue;
        };

        let mut player = commands.spawn((
            Player,
            PlayerName(name.into()),
            PlayerRole(role_id),
            Movable::default(),
            Outline::default(),
            ModifierCollection::new(),
            Mesh2d(body.clone()),
            MeshMaterial2d(materials.add(role.color)),
            Transform::from_xyz(x, 0.0, 0.0),
        ));
        if local {
            player.insert(LocalControl);
        }
        player.with_children(|parent| {
            parent.spawn((
                OutlineRing,
                Mesh2d(ring.clone()),
                MeshMaterial2d(materials.add(Color::WHITE)),
                Transform::from_xyz(0.0, 0.0, -0.1),
                Visibility::Hidden,
            ));
            parent.spawn((
                NameTag,
                Text2d::new(name),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Transform::from_xyz(0.0, PLAYER_RADIUS + 20.0, 0.1),
            ));
        });
    }

    info!("Space: freeze yourself, F: freeze remote, R: remove, C: clear");
    info!("T/Y: change options and sync, F5: reload tuning");
}

// ── FixedUpdate ─────────────────────────────────────────────────────

fn move_local_player(
    keyboard: Res<ButtonInput<KeyCode>>,
    tuning: Res<Tuning>,
    mut players: Query<(&mut Transform, &Movable), (With<Player>, With<LocalControl>)>,
) {
    let mut dir = Vec2::ZERO;
    if keyboard.pressed(KeyCode::ArrowLeft) {
        dir.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        dir.x += 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowUp) {
        dir.y += 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowDown) {
        dir.y -= 1.0;
    }
    let step = dir.normalize_or_zero() * tuning.move_speed * tuning.dt;

    for (mut tf, movable) in &mut players {
        if movable.0 && step != Vec2::ZERO {
            tf.translation += step.extend(0.0);
        }
    }
}

// ── Update ──────────────────────────────────────────────────────────

fn modifier_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut commands: Commands,
    local: Query<Entity, (With<Player>, With<LocalControl>)>,
    remote: Query<Entity, (With<Player>, Without<LocalControl>)>,
) {
    if keyboard.just_pressed(KeyCode::Space) {
        for me in &local {
            commands.add_modifier(me, FreezeModifier::default());
        }
    }
    if keyboard.just_pressed(KeyCode::KeyF) {
        for other in &remote {
            commands.add_modifier(other, FreezeModifier::default());
        }
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        for player in local.iter().chain(remote.iter()) {
            commands.remove_modifier::<FreezeModifier>(player);
        }
    }
    if keyboard.just_pressed(KeyCode::KeyC) {
        for player in local.iter().chain(remote.iter()) {
            commands.clear_modifiers(player);
        }
    }
}

fn option_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut registry: ResMut<OptionsRegistry>,
    mut requests: MessageWriter<RequestOptionSync>,
) {
    let mut changed = false;

    if keyboard.just_pressed(KeyCode::KeyT)
        && let Some(id) = registry.find("example_options.toggle_opt")
    {
        let on = registry.value(id).and_then(|v| v.as_bool()).unwrap_or(false);
        changed |= set_option(&mut registry, id, OptionValue::Toggle(!on));
    }
    if keyboard.just_pressed(KeyCode::KeyY)
        && let Some(id) = registry.find("example_options.best_api")
    {
        let next = registry.value(id).and_then(|v| v.as_index()).map_or(0, |i| i + 1);
        changed |= match registry.set_value(id, OptionValue::Enum(next)) {
            Ok(_) => true,
            Err(OptionError::EnumOutOfRange { .. }) => {
                set_option(&mut registry, id, OptionValue::Enum(0))
            }
            Err(e) => {
                warn!("{e}");
                false
            }
        };
    }

    if changed {
        if let Err(e) = registry.save() {
            warn!("{e}");
        }
        requests.write(RequestOptionSync { target: None });
    }
}

fn set_option(registry: &mut OptionsRegistry, id: OptionId, value: OptionValue) -> bool {
    match registry.set_value(id, value) {
        Ok(_) => true,
        Err(e) => {
            warn!("{e}");
            false
        }
    }
}

/// Stands in for the network: every outgoing chunk arrives back as if a peer echoed it.
fn loopback_transport(
    mut outgoing: MessageReader<SyncOptions>,
    mut incoming: MessageWriter<ReceivedOptions>,
) {
    for sync in outgoing.read() {
        debug!("Loopback: {} options for {:?}", sync.chunk.len(), sync.target);
        incoming.write(ReceivedOptions {
            data: sync.chunk.clone(),
        });
    }
}

fn log_modifier_events(mut events: MessageReader<ModifierEvent>, names: Query<&PlayerName>) {
    for event in events.read() {
        let entity = event.handle().entity;
        let who = names.get(entity).map_or("?", |n| n.0.as_str());
        match event {
            ModifierEvent::Added { kind, .. } => info!("{who}: +{kind}"),
            ModifierEvent::Removed { kind, .. } => info!("{who}: -{kind}"),
            ModifierEvent::TimerCompleted { kind, .. } => info!("{who}: {kind} ran out"),
        }
    }
}

fn log_options_changed(mut changed: MessageReader<OptionsChanged>) {
    for message in changed.read() {
        debug!("Applied {} synced option values", message.applied);
    }
}

fn sync_outline_rings(
    players: Query<(&Outline, &Children), Changed<Outline>>,
    mut rings: Query<(&mut Visibility, &MeshMaterial2d<ColorMaterial>), With<OutlineRing>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    for (outline, children) in &players {
        for child in children.iter() {
            let Ok((mut visibility, material)) = rings.get_mut(child) else {
                continue;
            };
            match outline.0 {
                Some(color) => {
                    *visibility = Visibility::Visible;
                    if let Some(mut ring) = materials.get_mut(&material.0) {
                        ring.color = color;
                    }
                }
                None => *visibility = Visibility::Hidden,
            }
        }
    }
}

fn sync_name_tags(
    roles: Res<RoleRegistry>,
    local: Query<(&PlayerRole, Has<Dead>), With<LocalControl>>,
    players: Query<(&PlayerName, &PlayerRole, &Children, Has<LocalControl>), With<Player>>,
    mut tags: Query<(&mut Text2d, &mut TextColor), With<NameTag>>,
) {
    let viewer = match local.single() {
        Ok((role, dead)) => Viewer {
            role: roles.get(role.0),
            dead,
        },
        Err(_) => Viewer {
            role: None,
            dead: false,
        },
    };

    for (name, role, children, is_self) in &players {
        let Some(def) = roles.get(role.0) else {
            continue;
        };
        let color = if is_self { def.color } else { name_color(viewer, def) };
        let label = if can_see_role(viewer, def, is_self) {
            format!("{}\n{}", name.0, def.name)
        } else {
            name.0.clone()
        };

        for child in children.iter() {
            let Ok((mut text, mut tag_color)) = tags.get_mut(child) else {
                continue;
            };
            if text.0 != label {
                text.0 = label.clone();
            }
            if tag_color.0 != color {
                tag_color.0 = color;
            }
        }
    }
}

fn tuning_reload_input(keyboard: Res<ButtonInput<KeyCode>>, mut tuning: ResMut<Tuning>) {
    if keyboard.just_pressed(KeyCode::F5) {
        tuning.reload();
    }
}
