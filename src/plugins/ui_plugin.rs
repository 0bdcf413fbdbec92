use bevy::prelude::*;

use crate::config::tuning::Tuning;
use crate::game::modifiers::ModifierHud;
use crate::game::options::OptionsRegistry;
use crate::plugins::modifier_plugin::ModifierSet;

/// Status panel (top right) and lobby options panel (top left).
pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModifierHud>();
        app.add_systems(Startup, setup_ui);
        app.add_systems(
            Update,
            (update_modifier_display, update_options_display).after(ModifierSet::Frame),
        );
    }
}

#[derive(Component)]
struct ModifierText;

#[derive(Component)]
struct OptionsText;

fn setup_ui(mut commands: Commands, tuning: Res<Tuning>) {
    commands.spawn((
        ModifierText,
        Text::new(""),
        TextFont {
            font_size: tuning.hud_font_size,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            right: Val::Px(tuning.hud_right_px),
            top: Val::Px(tuning.hud_top_px),
            ..default()
        },
        Visibility::Hidden,
    ));

    commands.spawn((
        OptionsText,
        Text::new(""),
        TextFont {
            font_size: tuning.hud_font_size * 0.8,
            ..default()
        },
        TextColor(Color::srgb(0.8, 0.8, 0.2)),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            top: Val::Px(10.0),
            ..default()
        },
    ));
}

fn update_modifier_display(
    hud: Res<ModifierHud>,
    mut text_query: Query<(&mut Text, &mut Visibility), With<ModifierText>>,
) {
    if !hud.is_changed() {
        return;
    }
    for (mut text, mut visibility) in &mut text_query {
        if **text != hud.text {
            **text = hud.text.clone();
        }
        *visibility = if hud.visible && !hud.text.is_empty() {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
    }
}

fn update_options_display(
    registry: Res<OptionsRegistry>,
    mut text_query: Query<&mut Text, With<OptionsText>>,
) {
    if !registry.is_changed() {
        return;
    }
    let mut lines = Vec::new();
    for group in registry.groups() {
        lines.push(group.name.clone());
        for option in group.options.iter().filter_map(|id| registry.option(*id)) {
            lines.push(format!("  {}: {}", option.def.title, option.display_value()));
        }
    }
    for mut text in &mut text_query {
        **text = lines.join("\n");
    }
}
