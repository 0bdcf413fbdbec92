use bevy::prelude::*;
use thiserror::Error;

use super::types::{RoleId, RoleTeam};

pub const FREEZER: &str = "freezer";
pub const TELEPORTER: &str = "teleporter";

pub const IMPOSTOR_RED: Color = Color::srgb(1.0, 0.1, 0.1);

/// Which viewers may learn the role of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleVisibility {
    Everyone,
    /// Members of the same team.
    Team,
    OwnerOnly,
}

/// Lobby settings for a role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleConfiguration {
    pub can_modify_chance: bool,
    pub default_chance: u8,
    pub default_count: u8,
}

impl Default for RoleConfiguration {
    fn default() -> Self {
        Self {
            can_modify_chance: true,
            default_chance: 50,
            default_count: 1,
        }
    }
}

/// A custom role: a tagged team plus a small capability set.
#[derive(Debug, Clone)]
pub struct RoleDefinition {
    pub key: &'static str,
    pub name: String,
    pub description: String,
    pub long_description: String,
    pub color: Color,
    pub team: RoleTeam,
    pub max_players: u8,
    pub visibility: RoleVisibility,
    /// Asset path for the options screen banner. Loading is up to the host.
    pub options_screenshot: Option<String>,
    pub configuration: RoleConfiguration,
}

impl RoleDefinition {
    pub fn new(key: &'static str, name: &str, team: RoleTeam, color: Color) -> Self {
        Self {
            key,
            name: name.into(),
            description: String::new(),
            long_description: String::new(),
            color,
            team,
            max_players: 1,
            visibility: RoleVisibility::Team,
            options_screenshot: None,
            configuration: RoleConfiguration::default(),
        }
    }

    /// Sets both the short and long description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.into();
        self.long_description = description.into();
        self
    }

    pub fn is_impostor(&self) -> bool {
        self.team == RoleTeam::Impostor
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("role {0} is already registered")]
    DuplicateRole(&'static str),
}

/// What a viewer knows about itself when deciding how others look.
#[derive(Debug, Clone, Copy)]
pub struct Viewer<'a> {
    pub role: Option<&'a RoleDefinition>,
    pub dead: bool,
}

#[derive(Resource, Default)]
pub struct RoleRegistry {
    roles: Vec<RoleDefinition>,
}

impl RoleRegistry {
    pub fn register(&mut self, role: RoleDefinition) -> Result<RoleId, RoleError> {
        if self.roles.iter().any(|r| r.key == role.key) {
            return Err(RoleError::DuplicateRole(role.key));
        }
        let id = RoleId(self.roles.len() as u16);
        debug!("Registered role {} as {:?}", role.key, id);
        self.roles.push(role);
        Ok(id)
    }

    pub fn get(&self, id: RoleId) -> Option<&RoleDefinition> {
        self.roles.get(id.0 as usize)
    }

    pub fn find(&self, key: &str) -> Option<(RoleId, &RoleDefinition)> {
        self.roles
            .iter()
            .enumerate()
            .find(|(_, r)| r.key == key)
            .map(|(i, r)| (RoleId(i as u16), r))
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoleId, &RoleDefinition)> {
        self.roles
            .iter()
            .enumerate()
            .map(|(i, r)| (RoleId(i as u16), r))
    }
}

/// Whether `viewer` may see `target`'s role.
pub fn can_see_role(viewer: Viewer, target: &RoleDefinition, is_self: bool) -> bool {
    if is_self || viewer.dead {
        return true;
    }
    match target.visibility {
        RoleVisibility::Everyone => true,
        RoleVisibility::Team => viewer.role.is_some_and(|r| r.team == target.team),
        RoleVisibility::OwnerOnly => false,
    }
}

/// Name tag color of another player as seen by `viewer`.
pub fn name_color(viewer: Viewer, other: &RoleDefinition) -> Color {
    if viewer.dead {
        return other.color;
    }
    let Some(own) = viewer.role else {
        return Color::WHITE;
    };
    if own.is_impostor() && other.is_impostor() {
        return IMPOSTOR_RED;
    }
    if own.key == other.key {
        other.color
    } else {
        Color::WHITE
    }
}

/// Roles shipped with the demo session.
pub fn example_roles() -> Vec<RoleDefinition> {
    let mut freezer = RoleDefinition::new(
        FREEZER,
        "Freezer",
        RoleTeam::Impostor,
        Color::srgb(0.0, 0.2, 0.9),
    )
    .with_description("Freeze another player for a duration of time.");
    freezer.max_players = 2;
    freezer.options_screenshot = Some("banner.png".into());

    let mut teleporter = RoleDefinition::new(
        TELEPORTER,
        "Teleporter",
        RoleTeam::Crewmate,
        Color::srgb_u8(221, 176, 152),
    )
    .with_description("Zoom out and teleport across the map!");
    teleporter.visibility = RoleVisibility::Everyone;
    teleporter.options_screenshot = Some("banner.png".into());
    teleporter.configuration = RoleConfiguration {
        can_modify_chance: false,
        default_chance: 73,
        default_count: 4,
    };

    vec![freezer, teleporter]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RoleRegistry {
        let mut reg = RoleRegistry::default();
        for role in example_roles() {
            reg.register(role).unwrap();
        }
        reg
    }

    #[test]
    fn duplicate_role_is_rejected() {
        let mut reg = registry();
        let again = example_roles().remove(0);
        assert_eq!(reg.register(again), Err(RoleError::DuplicateRole(FREEZER)));
        assert_eq!(reg.iter().count(), 2);
    }

    #[test]
    fn name_colors_follow_viewer_knowledge() {
        let reg = registry();
        let (_, freezer) = reg.find(FREEZER).unwrap();
        let (_, teleporter) = reg.find(TELEPORTER).unwrap();
        let other_impostor = RoleDefinition::new("other", "Other", RoleTeam::Impostor, Color::BLACK);

        let crew = Viewer { role: Some(teleporter), dead: false };
        assert_eq!(name_color(crew, freezer), Color::WHITE);
        assert_eq!(name_color(crew, teleporter), teleporter.color);

        let imp = Viewer { role: Some(freezer), dead: false };
        assert_eq!(name_color(imp, &other_impostor), IMPOSTOR_RED);

        let ghost = Viewer { role: Some(teleporter), dead: true };
        assert_eq!(name_color(ghost, freezer), freezer.color);
    }

    #[test]
    fn visibility_rules() {
        let reg = registry();
        let (_, freezer) = reg.find(FREEZER).unwrap();
        let (_, teleporter) = reg.find(TELEPORTER).unwrap();
        let crew = Viewer { role: Some(teleporter), dead: false };

        assert!(can_see_role(crew, teleporter, false));
        assert!(!can_see_role(crew, freezer, false));
        assert!(can_see_role(Viewer { role: Some(freezer), dead: false }, freezer, false));
    }
}
