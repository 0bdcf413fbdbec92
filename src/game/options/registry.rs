use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bevy::prelude::*;

use super::error::{OptionError, OptionResult};
use super::net::{NetData, decode_value};
use super::{OptionDef, OptionGroup, OptionKind, OptionValue};
use crate::game::types::OptionId;

/// A registered option and its current value.
#[derive(Debug, Clone)]
pub struct ModdedOption {
    pub id: OptionId,
    pub group: String,
    pub def: OptionDef,
    value: OptionValue,
}

impl ModdedOption {
    pub fn value(&self) -> OptionValue {
        self.value
    }

    /// `"{group}.{option}"`, the key used in the persisted file.
    pub fn config_key(&self) -> String {
        format!("{}.{}", self.group, self.def.key)
    }

    pub fn net_data(&self) -> NetData {
        NetData::new(self.id, self.value)
    }

    /// Value as shown in the lobby.
    pub fn display_value(&self) -> String {
        match (&self.def.kind, self.value) {
            (OptionKind::Toggle, OptionValue::Toggle(on)) => {
                let text = if on { "On" } else { "Off" };
                text.into()
            }
            (OptionKind::Number(range), OptionValue::Number(n)) => range.format(n),
            (OptionKind::Enum { labels }, OptionValue::Enum(i)) => {
                labels.get(i).cloned().unwrap_or_default()
            }
            _ => String::new(),
        }
    }

    fn validate(&self, value: OptionValue) -> OptionResult<OptionValue> {
        match (&self.def.kind, value) {
            (OptionKind::Toggle, OptionValue::Toggle(_)) => Ok(value),
            (OptionKind::Number(range), OptionValue::Number(n)) if n.is_finite() => {
                Ok(OptionValue::Number(range.normalize(n)))
            }
            (OptionKind::Enum { labels }, OptionValue::Enum(index)) => {
                if index < labels.len() {
                    Ok(value)
                } else {
                    Err(OptionError::EnumOutOfRange {
                        id: self.id,
                        index,
                        len: labels.len(),
                    })
                }
            }
            _ => Err(OptionError::KindMismatch {
                id: self.id,
                expected: self.def.kind.name(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisteredGroup {
    pub key: String,
    pub name: String,
    pub color: Color,
    pub options: Vec<OptionId>,
}

/// Every networked option of the session.
///
/// Ids are assigned from 1 in registration order and must match across peers.
/// When a storage path is set, values are loaded from and saved to it as RON.
#[derive(Resource, Debug, Default)]
pub struct OptionsRegistry {
    groups: Vec<RegisteredGroup>,
    options: Vec<ModdedOption>,
    storage: Option<PathBuf>,
}

impl OptionsRegistry {
    pub fn set_storage(&mut self, path: Option<PathBuf>) {
        self.storage = path;
    }

    pub fn storage(&self) -> Option<&Path> {
        self.storage.as_deref()
    }

    pub fn register_group(&mut self, group: OptionGroup) -> OptionResult<Vec<OptionId>> {
        if self.groups.iter().any(|g| g.key == group.key) {
            return Err(OptionError::DuplicateGroup(group.key));
        }
        for (i, def) in group.options.iter().enumerate() {
            if group.options[..i].iter().any(|d| d.key == def.key) {
                return Err(OptionError::DuplicateOption {
                    group: group.key.clone(),
                    option: def.key.clone(),
                });
            }
        }

        let mut ids = Vec::with_capacity(group.options.len());
        for def in group.options {
            let id = OptionId(self.options.len() as u32 + 1);
            self.options.push(ModdedOption {
                id,
                group: group.key.clone(),
                value: def.default,
                def,
            });
            ids.push(id);
        }
        info!("Registered option group {} with {} options", group.name, ids.len());
        self.groups.push(RegisteredGroup {
            key: group.key,
            name: group.name,
            color: group.color,
            options: ids.clone(),
        });
        Ok(ids)
    }

    pub fn option(&self, id: OptionId) -> Option<&ModdedOption> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.options.get(index)
    }

    fn option_mut(&mut self, id: OptionId) -> OptionResult<&mut ModdedOption> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|index| self.options.get_mut(index))
            .ok_or(OptionError::UnknownOption(id))
    }

    pub fn find(&self, config_key: &str) -> Option<OptionId> {
        self.options
            .iter()
            .find(|o| o.config_key() == config_key)
            .map(|o| o.id)
    }

    pub fn value(&self, id: OptionId) -> Option<OptionValue> {
        self.option(id).map(ModdedOption::value)
    }

    /// Set a value locally. Numbers are clamped and snapped; returns what was stored.
    pub fn set_value(&mut self, id: OptionId, value: OptionValue) -> OptionResult<OptionValue> {
        let option = self.option_mut(id)?;
        let value = option.validate(value)?;
        option.value = value;
        Ok(value)
    }

    pub fn groups(&self) -> impl Iterator<Item = &RegisteredGroup> {
        self.groups.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModdedOption> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Every value in wire form, in id order.
    pub fn net_data(&self) -> Vec<NetData> {
        self.options.iter().map(ModdedOption::net_data).collect()
    }

    fn apply_net_data(&mut self, data: &NetData) -> OptionResult<OptionValue> {
        let option = self.option_mut(data.id)?;
        let value = decode_value(&option.def.kind, &data.data).ok_or(OptionError::Malformed {
            id: data.id,
            len: data.data.len(),
        })?;
        let value = option.validate(value)?;
        option.value = value;
        Ok(value)
    }

    /// Apply a received chunk, then persist once. Returns how many values were applied.
    ///
    /// Unknown ids and bad payloads are skipped.
    pub fn handle_sync(&mut self, data: &[NetData]) -> usize {
        let mut applied = 0;
        for item in data {
            match self.apply_net_data(item) {
                Ok(_) => applied += 1,
                Err(OptionError::UnknownOption(id)) => debug!("Skipping unknown option {id}"),
                Err(e) => warn!("Skipping synced option: {e}"),
            }
        }
        if applied > 0
            && let Err(e) = self.save()
        {
            warn!("{e}");
        }
        applied
    }

    /// Current values keyed by config key.
    pub fn to_config(&self) -> BTreeMap<String, OptionValue> {
        self.options
            .iter()
            .map(|o| (o.config_key(), o.value))
            .collect()
    }

    /// Apply persisted values; entries that no longer fit their option are ignored.
    pub fn apply_config(&mut self, config: &BTreeMap<String, OptionValue>) -> usize {
        let mut applied = 0;
        for (key, value) in config {
            let Some(id) = self.find(key) else {
                debug!("Ignoring stored value for unknown option {key}");
                continue;
            };
            match self.set_value(id, *value) {
                Ok(_) => applied += 1,
                Err(e) => warn!("Ignoring stored value for {key}: {e}"),
            }
        }
        applied
    }

    /// Write all values to the storage file. No-op without storage.
    pub fn save(&self) -> OptionResult<()> {
        let Some(path) = &self.storage else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let pretty = ron::ser::PrettyConfig::default();
        let text = ron::ser::to_string_pretty(&self.to_config(), pretty)
            .map_err(|e| OptionError::Storage(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| OptionError::Storage(e.to_string()))
    }

    /// Read values from the storage file, if it exists.
    pub fn load(&mut self) -> OptionResult<usize> {
        let Some(path) = &self.storage else {
            return Ok(0);
        };
        if !path.exists() {
            return Ok(0);
        }
        let text =
            std::fs::read_to_string(path).map_err(|e| OptionError::Storage(e.to_string()))?;
        let config: BTreeMap<String, OptionValue> =
            ron::from_str(&text).map_err(|e| OptionError::Storage(e.to_string()))?;
        Ok(self.apply_config(&config))
    }
}
