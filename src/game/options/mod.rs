pub mod error;
pub mod net;
pub mod registry;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub use error::{OptionError, OptionResult};
pub use net::{NetData, chunk_net_data};
pub use registry::{ModdedOption, OptionsRegistry};

/// Current value of a networked option.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OptionValue {
    Toggle(bool),
    Number(f32),
    /// Index into the option's labels.
    Enum(usize),
}

impl OptionValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            OptionValue::Toggle(_) => "toggle",
            OptionValue::Number(_) => "number",
            OptionValue::Enum(_) => "enum",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Toggle(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            OptionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            OptionValue::Enum(i) => Some(*i),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberSuffix {
    #[default]
    None,
    Percent,
    Seconds,
    Multiplier,
}

impl NumberSuffix {
    fn as_str(&self) -> &'static str {
        match self {
            NumberSuffix::None => "",
            NumberSuffix::Percent => "%",
            NumberSuffix::Seconds => "s",
            NumberSuffix::Multiplier => "x",
        }
    }
}

/// Allowed values of a number option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRange {
    pub min: f32,
    pub max: f32,
    pub increment: f32,
    pub decimals: u8,
    pub suffix: NumberSuffix,
}

impl NumberRange {
    pub fn new(min: f32, max: f32, increment: f32) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
            increment: increment.abs(),
            decimals: 0,
            suffix: NumberSuffix::None,
        }
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_suffix(mut self, suffix: NumberSuffix) -> Self {
        self.suffix = suffix;
        self
    }

    /// Clamp into range and snap to the nearest increment step from `min`.
    pub fn normalize(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        if self.increment <= f32::EPSILON {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.increment).round();
        (self.min + steps * self.increment).min(self.max)
    }

    pub fn format(&self, value: f32) -> String {
        format!(
            "{:.*}{}",
            self.decimals as usize,
            value,
            self.suffix.as_str()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionKind {
    Toggle,
    Number(NumberRange),
    Enum { labels: Vec<String> },
}

impl OptionKind {
    pub fn name(&self) -> &'static str {
        match self {
            OptionKind::Toggle => "toggle",
            OptionKind::Number(_) => "number",
            OptionKind::Enum { .. } => "enum",
        }
    }
}

/// Declaration of one option inside a group.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDef {
    /// Stable key, part of the persisted config key.
    pub key: String,
    pub title: String,
    pub kind: OptionKind,
    pub default: OptionValue,
}

/// A titled set of options registered together.
#[derive(Debug, Clone)]
pub struct OptionGroup {
    pub key: String,
    pub name: String,
    pub color: Color,
    pub options: Vec<OptionDef>,
}

impl OptionGroup {
    pub fn builder(key: &str, name: &str) -> OptionGroupBuilder {
        OptionGroupBuilder {
            group: OptionGroup {
                key: key.into(),
                name: name.into(),
                color: Color::WHITE,
                options: Vec::new(),
            },
        }
    }
}

pub struct OptionGroupBuilder {
    group: OptionGroup,
}

impl OptionGroupBuilder {
    pub fn color(mut self, color: Color) -> Self {
        self.group.color = color;
        self
    }

    pub fn toggle(self, key: &str, title: &str, default: bool) -> Self {
        self.option(key, title, OptionKind::Toggle, OptionValue::Toggle(default))
    }

    pub fn number(self, key: &str, title: &str, default: f32, range: NumberRange) -> Self {
        let default = OptionValue::Number(range.normalize(default));
        self.option(key, title, OptionKind::Number(range), default)
    }

    pub fn enumeration(self, key: &str, title: &str, labels: &[&str], default: usize) -> Self {
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        let default = OptionValue::Enum(default.min(labels.len().saturating_sub(1)));
        self.option(key, title, OptionKind::Enum { labels }, default)
    }

    fn option(mut self, key: &str, title: &str, kind: OptionKind, default: OptionValue) -> Self {
        self.group.options.push(OptionDef {
            key: key.into(),
            title: title.into(),
            kind,
            default,
        });
        self
    }

    pub fn build(self) -> OptionGroup {
        self.group
    }
}

/// Options shown by the demo lobby.
pub fn example_options() -> OptionGroup {
    OptionGroup::builder("example_options", "Example Options 1")
        .color(Color::srgb(0.0, 1.0, 0.0))
        .toggle("toggle_opt", "Toggle Opt 1", false)
        .toggle("toggle_opt2", "Toggle Opt 2", true)
        .number(
            "number_opt",
            "Number Opt",
            4.0,
            NumberRange::new(0.0, 10.0, 0.25)
                .with_decimals(2)
                .with_suffix(NumberSuffix::Percent),
        )
        .enumeration(
            "best_api",
            "Best API",
            &["Mira API", "Mitochondria", "Reactor"],
            0,
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_range_clamps_and_snaps() {
        let range = NumberRange::new(0.0, 10.0, 0.25);
        assert_eq!(range.normalize(-3.0), 0.0);
        assert_eq!(range.normalize(12.0), 10.0);
        assert_eq!(range.normalize(4.1), 4.0);
        assert_eq!(range.normalize(4.2), 4.25);
    }

    #[test]
    fn example_group_declares_four_options() {
        let group = example_options();
        let titles: Vec<_> = group.options.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, ["Toggle Opt 1", "Toggle Opt 2", "Number Opt", "Best API"]);
        assert_eq!(group.options[2].default, OptionValue::Number(4.0));

        let OptionKind::Number(range) = &group.options[2].kind else {
            panic!("Number Opt should be a number");
        };
        assert_eq!(range.format(4.0), "4.00%");
    }
}
