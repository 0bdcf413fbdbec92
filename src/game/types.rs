use std::fmt;

use serde::{Deserialize, Serialize};

// ── Newtypes ────────────────────────────────────────────────────────

/// Duration in seconds. Always >= 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Seconds(pub f32);

impl Seconds {
    pub const ZERO: Self = Self(0.0);

    pub fn new(v: f32) -> Self {
        if v.is_finite() { Self(v.max(0.0)) } else { Self::ZERO }
    }

    /// Increment by dt, clamped to `max`.
    pub fn inc_clamped(self, dt: f32, max: Seconds) -> Self {
        let v = (self.0 + dt.max(0.0)).min(max.0);
        debug_assert!(v.is_finite());
        Self(v)
    }

    /// `self - other`, clamped to 0.
    pub fn saturating_sub(self, other: Seconds) -> Self {
        Self((self.0 - other.0).max(0.0))
    }
}

/// Compact, process-stable modifier kind identifier. Crosses the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModifierId(pub u32);

impl fmt::Display for ModifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compact option identifier. Crosses the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OptionId(pub u32);

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(pub u16);

// ── Enums ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleTeam {
    Crewmate,
    Impostor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_clamp_to_max() {
        let s = Seconds::new(14.5).inc_clamped(1.0, Seconds(15.0));
        assert_eq!(s, Seconds(15.0));
        assert_eq!(Seconds::new(-3.0), Seconds::ZERO);
        assert_eq!(Seconds::new(f32::NAN), Seconds::ZERO);
        assert_eq!(Seconds(2.0).saturating_sub(Seconds(5.0)), Seconds::ZERO);
    }
}
