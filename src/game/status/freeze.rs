use bevy::prelude::*;

use crate::game::modifiers::{Modifier, ModifierContext, ModifierResult, ModifierTimer};
use crate::game::roles::FREEZER;

pub const FREEZE_SECONDS: f32 = 15.0;
pub const FREEZE_OUTLINE: Color = Color::srgb(0.5, 0.5, 1.0);

/// Roots the owning player in place for a while.
///
/// The owner loses movement; the owner and every Freezer see a light-blue outline.
#[derive(Debug, Clone)]
pub struct FreezeModifier {
    timer: ModifierTimer,
}

impl Default for FreezeModifier {
    fn default() -> Self {
        Self::new(FREEZE_SECONDS)
    }
}

impl FreezeModifier {
    pub fn new(seconds: f32) -> Self {
        Self {
            timer: ModifierTimer::new(seconds),
        }
    }

    fn thaw(ctx: &mut ModifierContext) {
        ctx.set_movable(true);
        ctx.set_outline(None);
    }
}

impl Modifier for FreezeModifier {
    fn name(&self) -> &str {
        "Freezed"
    }

    fn on_activate(&mut self, ctx: &mut ModifierContext) {
        ctx.set_movable(false);
    }

    fn on_deactivate(&mut self, ctx: &mut ModifierContext) {
        Self::thaw(ctx);
    }

    fn fixed_update(&mut self, ctx: &mut ModifierContext) -> ModifierResult<()> {
        if self.timer.is_complete() {
            return Ok(());
        }
        if ctx.is_local() || ctx.local_player_role() == Some(FREEZER) {
            ctx.set_outline(Some(FREEZE_OUTLINE));
        }
        Ok(())
    }

    fn timer(&self) -> Option<&ModifierTimer> {
        Some(&self.timer)
    }

    fn timer_mut(&mut self) -> Option<&mut ModifierTimer> {
        Some(&mut self.timer)
    }

    fn on_timer_complete(&mut self, ctx: &mut ModifierContext) {
        Self::thaw(ctx);
    }
}
