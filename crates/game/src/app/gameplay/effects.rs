use std::time::Duration;

use engine::EntityId;

use super::{DEATH_HOP_DELAY, RESTART_DELAY};

/// Deferred gameplay actions held in the scene's timer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimedEffect {
    RemoveEnemy(EntityId),
    FlickerFrame,
    CompleteTransform,
    DeathHop,
    Restart,
}

impl TimedEffect {
    pub(crate) fn label(self) -> &'static str {
        match self {
            TimedEffect::RemoveEnemy(_) => "remove_enemy",
            TimedEffect::FlickerFrame => "flicker_frame",
            TimedEffect::CompleteTransform => "complete_transform",
            TimedEffect::DeathHop => "death_hop",
            TimedEffect::Restart => "restart",
        }
    }
}

/// Scheduled together at the moment of death; delays are measured from it.
pub(crate) const DEATH_SEQUENCE: [(Duration, TimedEffect); 2] = [
    (DEATH_HOP_DELAY, TimedEffect::DeathHop),
    (RESTART_DELAY, TimedEffect::Restart),
];
