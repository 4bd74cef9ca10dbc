use std::collections::HashMap;

use engine::{SceneWorld, TextId, TextProperty, TextStyle, TweenId, Vec2};
use tracing::debug;

use super::{SCORE_FADE_DURATION, SCORE_FONT_SIZE, SCORE_RISE_DISTANCE, SCORE_RISE_DURATION};

/// Floating score numbers and the running total.
///
/// Each award spawns a text that rises, then fades, then is destroyed.
/// The phase of every artifact is tracked by the id of its active tween.
#[derive(Debug, Default)]
pub(crate) struct ScoreOverlay {
    total: u32,
    rising: HashMap<TweenId, TextId>,
    fading: HashMap<TweenId, TextId>,
}

impl ScoreOverlay {
    pub(crate) fn total(&self) -> u32 {
        self.total
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.rising.len() + self.fading.len()
    }

    pub(crate) fn award(&mut self, world: &mut SceneWorld, points: u32, origin: Vec2) -> TextId {
        self.total = self.total.saturating_add(points);
        let style = TextStyle {
            font_family: "pixel",
            font_size: SCORE_FONT_SIZE,
            ..TextStyle::default()
        };
        let text = world.spawn_text(origin, points.to_string(), style);
        if let Some(tween) = world.add_tween(
            text,
            TextProperty::Y,
            origin.y - SCORE_RISE_DISTANCE,
            SCORE_RISE_DURATION,
        ) {
            self.rising.insert(tween, text);
        }
        debug!(points, total = self.total, x = origin.x, y = origin.y, "score_awarded");
        text
    }

    /// Advances artifacts whose tween finished this step.
    pub(crate) fn on_tweens_completed(&mut self, world: &mut SceneWorld, completed: &[TweenId]) {
        for tween in completed {
            if let Some(text) = self.rising.remove(tween) {
                match world.add_tween(text, TextProperty::Alpha, 0.0, SCORE_FADE_DURATION) {
                    Some(fade) => {
                        self.fading.insert(fade, text);
                    }
                    None => debug!(text = text.0, "score_text_missing_before_fade"),
                }
            } else if let Some(text) = self.fading.remove(tween) {
                world.destroy_text(text);
            }
        }
    }
}
