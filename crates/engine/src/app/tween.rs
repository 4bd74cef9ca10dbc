use std::time::Duration;

use super::scene::{TextArtifact, TextId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextProperty {
    X,
    Y,
    Alpha,
}

impl TextProperty {
    fn read(self, text: &TextArtifact) -> f32 {
        match self {
            TextProperty::X => text.position.x,
            TextProperty::Y => text.position.y,
            TextProperty::Alpha => text.alpha,
        }
    }

    fn write(self, text: &mut TextArtifact, value: f32) {
        match self {
            TextProperty::X => text.position.x = value,
            TextProperty::Y => text.position.y = value,
            TextProperty::Alpha => text.alpha = value.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone)]
struct Tween {
    id: TweenId,
    target: TextId,
    property: TextProperty,
    from: f32,
    to: f32,
    duration: Duration,
    elapsed: Duration,
}

/// Linear property tweens over text artifacts.
#[derive(Debug, Default)]
pub(crate) struct TweenSet {
    next_id: u64,
    tweens: Vec<Tween>,
}

impl TweenSet {
    pub(crate) fn add(
        &mut self,
        target: &TextArtifact,
        property: TextProperty,
        to: f32,
        duration: Duration,
    ) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.tweens.push(Tween {
            id,
            target: target.id,
            property,
            from: property.read(target),
            to,
            duration,
            elapsed: Duration::ZERO,
        });
        id
    }

    pub(crate) fn len(&self) -> usize {
        self.tweens.len()
    }

    pub(crate) fn clear(&mut self) {
        self.tweens.clear();
    }

    /// Advances every tween and returns the ids that finished this step.
    /// Tweens whose target no longer exists are dropped without completing.
    pub(crate) fn step(&mut self, texts: &mut [TextArtifact], dt: Duration) -> Vec<TweenId> {
        let mut completed = Vec::new();
        self.tweens.retain_mut(|tween| {
            let Some(text) = texts.iter_mut().find(|text| text.id == tween.target) else {
                return false;
            };

            tween.elapsed = tween.elapsed.saturating_add(dt).min(tween.duration);
            let progress = if tween.duration.is_zero() {
                1.0
            } else {
                tween.elapsed.as_secs_f32() / tween.duration.as_secs_f32()
            };
            let value = tween.from + (tween.to - tween.from) * progress;
            tween.property.write(text, value);

            if tween.elapsed >= tween.duration {
                tween.property.write(text, tween.to);
                completed.push(tween.id);
                return false;
            }
            true
        });
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{TextStyle, Vec2};

    fn text(id: TextId) -> TextArtifact {
        TextArtifact {
            id,
            position: Vec2 { x: 180.0, y: 150.0 },
            text: "100".to_string(),
            style: TextStyle::default(),
            alpha: 1.0,
        }
    }

    #[test]
    fn tween_interpolates_linearly_and_completes_once() {
        let mut texts = vec![text(TextId(0))];
        let mut tweens = TweenSet::default();
        let id = tweens.add(&texts[0], TextProperty::Y, 130.0, Duration::from_millis(500));

        assert!(tweens
            .step(&mut texts, Duration::from_millis(250))
            .is_empty());
        assert!((texts[0].position.y - 140.0).abs() < 1e-4);

        let done = tweens.step(&mut texts, Duration::from_millis(250));
        assert_eq!(done, vec![id]);
        assert_eq!(texts[0].position.y, 130.0);
        assert_eq!(tweens.len(), 0);
        assert!(tweens
            .step(&mut texts, Duration::from_millis(250))
            .is_empty());
    }

    #[test]
    fn tween_on_missing_target_is_dropped_silently() {
        let mut texts = vec![text(TextId(3))];
        let mut tweens = TweenSet::default();
        tweens.add(&texts[0], TextProperty::Alpha, 0.0, Duration::from_millis(500));
        texts.clear();

        assert!(tweens
            .step(&mut texts, Duration::from_millis(600))
            .is_empty());
        assert_eq!(tweens.len(), 0);
    }

    #[test]
    fn alpha_is_clamped_to_unit_range() {
        let mut texts = vec![text(TextId(1))];
        let mut tweens = TweenSet::default();
        tweens.add(&texts[0], TextProperty::Alpha, -2.0, Duration::from_millis(10));
        tweens.step(&mut texts, Duration::from_millis(10));
        assert_eq!(texts[0].alpha, 0.0);
    }
}
