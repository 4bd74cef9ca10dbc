use std::collections::HashMap;

use crate::texture_keys::{validate_texture_key, validate_texture_path, TextureKeyError};

/// A spritesheet laid out as a single row of equally sized frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub key: &'static str,
    pub path: &'static str,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl TextureDesc {
    pub(crate) fn validate(&self) -> Result<(), TextureKeyError> {
        validate_texture_key(self.key)?;
        validate_texture_path(self.path)?;
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(TextureKeyError::EmptyFrame {
                width: self.frame_width,
                height: self.frame_height,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDef {
    pub key: &'static str,
    pub texture: &'static str,
    pub frames: Vec<u32>,
    pub frame_rate: f32,
    pub repeat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Keep the current playback when the same key is already playing.
    IgnoreIfPlaying,
    /// Start from the first frame even when the key is already playing.
    Restart,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationRegistry {
    textures: HashMap<&'static str, TextureDesc>,
    animations: HashMap<&'static str, AnimationDef>,
}

impl AnimationRegistry {
    pub fn register_texture(&mut self, texture: TextureDesc) -> Result<(), TextureKeyError> {
        texture.validate()?;
        self.textures.insert(texture.key, texture);
        Ok(())
    }

    pub fn register(&mut self, animation: AnimationDef) -> Result<(), TextureKeyError> {
        validate_texture_key(animation.key)?;
        validate_texture_key(animation.texture)?;
        self.animations.insert(animation.key, animation);
        Ok(())
    }

    pub fn texture(&self, key: &str) -> Option<&TextureDesc> {
        self.textures.get(key)
    }

    pub fn textures(&self) -> impl Iterator<Item = &TextureDesc> {
        self.textures.values()
    }

    pub fn get(&self, key: &str) -> Option<&AnimationDef> {
        self.animations.get(key)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.animations.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnimationPlayer {
    current: Option<&'static str>,
    frame_cursor: usize,
    elapsed_seconds: f32,
    starts: u32,
}

impl AnimationPlayer {
    pub fn current(&self) -> Option<&'static str> {
        self.current
    }

    /// Number of times playback was (re)started on this entity.
    pub fn starts(&self) -> u32 {
        self.starts
    }

    pub fn frame(&self, animation: &AnimationDef) -> Option<u32> {
        animation.frames.get(self.frame_cursor).copied()
    }

    pub(crate) fn play(&mut self, animation: &AnimationDef, mode: PlayMode) -> bool {
        if mode == PlayMode::IgnoreIfPlaying && self.current == Some(animation.key) {
            return false;
        }
        self.current = Some(animation.key);
        self.frame_cursor = 0;
        self.elapsed_seconds = 0.0;
        self.starts = self.starts.saturating_add(1);
        true
    }

    pub(crate) fn advance(&mut self, animation: &AnimationDef, dt_seconds: f32) {
        if animation.frames.len() <= 1 || animation.frame_rate <= 0.0 {
            return;
        }
        let frame_duration = 1.0 / animation.frame_rate;
        self.elapsed_seconds += dt_seconds;
        while self.elapsed_seconds >= frame_duration {
            self.elapsed_seconds -= frame_duration;
            if self.frame_cursor + 1 < animation.frames.len() {
                self.frame_cursor += 1;
            } else if animation.repeat {
                self.frame_cursor = 0;
            } else {
                self.elapsed_seconds = 0.0;
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk() -> AnimationDef {
        AnimationDef {
            key: "goomba-walk",
            texture: "goomba",
            frames: vec![0, 1],
            frame_rate: 12.0,
            repeat: true,
        }
    }

    #[test]
    fn ignore_if_playing_keeps_progress() {
        let animation = walk();
        let mut player = AnimationPlayer::default();
        assert!(player.play(&animation, PlayMode::IgnoreIfPlaying));
        player.advance(&animation, 1.0 / 12.0);
        assert_eq!(player.frame(&animation), Some(1));

        assert!(!player.play(&animation, PlayMode::IgnoreIfPlaying));
        assert_eq!(player.frame(&animation), Some(1));
        assert_eq!(player.starts(), 1);

        assert!(player.play(&animation, PlayMode::Restart));
        assert_eq!(player.frame(&animation), Some(0));
        assert_eq!(player.starts(), 2);
    }

    #[test]
    fn repeating_animation_wraps_and_one_shot_holds_last_frame() {
        let looping = walk();
        let mut player = AnimationPlayer::default();
        player.play(&looping, PlayMode::Restart);
        player.advance(&looping, 2.0 / 12.0 + 0.001);
        assert_eq!(player.frame(&looping), Some(0));

        let once = AnimationDef {
            repeat: false,
            ..walk()
        };
        let mut player = AnimationPlayer::default();
        player.play(&once, PlayMode::Restart);
        player.advance(&once, 1.0);
        assert_eq!(player.frame(&once), Some(1));
    }

    #[test]
    fn registry_rejects_bad_textures() {
        let mut registry = AnimationRegistry::default();
        let bad = TextureDesc {
            key: "mario",
            path: "../mario.png",
            frame_width: 18,
            frame_height: 16,
        };
        assert_eq!(
            registry.register_texture(bad),
            Err(TextureKeyError::ParentTraversal)
        );

        let empty_frame = TextureDesc {
            key: "mario",
            path: "entities/mario.png",
            frame_width: 0,
            frame_height: 16,
        };
        assert!(registry.register_texture(empty_frame).is_err());
        assert!(registry.texture("mario").is_none());
    }
}
