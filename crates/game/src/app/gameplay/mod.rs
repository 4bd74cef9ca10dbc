use std::time::Duration;

use engine::{Scene, Vec2};

mod assets;
mod collision;
mod controls;
mod effects;
mod level;
mod player;
mod scene_impl;
mod score;
mod world;

pub(crate) use level::{Level, LevelError};
pub(crate) use scene_impl::PlatformerScene;

const BODY_GRAVITY: f32 = 300.0;
const PLAYER_SIZE: Vec2 = Vec2::new(18.0, 16.0);
const GROWN_PLAYER_SIZE: Vec2 = Vec2::new(18.0, 32.0);
const ENEMY_SIZE: Vec2 = Vec2::new(16.0, 16.0);
const COLLECTIBLE_SIZE: Vec2 = Vec2::new(16.0, 16.0);

const WALK_SPEED: f32 = 100.0;
const JUMP_VELOCITY: f32 = -300.0;
const STOMP_BOUNCE_VELOCITY: f32 = -200.0;
const DEATH_HOP_VELOCITY: f32 = -350.0;

const STOMP_SCORE: u32 = 200;
const COIN_SCORE: u32 = 100;

const ENEMY_REMOVAL_DELAY: Duration = Duration::from_millis(500);
const TRANSFORM_DURATION: Duration = Duration::from_millis(1000);
const FLICKER_INTERVAL: Duration = Duration::from_millis(100);
const DEATH_HOP_DELAY: Duration = Duration::from_millis(100);
const RESTART_DELAY: Duration = Duration::from_millis(8000);

const SCORE_RISE_DISTANCE: f32 = 20.0;
const SCORE_RISE_DURATION: Duration = Duration::from_millis(500);
const SCORE_FADE_DURATION: Duration = Duration::from_millis(500);
/// Viewport width over 40.
const SCORE_FONT_SIZE: f32 = 256.0 / 40.0;

const MUSIC_VOLUME: f32 = 0.2;
const GAMEOVER_VOLUME: f32 = 0.2;
const COIN_VOLUME: f32 = 0.1;
const POWERUP_VOLUME: f32 = 0.1;

pub(crate) fn build_scene(level: Level) -> Box<dyn Scene> {
    Box::new(PlatformerScene::new(level))
}

#[cfg(test)]
mod tests;
