use engine::{EntityId, PlayMode, PlayOptions, SceneWorld, SoundHandle, TimerHandle, TimerQueue};
use serde::Serialize;
use tracing::{debug, info};

use super::assets::{anims, cues};
use super::controls::{Horizontal, MovementIntent};
use super::effects::{TimedEffect, DEATH_SEQUENCE};
use super::{
    DEATH_HOP_VELOCITY, FLICKER_INTERVAL, GAMEOVER_VOLUME, GROWN_PLAYER_SIZE, JUMP_VELOCITY,
    POWERUP_VOLUME, TRANSFORM_DURATION, WALK_SPEED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PlayerMode {
    Idle,
    Transforming,
    Grown,
    Dead,
}

#[derive(Debug)]
pub(crate) struct Player {
    pub(crate) id: EntityId,
    pub(crate) mode: PlayerMode,
    pub(crate) is_grown: bool,
    pub(crate) is_blocked: bool,
    pub(crate) is_dead: bool,
    pub(crate) flicker: Option<TimerHandle>,
    pub(crate) transform_completion: Option<TimerHandle>,
    flicker_ticks: u32,
}

impl Player {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            mode: PlayerMode::Idle,
            is_grown: false,
            is_blocked: false,
            is_dead: false,
            flicker: None,
            transform_completion: None,
            flicker_ticks: 0,
        }
    }

    /// Freezes the world while the power-up plays out. Only an idle player
    /// transforms; returns whether the transition happened.
    pub(crate) fn begin_transform(
        &mut self,
        world: &mut SceneWorld,
        timers: &mut TimerQueue<TimedEffect>,
    ) -> bool {
        if self.mode != PlayerMode::Idle {
            return false;
        }
        world.pause_physics();
        world.pause_all_animations();
        world
            .audio_mut()
            .play(cues::POWERUP, PlayOptions::volume(POWERUP_VOLUME));
        self.is_blocked = true;
        self.is_grown = true;
        self.flicker_ticks = 0;
        self.flicker = Some(timers.schedule_repeating(FLICKER_INTERVAL, TimedEffect::FlickerFrame));
        self.transform_completion =
            Some(timers.schedule_once(TRANSFORM_DURATION, TimedEffect::CompleteTransform));
        self.mode = PlayerMode::Transforming;
        info!(player = self.player_raw(), "player_transforming");
        true
    }

    pub(crate) fn on_flicker(&mut self, world: &mut SceneWorld) {
        if self.mode != PlayerMode::Transforming {
            debug!("flicker_ignored_not_transforming");
            return;
        }
        self.flicker_ticks = self.flicker_ticks.saturating_add(1);
        let key = if self.flicker_ticks % 2 == 0 {
            anims::MARIO_GROWN_IDLE
        } else {
            anims::MARIO_IDLE
        };
        world.play_animation(self.id, key, PlayMode::Restart);
    }

    pub(crate) fn flicker_ticks(&self) -> u32 {
        self.flicker_ticks
    }

    pub(crate) fn complete_transform(
        &mut self,
        world: &mut SceneWorld,
        timers: &mut TimerQueue<TimedEffect>,
    ) -> bool {
        if self.mode != PlayerMode::Transforming {
            debug!("transform_completion_ignored");
            return false;
        }
        if let Some(entity) = world.find_entity_mut(self.id) {
            entity.body.set_size(GROWN_PLAYER_SIZE.x, GROWN_PLAYER_SIZE.y);
            entity.display_size = GROWN_PLAYER_SIZE;
        }
        world.resume_all_animations();
        self.is_blocked = false;
        if let Some(flicker) = self.flicker.take() {
            timers.cancel(flicker);
        }
        self.transform_completion = None;
        world.resume_physics();
        self.mode = PlayerMode::Grown;
        info!(player = self.player_raw(), "player_grown");
        true
    }

    /// Starts the death sequence. A second call is a silent no-op and
    /// returns `false`.
    pub(crate) fn die(
        &mut self,
        world: &mut SceneWorld,
        timers: &mut TimerQueue<TimedEffect>,
        music: Option<SoundHandle>,
    ) -> bool {
        if self.is_dead {
            return false;
        }
        if self.mode == PlayerMode::Transforming {
            if let Some(flicker) = self.flicker.take() {
                timers.cancel(flicker);
            }
            if let Some(completion) = self.transform_completion.take() {
                timers.cancel(completion);
            }
            world.resume_physics();
            world.resume_all_animations();
            self.is_blocked = false;
        }

        self.is_dead = true;
        self.mode = PlayerMode::Dead;
        world.play_animation(self.id, anims::MARIO_DEAD, PlayMode::Restart);
        if let Some(body) = world.body_mut(self.id) {
            body.collide_world_bounds = false;
            body.check_collision = false;
            body.set_velocity_x(0.0);
        }
        if let Some(music) = music {
            world.audio_mut().stop(music);
        }
        world
            .audio_mut()
            .play(cues::GAMEOVER, PlayOptions::volume(GAMEOVER_VOLUME));
        for (delay, effect) in DEATH_SEQUENCE {
            timers.schedule_once(delay, effect);
        }
        info!(player = self.player_raw(), "player_died");
        true
    }

    pub(crate) fn death_hop(&self, world: &mut SceneWorld) {
        if !self.is_dead {
            return;
        }
        if let Some(body) = world.body_mut(self.id) {
            body.set_velocity_y(DEATH_HOP_VELOCITY);
        }
    }

    /// Moves the player for this tick. Blocked or dead players ignore input.
    pub(crate) fn apply_intent(&self, world: &mut SceneWorld, intent: MovementIntent) {
        if self.is_blocked || self.is_dead {
            return;
        }
        let Some(entity) = world.find_entity_mut(self.id) else {
            return;
        };
        let on_floor = entity.body.touching.down;
        let walk = match intent.horizontal {
            Horizontal::Left => {
                entity.body.set_velocity_x(-WALK_SPEED);
                entity.flip_x = true;
                true
            }
            Horizontal::Right => {
                entity.body.set_velocity_x(WALK_SPEED);
                entity.flip_x = false;
                true
            }
            Horizontal::None => {
                entity.body.set_velocity_x(0.0);
                false
            }
        };
        let jump = intent.jump && on_floor;
        if jump {
            entity.body.set_velocity_y(JUMP_VELOCITY);
        }

        if jump {
            world.play_animation(self.id, self.jump_animation(), PlayMode::IgnoreIfPlaying);
        } else if on_floor {
            let key = if walk {
                self.walk_animation()
            } else {
                self.idle_animation()
            };
            world.play_animation(self.id, key, PlayMode::IgnoreIfPlaying);
        }
    }

    pub(crate) fn idle_animation(&self) -> &'static str {
        if self.is_grown {
            anims::MARIO_GROWN_IDLE
        } else {
            anims::MARIO_IDLE
        }
    }

    pub(crate) fn walk_animation(&self) -> &'static str {
        if self.is_grown {
            anims::MARIO_GROWN_WALK
        } else {
            anims::MARIO_WALK
        }
    }

    pub(crate) fn jump_animation(&self) -> &'static str {
        if self.is_grown {
            anims::MARIO_GROWN_JUMP
        } else {
            anims::MARIO_JUMP
        }
    }

    fn player_raw(&self) -> u64 {
        self.id.0
    }
}
