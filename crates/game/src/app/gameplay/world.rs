use std::collections::HashMap;
use std::time::Duration;

use engine::{
    BodyDesc, BodyDescError, BodySet, ColliderId, Contact, EntityId, InputSnapshot,
    PlayMode, PlayOptions, Rect, RenderableDesc, RenderableKind, SceneCommand, SceneWorld,
    SoundHandle, TextureKeyError, TimerQueue, Vec2,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::assets::{self, anims, cues, textures};
use super::collision::{collectible_outcome, enemy_contact_outcome, CollectibleKind, Outcome};
use super::controls::MovementIntent;
use super::effects::TimedEffect;
use super::level::Level;
use super::player::{Player, PlayerMode};
use super::score::ScoreOverlay;
use super::{
    BODY_GRAVITY, COIN_SCORE, COIN_VOLUME, COLLECTIBLE_SIZE, ENEMY_REMOVAL_DELAY, ENEMY_SIZE,
    MUSIC_VOLUME, PLAYER_SIZE, STOMP_BOUNCE_VELOCITY, STOMP_SCORE,
};

const UNKNOWN_COLLECTIBLE_COLOR: [u8; 4] = [255, 0, 255, 255];

#[derive(Debug, Error)]
pub(crate) enum SetupError {
    #[error("failed to register level textures: {0}")]
    Texture(#[from] TextureKeyError),
    #[error("failed to spawn {name}: {source}")]
    Body {
        name: &'static str,
        #[source]
        source: BodyDescError,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Enemy {
    pub(crate) id: EntityId,
    pub(crate) stomped: bool,
}

/// Everything one run of the level owns. Rebuilt from scratch on restart.
#[derive(Debug)]
pub(crate) struct GameWorld {
    pub(crate) player: Player,
    pub(crate) enemy: Enemy,
    /// Remaining collectibles; `None` marks a placement of unknown kind.
    pub(crate) collectibles: HashMap<EntityId, Option<CollectibleKind>>,
    pub(crate) player_enemy: ColliderId,
    pub(crate) player_collectibles: ColliderId,
    pub(crate) music: Option<SoundHandle>,
    pub(crate) score: ScoreOverlay,
    pub(crate) timers: TimerQueue<TimedEffect>,
    level_name: String,
    death_line: f32,
}

impl GameWorld {
    pub(crate) fn setup(level: &Level, world: &mut SceneWorld) -> Result<Self, SetupError> {
        assets::register(world)?;

        let bounds = Rect::new(0.0, 0.0, level.bounds.width, level.bounds.height);
        world.set_world_bounds(bounds);
        world.set_gravity(Vec2::new(0.0, level.gravity));

        let floor = world.create_group();
        for segment in &level.floor {
            let desc = BodyDesc::fixed(
                Vec2::new(segment.x, segment.y),
                Vec2::new(segment.width, segment.height),
            )
            .with_origin(0.0, 0.5)
            .in_group(floor);
            spawn(world, "floor", desc, sprite(textures::FLOORBRICKS, "floor"))?;
        }

        let player_desc = BodyDesc::dynamic(Vec2::new(level.player.x, level.player.y), PLAYER_SIZE)
            .with_origin(0.0, 1.0)
            .with_gravity_y(BODY_GRAVITY)
            .with_world_bounds(true);
        let player_id = spawn(world, "player", player_desc, sprite(textures::MARIO, "player"))?;

        let enemy_desc = BodyDesc::dynamic(Vec2::new(level.enemy.x, level.enemy.y), ENEMY_SIZE)
            .with_origin(0.0, 1.0)
            .with_gravity_y(BODY_GRAVITY)
            .with_velocity(Vec2::new(level.enemy.velocity_x, 0.0));
        let enemy_id = spawn(world, "enemy", enemy_desc, sprite(textures::GOOMBA, "enemy"))?;

        let collectible_group = world.create_group();
        let mut collectibles = HashMap::new();
        for placement in &level.collectibles {
            let kind = CollectibleKind::from_texture_key(&placement.texture);
            let renderable = match kind {
                Some(kind) => sprite(kind.texture_key(), "collectible"),
                None => {
                    debug!(texture = %placement.texture, "collectible_kind_unknown");
                    RenderableDesc {
                        kind: RenderableKind::Placeholder {
                            color: UNKNOWN_COLLECTIBLE_COLOR,
                        },
                        debug_name: "collectible",
                    }
                }
            };
            let desc = BodyDesc::fixed(Vec2::new(placement.x, placement.y), COLLECTIBLE_SIZE)
                .in_group(collectible_group);
            let id = spawn(world, "collectible", desc, renderable)?;
            collectibles.insert(id, kind);
        }

        world.apply_pending();
        world.play_animation(enemy_id, anims::GOOMBA_WALK, PlayMode::IgnoreIfPlaying);
        world.play_animation(player_id, anims::MARIO_IDLE, PlayMode::IgnoreIfPlaying);
        for (id, kind) in collectibles.iter().filter_map(|(id, kind)| kind.map(|k| (*id, k))) {
            world.play_animation(id, kind.idle_animation(), PlayMode::IgnoreIfPlaying);
        }

        world.add_collider(BodySet::Body(player_id), BodySet::Group(floor), false);
        world.add_collider(BodySet::Body(enemy_id), BodySet::Group(floor), false);
        let player_enemy =
            world.add_collider(BodySet::Body(player_id), BodySet::Body(enemy_id), true);
        let player_collectibles =
            world.add_overlap(BodySet::Body(player_id), BodySet::Group(collectible_group));

        let camera = world.camera_mut();
        camera.bounds = Some(bounds);
        camera.follow = Some(player_id);
        world.update_camera();

        let music = world
            .audio_mut()
            .play(cues::MAIN_THEME, PlayOptions::volume(MUSIC_VOLUME).looped());

        info!(
            level = %level.name,
            floor_segments = level.floor.len(),
            collectibles = collectibles.len(),
            "level_setup"
        );

        Ok(Self {
            player: Player::new(player_id),
            enemy: Enemy {
                id: enemy_id,
                stomped: false,
            },
            collectibles,
            player_enemy,
            player_collectibles,
            music: Some(music),
            score: ScoreOverlay::default(),
            timers: TimerQueue::new(),
            level_name: level.name.clone(),
            death_line: level.death_line(),
        })
    }

    /// One fixed step: due timers, movement, physics and contacts, the
    /// lower-bound check, then presentation state.
    pub(crate) fn tick(
        &mut self,
        world: &mut SceneWorld,
        fixed_dt: Duration,
        input: &InputSnapshot,
    ) -> SceneCommand {
        self.timers.advance(fixed_dt);
        while let Some((_, effect)) = self.timers.pop_due() {
            if self.fire(world, effect) == SceneCommand::Restart {
                return SceneCommand::Restart;
            }
        }

        self.player
            .apply_intent(world, MovementIntent::from_input(input));

        let dt_seconds = fixed_dt.as_secs_f32();
        for contact in world.step_physics(dt_seconds) {
            self.dispatch_contact(world, contact);
        }

        if self.player_below_death_line(world) {
            self.kill_player(world);
        }

        let completed = world.step_tweens(fixed_dt);
        self.score.on_tweens_completed(world, &completed);
        world.step_animations(dt_seconds);
        world.update_camera();
        SceneCommand::None
    }

    pub(crate) fn fire(&mut self, world: &mut SceneWorld, effect: TimedEffect) -> SceneCommand {
        debug!(effect = effect.label(), "timed_effect_fired");
        match effect {
            TimedEffect::RemoveEnemy(id) => {
                if world.despawn(id) {
                    info!(enemy = id.0, "enemy_removed");
                } else {
                    debug!(enemy = id.0, "stale_timer_effect_ignored");
                }
            }
            TimedEffect::FlickerFrame => self.player.on_flicker(world),
            TimedEffect::CompleteTransform => {
                self.player.complete_transform(world, &mut self.timers);
            }
            TimedEffect::DeathHop => self.player.death_hop(world),
            TimedEffect::Restart => {
                info!(level = %self.level_name, score = self.score.total(), "restart_requested");
                return SceneCommand::Restart;
            }
        }
        SceneCommand::None
    }

    pub(crate) fn dispatch_contact(&mut self, world: &mut SceneWorld, contact: Contact) {
        if contact.collider == self.player_enemy {
            let outcome = enemy_contact_outcome(
                self.player.is_dead,
                self.enemy.stomped,
                contact.a_touching,
                contact.b_touching,
            );
            match outcome {
                Outcome::Stomp => self.stomp_enemy(world),
                Outcome::Kill => self.kill_player(world),
                _ => {}
            }
        } else if contact.collider == self.player_collectibles {
            // Entries leave the registry on collection, so a repeat overlap
            // finds nothing.
            let Some(kind) = self.collectibles.get(&contact.b).copied() else {
                return;
            };
            match collectible_outcome(kind) {
                Outcome::CollectCoin => self.collect_coin(world, contact.b),
                Outcome::CollectPowerUp => self.collect_power_up(world, contact.b),
                _ => {}
            }
        }
    }

    /// Idempotent: only the first call has any effect.
    pub(crate) fn kill_player(&mut self, world: &mut SceneWorld) {
        if self.player.die(world, &mut self.timers, self.music) {
            self.music = None;
        }
    }

    fn stomp_enemy(&mut self, world: &mut SceneWorld) {
        self.enemy.stomped = true;
        world.play_animation(self.enemy.id, anims::GOOMBA_HURT, PlayMode::Restart);
        if let Some(body) = world.body_mut(self.enemy.id) {
            body.set_velocity_x(0.0);
        }
        let origin = match world.body_mut(self.player.id) {
            Some(body) => {
                body.set_velocity_y(STOMP_BOUNCE_VELOCITY);
                body.position()
            }
            None => Vec2::default(),
        };
        world
            .audio_mut()
            .play(cues::GOOMBA_STOMP, PlayOptions::default());
        self.score.award(world, STOMP_SCORE, origin);
        self.timers
            .schedule_once(ENEMY_REMOVAL_DELAY, TimedEffect::RemoveEnemy(self.enemy.id));
        info!(enemy = self.enemy.id.0, "enemy_stomped");
    }

    fn collect_coin(&mut self, world: &mut SceneWorld, id: EntityId) {
        let Some(origin) = self.consume_collectible(world, id) else {
            return;
        };
        world
            .audio_mut()
            .play(cues::COIN_PICKUP, PlayOptions::volume(COIN_VOLUME));
        self.score.award(world, COIN_SCORE, origin);
    }

    fn collect_power_up(&mut self, world: &mut SceneWorld, id: EntityId) {
        if self.consume_collectible(world, id).is_none() {
            return;
        }
        if !self.player.begin_transform(world, &mut self.timers) {
            debug!(mode = ?self.player.mode, "power_up_consumed_without_transform");
        }
    }

    /// Despawns before any side effect and returns where the item was.
    fn consume_collectible(&mut self, world: &mut SceneWorld, id: EntityId) -> Option<Vec2> {
        self.collectibles.remove(&id)?;
        let origin = world.body(id).map(|body| body.position());
        world.despawn(id);
        debug!(collectible = id.0, "collectible_consumed");
        origin
    }

    fn player_below_death_line(&self, world: &SceneWorld) -> bool {
        world
            .body(self.player.id)
            .is_some_and(|body| body.position().y >= self.death_line)
    }

    pub(crate) fn state_dump(&self, world: &SceneWorld) -> StateDump {
        let player_body = world.body(self.player.id);
        let mut collectibles: Vec<CollectibleDump> = self
            .collectibles
            .iter()
            .filter_map(|(id, kind)| {
                world.body(*id).map(|body| CollectibleDump {
                    id: id.0,
                    kind: *kind,
                    position: body.position(),
                })
            })
            .collect();
        collectibles.sort_by_key(|entry| entry.id);

        StateDump {
            level: self.level_name.clone(),
            scene_time_ms: self.timers.now().as_millis() as u64,
            player: PlayerDump {
                mode: self.player.mode,
                is_grown: self.player.is_grown,
                is_blocked: self.player.is_blocked,
                is_dead: self.player.is_dead,
                flicker_ticks: self.player.flicker_ticks(),
                position: player_body.map(|body| body.position()).unwrap_or_default(),
                velocity: player_body.map(|body| body.velocity).unwrap_or_default(),
            },
            enemy: world.body(self.enemy.id).map(|body| EnemyDump {
                stomped: self.enemy.stomped,
                position: body.position(),
            }),
            collectibles,
            score: self.score.total(),
            score_texts: self.score.in_flight(),
            pending_timers: self.timers.pending_actions().map(|effect| effect.label()).collect(),
        }
    }

    pub(crate) fn mode(&self) -> PlayerMode {
        self.player.mode
    }
}

fn sprite(texture: &'static str, debug_name: &'static str) -> RenderableDesc {
    RenderableDesc {
        kind: RenderableKind::Sprite { texture },
        debug_name,
    }
}

fn spawn(
    world: &mut SceneWorld,
    name: &'static str,
    desc: BodyDesc,
    renderable: RenderableDesc,
) -> Result<EntityId, SetupError> {
    world
        .spawn(desc, renderable)
        .map_err(|source| SetupError::Body { name, source })
}

/// Snapshot logged on demand from the debug key.
#[derive(Debug, Serialize)]
pub(crate) struct StateDump {
    pub(crate) level: String,
    pub(crate) scene_time_ms: u64,
    pub(crate) player: PlayerDump,
    pub(crate) enemy: Option<EnemyDump>,
    pub(crate) collectibles: Vec<CollectibleDump>,
    pub(crate) score: u32,
    pub(crate) score_texts: usize,
    pub(crate) pending_timers: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PlayerDump {
    pub(crate) mode: PlayerMode,
    pub(crate) is_grown: bool,
    pub(crate) is_blocked: bool,
    pub(crate) is_dead: bool,
    pub(crate) flicker_ticks: u32,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnemyDump {
    pub(crate) stomped: bool,
    pub(crate) position: Vec2,
}

#[derive(Debug, Serialize)]
pub(crate) struct CollectibleDump {
    pub(crate) id: u64,
    pub(crate) kind: Option<CollectibleKind>,
    pub(crate) position: Vec2,
}
