use super::assets::{anims, cues};
use super::collision::{collectible_outcome, enemy_contact_outcome, CollectibleKind, Outcome};
use super::controls::{Horizontal, MovementIntent};
use super::effects::TimedEffect;
use super::player::PlayerMode;
use super::score::ScoreOverlay;
use super::world::GameWorld;
use super::*;
use engine::{
    AudioCommand, Contact, InputAction, InputSnapshot, PairMode, SceneCommand, SceneWorld,
    TextStyle, Touching, Vec2,
};

const STEP: Duration = Duration::from_millis(10);

fn loaded_scene() -> (PlatformerScene, SceneWorld) {
    let level = Level::overworld().expect("embedded level parses");
    let mut scene = PlatformerScene::new(level);
    let mut world = SceneWorld::with_viewport(Vec2::new(256.0, 244.0));
    scene.load(&mut world);
    world.apply_pending();
    (scene, world)
}

fn state(scene: &PlatformerScene) -> &GameWorld {
    scene.state().expect("level loaded")
}

fn state_mut(scene: &mut PlatformerScene) -> &mut GameWorld {
    scene.state_mut().expect("level loaded")
}

fn tick(scene: &mut PlatformerScene, world: &mut SceneWorld, input: &InputSnapshot) -> SceneCommand {
    let command = scene.update(STEP, input, world);
    world.apply_pending();
    command
}

fn idle_ticks(scene: &mut PlatformerScene, world: &mut SceneWorld, count: usize) {
    let input = InputSnapshot::empty();
    for _ in 0..count {
        assert_eq!(tick(scene, world, &input), SceneCommand::None);
    }
}

fn place_player(scene: &PlatformerScene, world: &mut SceneWorld, x: f32, y: f32) {
    let body = world.body_mut(state(scene).player.id).expect("player body");
    body.set_position(Vec2::new(x, y));
    body.velocity = Vec2::default();
}

fn plays_of(world: &SceneWorld, cue: &str) -> usize {
    world
        .audio()
        .pending()
        .iter()
        .filter(|command| matches!(command, AudioCommand::Play { cue: played, .. } if *played == cue))
        .count()
}

fn stops(world: &SceneWorld) -> usize {
    world
        .audio()
        .pending()
        .iter()
        .filter(|command| matches!(command, AudioCommand::Stop { .. }))
        .count()
}

fn pending_restarts(scene: &PlatformerScene) -> usize {
    state(scene)
        .timers
        .pending_actions()
        .filter(|effect| **effect == TimedEffect::Restart)
        .count()
}

fn touching(up: bool, down: bool) -> Touching {
    Touching {
        up,
        down,
        ..Touching::default()
    }
}

#[test]
fn setup_spawns_level_and_starts_music() {
    let (scene, world) = loaded_scene();
    let state = state(&scene);

    // two floor bricks, player, enemy, two coins, one mushroom
    assert_eq!(world.entity_count(), 7);
    assert_eq!(state.collectibles.len(), 3);
    assert_eq!(state.player.mode, PlayerMode::Idle);
    assert!(world.audio().is_playing(state.music.expect("music handle")));
    assert_eq!(plays_of(&world, cues::MAIN_THEME), 1);

    let enemy = world.find_entity(state.enemy.id).expect("enemy");
    assert_eq!(enemy.animation.current(), Some(anims::GOOMBA_WALK));
    assert_eq!(enemy.body.velocity.x, -50.0);
    assert_eq!(world.camera().follow, Some(state.player.id));
}

#[test]
fn player_settles_on_the_floor() {
    let (mut scene, mut world) = loaded_scene();
    idle_ticks(&mut scene, &mut world, 20);

    let body = world.body(state(&scene).player.id).expect("player body");
    assert!(body.touching.down);
    assert!((body.position().y - 212.0).abs() < 0.01);
}

#[test]
fn death_is_idempotent() {
    let (mut scene, mut world) = loaded_scene();
    let player_id = state(&scene).player.id;
    let starts_before = world
        .find_entity(player_id)
        .expect("player")
        .animation
        .starts();

    state_mut(&mut scene).kill_player(&mut world);
    state_mut(&mut scene).kill_player(&mut world);

    let player = world.find_entity(player_id).expect("player");
    assert_eq!(player.animation.current(), Some(anims::MARIO_DEAD));
    assert_eq!(player.animation.starts(), starts_before + 1);
    assert!(!player.body.check_collision);
    assert!(!player.body.collide_world_bounds);
    assert_eq!(plays_of(&world, cues::GAMEOVER), 1);
    assert_eq!(stops(&world), 1);
    assert_eq!(pending_restarts(&scene), 1);
    assert!(state(&scene).player.is_dead);
    assert_eq!(state(&scene).music, None);
}

#[test]
fn enemy_contact_stomps_only_when_landing_on_top() {
    let cases = [
        (true, true, Outcome::Stomp),
        (true, false, Outcome::Kill),
        (false, true, Outcome::Kill),
        (false, false, Outcome::Kill),
    ];
    for (player_down, enemy_up, expected) in cases {
        let outcome = enemy_contact_outcome(
            false,
            false,
            touching(false, player_down),
            touching(enemy_up, false),
        );
        assert_eq!(outcome, expected, "player_down={player_down} enemy_up={enemy_up}");
    }
}

#[test]
fn enemy_contact_is_ignored_after_death_or_stomp() {
    let stomp_flags = (touching(false, true), touching(true, false));
    assert_eq!(
        enemy_contact_outcome(true, false, stomp_flags.0, stomp_flags.1),
        Outcome::Ignore
    );
    assert_eq!(
        enemy_contact_outcome(false, true, Touching::default(), Touching::default()),
        Outcome::Ignore
    );
}

#[test]
fn collectible_outcome_follows_kind() {
    assert_eq!(collectible_outcome(Some(CollectibleKind::Coin)), Outcome::CollectCoin);
    assert_eq!(
        collectible_outcome(Some(CollectibleKind::PowerUp)),
        Outcome::CollectPowerUp
    );
    assert_eq!(collectible_outcome(None), Outcome::Ignore);
    assert_eq!(CollectibleKind::from_texture_key("coin"), Some(CollectibleKind::Coin));
    assert_eq!(CollectibleKind::from_texture_key("cloud1"), None);
}

#[test]
fn stomp_awards_once_and_removes_enemy_after_delay() {
    let (mut scene, mut world) = loaded_scene();
    let (player_id, enemy_id, collider) = {
        let state = state(&scene);
        (state.player.id, state.enemy.id, state.player_enemy)
    };
    let contact = Contact {
        collider,
        mode: PairMode::Collide,
        a: player_id,
        b: enemy_id,
        a_touching: touching(false, true),
        b_touching: touching(true, false),
    };

    state_mut(&mut scene).dispatch_contact(&mut world, contact);
    state_mut(&mut scene).dispatch_contact(&mut world, contact);

    assert!(state(&scene).enemy.stomped);
    assert_eq!(state(&scene).score.total(), STOMP_SCORE);
    assert_eq!(plays_of(&world, cues::GOOMBA_STOMP), 1);
    assert!(!state(&scene).player.is_dead);
    let enemy = world.find_entity(enemy_id).expect("enemy");
    assert_eq!(enemy.animation.current(), Some(anims::GOOMBA_HURT));
    assert_eq!(enemy.body.velocity.x, 0.0);
    assert_eq!(
        world.body(player_id).expect("player").velocity.y,
        STOMP_BOUNCE_VELOCITY
    );

    idle_ticks(&mut scene, &mut world, 49);
    assert!(world.find_entity(enemy_id).is_some());
    idle_ticks(&mut scene, &mut world, 1);
    assert!(world.find_entity(enemy_id).is_none());
}

#[test]
fn stale_enemy_removal_is_a_no_op() {
    let (mut scene, mut world) = loaded_scene();
    let enemy_id = state(&scene).enemy.id;
    assert!(world.despawn(enemy_id));
    let count = world.entity_count();

    let command = state_mut(&mut scene).fire(&mut world, TimedEffect::RemoveEnemy(enemy_id));

    assert_eq!(command, SceneCommand::None);
    assert_eq!(world.entity_count(), count);
}

#[test]
fn coin_is_consumed_exactly_once() {
    let (mut scene, mut world) = loaded_scene();
    place_player(&scene, &mut world, 170.0, 158.0);

    idle_ticks(&mut scene, &mut world, 1);
    assert_eq!(state(&scene).score.total(), COIN_SCORE);
    assert_eq!(state(&scene).collectibles.len(), 2);
    assert_eq!(world.entity_count(), 6);

    place_player(&scene, &mut world, 170.0, 158.0);
    idle_ticks(&mut scene, &mut world, 1);
    assert_eq!(state(&scene).score.total(), COIN_SCORE);
    assert_eq!(plays_of(&world, cues::COIN_PICKUP), 1);
    assert_eq!(world.texts().len(), 1);
}

#[test]
fn power_up_transform_flickers_then_grows() {
    let (mut scene, mut world) = loaded_scene();
    let player_id = state(&scene).player.id;
    place_player(&scene, &mut world, 195.0, 210.0);

    idle_ticks(&mut scene, &mut world, 1);
    {
        let player = &state(&scene).player;
        assert_eq!(player.mode, PlayerMode::Transforming);
        assert!(player.is_blocked && player.is_grown);
        assert!(player.flicker.is_some() && player.transform_completion.is_some());
    }
    assert!(world.physics_paused());
    assert!(world.animations_paused());
    assert_eq!(plays_of(&world, cues::POWERUP), 1);
    assert_eq!(state(&scene).score.total(), 0);

    idle_ticks(&mut scene, &mut world, 10);
    assert_eq!(state(&scene).player.flicker_ticks(), 1);
    assert_eq!(
        world.find_entity(player_id).expect("player").animation.current(),
        Some(anims::MARIO_IDLE)
    );
    idle_ticks(&mut scene, &mut world, 10);
    assert_eq!(state(&scene).player.flicker_ticks(), 2);
    assert_eq!(
        world.find_entity(player_id).expect("player").animation.current(),
        Some(anims::MARIO_GROWN_IDLE)
    );

    // Input is ignored while blocked.
    let right = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);
    tick(&mut scene, &mut world, &right);
    assert_eq!(world.body(player_id).expect("player").velocity.x, 0.0);

    idle_ticks(&mut scene, &mut world, 78);
    assert_eq!(state(&scene).player.mode, PlayerMode::Transforming);
    idle_ticks(&mut scene, &mut world, 1);

    let player = &state(&scene).player;
    assert_eq!(player.mode, PlayerMode::Grown);
    assert!(!player.is_blocked);
    assert!(player.flicker.is_none());
    assert!(!world.physics_paused());
    assert!(!world.animations_paused());
    let entity = world.find_entity(player_id).expect("player");
    assert_eq!(entity.body.size(), GROWN_PLAYER_SIZE);
    assert_eq!(entity.display_size, GROWN_PLAYER_SIZE);
    assert!((entity.body.position().y - 210.0).abs() < 0.5);
    assert!(!state(&scene)
        .timers
        .pending_actions()
        .any(|effect| *effect == TimedEffect::FlickerFrame));
}

#[test]
fn transform_then_death_leaves_no_flicker() {
    let (mut scene, mut world) = loaded_scene();
    place_player(&scene, &mut world, 195.0, 210.0);
    idle_ticks(&mut scene, &mut world, 31);
    assert_eq!(state(&scene).player.mode, PlayerMode::Transforming);

    state_mut(&mut scene).kill_player(&mut world);

    let flicker_ticks = state(&scene).player.flicker_ticks();
    {
        let state = state(&scene);
        assert!(state.player.flicker.is_none());
        assert!(state.player.transform_completion.is_none());
        assert!(!state.timers.pending_actions().any(|effect| matches!(
            effect,
            TimedEffect::FlickerFrame | TimedEffect::CompleteTransform
        )));
    }
    assert!(!world.physics_paused());
    assert!(!world.animations_paused());

    idle_ticks(&mut scene, &mut world, 120);
    assert_eq!(state(&scene).player.flicker_ticks(), flicker_ticks);
    assert_eq!(state(&scene).player.mode, PlayerMode::Dead);
}

#[test]
fn falling_below_the_level_kills_even_while_blocked() {
    let (mut scene, mut world) = loaded_scene();
    place_player(&scene, &mut world, 195.0, 210.0);
    idle_ticks(&mut scene, &mut world, 1);
    assert!(state(&scene).player.is_blocked);

    place_player(&scene, &mut world, 195.0, 244.0);
    idle_ticks(&mut scene, &mut world, 1);

    assert!(state(&scene).player.is_dead);
    assert_eq!(plays_of(&world, cues::GAMEOVER), 1);
}

#[test]
fn death_hop_then_restart_rebuilds_the_level() {
    let (mut scene, mut world) = loaded_scene();
    place_player(&scene, &mut world, 170.0, 158.0);
    idle_ticks(&mut scene, &mut world, 1);
    assert_eq!(state(&scene).score.total(), COIN_SCORE);

    state_mut(&mut scene).kill_player(&mut world);
    let player_id = state(&scene).player.id;

    idle_ticks(&mut scene, &mut world, 10);
    // hop velocity plus one step of world and body gravity
    let hop_velocity = world.body(player_id).expect("player").velocity.y;
    assert!((hop_velocity - (DEATH_HOP_VELOCITY + 6.0)).abs() < 0.01, "vy={hop_velocity}");

    let input = InputSnapshot::empty();
    let mut ticks_since_death = 10;
    let command = loop {
        ticks_since_death += 1;
        let command = tick(&mut scene, &mut world, &input);
        if command == SceneCommand::Restart || ticks_since_death > 900 {
            break command;
        }
    };
    assert_eq!(command, SceneCommand::Restart);
    assert_eq!(ticks_since_death, 800);

    scene.unload(&mut world);
    world.clear();
    scene.load(&mut world);
    world.apply_pending();

    let state = state(&scene);
    assert_eq!(world.entity_count(), 7);
    assert_eq!(state.player.mode, PlayerMode::Idle);
    assert!(!state.player.is_dead && !state.player.is_grown && !state.player.is_blocked);
    assert_eq!(state.score.total(), 0);
    assert_eq!(state.collectibles.len(), 3);
    assert_eq!(state.timers.active_count(), 0);
    assert!(!state.enemy.stomped);
    let position = world.body(state.player.id).expect("player").position();
    assert_eq!(position, Vec2::new(50.0, 210.0));
    assert!(world.texts().is_empty());
}

#[test]
fn score_text_rises_fades_and_disappears() {
    let mut world = SceneWorld::with_viewport(Vec2::new(256.0, 244.0));
    let mut overlay = ScoreOverlay::default();
    let text = overlay.award(&mut world, 100, Vec2::new(180.0, 150.0));

    let artifact = world.find_text(text).expect("score text");
    assert_eq!(artifact.text, "100");
    assert_eq!(artifact.style.font_size, SCORE_FONT_SIZE);
    assert_eq!(artifact.style.font_family, TextStyle::default().font_family);

    fn step(world: &mut SceneWorld, overlay: &mut ScoreOverlay, count: usize) {
        for _ in 0..count {
            let completed = world.step_tweens(STEP);
            overlay.on_tweens_completed(world, &completed);
        }
    }

    step(&mut world, &mut overlay, 50);
    let artifact = world.find_text(text).expect("score text after rise");
    assert_eq!(artifact.position.y, 130.0);
    assert_eq!(artifact.alpha, 1.0);

    step(&mut world, &mut overlay, 25);
    let alpha = world.find_text(text).expect("score text mid fade").alpha;
    assert!((alpha - 0.5).abs() < 0.01, "alpha={alpha}");

    step(&mut world, &mut overlay, 25);
    assert!(world.find_text(text).is_none());
    assert_eq!(overlay.in_flight(), 0);
    assert_eq!(overlay.total(), 100);
}

#[test]
fn left_wins_when_both_directions_are_held() {
    let input = InputSnapshot::empty()
        .with_action_down(InputAction::MoveLeft, true)
        .with_action_down(InputAction::MoveRight, true)
        .with_action_down(InputAction::Jump, true);
    let intent = MovementIntent::from_input(&input);
    assert_eq!(intent.horizontal, Horizontal::Left);
    assert!(intent.jump);

    let idle = MovementIntent::from_input(&InputSnapshot::empty());
    assert_eq!(idle.horizontal, Horizontal::None);
    assert!(!idle.jump);
}

#[test]
fn walking_and_jumping_on_the_floor() {
    let (mut scene, mut world) = loaded_scene();
    let player_id = state(&scene).player.id;
    idle_ticks(&mut scene, &mut world, 20);

    let right = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);
    tick(&mut scene, &mut world, &right);
    let player = world.find_entity(player_id).expect("player");
    assert_eq!(player.body.velocity.x, WALK_SPEED);
    assert!(!player.flip_x);
    assert_eq!(player.animation.current(), Some(anims::MARIO_WALK));

    let left_jump = InputSnapshot::empty()
        .with_action_down(InputAction::MoveLeft, true)
        .with_action_down(InputAction::Jump, true);
    tick(&mut scene, &mut world, &left_jump);
    let player = world.find_entity(player_id).expect("player");
    assert!(player.flip_x);
    assert_eq!(player.animation.current(), Some(anims::MARIO_JUMP));
    assert!(player.body.velocity.y < 0.0);
}

#[test]
fn second_power_up_is_consumed_without_transforming() {
    let (mut scene, mut world) = loaded_scene();
    let mushroom = state(&scene)
        .collectibles
        .iter()
        .find(|(_, kind)| **kind == Some(CollectibleKind::PowerUp))
        .map(|(id, _)| *id)
        .expect("mushroom");
    state_mut(&mut scene).player.mode = PlayerMode::Grown;
    let contact = Contact {
        collider: state(&scene).player_collectibles,
        mode: PairMode::Overlap,
        a: state(&scene).player.id,
        b: mushroom,
        a_touching: Touching::default(),
        b_touching: Touching::default(),
    };

    state_mut(&mut scene).dispatch_contact(&mut world, contact);

    assert!(world.find_entity(mushroom).is_none());
    assert_eq!(state(&scene).player.mode, PlayerMode::Grown);
    assert!(!world.physics_paused());
    assert_eq!(plays_of(&world, cues::POWERUP), 0);
}

#[test]
fn state_dump_serializes_player_and_timers() {
    let (mut scene, mut world) = loaded_scene();
    state_mut(&mut scene).kill_player(&mut world);

    let dump = state(&scene).state_dump(&world);
    let value = serde_json::to_value(&dump).expect("dump serializes");

    assert_eq!(value["player"]["mode"], "dead");
    assert_eq!(value["player"]["is_dead"], true);
    assert_eq!(value["collectibles"].as_array().map(Vec::len), Some(3));
    assert_eq!(value["pending_timers"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["collectibles"][0]["kind"], "coin");
}

#[test]
fn malformed_level_reports_json_path() {
    let raw = include_str!("../../../../../assets/levels/overworld.json")
        .replace("\"velocity_x\": -50.0", "\"velocity_x\": \"fast\"");
    match Level::from_json(&raw) {
        Err(LevelError::Parse { path, .. }) => assert_eq!(path, "enemy.velocity_x"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn level_without_floor_is_rejected() {
    let mut level = Level::overworld().expect("embedded level parses");
    level.floor.clear();
    let raw = serde_json::to_string(&level).expect("level serializes");
    assert!(matches!(
        Level::from_json(&raw),
        Err(LevelError::Invalid { field: "floor", .. })
    ));
}
