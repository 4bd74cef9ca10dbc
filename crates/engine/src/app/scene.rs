use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use super::animation::{AnimationDef, AnimationPlayer, AnimationRegistry, PlayMode, TextureDesc};
use super::audio::AudioBus;
use super::input::{ActionStates, InputAction};
use super::physics::{
    Body, BodyDesc, BodyDescError, BodySet, ColliderId, Contact, GroupId, PairMode, PhysicsWorld,
    Rect,
};
use super::tween::{TextProperty, TweenId, TweenSet};
use crate::TextureKeyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    /// Tear the active world down and run `load` again from scratch.
    Restart,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    dump_state_pressed: bool,
    actions: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, dump_state_pressed: bool, actions: ActionStates) -> Self {
        Self {
            quit_requested,
            dump_state_pressed,
            actions,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn dump_state_pressed(&self) -> bool {
        self.dump_state_pressed
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_dump_state_pressed(mut self, pressed: bool) -> Self {
        self.dump_state_pressed = pressed;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// World-space scroll camera. `scroll` is the top-left corner of the view.
#[derive(Debug, Clone, Copy, Default)]
pub struct Camera2D {
    pub scroll: Vec2,
    pub viewport: Vec2,
    pub bounds: Option<Rect>,
    pub follow: Option<EntityId>,
}

impl Camera2D {
    pub fn center_on(&mut self, target: Vec2) {
        self.scroll = Vec2 {
            x: target.x - self.viewport.x * 0.5,
            y: target.y - self.viewport.y * 0.5,
        };
        if let Some(bounds) = self.bounds {
            self.scroll.x = clamp_axis(self.scroll.x, bounds.left(), bounds.right(), self.viewport.x);
            self.scroll.y = clamp_axis(self.scroll.y, bounds.top(), bounds.bottom(), self.viewport.y);
        }
    }
}

fn clamp_axis(scroll: f32, min: f32, max: f32, extent: f32) -> f32 {
    let upper = max - extent;
    if upper <= min {
        return min;
    }
    scroll.clamp(min, upper)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderableKind {
    Placeholder { color: [u8; 4] },
    Sprite { texture: &'static str },
}

#[derive(Debug, Clone)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub debug_name: &'static str,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub renderable: RenderableDesc,
    pub body: Body,
    pub display_size: Vec2,
    pub flip_x: bool,
    pub animation: AnimationPlayer,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn applied_spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_family: &'static str,
    pub font_size: f32,
    pub color: [u8; 4],
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "pixel",
            font_size: 6.4,
            color: [255, 255, 255, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextArtifact {
    pub id: TextId,
    pub position: Vec2,
    pub text: String,
    pub style: TextStyle,
    pub alpha: f32,
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    next_applied_spawn_order: u64,
    camera: Camera2D,
    physics: PhysicsWorld,
    animations: AnimationRegistry,
    animations_paused: bool,
    texts: Vec<TextArtifact>,
    next_text_id: u64,
    tweens: TweenSet,
    audio: AudioBus,
}

impl SceneWorld {
    pub fn with_viewport(viewport: Vec2) -> Self {
        let mut world = Self::default();
        world.camera.viewport = viewport;
        world
    }

    /// Queues a body for the next `apply_pending`.
    pub fn spawn(
        &mut self,
        desc: BodyDesc,
        renderable: RenderableDesc,
    ) -> Result<EntityId, BodyDescError> {
        let display_size = desc.size;
        let body = desc.into_body()?;
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            renderable,
            body,
            display_size,
            flip_x: false,
            animation: AnimationPlayer::default(),
            applied_spawn_order: 0,
        });
        Ok(id)
    }

    /// Removes the entity immediately, whether applied or still pending.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if let Some(index) = self.entities.iter().position(|entity| entity.id == id) {
            self.entities.remove(index);
            return true;
        }
        if let Some(index) = self.pending_spawns.iter().position(|entity| entity.id == id) {
            self.pending_spawns.remove(index);
            return true;
        }
        false
    }

    pub fn apply_pending(&mut self) {
        for mut entity in self.pending_spawns.drain(..) {
            entity.applied_spawn_order = self.next_applied_spawn_order;
            self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
            self.entities.push(entity);
        }
    }

    /// Drops every entity, text, tween, collider and registration. The
    /// camera keeps its viewport; looping audio is stopped.
    pub fn clear(&mut self) {
        let viewport = self.camera.viewport;
        self.audio.stop_all();
        self.entities.clear();
        self.pending_spawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = Camera2D {
            viewport,
            ..Camera2D::default()
        };
        self.physics = PhysicsWorld::default();
        self.animations.clear();
        self.animations_paused = false;
        self.texts.clear();
        self.tweens.clear();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.find_entity(id).map(|entity| &entity.body)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.find_entity_mut(id).map(|entity| &mut entity.body)
    }

    pub fn group_members(&self, group: GroupId) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|entity| entity.body.group == Some(group))
            .map(|entity| entity.id)
            .collect()
    }

    pub fn create_group(&mut self) -> GroupId {
        self.physics.create_group()
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.physics.set_gravity(gravity);
    }

    pub fn gravity(&self) -> Vec2 {
        self.physics.gravity()
    }

    pub fn set_world_bounds(&mut self, bounds: Rect) {
        self.physics.set_bounds(bounds);
    }

    pub fn world_bounds(&self) -> Option<Rect> {
        self.physics.bounds()
    }

    pub fn add_collider(&mut self, a: BodySet, b: BodySet, notify: bool) -> ColliderId {
        self.physics.add_pair(a, b, PairMode::Collide, notify)
    }

    pub fn add_overlap(&mut self, a: BodySet, b: BodySet) -> ColliderId {
        self.physics.add_pair(a, b, PairMode::Overlap, true)
    }

    pub fn step_physics(&mut self, dt_seconds: f32) -> Vec<Contact> {
        self.physics.step(&mut self.entities, dt_seconds)
    }

    pub fn pause_physics(&mut self) {
        self.physics.set_paused(true);
    }

    pub fn resume_physics(&mut self) {
        self.physics.set_paused(false);
    }

    pub fn physics_paused(&self) -> bool {
        self.physics.is_paused()
    }

    pub fn register_texture(&mut self, texture: TextureDesc) -> Result<(), TextureKeyError> {
        self.animations.register_texture(texture)
    }

    pub fn register_animation(&mut self, animation: AnimationDef) -> Result<(), TextureKeyError> {
        if self.animations.texture(animation.texture).is_none() {
            warn!(
                animation = animation.key,
                texture = animation.texture,
                "animation_texture_unregistered"
            );
        }
        self.animations.register(animation)
    }

    pub fn animations(&self) -> &AnimationRegistry {
        &self.animations
    }

    /// Unknown keys and missing entities are ignored and return `false`.
    pub fn play_animation(&mut self, id: EntityId, key: &str, mode: PlayMode) -> bool {
        let Some(animation) = self.animations.get(key) else {
            warn!(animation = key, "animation_unknown");
            return false;
        };
        let Some(entity) = self.entities.iter_mut().find(|entity| entity.id == id) else {
            return false;
        };
        entity.animation.play(animation, mode)
    }

    pub fn pause_all_animations(&mut self) {
        self.animations_paused = true;
    }

    pub fn resume_all_animations(&mut self) {
        self.animations_paused = false;
    }

    pub fn animations_paused(&self) -> bool {
        self.animations_paused
    }

    pub fn step_animations(&mut self, dt_seconds: f32) {
        if self.animations_paused {
            return;
        }
        let registry = &self.animations;
        for entity in &mut self.entities {
            if let Some(animation) = entity.animation.current().and_then(|key| registry.get(key)) {
                entity.animation.advance(animation, dt_seconds);
            }
        }
    }

    pub fn spawn_text(&mut self, position: Vec2, text: impl Into<String>, style: TextStyle) -> TextId {
        let id = TextId(self.next_text_id);
        self.next_text_id = self.next_text_id.saturating_add(1);
        self.texts.push(TextArtifact {
            id,
            position,
            text: text.into(),
            style,
            alpha: 1.0,
        });
        id
    }

    pub fn destroy_text(&mut self, id: TextId) -> bool {
        let before = self.texts.len();
        self.texts.retain(|text| text.id != id);
        self.texts.len() != before
    }

    pub fn find_text(&self, id: TextId) -> Option<&TextArtifact> {
        self.texts.iter().find(|text| text.id == id)
    }

    pub fn texts(&self) -> &[TextArtifact] {
        &self.texts
    }

    /// Returns `None` when the target text no longer exists.
    pub fn add_tween(
        &mut self,
        target: TextId,
        property: TextProperty,
        to: f32,
        duration: Duration,
    ) -> Option<TweenId> {
        let text = self.texts.iter().find(|text| text.id == target)?;
        Some(self.tweens.add(text, property, to, duration))
    }

    pub fn active_tween_count(&self) -> usize {
        self.tweens.len()
    }

    pub fn step_tweens(&mut self, dt: Duration) -> Vec<TweenId> {
        self.tweens.step(&mut self.texts, dt)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    /// Centers the camera on its follow target, if it still exists.
    pub fn update_camera(&mut self) {
        let Some(target) = self.camera.follow else {
            return;
        };
        let Some(center) = self.body(target).map(|body| body.rect.center()) else {
            return;
        };
        self.camera.center_on(center);
    }

    pub fn audio(&self) -> &AudioBus {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioBus {
        &mut self.audio
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt: Duration,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
    fn debug_lines(&self, _world: &SceneWorld) -> Vec<String> {
        Vec::new()
    }
}

pub(crate) struct SceneMachine {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
    restart_count: u32,
}

impl SceneMachine {
    pub(crate) fn new(scene: Box<dyn Scene>, viewport: Vec2) -> Self {
        Self {
            scene,
            world: SceneWorld::with_viewport(viewport),
            is_loaded: false,
            restart_count: 0,
        }
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, fixed_dt: Duration, input: &InputSnapshot) -> SceneCommand {
        self.scene.update(fixed_dt, input, &mut self.world)
    }

    pub(crate) fn apply_pending(&mut self) {
        self.world.apply_pending();
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub(crate) fn restart_count(&self) -> u32 {
        self.restart_count
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn debug_lines(&self) -> Vec<String> {
        self.scene.debug_lines(&self.world)
    }

    pub(crate) fn restart(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
        }
        self.world.clear();
        self.scene.load(&mut self.world);
        self.is_loaded = true;
        self.restart_count = self.restart_count.saturating_add(1);
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.is_loaded = false;
        }
    }
}
