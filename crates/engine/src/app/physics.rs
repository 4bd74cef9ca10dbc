use serde::Serialize;
use thiserror::Error;

use super::scene::{Entity, EntityId, Vec2};

const CONTACT_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.width * 0.5,
            y: self.y + self.height * 0.5,
        }
    }

    /// Strict intersection; rectangles sharing only an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    Dynamic,
}

/// Per-face contact flags, reset at the start of every physics step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Touching {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Touching {
    pub fn none(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySet {
    Body(EntityId),
    Group(GroupId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairMode {
    /// Bodies are separated and touching flags are set.
    Collide,
    /// Detection only, no physical response.
    Overlap,
}

/// A collision or overlap reported by `SceneWorld::step_physics`.
///
/// `a` always belongs to the first set of the registration and `b` to the
/// second. Touching flags are the bodies' accumulated flags at the moment
/// the pair was resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub collider: ColliderId,
    pub mode: PairMode,
    pub a: EntityId,
    pub b: EntityId,
    pub a_touching: Touching,
    pub b_touching: Touching,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BodyDescError {
    #[error("body size must be positive and finite, got {width}x{height}")]
    InvalidSize { width: f32, height: f32 },
    #[error("body origin must lie within 0..=1 on both axes, got ({x}, {y})")]
    InvalidOrigin { x: f32, y: f32 },
}

#[derive(Debug, Clone)]
pub struct Body {
    pub kind: BodyKind,
    pub rect: Rect,
    pub origin: Vec2,
    pub velocity: Vec2,
    pub gravity_y: f32,
    pub collide_world_bounds: bool,
    /// Cleared to opt the body out of every collider and overlap pair.
    pub check_collision: bool,
    pub touching: Touching,
    /// Faces blocked by the world bounds this step.
    pub blocked: Touching,
    pub group: Option<GroupId>,
    prev_rect: Rect,
}

impl Body {
    /// The anchor point selected by `origin`, e.g. bottom-left for `(0, 1)`.
    pub fn position(&self) -> Vec2 {
        Vec2 {
            x: self.rect.x + self.origin.x * self.rect.width,
            y: self.rect.y + self.origin.y * self.rect.height,
        }
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.rect.x = position.x - self.origin.x * self.rect.width;
        self.rect.y = position.y - self.origin.y * self.rect.height;
    }

    pub fn size(&self) -> Vec2 {
        Vec2 {
            x: self.rect.width,
            y: self.rect.height,
        }
    }

    /// Resizes around the anchor point so it stays where it is.
    pub fn set_size(&mut self, width: f32, height: f32) {
        let anchor = self.position();
        self.rect.width = width;
        self.rect.height = height;
        self.set_position(anchor);
    }

    pub fn set_velocity_x(&mut self, x: f32) {
        self.velocity.x = x;
    }

    pub fn set_velocity_y(&mut self, y: f32) {
        self.velocity.y = y;
    }

    fn interactive(&self) -> bool {
        self.check_collision
    }

    fn clamp_to_bounds(&mut self, bounds: Rect) {
        if self.rect.left() < bounds.left() {
            self.rect.x = bounds.left();
            self.blocked.left = true;
            self.velocity.x = self.velocity.x.max(0.0);
        } else if self.rect.right() > bounds.right() {
            self.rect.x = bounds.right() - self.rect.width;
            self.blocked.right = true;
            self.velocity.x = self.velocity.x.min(0.0);
        }

        if self.rect.top() < bounds.top() {
            self.rect.y = bounds.top();
            self.blocked.up = true;
            self.velocity.y = self.velocity.y.max(0.0);
        } else if self.rect.bottom() > bounds.bottom() {
            self.rect.y = bounds.bottom() - self.rect.height;
            self.blocked.down = true;
            self.velocity.y = self.velocity.y.min(0.0);
        }
    }
}

#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    pub origin: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    pub gravity_y: f32,
    pub collide_world_bounds: bool,
    pub group: Option<GroupId>,
}

impl BodyDesc {
    pub fn dynamic(position: Vec2, size: Vec2) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position,
            origin: Vec2 { x: 0.5, y: 0.5 },
            size,
            velocity: Vec2::default(),
            gravity_y: 0.0,
            collide_world_bounds: false,
            group: None,
        }
    }

    pub fn fixed(position: Vec2, size: Vec2) -> Self {
        Self {
            kind: BodyKind::Static,
            ..Self::dynamic(position, size)
        }
    }

    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.origin = Vec2 { x, y };
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_gravity_y(mut self, gravity_y: f32) -> Self {
        self.gravity_y = gravity_y;
        self
    }

    pub fn with_world_bounds(mut self, collide: bool) -> Self {
        self.collide_world_bounds = collide;
        self
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    pub(crate) fn into_body(self) -> Result<Body, BodyDescError> {
        let size_ok = self.size.x.is_finite()
            && self.size.y.is_finite()
            && self.size.x > 0.0
            && self.size.y > 0.0;
        if !size_ok {
            return Err(BodyDescError::InvalidSize {
                width: self.size.x,
                height: self.size.y,
            });
        }
        if !(0.0..=1.0).contains(&self.origin.x) || !(0.0..=1.0).contains(&self.origin.y) {
            return Err(BodyDescError::InvalidOrigin {
                x: self.origin.x,
                y: self.origin.y,
            });
        }

        let mut body = Body {
            kind: self.kind,
            rect: Rect::new(0.0, 0.0, self.size.x, self.size.y),
            origin: self.origin,
            velocity: self.velocity,
            gravity_y: self.gravity_y,
            collide_world_bounds: self.collide_world_bounds,
            check_collision: true,
            touching: Touching::default(),
            blocked: Touching::default(),
            group: self.group,
            prev_rect: Rect::default(),
        };
        body.set_position(self.position);
        body.prev_rect = body.rect;
        Ok(body)
    }
}

#[derive(Debug, Clone, Copy)]
struct PairRegistration {
    id: ColliderId,
    a: BodySet,
    b: BodySet,
    mode: PairMode,
    notify: bool,
}

#[derive(Debug, Default)]
pub(crate) struct PhysicsWorld {
    gravity: Vec2,
    bounds: Option<Rect>,
    paused: bool,
    pairs: Vec<PairRegistration>,
    next_group: u32,
    next_collider: u32,
}

impl PhysicsWorld {
    pub(crate) fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub(crate) fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub(crate) fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub(crate) fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = Some(bounds);
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub(crate) fn create_group(&mut self) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group = self.next_group.saturating_add(1);
        id
    }

    pub(crate) fn add_pair(
        &mut self,
        a: BodySet,
        b: BodySet,
        mode: PairMode,
        notify: bool,
    ) -> ColliderId {
        let id = ColliderId(self.next_collider);
        self.next_collider = self.next_collider.saturating_add(1);
        self.pairs.push(PairRegistration {
            id,
            a,
            b,
            mode,
            notify,
        });
        id
    }

    /// Integrates every dynamic body, then resolves registered pairs in
    /// registration order. A paused world neither moves nor reports.
    pub(crate) fn step(&self, entities: &mut [Entity], dt_seconds: f32) -> Vec<Contact> {
        if self.paused {
            return Vec::new();
        }

        for entity in entities.iter_mut() {
            let body = &mut entity.body;
            body.touching = Touching::default();
            body.blocked = Touching::default();
            body.prev_rect = body.rect;
            if body.kind == BodyKind::Static {
                continue;
            }

            body.velocity.x += self.gravity.x * dt_seconds;
            body.velocity.y += (self.gravity.y + body.gravity_y) * dt_seconds;
            body.rect.x += body.velocity.x * dt_seconds;
            body.rect.y += body.velocity.y * dt_seconds;

            if body.collide_world_bounds {
                if let Some(bounds) = self.bounds {
                    body.clamp_to_bounds(bounds);
                }
            }
        }

        let mut contacts = Vec::new();
        for pair in &self.pairs {
            let left = resolve_set(pair.a, entities);
            let right = resolve_set(pair.b, entities);
            for &i in &left {
                for &j in &right {
                    if i == j {
                        continue;
                    }
                    if !entities[i].body.interactive() || !entities[j].body.interactive() {
                        continue;
                    }
                    if !entities[i].body.rect.intersects(&entities[j].body.rect) {
                        continue;
                    }

                    if pair.mode == PairMode::Collide {
                        let (a, b) = pair_mut(entities, i, j);
                        separate(&mut a.body, &mut b.body);
                    }

                    if pair.notify {
                        contacts.push(Contact {
                            collider: pair.id,
                            mode: pair.mode,
                            a: entities[i].id,
                            b: entities[j].id,
                            a_touching: entities[i].body.touching,
                            b_touching: entities[j].body.touching,
                        });
                    }
                }
            }
        }
        contacts
    }
}

fn resolve_set(set: BodySet, entities: &[Entity]) -> Vec<usize> {
    match set {
        BodySet::Body(id) => entities
            .iter()
            .position(|entity| entity.id == id)
            .into_iter()
            .collect(),
        BodySet::Group(group) => entities
            .iter()
            .enumerate()
            .filter(|(_, entity)| entity.body.group == Some(group))
            .map(|(index, _)| index)
            .collect(),
    }
}

fn pair_mut(entities: &mut [Entity], i: usize, j: usize) -> (&mut Entity, &mut Entity) {
    if i < j {
        let (head, tail) = entities.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = entities.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

/// Pushes two intersecting bodies apart along one axis and records the
/// touching faces. The axis is the one along which the bodies were apart
/// before this step; the smaller penetration breaks ties.
fn separate(a: &mut Body, b: &mut Body) {
    let overlap_x = a.rect.right().min(b.rect.right()) - a.rect.left().max(b.rect.left());
    let overlap_y = a.rect.bottom().min(b.rect.bottom()) - a.rect.top().max(b.rect.top());
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return;
    }

    let a_was_above = a.prev_rect.bottom() <= b.prev_rect.top() + CONTACT_EPSILON;
    let a_was_below = a.prev_rect.top() >= b.prev_rect.bottom() - CONTACT_EPSILON;
    let a_was_left = a.prev_rect.right() <= b.prev_rect.left() + CONTACT_EPSILON;
    let a_was_right = a.prev_rect.left() >= b.prev_rect.right() - CONTACT_EPSILON;
    let was_vertical = a_was_above || a_was_below;
    let was_horizontal = a_was_left || a_was_right;

    let vertical = if was_vertical != was_horizontal {
        was_vertical
    } else {
        overlap_y <= overlap_x
    };

    let (a_share, b_share) = match (a.kind, b.kind) {
        (BodyKind::Static, BodyKind::Static) => return,
        (BodyKind::Static, BodyKind::Dynamic) => (0.0, 1.0),
        (BodyKind::Dynamic, BodyKind::Static) => (1.0, 0.0),
        (BodyKind::Dynamic, BodyKind::Dynamic) => (0.5, 0.5),
    };
    let against_static = a.kind == BodyKind::Static || b.kind == BodyKind::Static;

    if vertical {
        let a_on_top = if was_vertical {
            a_was_above
        } else {
            a.rect.center().y < b.rect.center().y
        };
        let (top, bottom) = if a_on_top { (a, b) } else { (b, a) };
        top.rect.y -= overlap_y * if a_on_top { a_share } else { b_share };
        bottom.rect.y += overlap_y * if a_on_top { b_share } else { a_share };
        top.touching.down = true;
        bottom.touching.up = true;
        if against_static {
            if top.kind == BodyKind::Dynamic {
                top.velocity.y = top.velocity.y.min(0.0);
            }
            if bottom.kind == BodyKind::Dynamic {
                bottom.velocity.y = bottom.velocity.y.max(0.0);
            }
        }
    } else {
        let a_on_left = if was_horizontal {
            a_was_left
        } else {
            a.rect.center().x < b.rect.center().x
        };
        let (left, right) = if a_on_left { (a, b) } else { (b, a) };
        left.rect.x -= overlap_x * if a_on_left { a_share } else { b_share };
        right.rect.x += overlap_x * if a_on_left { b_share } else { a_share };
        left.touching.right = true;
        right.touching.left = true;
        if against_static {
            if left.kind == BodyKind::Dynamic {
                left.velocity.x = left.velocity.x.min(0.0);
            }
            if right.kind == BodyKind::Dynamic {
                right.velocity.x = right.velocity.x.max(0.0);
            }
        }
    }
}
