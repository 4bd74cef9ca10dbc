use crate::app::{Camera2D, Vec2};

/// Size of the logical frame buffer in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// One world unit maps to one logical pixel; the camera scroll is the
/// top-left corner of the frame. Y grows downward on both sides.
pub fn world_to_screen(world: Vec2, camera: &Camera2D) -> (i32, i32) {
    let x = world.x - camera.scroll.x;
    let y = world.y - camera.scroll.y;
    (x.round() as i32, y.round() as i32)
}
