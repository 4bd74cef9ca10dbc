use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use tracing::warn;
use winit::window::Window;

use crate::app::tools::{
    blend_pixel, draw_overlay, draw_text_scaled, fill_rect_blended, OverlayData, GLYPH_HEIGHT,
};
use crate::app::{AnimationRegistry, Camera2D, Entity, RenderableKind, SceneWorld, TextArtifact};
use crate::texture_keys::validate_texture_path;

use super::{world_to_screen, Viewport};

const CLEAR_COLOR: [u8; 4] = [0x04, 0x9c, 0xd8, 255];

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// A source rectangle inside a loaded spritesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRect {
    left: i32,
    top: i32,
    width: i32,
    height: i32,
}

/// Software renderer over a fixed-size logical frame buffer. The surface
/// follows the window size and `pixels` scales the buffer up to it.
pub struct Renderer {
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<&'static str, Option<LoadedSprite>>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, viewport: Viewport, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, window);
        let pixels = Pixels::new(viewport.width, viewport.height, surface)?;
        Ok(Self {
            pixels,
            viewport,
            asset_root,
            sprite_cache: HashMap::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    pub(crate) fn render_world(
        &mut self,
        world: &SceneWorld,
        overlay_data: Option<&OverlayData>,
    ) -> Result<(), Error> {
        let Viewport { width, height } = self.viewport;
        let asset_root = self.asset_root.as_path();
        let sprite_cache = &mut self.sprite_cache;
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        let camera = world.camera();
        let registry = world.animations();
        for entity in world.entities() {
            let rect = entity_screen_rect(entity, camera);
            match resolve_entity_frame(entity, registry) {
                Some((texture_key, source)) => {
                    let sprite = resolve_cached_sprite(sprite_cache, registry, asset_root, texture_key);
                    match sprite {
                        Some(sprite) => {
                            draw_sprite_frame(frame, width, height, sprite, source, rect, entity.flip_x)
                        }
                        None => fill_rect_blended(
                            frame,
                            width,
                            height,
                            rect.left,
                            rect.top,
                            rect.width,
                            rect.height,
                            fallback_color(texture_key),
                        ),
                    }
                }
                None => {
                    let color = match entity.renderable.kind {
                        RenderableKind::Placeholder { color } => color,
                        RenderableKind::Sprite { texture } => fallback_color(texture),
                    };
                    fill_rect_blended(
                        frame,
                        width,
                        height,
                        rect.left,
                        rect.top,
                        rect.width,
                        rect.height,
                        color,
                    );
                }
            }
        }

        for text in world.texts() {
            draw_text_artifact(frame, width, height, text, camera);
        }

        if let Some(data) = overlay_data {
            draw_overlay(frame, width, height, data);
        }

        self.pixels.render()
    }
}

/// Screen rectangle of the entity's display size, anchored at the body's origin.
fn entity_screen_rect(entity: &Entity, camera: &Camera2D) -> ScreenRect {
    let anchor = entity.body.position();
    let origin = entity.body.origin;
    let display = entity.display_size;
    let top_left = crate::app::Vec2 {
        x: anchor.x - origin.x * display.x,
        y: anchor.y - origin.y * display.y,
    };
    let (left, top) = world_to_screen(top_left, camera);
    ScreenRect {
        left,
        top,
        width: display.x.round().max(1.0) as i32,
        height: display.y.round().max(1.0) as i32,
    }
}

/// Texture key and source frame for an entity: the current animation frame
/// when one is playing, otherwise frame 0 of its sprite texture.
fn resolve_entity_frame(
    entity: &Entity,
    registry: &AnimationRegistry,
) -> Option<(&'static str, FrameRect)> {
    let (texture_key, frame_index) = match entity.animation.current().and_then(|key| registry.get(key)) {
        Some(animation) => (animation.texture, entity.animation.frame(animation).unwrap_or(0)),
        None => match entity.renderable.kind {
            RenderableKind::Sprite { texture } => (texture, 0),
            RenderableKind::Placeholder { .. } => return None,
        },
    };
    let texture = registry.texture(texture_key)?;
    Some((
        texture.key,
        FrameRect {
            x: frame_index * texture.frame_width,
            y: 0,
            width: texture.frame_width,
            height: texture.frame_height,
        },
    ))
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<&'static str, Option<LoadedSprite>>,
    registry: &AnimationRegistry,
    asset_root: &Path,
    key: &'static str,
) -> Option<&'a LoadedSprite> {
    cache
        .entry(key)
        .or_insert_with(|| {
            let path = registry.texture(key)?.path;
            match load_sprite_rgba(asset_root, path) {
                Ok(sprite) => Some(sprite),
                Err(reason) => {
                    warn!(
                        texture = key,
                        path,
                        reason = reason.as_str(),
                        "renderer_sprite_load_failed_using_placeholder"
                    );
                    None
                }
            }
        })
        .as_ref()
}

fn load_sprite_rgba(asset_root: &Path, relative_path: &str) -> Result<LoadedSprite, String> {
    validate_texture_path(relative_path).map_err(|error| format!("invalid_path:{error}"))?;
    let path = asset_root.join(relative_path);
    let reader = ImageReader::open(&path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

/// Stable per-texture colour for sprites whose image is unavailable.
fn fallback_color(key: &str) -> [u8; 4] {
    let hash = key
        .bytes()
        .fold(0x811c_9dc5u32, |hash, byte| (hash ^ byte as u32).wrapping_mul(0x0100_0193));
    [
        96 + (hash & 0x7f) as u8,
        96 + ((hash >> 8) & 0x7f) as u8,
        96 + ((hash >> 16) & 0x7f) as u8,
        255,
    ]
}

/// Nearest-neighbour blit of `source` into `target`, skipping transparent texels.
fn draw_sprite_frame(
    frame: &mut [u8],
    width: u32,
    height: u32,
    sprite: &LoadedSprite,
    source: FrameRect,
    target: ScreenRect,
    flip_x: bool,
) {
    if source.width == 0 || source.height == 0 || target.width <= 0 || target.height <= 0 {
        return;
    }
    if source.x + source.width > sprite.width || source.y + source.height > sprite.height {
        return;
    }
    if sprite.rgba.len() < sprite.width as usize * sprite.height as usize * 4 {
        return;
    }

    for dy in 0..target.height {
        let src_y = source.y + (dy as u32 * source.height) / target.height as u32;
        for dx in 0..target.width {
            let mut local_x = (dx as u32 * source.width) / target.width as u32;
            if flip_x {
                local_x = source.width - 1 - local_x;
            }
            let src_offset = ((src_y * sprite.width + source.x + local_x) * 4) as usize;
            let texel = [
                sprite.rgba[src_offset],
                sprite.rgba[src_offset + 1],
                sprite.rgba[src_offset + 2],
                sprite.rgba[src_offset + 3],
            ];
            if texel[3] == 0 {
                continue;
            }
            blend_pixel(frame, width, height, target.left + dx, target.top + dy, texel);
        }
    }
}

fn draw_text_artifact(frame: &mut [u8], width: u32, height: u32, text: &TextArtifact, camera: &Camera2D) {
    let alpha = (text.alpha.clamp(0.0, 1.0) * text.style.color[3] as f32).round() as u8;
    if alpha == 0 {
        return;
    }
    let mut color = text.style.color;
    color[3] = alpha;
    let scale = (text.style.font_size / GLYPH_HEIGHT as f32).floor().max(1.0) as i32;
    let (x, y) = world_to_screen(text.position, camera);
    draw_text_scaled(frame, width, height, x, y, &text.text, color, scale);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AnimationDef, BodyDesc, PlayMode, RenderableDesc, TextureDesc, Vec2};

    fn mario_world() -> (SceneWorld, crate::app::EntityId) {
        let mut world = SceneWorld::with_viewport(Vec2 { x: 256.0, y: 244.0 });
        world
            .register_texture(TextureDesc {
                key: "mario",
                path: "sprites/mario.png",
                frame_width: 18,
                frame_height: 16,
            })
            .expect("texture");
        world
            .register_animation(AnimationDef {
                key: "mario-walk",
                texture: "mario",
                frames: vec![3, 2, 1],
                frame_rate: 12.0,
                repeat: true,
            })
            .expect("animation");
        let id = world
            .spawn(
                BodyDesc::dynamic(Vec2 { x: 50.0, y: 210.0 }, Vec2 { x: 18.0, y: 16.0 })
                    .with_origin(0.0, 1.0),
                RenderableDesc {
                    kind: RenderableKind::Sprite { texture: "mario" },
                    debug_name: "mario",
                },
            )
            .expect("spawn");
        world.apply_pending();
        (world, id)
    }

    #[test]
    fn entity_rect_is_anchored_at_body_origin() {
        let (world, id) = mario_world();
        let entity = world.find_entity(id).expect("entity");
        let rect = entity_screen_rect(entity, world.camera());
        assert_eq!(
            rect,
            ScreenRect {
                left: 50,
                top: 194,
                width: 18,
                height: 16,
            }
        );
    }

    #[test]
    fn playing_animation_selects_texture_frame() {
        let (mut world, id) = mario_world();
        let entity = world.find_entity(id).expect("entity");
        let (key, source) = resolve_entity_frame(entity, world.animations()).expect("frame");
        assert_eq!((key, source.x), ("mario", 0));

        world.play_animation(id, "mario-walk", PlayMode::IgnoreIfPlaying);
        let entity = world.find_entity(id).expect("entity");
        let (_, source) = resolve_entity_frame(entity, world.animations()).expect("frame");
        assert_eq!(source.x, 3 * 18);
    }

    #[test]
    fn flipped_blit_mirrors_columns() {
        let sprite = LoadedSprite {
            width: 2,
            height: 1,
            rgba: vec![255, 0, 0, 255, 0, 0, 255, 255],
        };
        let source = FrameRect {
            x: 0,
            y: 0,
            width: 2,
            height: 1,
        };
        let target = ScreenRect {
            left: 0,
            top: 0,
            width: 2,
            height: 1,
        };
        let mut frame = vec![0u8; 2 * 4];
        draw_sprite_frame(&mut frame, 2, 1, &sprite, source, target, true);
        assert_eq!(&frame[0..4], &[0, 0, 255, 255]);
        assert_eq!(&frame[4..8], &[255, 0, 0, 255]);
    }

    #[test]
    fn missing_sprite_is_cached_as_placeholder() {
        let (world, _) = mario_world();
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = HashMap::new();
        assert!(resolve_cached_sprite(&mut cache, world.animations(), dir.path(), "mario").is_none());
        assert!(cache.contains_key("mario"));
    }

    #[test]
    fn faded_text_draws_nothing() {
        let camera = Camera2D::default();
        let text = TextArtifact {
            id: crate::app::TextId(0),
            position: Vec2 { x: 1.0, y: 1.0 },
            text: "100".to_string(),
            style: crate::app::TextStyle::default(),
            alpha: 0.0,
        };
        let mut frame = vec![0u8; 16 * 8 * 4];
        draw_text_artifact(&mut frame, 16, 8, &text, &camera);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn fallback_colors_are_stable_and_opaque() {
        assert_eq!(fallback_color("coin"), fallback_color("coin"));
        assert_ne!(fallback_color("coin"), fallback_color("goomba"));
        assert_eq!(fallback_color("coin")[3], 255);
    }
}
