mod overlay;

pub(crate) use overlay::{
    blend_pixel, draw_overlay, draw_text_scaled, fill_rect_blended, OverlayData, GLYPH_HEIGHT,
};
