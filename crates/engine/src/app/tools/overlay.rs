use crate::app::LoopMetricsSnapshot;

const GLYPH_WIDTH: i32 = 3;
pub(crate) const GLYPH_HEIGHT: i32 = 5;
const GLYPH_ADVANCE: i32 = GLYPH_WIDTH + 1;
const LINE_ADVANCE: i32 = GLYPH_HEIGHT + 2;
const OVERLAY_PADDING: i32 = 6;
const OVERLAY_PANEL_INSET: i32 = 3;
const OVERLAY_TEXT_PRIMARY_COLOR: [u8; 4] = [244, 248, 252, 255];
const OVERLAY_TEXT_DIM_COLOR: [u8; 4] = [176, 198, 220, 255];
const OVERLAY_PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 200];
const PERF_SECTION_LABEL: &str = "Perf";
const SCENE_SECTION_LABEL: &str = "Scene";

#[derive(Debug, Clone)]
pub(crate) struct OverlayData {
    pub metrics: LoopMetricsSnapshot,
    pub render_fps_cap: Option<u32>,
    pub slow_frame_delay_ms: u64,
    pub entity_count: usize,
    pub restart_count: u32,
    pub scene_lines: Vec<String>,
}

pub(crate) fn draw_overlay(frame: &mut [u8], width: u32, height: u32, data: &OverlayData) {
    if width == 0 || height == 0 {
        return;
    }

    let lines = build_overlay_lines(data);
    let panel_text_width = lines
        .iter()
        .map(|line| text_width(line, 1))
        .max()
        .unwrap_or(0);
    fill_rect_blended(
        frame,
        width,
        height,
        OVERLAY_PADDING - OVERLAY_PANEL_INSET,
        OVERLAY_PADDING - OVERLAY_PANEL_INSET,
        panel_text_width + OVERLAY_PANEL_INSET * 2,
        lines.len() as i32 * LINE_ADVANCE + OVERLAY_PANEL_INSET * 2,
        OVERLAY_PANEL_BG_COLOR,
    );

    let mut y = OVERLAY_PADDING;
    for line in &lines {
        let color = if matches!(line.as_str(), PERF_SECTION_LABEL | SCENE_SECTION_LABEL) {
            OVERLAY_TEXT_DIM_COLOR
        } else {
            OVERLAY_TEXT_PRIMARY_COLOR
        };
        draw_text(frame, width, height, OVERLAY_PADDING, y, line, color);
        y += LINE_ADVANCE;
    }
}

fn build_overlay_lines(data: &OverlayData) -> Vec<String> {
    let mut lines = vec![
        PERF_SECTION_LABEL.to_string(),
        format_fps_line(data.metrics.fps, data.render_fps_cap, data.slow_frame_delay_ms),
        format!("TPS: {:.1}", data.metrics.tps),
        format!(
            "Frame: {:.1} ms (max {:.1})",
            data.metrics.frame_time_ms, data.metrics.worst_frame_ms
        ),
        format!("Clamped: {}", data.metrics.clamped_frames),
        SCENE_SECTION_LABEL.to_string(),
        format!("Entities: {}", data.entity_count),
        format!("Restarts: {}", data.restart_count),
    ];
    lines.extend(data.scene_lines.iter().cloned());
    lines
}

fn format_fps_line(current_fps: f32, cap: Option<u32>, slow_frame_delay_ms: u64) -> String {
    let cap_text = match cap {
        Some(value) => value.to_string(),
        None => "inf".to_string(),
    };
    format!("[{current_fps:.0} / {cap_text}] dbg+{slow_frame_delay_ms}ms")
}

/// Width in pixels of `text` drawn with the bitmap font at `scale`.
pub(crate) fn text_width(text: &str, scale: i32) -> i32 {
    let count = text.chars().count() as i32;
    if count == 0 {
        0
    } else {
        (count * GLYPH_ADVANCE - 1) * scale.max(1)
    }
}

/// Draws `text` with its top-left at `(x, y)`, blending by `color[3]`.
/// Characters outside printable ASCII draw as blanks.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_text_scaled(
    frame: &mut [u8],
    width: u32,
    height: u32,
    mut x: i32,
    y: i32,
    text: &str,
    color: [u8; 4],
    scale: i32,
) {
    let scale = scale.max(1);
    for ch in text.chars() {
        if let Some(rows) = glyph_rows(ch) {
            draw_glyph(frame, width, height, x, y, rows, color, scale);
        }
        x += GLYPH_ADVANCE * scale;
    }
}

fn draw_text(frame: &mut [u8], width: u32, height: u32, x: i32, y: i32, text: &str, color: [u8; 4]) {
    draw_text_scaled(frame, width, height, x, y, text, color, 1);
}

#[allow(clippy::too_many_arguments)]
fn draw_glyph(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rows: &[u8; GLYPH_HEIGHT as usize],
    color: [u8; 4],
    scale: i32,
) {
    for (row_index, row_bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if (row_bits & (1 << (GLYPH_WIDTH - 1 - col))) == 0 {
                continue;
            }
            let left = x + col * scale;
            let top = y + row_index as i32 * scale;
            fill_rect_blended(frame, width, height, left, top, scale, scale, color);
        }
    }
}

/// Source-over blend of one pixel; out-of-bounds writes are dropped.
pub(crate) fn blend_pixel(frame: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let offset = (y as usize * width as usize + x as usize) * 4;
    let Some(pixel) = frame.get_mut(offset..offset + 4) else {
        return;
    };
    let alpha = color[3] as u32;
    if alpha == 255 {
        pixel.copy_from_slice(&color);
        return;
    }
    for channel in 0..3 {
        let src = color[channel] as u32;
        let dst = pixel[channel] as u32;
        pixel[channel] = ((src * alpha + dst * (255 - alpha)) / 255) as u8;
    }
    pixel[3] = 255;
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn fill_rect_blended(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = (x + rect_width).min(width as i32);
    let end_y = (y + rect_height).min(height as i32);
    for py in start_y..end_y {
        for px in start_x..end_x {
            blend_pixel(frame, width, height, px, py, color);
        }
    }
}

fn glyph_rows(ch: char) -> Option<&'static [u8; GLYPH_HEIGHT as usize]> {
    let code = ch as u32;
    if !(0x20..=0x7e).contains(&code) {
        return None;
    }
    FONT.get((code - 0x20) as usize)
}

/// 3x5 glyphs for printable ASCII, one row per entry, MSB on the left.
const FONT: [[u8; GLYPH_HEIGHT as usize]; 95] = [
    [0b000, 0b000, 0b000, 0b000, 0b000], // space
    [0b010, 0b010, 0b010, 0b000, 0b010], // !
    [0b101, 0b101, 0b000, 0b000, 0b000], // "
    [0b101, 0b111, 0b101, 0b111, 0b101], // #
    [0b111, 0b110, 0b111, 0b011, 0b111], // $
    [0b101, 0b001, 0b010, 0b100, 0b101], // %
    [0b010, 0b101, 0b010, 0b101, 0b011], // &
    [0b010, 0b010, 0b000, 0b000, 0b000], // '
    [0b001, 0b010, 0b010, 0b010, 0b001], // (
    [0b100, 0b010, 0b010, 0b010, 0b100], // )
    [0b000, 0b101, 0b010, 0b101, 0b000], // *
    [0b000, 0b010, 0b111, 0b010, 0b000], // +
    [0b000, 0b000, 0b000, 0b010, 0b100], // ,
    [0b000, 0b000, 0b111, 0b000, 0b000], // -
    [0b000, 0b000, 0b000, 0b000, 0b010], // .
    [0b001, 0b001, 0b010, 0b100, 0b100], // /
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b010, 0b010, 0b010], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
    [0b000, 0b010, 0b000, 0b010, 0b000], // :
    [0b000, 0b010, 0b000, 0b010, 0b100], // ;
    [0b001, 0b010, 0b100, 0b010, 0b001], // <
    [0b000, 0b111, 0b000, 0b111, 0b000], // =
    [0b100, 0b010, 0b001, 0b010, 0b100], // >
    [0b111, 0b001, 0b011, 0b000, 0b010], // ?
    [0b111, 0b101, 0b111, 0b100, 0b111], // @
    [0b010, 0b101, 0b111, 0b101, 0b101], // A
    [0b110, 0b101, 0b110, 0b101, 0b110], // B
    [0b111, 0b100, 0b100, 0b100, 0b111], // C
    [0b110, 0b101, 0b101, 0b101, 0b110], // D
    [0b111, 0b100, 0b110, 0b100, 0b111], // E
    [0b111, 0b100, 0b110, 0b100, 0b100], // F
    [0b111, 0b100, 0b101, 0b101, 0b111], // G
    [0b101, 0b101, 0b111, 0b101, 0b101], // H
    [0b111, 0b010, 0b010, 0b010, 0b111], // I
    [0b111, 0b001, 0b001, 0b101, 0b111], // J
    [0b101, 0b101, 0b110, 0b101, 0b101], // K
    [0b100, 0b100, 0b100, 0b100, 0b111], // L
    [0b101, 0b111, 0b111, 0b101, 0b101], // M
    [0b101, 0b111, 0b111, 0b111, 0b101], // N
    [0b111, 0b101, 0b101, 0b101, 0b111], // O
    [0b110, 0b101, 0b110, 0b100, 0b100], // P
    [0b111, 0b101, 0b101, 0b111, 0b001], // Q
    [0b110, 0b101, 0b110, 0b101, 0b101], // R
    [0b111, 0b100, 0b111, 0b001, 0b111], // S
    [0b111, 0b010, 0b010, 0b010, 0b010], // T
    [0b101, 0b101, 0b101, 0b101, 0b111], // U
    [0b101, 0b101, 0b101, 0b101, 0b010], // V
    [0b101, 0b101, 0b111, 0b111, 0b101], // W
    [0b101, 0b101, 0b010, 0b101, 0b101], // X
    [0b101, 0b101, 0b010, 0b010, 0b010], // Y
    [0b111, 0b001, 0b010, 0b100, 0b111], // Z
    [0b110, 0b100, 0b100, 0b100, 0b110], // [
    [0b100, 0b100, 0b010, 0b001, 0b001], // \
    [0b011, 0b001, 0b001, 0b001, 0b011], // ]
    [0b010, 0b101, 0b000, 0b000, 0b000], // ^
    [0b000, 0b000, 0b000, 0b000, 0b111], // _
    [0b100, 0b010, 0b000, 0b000, 0b000], // `
    [0b000, 0b111, 0b001, 0b111, 0b111], // a
    [0b100, 0b100, 0b110, 0b101, 0b110], // b
    [0b000, 0b111, 0b100, 0b100, 0b111], // c
    [0b001, 0b001, 0b111, 0b101, 0b111], // d
    [0b000, 0b111, 0b110, 0b100, 0b111], // e
    [0b011, 0b100, 0b110, 0b100, 0b100], // f
    [0b000, 0b111, 0b101, 0b111, 0b001], // g
    [0b100, 0b100, 0b110, 0b101, 0b101], // h
    [0b010, 0b000, 0b010, 0b010, 0b010], // i
    [0b001, 0b000, 0b001, 0b101, 0b010], // j
    [0b100, 0b101, 0b110, 0b101, 0b101], // k
    [0b100, 0b100, 0b100, 0b100, 0b111], // l
    [0b000, 0b110, 0b111, 0b101, 0b101], // m
    [0b000, 0b110, 0b101, 0b101, 0b101], // n
    [0b000, 0b111, 0b101, 0b101, 0b111], // o
    [0b000, 0b110, 0b101, 0b110, 0b100], // p
    [0b000, 0b111, 0b101, 0b111, 0b001], // q
    [0b000, 0b110, 0b101, 0b100, 0b100], // r
    [0b000, 0b111, 0b110, 0b001, 0b111], // s
    [0b010, 0b111, 0b010, 0b010, 0b011], // t
    [0b000, 0b101, 0b101, 0b101, 0b111], // u
    [0b000, 0b101, 0b101, 0b101, 0b010], // v
    [0b000, 0b101, 0b101, 0b111, 0b010], // w
    [0b000, 0b101, 0b010, 0b010, 0b101], // x
    [0b000, 0b101, 0b101, 0b111, 0b001], // y
    [0b000, 0b111, 0b001, 0b010, 0b111], // z
    [0b011, 0b010, 0b110, 0b010, 0b011], // {
    [0b010, 0b010, 0b010, 0b010, 0b010], // |
    [0b110, 0b010, 0b011, 0b010, 0b110], // }
    [0b000, 0b011, 0b110, 0b000, 0b000], // ~
];

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_pixels(frame: &[u8]) -> usize {
        frame
            .chunks_exact(4)
            .filter(|px| px.iter().any(|byte| *byte != 0))
            .count()
    }

    #[test]
    fn every_printable_ascii_has_a_glyph() {
        for code in 0x20u8..=0x7e {
            assert!(glyph_rows(char::from(code)).is_some());
        }
        assert!(glyph_rows('\u{7f}').is_none());
        assert!(glyph_rows('é').is_none());
    }

    #[test]
    fn score_digits_draw_opaque_pixels() {
        let mut frame = vec![0u8; 16 * 8 * 4];
        draw_text(&mut frame, 16, 8, 0, 0, "200", [255, 255, 255, 255]);
        assert!(lit_pixels(&frame) > 0);
        assert_eq!(text_width("200", 1), 11);
        assert_eq!(text_width("200", 2), 22);
    }

    #[test]
    fn transparent_text_leaves_frame_untouched() {
        let mut frame = vec![0u8; 16 * 8 * 4];
        draw_text(&mut frame, 16, 8, 0, 0, "100", [255, 255, 255, 0]);
        assert!(frame
            .chunks_exact(4)
            .all(|px| px[0] == 0 && px[1] == 0 && px[2] == 0));
    }

    #[test]
    fn clipped_draws_are_safe() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        draw_text(&mut frame, 8, 8, -2, -2, "FPS", OVERLAY_TEXT_PRIMARY_COLOR);
        draw_text(&mut frame, 8, 8, 64, 64, "TPS", OVERLAY_TEXT_PRIMARY_COLOR);

        let mut empty = vec![];
        draw_text(&mut empty, 0, 8, 0, 0, "Entities", OVERLAY_TEXT_PRIMARY_COLOR);
        draw_overlay(
            &mut empty,
            0,
            0,
            &OverlayData {
                metrics: LoopMetricsSnapshot::default(),
                render_fps_cap: None,
                slow_frame_delay_ms: 0,
                entity_count: 0,
                restart_count: 0,
                scene_lines: Vec::new(),
            },
        );
    }

    #[test]
    fn overlay_lines_append_scene_lines() {
        let data = OverlayData {
            metrics: LoopMetricsSnapshot::default(),
            render_fps_cap: Some(60),
            slow_frame_delay_ms: 0,
            entity_count: 6,
            restart_count: 1,
            scene_lines: vec!["score: 300".to_string(), "mode: grown".to_string()],
        };
        let lines = build_overlay_lines(&data);
        assert_eq!(lines[1], "[0 / 60] dbg+0ms");
        assert_eq!(lines[4], "Clamped: 0");
        assert_eq!(lines[6], "Entities: 6");
        assert_eq!(lines.last().map(String::as_str), Some("mode: grown"));

        let mut frame = vec![0u8; 256 * 244 * 4];
        draw_overlay(&mut frame, 256, 244, &data);
        assert!(lit_pixels(&frame) > 0);
    }
}
