use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

use crate::pixels::{Image, Pixel};
use crate::viewport::Viewport;

const MARKER_COLOR: Color = Color::Rgb(255, 0, 0);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawMode {
    /// Paint the cell background, symbol in black on top.
    Background,
    /// Paint the symbol itself.
    Foreground,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GlyphStyle {
    pub symbol: char,
    pub mode: DrawMode,
}

impl Default for GlyphStyle {
    fn default() -> Self {
        Self {
            symbol: '$',
            mode: DrawMode::Background,
        }
    }
}

impl From<Pixel> for Color {
    fn from(pixel: Pixel) -> Self {
        Color::Rgb(pixel.r, pixel.g, pixel.b)
    }
}

/// Draws one averaged glyph per visible cell of the viewport.
pub struct BlockRenderer<'a> {
    pub image: &'a Image,
    pub viewport: &'a Viewport,
    pub style: GlyphStyle,
    pub marker: bool,
}

impl<'a> BlockRenderer<'a> {
    pub fn new(image: &'a Image, viewport: &'a Viewport, style: GlyphStyle) -> Self {
        Self {
            image,
            viewport,
            style,
            marker: false,
        }
    }

    pub fn with_marker(mut self, marker: bool) -> Self {
        self.marker = marker;
        self
    }
}

impl Widget for BlockRenderer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let geometry = self.viewport.geometry();
        let (offset_x, offset_y) = self.viewport.offset();
        let (width, height) = (self.image.width(), self.image.height());

        for row in 0..geometry.bounded_h.min(area.height) {
            let source_y = u32::from(row) * geometry.block_h + offset_y;
            if source_y >= height {
                break;
            }
            for col in 0..geometry.bounded_w.min(area.width) {
                let source_x = u32::from(col) * geometry.block_w + offset_x;
                if source_x >= width {
                    break;
                }
                let color = average_block(
                    self.image,
                    source_x,
                    source_y,
                    geometry.block_w,
                    geometry.block_h,
                    geometry.pixels_per_cell,
                );
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    match self.style.mode {
                        DrawMode::Background => cell
                            .set_char(self.style.symbol)
                            .set_fg(Color::Black)
                            .set_bg(color.into()),
                        DrawMode::Foreground => {
                            cell.set_char(self.style.symbol).set_fg(color.into())
                        }
                    };
                }
            }
        }

        if self.marker && self.viewport.zoom() == 1 {
            let (x, y) = self.viewport.cursor();
            if x < area.width && y < area.height {
                if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                    match self.style.mode {
                        DrawMode::Background => cell.set_char(' ').set_bg(MARKER_COLOR),
                        DrawMode::Foreground => cell.set_char('_').set_fg(MARKER_COLOR),
                    };
                }
            }
        }
    }
}

/// Average of the `block_w` x `block_h` window whose top-left pixel is
/// (`x`, `y`).
///
/// Window pixels past the image edge are skipped, yet the sums are still
/// divided by the full `pixels_per_cell`, so edge cells come out darker.
pub fn average_block(
    image: &Image,
    x: u32,
    y: u32,
    block_w: u32,
    block_h: u32,
    pixels_per_cell: u32,
) -> Pixel {
    let x_end = x.saturating_add(block_w).min(image.width());
    let y_end = y.saturating_add(block_h).min(image.height());

    let (mut sum_r, mut sum_g, mut sum_b) = (0u64, 0u64, 0u64);
    for py in y..y_end {
        for px in x..x_end {
            let p = image.pixel(px, py);
            sum_r += u64::from(p.r);
            sum_g += u64::from(p.g);
            sum_b += u64::from(p.b);
        }
    }

    let divisor = u64::from(pixels_per_cell.max(1));
    let channel = |sum: u64| u8::try_from(sum / divisor).unwrap_or(u8::MAX);
    Pixel::new(channel(sum_r), channel(sum_g), channel(sum_b))
}
