//! Zoom, pan and cursor bookkeeping.
//!
//! A [`Viewport`] maps terminal cells onto blocks of source pixels. At zoom 1
//! the whole image is fitted into the console while keeping its aspect ratio;
//! every zoom step doubles the number of cells the image would span, and
//! anything beyond one screenful is reached by panning.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// What the terminal surface has to do after a state change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Move the native terminal cursor to a cell without redrawing.
    MoveCursor { x: u16, y: u16 },
    /// Draw the current frame over the previous one.
    Refresh,
    /// Clear the screen, then draw.
    Redraw,
}

/// Derived cell-to-pixel mapping, recomputed on every geometry change.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Geometry {
    pub bounded_w: u16,
    pub bounded_h: u16,
    pub block_w: u32,
    pub block_h: u32,
    pub pixels_per_cell: u32,
    pub can_zoom_in: bool,
    pub can_pan_x: bool,
    pub can_pan_y: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    image_w: u32,
    image_h: u32,
    ratio: f64,
    console_w: u16,
    console_h: u16,
    zoom: u32,
    offset_x: u32,
    offset_y: u32,
    cursor_x: u16,
    cursor_y: u16,
    geometry: Geometry,
}

impl Viewport {
    /// A viewport for an `image_w` x `image_h` image, fitted to the console.
    pub fn new(image_w: u32, image_h: u32, console_w: u16, console_h: u16) -> Self {
        let image_w = image_w.max(1);
        let image_h = image_h.max(1);
        let mut viewport = Self {
            image_w,
            image_h,
            ratio: 2.0 * f64::from(image_w) / f64::from(image_h),
            console_w: 0,
            console_h: 0,
            zoom: 1,
            offset_x: 0,
            offset_y: 0,
            cursor_x: 0,
            cursor_y: 0,
            geometry: Geometry::default(),
        };
        viewport.on_resize(console_w, console_h);
        viewport
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    pub fn offset(&self) -> (u32, u32) {
        (self.offset_x, self.offset_y)
    }

    pub fn cursor(&self) -> (u16, u16) {
        (self.cursor_x, self.cursor_y)
    }

    pub fn console(&self) -> (u16, u16) {
        (self.console_w, self.console_h)
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.image_w, self.image_h)
    }

    /// Adopt a new console size and fall back to the fitted whole image.
    pub fn on_resize(&mut self, console_w: u16, console_h: u16) -> Effect {
        self.console_w = console_w;
        self.console_h = console_h;
        self.zoom = 1;
        self.offset_x = 0;
        self.offset_y = 0;
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.recompute_geometry();
        Effect::Redraw
    }

    pub fn recompute_geometry(&mut self) {
        // A zero-sized console still gets a one-cell fit so block sizes stay
        // non-zero; the bounded size below is clamped back to the console.
        let console_w = u32::from(self.console_w.max(1));
        let console_h = u32::from(self.console_h.max(1));

        let (mut fit_w, mut fit_h) = (console_w, console_h);
        if f64::from(console_w) / f64::from(console_h) > self.ratio {
            fit_w = (f64::from(console_h) * self.ratio).round() as u32;
        } else {
            fit_h = (f64::from(console_w) / self.ratio).round() as u32;
        }
        // More cells than pixels would leave an empty block.
        let fit_w = fit_w.clamp(1, self.image_w);
        let fit_h = fit_h.clamp(1, self.image_h);

        // The zoomed extent may be larger than the console; blocks come from
        // the extent so that zooming magnifies even on a clamped axis.
        let extent_w = fit_w.saturating_mul(self.zoom).min(self.image_w);
        let extent_h = fit_h.saturating_mul(self.zoom).min(self.image_h);
        let block_w = self.image_w / extent_w;
        let block_h = self.image_h / extent_h;

        let bounded_w = clamp_to_console(extent_w, self.console_w);
        let bounded_h = clamp_to_console(extent_h, self.console_h);

        let last_row = u64::from(bounded_h.saturating_sub(1)) * u64::from(block_h);
        let last_col = u64::from(bounded_w.saturating_sub(1)) * u64::from(block_w);
        let fitted = self.zoom == 1;

        self.geometry = Geometry {
            bounded_w,
            bounded_h,
            block_w,
            block_h,
            pixels_per_cell: block_w * block_h,
            can_zoom_in: block_w / 2 > 1 && block_h / 2 > 1,
            can_pan_x: fitted || last_col + u64::from(self.offset_x) < u64::from(self.image_w),
            can_pan_y: fitted || last_row + u64::from(self.offset_y) < u64::from(self.image_h),
        };

        tracing::debug!(
            zoom = self.zoom,
            bounded_w,
            bounded_h,
            block_w,
            block_h,
            offset_x = self.offset_x,
            offset_y = self.offset_y,
            "recomputed viewport geometry"
        );
    }

    /// Double the zoom, anchoring the new view at the cell under the cursor.
    pub fn zoom_in(&mut self) -> Effect {
        if !self.geometry.can_zoom_in {
            return Effect::None;
        }
        let Some(zoom) = self.zoom.checked_mul(2) else {
            return Effect::None;
        };
        self.zoom = zoom;
        let shift_x = self.geometry.block_w * u32::from(self.cursor_x);
        let shift_y = self.geometry.block_h * u32::from(self.cursor_y);
        self.offset_x = self.offset_x.saturating_add(shift_x).min(self.image_w - 1);
        self.offset_y = self.offset_y.saturating_add(shift_y).min(self.image_h - 1);
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.recompute_geometry();
        Effect::Redraw
    }

    pub fn zoom_out(&mut self) -> Effect {
        if self.zoom <= 1 {
            return Effect::None;
        }
        self.zoom /= 2;
        if self.zoom == 1 {
            self.offset_x = 0;
            self.offset_y = 0;
        }
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.recompute_geometry();
        Effect::Redraw
    }

    /// Move the cursor one cell at zoom 1, pan one block when zoomed in.
    pub fn move_cursor(&mut self, direction: Direction) -> Effect {
        if self.zoom == 1 {
            self.step_cursor(direction)
        } else {
            self.pan(direction)
        }
    }

    fn step_cursor(&mut self, direction: Direction) -> Effect {
        let Geometry {
            bounded_w,
            bounded_h,
            ..
        } = self.geometry;
        let (x, y) = (self.cursor_x, self.cursor_y);
        match direction {
            Direction::Up => self.cursor_y = y.saturating_sub(1),
            Direction::Down if y.saturating_add(1) < bounded_h => self.cursor_y = y + 1,
            Direction::Left => self.cursor_x = x.saturating_sub(1),
            Direction::Right if x.saturating_add(1) < bounded_w => self.cursor_x = x + 1,
            Direction::Down | Direction::Right => {}
        }
        if (x, y) == (self.cursor_x, self.cursor_y) {
            return Effect::None;
        }
        Effect::MoveCursor {
            x: self.cursor_x,
            y: self.cursor_y,
        }
    }

    fn pan(&mut self, direction: Direction) -> Effect {
        let Geometry {
            block_w,
            block_h,
            can_pan_x,
            can_pan_y,
            ..
        } = self.geometry;
        let moved = match direction {
            Direction::Up => retreat(&mut self.offset_y, block_h),
            Direction::Left => retreat(&mut self.offset_x, block_w),
            Direction::Down => can_pan_y && advance(&mut self.offset_y, block_h, self.image_h),
            Direction::Right => can_pan_x && advance(&mut self.offset_x, block_w, self.image_w),
        };
        if !moved {
            return Effect::None;
        }
        self.recompute_geometry();
        Effect::Redraw
    }
}

fn clamp_to_console(extent: u32, console: u16) -> u16 {
    u16::try_from(extent).unwrap_or(u16::MAX).min(console)
}

fn retreat(offset: &mut u32, block: u32) -> bool {
    if *offset == 0 {
        return false;
    }
    *offset = offset.saturating_sub(block);
    true
}

fn advance(offset: &mut u32, block: u32, limit: u32) -> bool {
    match offset.checked_add(block) {
        Some(next) if next < limit => {
            *offset = next;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoomable() -> Viewport {
        // 800x400 in 80x24: fit 80x20, blocks 10x20.
        Viewport::new(800, 400, 80, 24)
    }

    fn assert_invariants(viewport: &Viewport) {
        let g = viewport.geometry();
        let (w, h) = viewport.image_size();
        let (console_w, console_h) = viewport.console();
        assert!(g.block_w >= 1 && g.block_h >= 1, "{viewport:?}");
        assert!(g.bounded_w <= console_w && g.bounded_h <= console_h, "{viewport:?}");
        assert!(u32::from(g.bounded_w) * g.block_w <= w, "{viewport:?}");
        assert!(u32::from(g.bounded_h) * g.block_h <= h, "{viewport:?}");
        let (x, y) = viewport.offset();
        assert!(x < w && y < h, "{viewport:?}");
    }

    #[test]
    fn fits_wide_image_on_the_narrow_axis() {
        let viewport = Viewport::new(100, 50, 80, 24);
        let g = viewport.geometry();
        assert_eq!((g.bounded_w, g.bounded_h), (80, 20));
        assert_eq!((g.block_w, g.block_h), (1, 2));
        assert_eq!(g.pixels_per_cell, 2);
        assert!(!g.can_zoom_in);
        assert!(g.can_pan_x && g.can_pan_y);
    }

    #[test]
    fn fits_tall_image_on_the_wide_axis() {
        // ratio 1.0 in a 3.33 console: width shrinks to the console height.
        let viewport = Viewport::new(300, 600, 80, 24);
        let g = viewport.geometry();
        assert_eq!((g.bounded_w, g.bounded_h), (24, 24));
        assert_eq!((g.block_w, g.block_h), (12, 25));
    }

    #[test]
    fn geometry_invariants_hold_across_sizes() {
        let images = [(1, 1), (3, 500), (500, 3), (10, 10), (100, 50), (1920, 1080)];
        let consoles = [(0, 0), (1, 1), (0, 40), (80, 24), (300, 90), (2, 200)];
        for &(w, h) in &images {
            for &(cw, ch) in &consoles {
                let mut viewport = Viewport::new(w, h, cw, ch);
                assert_invariants(&viewport);
                while viewport.zoom_in() == Effect::Redraw {
                    assert_invariants(&viewport);
                }
            }
        }
    }

    #[test]
    fn zoom_out_undoes_zoom_in() {
        let mut viewport = zoomable();
        assert!(viewport.geometry().can_zoom_in);
        assert_eq!(viewport.zoom_in(), Effect::Redraw);
        assert_eq!(viewport.zoom(), 2);
        assert_eq!(viewport.zoom_out(), Effect::Redraw);
        assert_eq!(viewport.zoom(), 1);
        assert_eq!(viewport.offset(), (0, 0));
    }

    #[test]
    fn zoom_out_at_one_is_a_no_op() {
        let mut viewport = zoomable();
        let before = viewport.clone();
        assert_eq!(viewport.zoom_out(), Effect::None);
        assert_eq!(viewport.zoom_out(), Effect::None);
        assert_eq!(viewport, before);
    }

    #[test]
    fn zoom_in_is_refused_when_blocks_are_too_small() {
        let mut viewport = Viewport::new(100, 50, 80, 24);
        let before = viewport.clone();
        assert_eq!(viewport.zoom_in(), Effect::None);
        assert_eq!(viewport, before);
    }

    #[test]
    fn zoom_in_halves_blocks() {
        let mut viewport = zoomable();
        viewport.zoom_in();
        let g = viewport.geometry();
        assert_eq!((g.block_w, g.block_h), (5, 10));
        assert_eq!((g.bounded_w, g.bounded_h), (80, 24));
        assert!(g.can_zoom_in);
        viewport.zoom_in();
        let g = viewport.geometry();
        assert_eq!((g.block_w, g.block_h), (2, 5));
        assert!(!g.can_zoom_in);
    }

    #[test]
    fn zoom_in_anchors_on_cursor_cell() {
        let mut viewport = zoomable();
        for _ in 0..3 {
            viewport.move_cursor(Direction::Right);
        }
        viewport.move_cursor(Direction::Down);
        assert_eq!(viewport.cursor(), (3, 1));

        viewport.zoom_in();
        assert_eq!(viewport.offset(), (30, 20));
        assert_eq!(viewport.cursor(), (0, 0));
    }

    #[test]
    fn cursor_is_clamped_to_bounded_area() {
        let mut viewport = Viewport::new(100, 50, 4, 24);
        // fit: 4 wide, 1 tall.
        assert_eq!(viewport.move_cursor(Direction::Up), Effect::None);
        assert_eq!(viewport.move_cursor(Direction::Left), Effect::None);
        assert_eq!(viewport.move_cursor(Direction::Down), Effect::None);
        for _ in 0..10 {
            viewport.move_cursor(Direction::Right);
        }
        assert_eq!(viewport.cursor(), (3, 0));
        assert_eq!(
            viewport.move_cursor(Direction::Left),
            Effect::MoveCursor { x: 2, y: 0 }
        );
    }

    #[test]
    fn arrows_pan_when_zoomed() {
        let mut viewport = zoomable();
        viewport.zoom_in();
        assert_eq!(viewport.move_cursor(Direction::Right), Effect::Redraw);
        assert_eq!(viewport.offset(), (5, 0));
        assert_eq!(viewport.cursor(), (0, 0));
        assert_eq!(viewport.move_cursor(Direction::Down), Effect::Redraw);
        assert_eq!(viewport.offset(), (5, 10));
        assert_eq!(viewport.move_cursor(Direction::Left), Effect::Redraw);
        assert_eq!(viewport.move_cursor(Direction::Left), Effect::None);
        assert_eq!(viewport.offset(), (0, 10));
    }

    #[test]
    fn panning_stays_inside_the_image() {
        let mut viewport = zoomable();
        viewport.zoom_in();
        viewport.zoom_in();
        let (w, h) = viewport.image_size();
        for _ in 0..1000 {
            viewport.move_cursor(Direction::Right);
            viewport.move_cursor(Direction::Down);
            assert_invariants(&viewport);
        }
        let (x, y) = viewport.offset();
        assert!(x < w && y < h);
        assert!(!viewport.geometry().can_pan_x || !viewport.geometry().can_pan_y);
        for _ in 0..1000 {
            viewport.move_cursor(Direction::Left);
            viewport.move_cursor(Direction::Up);
        }
        assert_eq!(viewport.offset(), (0, 0));
    }

    #[test]
    fn resize_resets_zoom_and_is_idempotent() {
        let mut viewport = zoomable();
        viewport.zoom_in();
        viewport.move_cursor(Direction::Right);

        assert_eq!(viewport.on_resize(120, 40), Effect::Redraw);
        let once = viewport.clone();
        viewport.on_resize(120, 40);
        assert_eq!(viewport, once);
        assert_eq!(viewport.zoom(), 1);
        assert_eq!(viewport.offset(), (0, 0));
        assert_eq!(viewport.cursor(), (0, 0));
    }

    #[test]
    fn zero_console_draws_nothing() {
        let viewport = Viewport::new(640, 480, 0, 0);
        let g = viewport.geometry();
        assert_eq!((g.bounded_w, g.bounded_h), (0, 0));
        assert!(g.block_w >= 1 && g.block_h >= 1);
    }
}
