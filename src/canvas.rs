//! Freehand drawing surface backed by an RGBA bitmap.
//!
//! Strokes are rasterized as round-capped capsules between consecutive pointer
//! positions, so joins between segments come out round as well.

use egui::{ColorImage, PointerButton, Pos2};
use image::{Rgba, RgbaImage};

/// Color of untouched pixels.
pub const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Default ink color.
pub const FOREGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Pen used for new segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    /// Stroke diameter in pixels.
    pub width: f32,
    pub color: Rgba<u8>,
}

impl Pen {
    pub fn new(width: f32) -> Self {
        Self {
            width,
            color: FOREGROUND,
        }
    }
}

impl Default for Pen {
    fn default() -> Self {
        Self::new(20.0)
    }
}

/// Square bitmap the user draws on, plus the state of the active stroke.
pub struct Canvas {
    image: RgbaImage,
    pen: Pen,
    drawing: bool,
    last_point: Pos2,
    needs_redraw: bool,
}

impl Canvas {
    /// Create a blank `size`x`size` canvas.
    pub fn new(size: u32, pen: Pen) -> Self {
        Self {
            image: RgbaImage::from_pixel(size, size, BACKGROUND),
            pen,
            drawing: false,
            last_point: Pos2::ZERO,
            needs_redraw: true,
        }
    }

    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Whether a stroke is in progress.
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Current bitmap contents.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Start a stroke at `pos` when the primary button goes down.
    pub fn pointer_down(&mut self, pos: Pos2, button: PointerButton) {
        if button == PointerButton::Primary {
            self.drawing = true;
            self.last_point = pos;
        }
    }

    /// Extend the active stroke to `pos` while the primary button is held.
    pub fn pointer_move(&mut self, pos: Pos2, primary_held: bool) {
        if !(self.drawing && primary_held) {
            return;
        }
        let from = self.last_point;
        self.draw_segment(from, pos);
        self.last_point = pos;
        self.needs_redraw = true;
    }

    /// End the active stroke on primary release.
    pub fn pointer_up(&mut self, button: PointerButton) {
        if button == PointerButton::Primary {
            self.drawing = false;
        }
    }

    /// Reset every pixel to the background color.
    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = BACKGROUND;
        }
        self.needs_redraw = true;
    }

    /// Consume a pending redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Copy the bitmap into an egui image for texture upload.
    pub fn to_color_image(&self) -> ColorImage {
        let size = [self.image.width() as usize, self.image.height() as usize];
        ColorImage::from_rgba_unmultiplied(size, self.image.as_raw())
    }

    /// Paint every pixel whose center lies within half the pen width of the
    /// segment `a`-`b`.
    fn draw_segment(&mut self, a: Pos2, b: Pos2) {
        let radius = self.pen.width.max(1.0) * 0.5;
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let min_x = (a.x.min(b.x) - radius).floor().max(0.0);
        let min_y = (a.y.min(b.y) - radius).floor().max(0.0);
        let max_x = (a.x.max(b.x) + radius).ceil().min(width as f32 - 1.0);
        let max_y = (a.y.max(b.y) + radius).ceil().min(height as f32 - 1.0);
        if !(min_x <= max_x && min_y <= max_y) {
            return;
        }

        let radius_sq = radius * radius;
        for y in min_y as u32..=max_y as u32 {
            for x in min_x as u32..=max_x as u32 {
                let center = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_sq_to_segment(center, a, b) <= radius_sq {
                    self.image.put_pixel(x, y, self.pen.color);
                }
            }
        }
    }
}

/// Squared distance from `p` to the closed segment `a`-`b`.
pub(crate) fn distance_sq_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return (p - a).length_sq();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length_sq()
}
