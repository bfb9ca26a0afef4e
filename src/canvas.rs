//! Software RGBA drawing surface.
//!
//! The render loop draws into this buffer; the windowed binary uploads it to
//! the GPU each frame and headless runs simply keep it in memory.

use crate::config::Color;
use crate::constants::BYTES_PER_PIXEL;
use crate::mask::Mask;
use glam::Vec2;

#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize * BYTES_PER_PIXEL];
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    #[inline]
    fn put(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = self.index(x as u32, y as u32);
        self.pixels[i..i + 4].copy_from_slice(&color.to_rgba());
    }

    pub fn clear(&mut self, color: Color) {
        let rgba = color.to_rgba();
        for px in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Draws `mask` stretched over the whole canvas (nearest neighbour) at
    /// `alpha` opacity, also honouring the mask's own alpha channel.
    pub fn draw_mask_overlay(&mut self, mask: &Mask, alpha: f32) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        let src = mask.data();
        let (mw, mh) = (mask.width() as u64, mask.height() as u64);
        let (cw, ch) = (self.width as u64, self.height as u64);

        for y in 0..ch {
            let my = (y * mh / ch) as usize;
            for x in 0..cw {
                let mx = (x * mw / cw) as usize;
                let s = (my * mw as usize + mx) * BYTES_PER_PIXEL;
                let a = alpha * src[s + 3] as f32 / 255.0;
                if a <= 0.0 {
                    continue;
                }
                let d = self.index(x as u32, y as u32);
                for c in 0..3 {
                    let blended = self.pixels[d + c] as f32 * (1.0 - a) + src[s + c] as f32 * a;
                    self.pixels[d + c] = blended.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }

    /// Fills an ellipse with radii `(rx, ry)` rotated by `rotation` radians.
    pub fn fill_ellipse(&mut self, center: Vec2, rx: f32, ry: f32, rotation: f32, color: Color) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let reach = rx.max(ry);
        let min_x = (center.x - reach).floor() as i64;
        let max_x = (center.x + reach).ceil() as i64;
        let min_y = (center.y - reach).floor() as i64;
        let max_y = (center.y + reach).ceil() as i64;
        let (sin, cos) = rotation.sin_cos();

        for py in min_y.max(0)..=max_y.min(self.height as i64 - 1) {
            for px in min_x.max(0)..=max_x.min(self.width as i64 - 1) {
                // Sample at the pixel centre, in the ellipse's own frame.
                let dx = px as f32 + 0.5 - center.x;
                let dy = py as f32 + 0.5 - center.y;
                let lx = dx * cos + dy * sin;
                let ly = -dx * sin + dy * cos;
                if (lx / rx).powi(2) + (ly / ry).powi(2) <= 1.0 {
                    self.put(px, py, color);
                }
            }
        }
    }

    /// One-pixel line.
    pub fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color) {
        let delta = to - from;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let p = from + delta * (i as f32 / steps as f32);
            self.put(p.x.floor() as i64, p.y.floor() as i64, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);

    #[test]
    fn clear_fills_every_pixel() {
        let mut canvas = Canvas::new(3, 2);
        canvas.clear(Color::rgb(10, 20, 30));
        assert!(canvas.pixels().chunks(4).all(|p| p == [10, 20, 30, 255]));
        assert_eq!(canvas.pixel(3, 0), None);
    }

    #[test]
    fn overlay_blends_at_requested_alpha() {
        let mut canvas = Canvas::new(4, 4);
        canvas.clear(Color::rgb(0, 0, 0));
        let mask = Mask::filled(2, 2, [255, 255, 255, 255]).unwrap();
        canvas.draw_mask_overlay(&mask, 0.3);
        // 255 * 0.3 = 76.5, rounded.
        assert_eq!(canvas.pixel(3, 3), Some([77, 77, 77, 255]));
    }

    #[test]
    fn overlay_stretches_mask() {
        let mut canvas = Canvas::new(4, 2);
        canvas.clear(Color::rgb(0, 0, 0));
        let mut data = vec![0u8; 2 * 4];
        data[4..8].copy_from_slice(&[255, 255, 255, 255]);
        let mask = Mask::from_rgba(data, 2, 1).unwrap();
        canvas.draw_mask_overlay(&mask, 1.0);
        assert_eq!(canvas.pixel(1, 1), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(2, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn ellipse_respects_rotation() {
        let mut canvas = Canvas::new(40, 40);
        canvas.fill_ellipse(Vec2::new(20.0, 20.0), 10.0, 3.0, 0.0, RED);
        assert_eq!(canvas.pixel(28, 20), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(20, 28), Some([0, 0, 0, 0]));

        let mut rotated = Canvas::new(40, 40);
        rotated.fill_ellipse(Vec2::new(20.0, 20.0), 10.0, 3.0, std::f32::consts::FRAC_PI_2, RED);
        assert_eq!(rotated.pixel(20, 28), Some([255, 0, 0, 255]));
        assert_eq!(rotated.pixel(28, 20), Some([0, 0, 0, 0]));
    }

    #[test]
    fn shapes_clip_at_edges() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill_ellipse(Vec2::new(0.0, 0.0), 5.0, 5.0, 0.0, RED);
        canvas.draw_line(Vec2::new(-5.0, 5.0), Vec2::new(20.0, 5.0), RED);
        assert_eq!(canvas.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(9, 5), Some([255, 0, 0, 255]));
    }

    #[test]
    fn resize_reallocates() {
        let mut canvas = Canvas::new(2, 2);
        canvas.resize(5, 3);
        assert_eq!(canvas.pixels().len(), 5 * 3 * 4);
        assert_eq!(canvas.size(), Vec2::new(5.0, 3.0));
    }
}
