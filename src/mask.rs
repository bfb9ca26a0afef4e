//! Binary obstacle field sampled from an RGBA pixel buffer.
//!
//! A [`Mask`] is immutable once built. New frames replace it wholesale through
//! a [`MaskSlot`], which swaps an `Arc` so a tick sees either the old frame or
//! the new one in full.

use crate::constants::{BYTES_PER_PIXEL, OBSTACLE_BRIGHTNESS_THRESHOLD};
use crate::error::MaskError;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>, // RGBA, row-major, origin top-left
}

impl Mask {
    /// Wraps a decoded RGBA buffer, rejecting it if the length does not match
    /// the declared dimensions.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, MaskError> {
        if width == 0 || height == 0 {
            return Err(MaskError::EmptyMask);
        }
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(MaskError::DimensionMismatch {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A mask filled with a single color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, MaskError> {
        let pixels = width as usize * height as usize;
        let data = rgba.iter().copied().cycle().take(pixels * BYTES_PER_PIXEL).collect();
        Self::from_rgba(data, width, height)
    }

    pub fn from_dynamic_image(image: &image::DynamicImage) -> Result<Self, MaskError> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(rgba.into_raw(), width, height)
    }

    pub fn from_image_path(path: impl AsRef<Path>) -> Result<Self, MaskError> {
        let image = image::open(path)?;
        Self::from_dynamic_image(&image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// `(R+G+B)/3` of an in-bounds pixel.
    pub fn brightness(&self, px: u32, py: u32) -> u32 {
        let index = (py as usize * self.width as usize + px as usize) * BYTES_PER_PIXEL;
        let r = self.data[index] as u32;
        let g = self.data[index + 1] as u32;
        let b = self.data[index + 2] as u32;
        (r + g + b) / 3
    }

    /// 1 if the pixel enclosing `(x, y)` is an obstacle, else 0.
    /// Anything outside the buffer counts as a wall.
    pub fn is_obstacle(&self, x: f32, y: f32) -> u8 {
        let px = x.floor();
        let py = y.floor();
        // NaN fails every comparison and lands here as well.
        if !(px >= 0.0 && py >= 0.0 && px < self.width as f32 && py < self.height as f32) {
            return 1;
        }
        u8::from(self.brightness(px as u32, py as u32) > OBSTACLE_BRIGHTNESS_THRESHOLD)
    }
}

/// Shared handle through which an external producer replaces the current mask.
#[derive(Debug, Clone, Default)]
pub struct MaskSlot {
    current: Arc<Mutex<Option<Arc<Mask>>>>,
}

impl MaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<Mask>>> {
        // A panicking producer cannot leave a half-written Arc behind.
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn publish(&self, mask: Mask) {
        *self.lock() = Some(Arc::new(mask));
    }

    /// Validates and publishes a raw RGBA frame. On error the previous mask is kept.
    pub fn publish_rgba(&self, data: Vec<u8>, width: u32, height: u32) -> Result<(), MaskError> {
        match Mask::from_rgba(data, width, height) {
            Ok(mask) => {
                self.publish(mask);
                Ok(())
            }
            Err(e) => {
                log::warn!("Rejected mask frame, keeping previous: {}", e);
                Err(e)
            }
        }
    }

    /// The mask a tick should use, pinned for the whole tick.
    pub fn snapshot(&self) -> Option<Arc<Mask>> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_pixel(width: u32, height: u32, at: (u32, u32), value: u8) -> Mask {
        let mut data = vec![0u8; (width * height * 4) as usize];
        let index = ((at.1 * width + at.0) * 4) as usize;
        data[index..index + 3].fill(value);
        data[index + 3] = 255;
        Mask::from_rgba(data, width, height).unwrap()
    }

    #[test]
    fn brightness_threshold_is_strict() {
        assert_eq!(mask_with_pixel(4, 4, (1, 1), 200).is_obstacle(1.5, 1.5), 1);
        assert_eq!(mask_with_pixel(4, 4, (1, 1), 50).is_obstacle(1.5, 1.5), 0);
        assert_eq!(mask_with_pixel(4, 4, (1, 1), 128).is_obstacle(1.5, 1.5), 0);
        assert_eq!(mask_with_pixel(4, 4, (1, 1), 129).is_obstacle(1.5, 1.5), 1);
    }

    #[test]
    fn brightness_averages_channels() {
        let mut data = vec![0u8; 4];
        data[..3].copy_from_slice(&[255, 255, 0]);
        let mask = Mask::from_rgba(data, 1, 1).unwrap();
        assert_eq!(mask.brightness(0, 0), 170);
        assert_eq!(mask.is_obstacle(0.0, 0.0), 1);
    }

    #[test]
    fn out_of_bounds_is_obstacle() {
        let mask = Mask::filled(5, 3, [0, 0, 0, 255]).unwrap();
        assert_eq!(mask.is_obstacle(-1.0, 0.0), 1);
        assert_eq!(mask.is_obstacle(5.0, 0.0), 1);
        assert_eq!(mask.is_obstacle(0.0, -1.0), 1);
        assert_eq!(mask.is_obstacle(0.0, 3.0), 1);
        assert_eq!(mask.is_obstacle(-0.5, 0.0), 1);
        assert_eq!(mask.is_obstacle(f32::NAN, 0.0), 1);
        assert_eq!(mask.is_obstacle(4.99, 2.99), 0);
    }

    #[test]
    fn coordinates_floor_to_enclosing_pixel() {
        let mask = mask_with_pixel(4, 4, (2, 3), 255);
        assert_eq!(mask.is_obstacle(2.0, 3.0), 1);
        assert_eq!(mask.is_obstacle(2.999, 3.999), 1);
        assert_eq!(mask.is_obstacle(1.999, 3.5), 0);
    }

    #[test]
    fn repeated_queries_agree() {
        let mask = mask_with_pixel(8, 8, (3, 4), 220);
        let first: Vec<u8> = (0..64).map(|i| mask.is_obstacle((i % 8) as f32, (i / 8) as f32)).collect();
        let second: Vec<u8> = (0..64).map(|i| mask.is_obstacle((i % 8) as f32, (i / 8) as f32)).collect();
        assert_eq!(first, second);
        assert_eq!(first.iter().filter(|&&v| v == 1).count(), 1);
    }

    #[test]
    fn rejects_mismatched_buffers() {
        assert!(matches!(
            Mask::from_rgba(vec![0; 15], 2, 2),
            Err(MaskError::DimensionMismatch { len: 15, .. })
        ));
        assert!(matches!(Mask::from_rgba(vec![], 0, 2), Err(MaskError::EmptyMask)));
    }

    #[test]
    fn slot_keeps_previous_mask_on_bad_frame() {
        let slot = MaskSlot::new();
        assert!(slot.snapshot().is_none());

        slot.publish_rgba(vec![255; 16], 2, 2).unwrap();
        let before = slot.snapshot().unwrap();

        assert!(slot.publish_rgba(vec![0; 7], 2, 2).is_err());
        let after = slot.snapshot().unwrap();
        assert!(Arc::ptr_eq(&before, &after));

        slot.clear();
        assert!(slot.snapshot().is_none());
    }

    #[test]
    fn snapshot_survives_replacement() {
        let slot = MaskSlot::new();
        slot.publish(Mask::filled(2, 2, [255, 255, 255, 255]).unwrap());
        let pinned = slot.snapshot().unwrap();
        slot.publish(Mask::filled(2, 2, [0, 0, 0, 255]).unwrap());

        assert_eq!(pinned.is_obstacle(0.0, 0.0), 1);
        assert_eq!(slot.snapshot().unwrap().is_obstacle(0.0, 0.0), 0);
    }

    #[test]
    fn loads_from_dynamic_image() {
        let mut img = image::RgbaImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgba([255, 255, 255, 255]));
        let mask = Mask::from_dynamic_image(&image::DynamicImage::ImageRgba8(img)).unwrap();
        assert_eq!((mask.width(), mask.height()), (3, 2));
        assert_eq!(mask.is_obstacle(2.5, 1.5), 1);
        assert_eq!(mask.is_obstacle(0.5, 0.5), 0);
    }
}
