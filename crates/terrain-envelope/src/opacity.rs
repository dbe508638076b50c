//! Opacity sampling.
//!
//! The core never touches pixel buffers directly. Everything it needs is the
//! [`OpacitySource`] accessor: grid dimensions plus one `(x, y) -> opacity`
//! query. Values are in whatever scale the source uses (0..1 for an
//! [`OpacityGrid`] built from normalized alpha, 0..255 for 8-bit `image`
//! buffers); the classification threshold is always supplied in that same
//! scale.

use image::{DynamicImage, GenericImageView, GrayAlphaImage, GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Binary classification of one opacity sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opacity {
    Opaque,
    Transparent,
}

impl Opacity {
    #[inline]
    pub fn is_opaque(self) -> bool {
        self == Self::Opaque
    }

    #[inline]
    pub fn is_transparent(self) -> bool {
        self == Self::Transparent
    }
}

/// Classify a sample: opaque iff `value > threshold`.
///
/// NaN never compares greater, so it classifies as transparent.
#[inline]
pub fn classify(value: f64, threshold: f64) -> Opacity {
    if value > threshold {
        Opacity::Opaque
    } else {
        Opacity::Transparent
    }
}

/// Read-only per-pixel opacity accessor.
pub trait OpacitySource {
    /// Grid width in pixels.
    fn width(&self) -> u32;
    /// Grid height in pixels (rows grow downward).
    fn height(&self) -> u32;
    /// Opacity at `(x, y)`. Callers keep `x < width()` and `y < height()`.
    fn opacity(&self, x: u32, y: u32) -> f64;
}

impl<T: OpacitySource + ?Sized> OpacitySource for &T {
    #[inline]
    fn width(&self) -> u32 {
        (**self).width()
    }
    #[inline]
    fn height(&self) -> u32 {
        (**self).height()
    }
    #[inline]
    fn opacity(&self, x: u32, y: u32) -> f64 {
        (**self).opacity(x, y)
    }
}

/// Thread-safety a source needs for column scanning.
///
/// With the `parallel` feature the scan shares the source across rayon
/// workers, so this is `Sync`. Serial builds accept any source.
#[cfg(feature = "parallel")]
pub trait ScanSync: Sync {}

#[cfg(feature = "parallel")]
impl<T: Sync + ?Sized> ScanSync for T {}

/// Thread-safety a source needs for column scanning.
///
/// With the `parallel` feature the scan shares the source across rayon
/// workers, so this is `Sync`. Serial builds accept any source.
#[cfg(not(feature = "parallel"))]
pub trait ScanSync {}

#[cfg(not(feature = "parallel"))]
impl<T: ?Sized> ScanSync for T {}

/// Owned single-channel opacity field in row-major layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpacityGrid {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl OpacityGrid {
    /// Wrap row-major samples. `data.len()` must equal `width * height`.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::InvalidConfig(format!(
                "opacity grid {}x{} needs {} samples, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Backing samples, row-major.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl OpacitySource for OpacityGrid {
    #[inline]
    fn width(&self) -> u32 {
        self.width
    }
    #[inline]
    fn height(&self) -> u32 {
        self.height
    }
    #[inline]
    fn opacity(&self, x: u32, y: u32) -> f64 {
        self.get(x, y) as f64
    }
}

/// Luma value (0..255) used directly as the mask, e.g. a pre-extracted alpha plane.
impl OpacitySource for GrayImage {
    #[inline]
    fn width(&self) -> u32 {
        GenericImageView::width(self)
    }
    #[inline]
    fn height(&self) -> u32 {
        GenericImageView::height(self)
    }
    #[inline]
    fn opacity(&self, x: u32, y: u32) -> f64 {
        self.get_pixel(x, y)[0] as f64
    }
}

/// Alpha channel (0..255).
impl OpacitySource for GrayAlphaImage {
    #[inline]
    fn width(&self) -> u32 {
        GenericImageView::width(self)
    }
    #[inline]
    fn height(&self) -> u32 {
        GenericImageView::height(self)
    }
    #[inline]
    fn opacity(&self, x: u32, y: u32) -> f64 {
        self.get_pixel(x, y)[1] as f64
    }
}

/// Alpha channel (0..255).
impl OpacitySource for RgbaImage {
    #[inline]
    fn width(&self) -> u32 {
        GenericImageView::width(self)
    }
    #[inline]
    fn height(&self) -> u32 {
        GenericImageView::height(self)
    }
    #[inline]
    fn opacity(&self, x: u32, y: u32) -> f64 {
        self.get_pixel(x, y)[3] as f64
    }
}

/// Alpha channel of the pixel as RGBA8 (0..255). Formats without alpha
/// report every pixel as fully opaque.
impl OpacitySource for DynamicImage {
    #[inline]
    fn width(&self) -> u32 {
        GenericImageView::width(self)
    }
    #[inline]
    fn height(&self) -> u32 {
        GenericImageView::height(self)
    }
    #[inline]
    fn opacity(&self, x: u32, y: u32) -> f64 {
        GenericImageView::get_pixel(self, x, y)[3] as f64
    }
}

/// A source bound to a threshold, classifying single samples by coordinate.
#[derive(Debug)]
pub struct OpacitySampler<'a, S: OpacitySource + ?Sized> {
    source: &'a S,
    threshold: f64,
}

impl<'a, S: OpacitySource + ?Sized> OpacitySampler<'a, S> {
    pub fn new(source: &'a S, threshold: f64) -> Self {
        Self { source, threshold }
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[inline]
    pub fn classify_at(&self, x: u32, y: u32) -> Opacity {
        classify(self.source.opacity(x, y), self.threshold)
    }

    #[inline]
    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        self.classify_at(x, y).is_opaque()
    }
}
