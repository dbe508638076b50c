//! Per-column terrain boundary extraction.
//!
//! Each sampled column is scanned top to bottom for the first
//! transparent-above / opaque-below transition. Columns without such a
//! transition fall back to the first opaque row, and columns without any
//! opaque row resolve to the bottom row. Every sampled column therefore yields
//! exactly one [`BoundaryPoint`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::opacity::{OpacitySampler, OpacitySource, ScanSync};

/// Which scan decides a column's boundary row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryRule {
    /// First transparent→opaque edge from the top, falling back to the first
    /// opaque row. Skips opaque islands that touch the top row.
    #[default]
    Transition,
    /// First opaque row from the top. Cheaper, but picks up any opaque pixel.
    FirstOpaque,
}

/// Configuration for boundary extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Column stride: columns `0, s, 2s, ...` are scanned.
    pub sample_step: u32,
    /// Opacity cutoff, in the source's value scale. Opaque iff `value > threshold`.
    pub threshold: f64,
    /// Scan rule.
    pub rule: BoundaryRule,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            sample_step: 1,
            threshold: 0.5,
            rule: BoundaryRule::default(),
        }
    }
}

impl ExtractConfig {
    /// Check that the stride and threshold are usable.
    pub fn validate(&self) -> Result<()> {
        if self.sample_step == 0 {
            return Err(Error::InvalidConfig("sample_step must be >= 1".into()));
        }
        if !self.threshold.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Top of the terrain in one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundaryPoint {
    pub x: u32,
    pub y: u32,
}

impl BoundaryPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// How a column's boundary row was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Transition,
    FirstOpaque,
    NoTerrain,
}

/// Ordered boundary points, one per sampled column, ascending in x.
///
/// Deserialization runs the same checks as [`BoundarySet::from_points`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundarySetData")]
pub struct BoundarySet {
    points: Vec<BoundaryPoint>,
    grid_width: u32,
    grid_height: u32,
    transition_columns: usize,
    first_opaque_columns: usize,
    empty_columns: usize,
}

impl BoundarySet {
    /// Build a set from externally obtained points.
    ///
    /// `x` must be strictly increasing and below `grid_width`; `y` must be
    /// below `grid_height`. The points are not attributed to any scan rule, so
    /// all column counters in [`BoundarySet::stats`] are zero.
    pub fn from_points(
        points: Vec<BoundaryPoint>,
        grid_width: u32,
        grid_height: u32,
    ) -> Result<Self> {
        if grid_width == 0 || grid_height == 0 {
            return Err(Error::EmptyGrid {
                width: grid_width,
                height: grid_height,
            });
        }
        if let Some(w) = points.windows(2).find(|w| w[1].x <= w[0].x) {
            return Err(Error::InvalidConfig(format!(
                "boundary x values must be strictly increasing ({} then {})",
                w[0].x, w[1].x
            )));
        }
        if let Some(p) = points
            .iter()
            .find(|p| p.x >= grid_width || p.y >= grid_height)
        {
            return Err(Error::InvalidConfig(format!(
                "boundary point ({}, {}) outside {}x{} grid",
                p.x, p.y, grid_width, grid_height
            )));
        }
        Ok(Self {
            points,
            grid_width,
            grid_height,
            transition_columns: 0,
            first_opaque_columns: 0,
            empty_columns: 0,
        })
    }

    pub fn points(&self) -> &[BoundaryPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoundaryPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Width of the grid the points were taken from; the default fit period.
    pub fn grid_width(&self) -> u32 {
        self.grid_width
    }

    pub fn grid_height(&self) -> u32 {
        self.grid_height
    }

    /// Boundary row for column `x`, if that column was sampled.
    pub fn y_at(&self, x: u32) -> Option<u32> {
        self.points
            .binary_search_by_key(&x, |p| p.x)
            .ok()
            .map(|i| self.points[i].y)
    }

    /// Points as `[x, y]` pairs in floating point.
    pub fn to_samples(&self) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|p| [p.x as f64, p.y as f64])
            .collect()
    }

    /// Summary statistics, or `None` for an empty set.
    pub fn stats(&self) -> Option<BoundaryStats> {
        let min_y = self.points.iter().map(|p| p.y).min()?;
        let max_y = self.points.iter().map(|p| p.y).max()?;
        Some(BoundaryStats {
            count: self.points.len(),
            min_y,
            max_y,
            range: max_y - min_y,
            transition_columns: self.transition_columns,
            first_opaque_columns: self.first_opaque_columns,
            empty_columns: self.empty_columns,
        })
    }
}

/// Unchecked wire form of [`BoundarySet`].
#[derive(Deserialize)]
struct BoundarySetData {
    points: Vec<BoundaryPoint>,
    grid_width: u32,
    grid_height: u32,
    #[serde(default)]
    transition_columns: usize,
    #[serde(default)]
    first_opaque_columns: usize,
    #[serde(default)]
    empty_columns: usize,
}

impl TryFrom<BoundarySetData> for BoundarySet {
    type Error = Error;

    fn try_from(data: BoundarySetData) -> Result<Self> {
        let mut set = Self::from_points(data.points, data.grid_width, data.grid_height)?;
        let classified = data
            .transition_columns
            .saturating_add(data.first_opaque_columns)
            .saturating_add(data.empty_columns);
        if classified > set.len() {
            return Err(Error::InvalidConfig(format!(
                "{} classified columns for {} boundary points",
                classified,
                set.len()
            )));
        }
        set.transition_columns = data.transition_columns;
        set.first_opaque_columns = data.first_opaque_columns;
        set.empty_columns = data.empty_columns;
        Ok(set)
    }
}

impl<'a> IntoIterator for &'a BoundarySet {
    type Item = &'a BoundaryPoint;
    type IntoIter = std::slice::Iter<'a, BoundaryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Summary of an extracted boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryStats {
    /// Number of boundary points.
    pub count: usize,
    /// Smallest y, i.e. the highest terrain point.
    pub min_y: u32,
    /// Largest y, i.e. the lowest terrain point.
    pub max_y: u32,
    /// `max_y - min_y`.
    pub range: u32,
    /// Columns resolved by a transparent→opaque edge.
    ///
    /// The three column counters are zero for sets built with
    /// [`BoundarySet::from_points`], whose points have no known scan rule.
    pub transition_columns: usize,
    /// Columns resolved by the first-opaque scan.
    pub first_opaque_columns: usize,
    /// Columns without any opaque row (boundary placed on the bottom row).
    pub empty_columns: usize,
}

/// Scan the sampled columns of `source` and return one boundary point per column.
pub fn extract<S>(source: &S, config: &ExtractConfig) -> Result<BoundarySet>
where
    S: OpacitySource + ScanSync + ?Sized,
{
    config.validate()?;
    let width = source.width();
    let height = source.height();
    if width == 0 || height == 0 {
        return Err(Error::EmptyGrid { width, height });
    }

    let sampler = OpacitySampler::new(source, config.threshold);
    let columns: Vec<u32> = (0..width).step_by(config.sample_step as usize).collect();
    let scanned = scan_columns(&sampler, &columns, height, config.rule);

    let mut points = Vec::with_capacity(scanned.len());
    let (mut n_transition, mut n_opaque, mut n_empty) = (0usize, 0usize, 0usize);
    for (x, (y, resolution)) in columns.iter().zip(scanned) {
        match resolution {
            Resolution::Transition => n_transition += 1,
            Resolution::FirstOpaque => n_opaque += 1,
            Resolution::NoTerrain => n_empty += 1,
        }
        points.push(BoundaryPoint::new(*x, y));
    }

    if n_empty > 0 {
        tracing::warn!(
            "{} of {} sampled columns contain no terrain; placed on bottom row {}",
            n_empty,
            points.len(),
            height - 1
        );
    }
    tracing::debug!(
        "extracted {} boundary points from {}x{} grid (step {}, {} transition, {} first-opaque)",
        points.len(),
        width,
        height,
        config.sample_step,
        n_transition,
        n_opaque
    );

    Ok(BoundarySet {
        points,
        grid_width: width,
        grid_height: height,
        transition_columns: n_transition,
        first_opaque_columns: n_opaque,
        empty_columns: n_empty,
    })
}

#[cfg(not(feature = "parallel"))]
fn scan_columns<S>(
    sampler: &OpacitySampler<'_, S>,
    columns: &[u32],
    height: u32,
    rule: BoundaryRule,
) -> Vec<(u32, Resolution)>
where
    S: OpacitySource + ScanSync + ?Sized,
{
    columns
        .iter()
        .map(|&x| scan_column(sampler, x, height, rule))
        .collect()
}

#[cfg(feature = "parallel")]
fn scan_columns<S>(
    sampler: &OpacitySampler<'_, S>,
    columns: &[u32],
    height: u32,
    rule: BoundaryRule,
) -> Vec<(u32, Resolution)>
where
    S: OpacitySource + ScanSync + ?Sized,
{
    use rayon::prelude::*;

    columns
        .par_iter()
        .map(|&x| scan_column(sampler, x, height, rule))
        .collect()
}

fn scan_column<S>(
    sampler: &OpacitySampler<'_, S>,
    x: u32,
    height: u32,
    rule: BoundaryRule,
) -> (u32, Resolution)
where
    S: OpacitySource + ?Sized,
{
    if rule == BoundaryRule::Transition && height >= 2 {
        let mut above = sampler.classify_at(x, 0);
        for y in 0..height - 1 {
            let below = sampler.classify_at(x, y + 1);
            if above.is_transparent() && below.is_opaque() {
                return (y + 1, Resolution::Transition);
            }
            above = below;
        }
    }

    match (0..height).find(|&y| sampler.is_opaque(x, y)) {
        Some(y) => (y, Resolution::FirstOpaque),
        None => (height - 1, Resolution::NoTerrain),
    }
}
