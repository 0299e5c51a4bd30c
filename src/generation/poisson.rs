//! Poisson-disc (blue-noise) site placement
//!
//! Bridson's algorithm: grow a set of samples outward from a random seed
//! point, keeping every pair at least `r` apart.
//!
//! # Algorithm
//!
//! - `r = sqrt(width * height / count) * spacing_factor`
//! - A background grid with cell size `r / √2` holds at most one sample per
//!   cell, so a candidate only needs checking against the 5×5 block of cells
//!   around its own.
//! - Each round picks a random active sample and tries `attempts` candidates
//!   at a random angle and a distance in `[r, 2r)`. The first valid candidate
//!   is accepted; if none is valid the active sample is retired for good.
//!
//! The active list can run dry before `count` samples exist, so the result
//! may hold fewer points than requested. That is a normal outcome.
//!
//! # References
//!
//! - Bridson, "Fast Poisson Disk Sampling in Arbitrary Dimensions", SIGGRAPH 2007

use glam::DVec2;
use rand::Rng;
use std::f64::consts::{SQRT_2, TAU};

use crate::error::{check_dimensions, Result, VoronoiError};

/// Tuning for blue-noise sampling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoissonDiscOptions {
    /// Candidates tried around an active sample before retiring it (Bridson's `k`)
    pub attempts: usize,
    /// Multiplier on the ideal spacing `sqrt(area / count)`
    pub spacing_factor: f64,
}

impl Default for PoissonDiscOptions {
    fn default() -> Self {
        Self {
            attempts: 30,
            spacing_factor: 0.9,
        }
    }
}

impl PoissonDiscOptions {
    /// Check that the options can drive the sampler
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for zero attempts or a spacing factor that is
    /// not finite and positive.
    pub fn validate(&self) -> Result<()> {
        if self.attempts == 0 {
            return Err(VoronoiError::InvalidConfig(
                "poisson attempts must be at least 1".to_string(),
            ));
        }
        if !(self.spacing_factor.is_finite() && self.spacing_factor > 0.0) {
            return Err(VoronoiError::InvalidConfig(format!(
                "poisson spacing factor must be finite and positive (got {})",
                self.spacing_factor
            )));
        }
        Ok(())
    }
}

/// Minimum distance between blue-noise samples for the given area and count
///
/// Returns `f64::INFINITY` for `count == 0`.
pub fn min_distance(width: f64, height: f64, count: usize, spacing_factor: f64) -> f64 {
    (width * height / count as f64).sqrt() * spacing_factor
}

/// Acceleration grid for neighbor lookups during sampling
///
/// Cell size is `r / √2`, so a cell's diagonal equals `r` and no two accepted
/// samples can share a cell.
#[derive(Debug, Clone)]
pub struct SampleGrid {
    cell_size: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Option<DVec2>>,
}

impl SampleGrid {
    /// Create an empty grid covering `[0, width) × [0, height)` for spacing `r`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `r` is not finite and positive, or if the
    /// grid would need more cells than can be addressed.
    pub fn new(width: f64, height: f64, r: f64) -> Result<Self> {
        let cell_size = r / SQRT_2;
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(VoronoiError::InvalidConfig(format!(
                "sample spacing must be finite and positive (got {})",
                r
            )));
        }

        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        let len = cols.checked_mul(rows).ok_or_else(|| {
            VoronoiError::InvalidConfig(format!(
                "sample grid of {} x {} cells is too large (r={})",
                cols, rows, r
            ))
        })?;

        Ok(Self {
            cell_size,
            cols,
            rows,
            cells: vec![None; len],
        })
    }

    /// Grid dimensions as `(columns, rows)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    #[inline]
    fn cell_of(&self, point: DVec2) -> (usize, usize) {
        let gx = ((point.x / self.cell_size).floor() as usize).min(self.cols - 1);
        let gy = ((point.y / self.cell_size).floor() as usize).min(self.rows - 1);
        (gx, gy)
    }

    /// Record an accepted sample
    pub fn insert(&mut self, point: DVec2) {
        let (gx, gy) = self.cell_of(point);
        self.cells[gy * self.cols + gx] = Some(point);
    }

    /// Sample stored in grid cell `(gx, gy)`, if any
    pub fn get(&self, gx: usize, gy: usize) -> Option<DVec2> {
        if gx >= self.cols || gy >= self.rows {
            return None;
        }
        self.cells[gy * self.cols + gx]
    }

    /// True if `point` is at least `r` from every sample in the surrounding 5×5 cells
    pub fn fits(&self, point: DVec2, r: f64) -> bool {
        let (gx, gy) = self.cell_of(point);
        let r_squared = r * r;

        let x_range = gx.saturating_sub(2)..=(gx + 2).min(self.cols - 1);
        for x in x_range {
            let y_range = gy.saturating_sub(2)..=(gy + 2).min(self.rows - 1);
            for y in y_range {
                if let Some(existing) = self.cells[y * self.cols + x] {
                    if existing.distance_squared(point) < r_squared {
                        return false;
                    }
                }
            }
        }

        true
    }
}

/// Generate up to `count` blue-noise points in `[0, width) × [0, height)`
///
/// Uses the default options (30 attempts, spacing factor 0.9).
///
/// # Errors
///
/// Returns `InvalidConfig` unless both dimensions are finite and positive
/// and their area yields a finite, positive spacing.
///
/// # Example
///
/// ```rust
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use voronoi_heightmap::generation::sample_poisson_disc;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(42);
/// let points = sample_poisson_disc(200, 100.0, 100.0, &mut rng).unwrap();
/// assert!(points.len() <= 200);
/// ```
pub fn sample_poisson_disc<R: Rng + ?Sized>(
    count: usize,
    width: f64,
    height: f64,
    rng: &mut R,
) -> Result<Vec<DVec2>> {
    sample_poisson_disc_with_options(count, width, height, PoissonDiscOptions::default(), rng)
}

/// Generate blue-noise points with custom options
pub fn sample_poisson_disc_with_options<R: Rng + ?Sized>(
    count: usize,
    width: f64,
    height: f64,
    options: PoissonDiscOptions,
    rng: &mut R,
) -> Result<Vec<DVec2>> {
    check_dimensions(width, height)?;
    options.validate()?;
    if count == 0 {
        return Ok(Vec::new());
    }

    // The area can overflow to infinity or underflow to zero
    let r = min_distance(width, height, count, options.spacing_factor);
    if !(r > 0.0 && (2.0 * r).is_finite()) {
        return Err(VoronoiError::InvalidConfig(format!(
            "{} x {} with {} samples gives an unusable spacing r={}",
            width, height, count, r
        )));
    }
    let mut grid = SampleGrid::new(width, height, r)?;
    let mut samples: Vec<DVec2> = Vec::with_capacity(count);
    let mut active: Vec<DVec2> = Vec::new();

    let first = DVec2::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height));
    samples.push(first);
    active.push(first);
    grid.insert(first);

    while !active.is_empty() && samples.len() < count {
        let active_idx = rng.gen_range(0..active.len());
        let origin = active[active_idx];

        let mut found = false;
        for _ in 0..options.attempts {
            let theta = rng.gen_range(0.0..TAU);
            let radius = rng.gen_range(r..2.0 * r);
            let candidate = origin + DVec2::new(theta.cos(), theta.sin()) * radius;

            let outside = candidate.x < 0.0
                || candidate.x >= width
                || candidate.y < 0.0
                || candidate.y >= height;
            if outside {
                continue;
            }

            if grid.fits(candidate, r) {
                samples.push(candidate);
                active.push(candidate);
                grid.insert(candidate);
                found = true;
                break;
            }
        }

        if !found {
            active.swap_remove(active_idx);
        }
    }

    if samples.len() < count {
        log::debug!(
            "[Poisson] frontier exhausted: {} of {} samples (r={:.4})",
            samples.len(),
            count,
            r
        );
    }

    Ok(samples)
}
