//! Map Configuration and Builder
//!
//! This module provides configuration types for reproducible map generation.

use glam::DVec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{check_dimensions, Result, VoronoiError};
use crate::terrain::DiffusionOptions;

/// Upper bound accepted by [`MapConfigBuilder::lloyd_iterations`]
pub const MAX_LLOYD_ITERATIONS: usize = 50;

/// Strategy used to place the initial sites
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplingStrategy {
    /// Independent uniform draws, exactly `count` points
    Uniform,
    /// Bridson blue-noise sampling, at most `count` points
    #[default]
    PoissonDisc,
}

/// Which point set feeds polygons and height diffusion
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RelaxationMode {
    /// Use the sampled points as-is
    Base,
    /// Use the Lloyd-relaxed points
    #[default]
    Lloyd,
}

/// Axis-aligned closed rectangle `[min.x, max.x] × [min.y, max.y]`
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    /// Bounds spanning `[0, width] × [0, height]`
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            min: DVec2::ZERO,
            max: DVec2::new(width, height),
        }
    }

    /// Bounds from explicit corners, `[min_x, min_y, max_x, max_y]`
    pub fn from_corners(corners: [f64; 4]) -> Self {
        Self {
            min: DVec2::new(corners[0], corners[1]),
            max: DVec2::new(corners[2], corners[3]),
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Length of the diagonal, used to scale relative thresholds
    #[inline]
    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).length()
    }

    /// Closed containment test (a clipped cell may touch the max edge)
    #[inline]
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// Configuration for reproducible map generation
///
/// The same configuration (and the same height seeds) always produces the
/// identical map.
///
/// # Example
///
/// ```rust
/// use voronoi_heightmap::*;
///
/// let config = MapConfigBuilder::new()
///     .seed(42)
///     .count(200)
///     .build()
///     .unwrap();
///
/// # #[cfg(feature = "serde")]
/// # {
/// let json = serde_json::to_string(&config).unwrap();
/// let restored: MapConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, restored);
/// # }
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Random seed for site placement
    pub seed: u64,

    /// Width of the sampling area
    pub width: f64,

    /// Height of the sampling area
    pub height: f64,

    /// Requested number of sites
    ///
    /// Blue-noise sampling may return fewer.
    pub count: usize,

    /// How the initial sites are placed
    pub sampling: SamplingStrategy,

    /// Number of Lloyd's relaxation rounds
    ///
    /// - 0: raw sampled sites (irregular cells)
    /// - 1-3: noticeably more even
    /// - 10+: diminishing returns
    pub lloyd_iterations: usize,

    /// Early-exit threshold for relaxation, as a fraction of the bounds diagonal
    ///
    /// 0.0 runs exactly `lloyd_iterations` rounds.
    pub lloyd_convergence: f64,

    /// Whether the relaxed or the base sites feed cells and heights
    pub relaxation: RelaxationMode,

    /// Random seed for height diffusion (separate from site placement)
    ///
    /// This allows the same cell layout with different elevation.
    pub height_seed: u64,

    /// Step range and guards for height diffusion
    pub diffusion: DiffusionOptions,
}

impl MapConfig {
    /// Sampling area as bounds
    #[inline]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfigBuilder::new().finish()
    }
}

/// Builder for creating MapConfig with validation
///
/// # Example
///
/// ```rust
/// use voronoi_heightmap::*;
///
/// let config = MapConfigBuilder::new()
///     .seed(12345)
///     .dimensions(400.0, 300.0)
///     .unwrap()
///     .count(150)
///     .sampling(SamplingStrategy::Uniform)
///     .lloyd_iterations(3)
///     .unwrap()
///     .height_seed(7)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.bounds().width(), 400.0);
/// ```
#[derive(Debug, Clone)]
pub struct MapConfigBuilder {
    seed: Option<u64>,
    width: f64,
    height: f64,
    count: usize,
    sampling: SamplingStrategy,
    lloyd_iterations: usize,
    lloyd_convergence: f64,
    relaxation: RelaxationMode,
    height_seed: Option<u64>,
    diffusion: DiffusionOptions,
}

impl MapConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - seed: random
    /// - dimensions: 800 × 600
    /// - count: 500
    /// - sampling: Poisson disc
    /// - lloyd_iterations: 2
    /// - lloyd_convergence: 0.0 (always run every round)
    /// - relaxation: Lloyd
    /// - height_seed: same as seed
    pub fn new() -> Self {
        Self {
            seed: None,
            width: 800.0,
            height: 600.0,
            count: 500,
            sampling: SamplingStrategy::default(),
            lloyd_iterations: 2,
            lloyd_convergence: 0.0,
            relaxation: RelaxationMode::default(),
            height_seed: None,
            diffusion: DiffusionOptions::default(),
        }
    }

    /// Set the random seed for site placement
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the sampling area
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless both dimensions are finite and positive
    pub fn dimensions(mut self, width: f64, height: f64) -> Result<Self> {
        check_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        Ok(self)
    }

    /// Set the requested number of sites
    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the sampling strategy
    pub fn sampling(mut self, sampling: SamplingStrategy) -> Self {
        self.sampling = sampling;
        self
    }

    /// Set the number of Lloyd's relaxation rounds
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if iterations > 50
    pub fn lloyd_iterations(mut self, iterations: usize) -> Result<Self> {
        if iterations > MAX_LLOYD_ITERATIONS {
            return Err(VoronoiError::InvalidConfig(format!(
                "Lloyd iterations must be <= {} (got {})",
                MAX_LLOYD_ITERATIONS, iterations
            )));
        }
        self.lloyd_iterations = iterations;
        Ok(self)
    }

    /// Set the convergence threshold for Lloyd's relaxation
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if threshold is negative or not finite
    pub fn lloyd_convergence(mut self, threshold: f64) -> Result<Self> {
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(VoronoiError::InvalidConfig(format!(
                "Lloyd convergence threshold must be >= 0 (got {})",
                threshold
            )));
        }
        self.lloyd_convergence = threshold;
        Ok(self)
    }

    /// Choose relaxed or base sites for the final map
    pub fn relaxation(mut self, mode: RelaxationMode) -> Self {
        self.relaxation = mode;
        self
    }

    /// Set a separate height diffusion seed
    ///
    /// If not set, the height seed will match the site seed.
    pub fn height_seed(mut self, seed: u64) -> Self {
        self.height_seed = Some(seed);
        self
    }

    /// Set the diffusion step range and guards
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the options fail [`DiffusionOptions::validate`]
    pub fn diffusion(mut self, options: DiffusionOptions) -> Result<Self> {
        options.validate()?;
        self.diffusion = options;
        Ok(self)
    }

    /// Build the configuration
    ///
    /// If no seed was provided, generates a random seed using thread_rng.
    pub fn build(self) -> Result<MapConfig> {
        check_dimensions(self.width, self.height)?;
        Ok(self.finish())
    }

    fn finish(self) -> MapConfig {
        let seed = self.seed.unwrap_or_else(rand::random);
        let height_seed = self.height_seed.unwrap_or(seed);

        MapConfig {
            seed,
            width: self.width,
            height: self.height,
            count: self.count,
            sampling: self.sampling,
            lloyd_iterations: self.lloyd_iterations,
            lloyd_convergence: self.lloyd_convergence,
            relaxation: self.relaxation,
            height_seed,
            diffusion: self.diffusion,
        }
    }
}

impl Default for MapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
