//! Multi-source height diffusion
//!
//! A FIFO flood from the seed cells. Each hop lowers the height by a random
//! step, so the field falls off irregularly rather than in perfect rings.
//! The first time a site is popped fixes its height; later arrivals are
//! discarded. This is a greedy flood, not a shortest-path search, and the
//! result depends on traversal order and the random draws.

use rand::Rng;
use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{HeightField, Seed};
use crate::error::{Result, VoronoiError};
use crate::generation::Adjacency;

/// Step range and guards for height diffusion
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionOptions {
    /// Smallest height drop per hop (inclusive)
    pub min_step: f64,
    /// Largest height drop per hop (exclusive, unless equal to `min_step`)
    pub max_step: f64,
    /// Stop after this many sites are fixed (None = until the queue empties)
    pub max_pops: Option<usize>,
    /// Height an unassigned neighbor is compared against before a push
    ///
    /// A neighbor is not pushed when its current height (or this floor, if
    /// it has none yet) exceeds the propagating height. `None` acts as −∞.
    /// `Some(0.0)` stops propagation once the front drops below zero.
    pub floor: Option<f64>,
}

impl Default for DiffusionOptions {
    fn default() -> Self {
        Self {
            min_step: 0.01,
            max_step: 0.09,
            max_pops: None,
            floor: None,
        }
    }
}

impl DiffusionOptions {
    /// Check that the step range is usable
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for non-finite or negative steps,
    /// `min_step > max_step`, or a non-finite floor.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_step.is_finite() && self.max_step.is_finite()) {
            return Err(VoronoiError::InvalidConfig(format!(
                "diffusion steps must be finite (got {}..{})",
                self.min_step, self.max_step
            )));
        }
        if self.min_step < 0.0 || self.min_step > self.max_step {
            return Err(VoronoiError::InvalidConfig(format!(
                "diffusion steps need 0 <= min_step <= max_step (got {}..{})",
                self.min_step, self.max_step
            )));
        }
        if let Some(floor) = self.floor {
            if !floor.is_finite() {
                return Err(VoronoiError::InvalidConfig(format!(
                    "diffusion floor must be finite (got {})",
                    floor
                )));
            }
        }
        Ok(())
    }

    fn draw_step<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min_step == self.max_step {
            self.min_step
        } else {
            rng.gen_range(self.min_step..self.max_step)
        }
    }
}

/// Spread heights from `seeds` across `adjacency` with the default options
///
/// # Example
///
/// ```rust
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use voronoi_heightmap::{diffuse_heights, Seed};
///
/// // 0 - 1 - 2, plus an isolated site 3
/// let graph: Vec<Vec<usize>> = vec![vec![1], vec![0, 2], vec![1], vec![]];
/// let mut rng = ChaCha8Rng::seed_from_u64(1);
/// let heights = diffuse_heights(&graph, &[Seed::new(0, 1.0)], &mut rng).unwrap();
///
/// assert_eq!(heights.get(0), Some(1.0));
/// assert!(heights.get(2).unwrap() < heights.get(1).unwrap());
/// assert_eq!(heights.get(3), None);
/// ```
pub fn diffuse_heights<A, R>(adjacency: &A, seeds: &[Seed], rng: &mut R) -> Result<HeightField>
where
    A: Adjacency + ?Sized,
    R: Rng + ?Sized,
{
    diffuse_heights_with_options(adjacency, seeds, DiffusionOptions::default(), rng)
}

/// Spread heights from `seeds` across `adjacency`
///
/// # Algorithm
///
/// 1. Queue every seed in order
/// 2. Pop the front; skip it if its site is already fixed
/// 3. Fix the site's height to the popped height
/// 4. For each unfixed neighbor, skip it if its height (or the floor)
///    exceeds the popped height; otherwise queue it one random step lower
///
/// # Errors
///
/// - `IndexOutOfRange` for a seed or neighbor index outside `[0, N)`
/// - `InvalidConfig` for bad options or a non-finite seed height
pub fn diffuse_heights_with_options<A, R>(
    adjacency: &A,
    seeds: &[Seed],
    options: DiffusionOptions,
    rng: &mut R,
) -> Result<HeightField>
where
    A: Adjacency + ?Sized,
    R: Rng + ?Sized,
{
    options.validate()?;

    let site_count = adjacency.site_count();
    for seed in seeds {
        if seed.index >= site_count {
            return Err(VoronoiError::IndexOutOfRange {
                index: seed.index,
                len: site_count,
            });
        }
        if !seed.height.is_finite() {
            return Err(VoronoiError::InvalidConfig(format!(
                "seed height for site {} must be finite (got {})",
                seed.index, seed.height
            )));
        }
    }

    let mut field = HeightField::new(site_count);
    let mut visited = vec![false; site_count];
    let mut queue: VecDeque<Seed> = seeds.iter().copied().collect();

    let mut fixed = 0usize;
    let mut pushes = 0usize;
    let mut guarded = 0usize;

    while let Some(current) = queue.pop_front() {
        if options.max_pops.is_some_and(|max| fixed >= max) {
            log::debug!(
                "[Diffusion] stopped at max_pops={} with {} queued",
                fixed,
                queue.len() + 1
            );
            break;
        }

        if visited[current.index] {
            continue;
        }
        visited[current.index] = true;
        field.assign(current.index, current.height);
        fixed += 1;

        for &neighbor in adjacency.neighbors(current.index) {
            if neighbor >= site_count {
                return Err(VoronoiError::IndexOutOfRange {
                    index: neighbor,
                    len: site_count,
                });
            }
            if visited[neighbor] {
                continue;
            }

            let existing = field.get(neighbor).or(options.floor);
            if existing.is_some_and(|h| h > current.height) {
                guarded += 1;
                continue;
            }

            queue.push_back(Seed {
                index: neighbor,
                height: current.height - options.draw_step(rng),
            });
            pushes += 1;
        }
    }

    log::debug!(
        "[Diffusion] {} seeds -> {}/{} sites assigned ({} pushes, {} guarded)",
        seeds.len(),
        fixed,
        site_count,
        pushes,
        guarded
    );

    Ok(field)
}
