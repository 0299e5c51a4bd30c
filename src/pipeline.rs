//! Memoized generation pipeline
//!
//! Each stage is a pure function of its inputs. [`MapPipeline`] caches the
//! output of every stage together with a fingerprint of the inputs it read,
//! and reruns a stage only when that fingerprint changes. Because every
//! fingerprint folds in its upstream fingerprint, a change anywhere upstream
//! invalidates everything below it.
//!
//! ```text
//! points ─► base ─┬────────────► selected ─► diagram ─► heights
//!                 └► relaxation ┘
//! ```

use glam::DVec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::cell::MapCell;
use crate::config::{Bounds, MapConfig, RelaxationMode};
use crate::error::Result;
use crate::generation::{
    lloyd_options, raw_cells, relax_triangulation, sample_points, DelaunayTriangulator,
    Relaxation, Triangulation, Triangulator, VoronoiDiagram,
};
use crate::map::VoronoiMap;
use crate::terrain::{diffuse_heights_with_options, HeightField, Seed};

/// A stage output and the fingerprint of the inputs that produced it
#[derive(Debug, Clone)]
struct Cached<T> {
    key: u64,
    value: T,
}

type Slot<T> = Option<Cached<T>>;

/// How many times each stage has actually run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub points: usize,
    pub triangulation: usize,
    pub relaxation: usize,
    pub diagram: usize,
    pub heights: usize,
}

#[derive(Debug, Clone)]
struct StageCache<T> {
    points: Slot<Vec<DVec2>>,
    base: Slot<T>,
    relaxed: Slot<Relaxation<T>>,
    diagram: Slot<VoronoiDiagram>,
    heights: Slot<HeightField>,
    counts: StageCounts,
}

impl<T> Default for StageCache<T> {
    fn default() -> Self {
        Self {
            points: None,
            base: None,
            relaxed: None,
            diagram: None,
            heights: None,
            counts: StageCounts::default(),
        }
    }
}

/// Cached, incremental map generation
///
/// # Example
///
/// ```rust
/// use voronoi_heightmap::*;
///
/// let config = MapConfigBuilder::new().seed(3).count(80).build().unwrap();
/// let mut pipeline = MapPipeline::new(config);
/// pipeline.set_height_seeds(vec![Seed::new(0, 1.0)]);
///
/// let assigned = pipeline.heights().unwrap().assigned_count();
/// assert!(assigned > 0);
///
/// // Only the height stage reruns
/// pipeline.set_height_seeds(vec![Seed::new(1, 0.5)]);
/// pipeline.heights().unwrap();
/// assert_eq!(pipeline.stage_counts().points, 1);
/// assert_eq!(pipeline.stage_counts().heights, 2);
/// ```
pub struct MapPipeline<Tr: Triangulator = DelaunayTriangulator> {
    config: MapConfig,
    height_seeds: Vec<Seed>,
    triangulator: Tr,
    cache: StageCache<Tr::Output>,
}

impl MapPipeline<DelaunayTriangulator> {
    /// Pipeline using the default Delaunay service
    pub fn new(config: MapConfig) -> Self {
        Self::with_triangulator(config, DelaunayTriangulator)
    }
}

impl<Tr> MapPipeline<Tr>
where
    Tr: Triangulator,
    Tr::Output: Clone,
{
    /// Pipeline using a custom triangulation service
    pub fn with_triangulator(config: MapConfig, triangulator: Tr) -> Self {
        Self {
            config,
            height_seeds: Vec::new(),
            triangulator,
            cache: StageCache::default(),
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Replace the configuration; stages rerun lazily where their inputs changed
    pub fn set_config(&mut self, config: MapConfig) {
        self.config = config;
    }

    pub fn height_seeds(&self) -> &[Seed] {
        &self.height_seeds
    }

    /// Replace the diffusion seeds; only the height stage depends on them
    pub fn set_height_seeds(&mut self, seeds: Vec<Seed>) {
        self.height_seeds = seeds;
    }

    /// Number of real (uncached) runs per stage so far
    pub fn stage_counts(&self) -> StageCounts {
        self.cache.counts
    }

    /// Drop every cached stage
    pub fn clear(&mut self) {
        self.cache = StageCache::default();
    }

    /// Sampled (unrelaxed) sites
    pub fn points(&mut self) -> Result<&[DVec2]> {
        let cache = &mut self.cache;
        let (_, points) = ensure_points(&mut cache.points, &mut cache.counts, &self.config)?;
        Ok(points)
    }

    /// Triangulation of the unrelaxed sites
    pub fn base_triangulation(&mut self) -> Result<&Tr::Output> {
        let cache = &mut self.cache;
        let points = ensure_points(&mut cache.points, &mut cache.counts, &self.config)?;
        let (_, base) =
            ensure_base(&mut cache.base, &mut cache.counts, points, &self.triangulator)?;
        Ok(base)
    }

    /// Lloyd relaxation of the sampled sites, regardless of the relaxation mode
    pub fn relaxation(&mut self) -> Result<&Relaxation<Tr::Output>> {
        let cache = &mut self.cache;
        let points = ensure_points(&mut cache.points, &mut cache.counts, &self.config)?;
        let base = ensure_base(&mut cache.base, &mut cache.counts, points, &self.triangulator)?;
        let (_, relaxed) = ensure_relaxed(
            &mut cache.relaxed,
            &mut cache.counts,
            base,
            &self.config,
            &self.triangulator,
        )?;
        Ok(relaxed)
    }

    /// Triangulation picked by the relaxation mode
    pub fn triangulation(&mut self) -> Result<&Tr::Output> {
        let cache = &mut self.cache;
        let (_, selected) = select(
            &mut cache.points,
            &mut cache.base,
            &mut cache.relaxed,
            &mut cache.counts,
            &self.config,
            &self.triangulator,
        )?;
        Ok(selected)
    }

    /// Sites picked by the relaxation mode
    pub fn sites(&mut self) -> Result<&[DVec2]> {
        Ok(self.triangulation()?.points())
    }

    /// Clipped Voronoi cells of the selected sites
    pub fn diagram(&mut self) -> Result<&VoronoiDiagram> {
        let cache = &mut self.cache;
        let selected = select(
            &mut cache.points,
            &mut cache.base,
            &mut cache.relaxed,
            &mut cache.counts,
            &self.config,
            &self.triangulator,
        )?;
        let (_, diagram) =
            ensure_diagram(&mut cache.diagram, &mut cache.counts, selected, self.config.bounds())?;
        Ok(diagram)
    }

    /// Heights diffused from the current seeds over the selected cells
    pub fn heights(&mut self) -> Result<&HeightField> {
        let cache = &mut self.cache;
        let selected = select(
            &mut cache.points,
            &mut cache.base,
            &mut cache.relaxed,
            &mut cache.counts,
            &self.config,
            &self.triangulator,
        )?;
        let (diagram_key, _) =
            ensure_diagram(&mut cache.diagram, &mut cache.counts, selected, self.config.bounds())?;
        let (_, heights) = ensure_heights(
            &mut cache.heights,
            &mut cache.counts,
            diagram_key,
            selected.1,
            &self.height_seeds,
            &self.config,
        )?;
        Ok(heights)
    }

    /// Assemble the finished map from the cached stages
    pub fn build(&mut self) -> Result<VoronoiMap> {
        let config = self.config;
        let cache = &mut self.cache;
        let selected = select(
            &mut cache.points,
            &mut cache.base,
            &mut cache.relaxed,
            &mut cache.counts,
            &config,
            &self.triangulator,
        )?;
        let (diagram_key, diagram) =
            ensure_diagram(&mut cache.diagram, &mut cache.counts, selected, config.bounds())?;
        let (_, heights) = ensure_heights(
            &mut cache.heights,
            &mut cache.counts,
            diagram_key,
            selected.1,
            &self.height_seeds,
            &config,
        )?;

        let cells = raw_cells(selected.1, diagram)?
            .into_iter()
            .map(|raw| {
                let height = heights.get(raw.id);
                MapCell::from_raw(raw, height)
            })
            .collect();

        Ok(VoronoiMap::from_cells(config, cells))
    }
}

fn fingerprint<H: Hash>(value: &H) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn bounds_key(bounds: Bounds) -> [u64; 4] {
    [
        bounds.min.x.to_bits(),
        bounds.min.y.to_bits(),
        bounds.max.x.to_bits(),
        bounds.max.y.to_bits(),
    ]
}

/// Reuse `slot` if its key matches, otherwise run `compute` and store the result
fn refresh<'a, T>(
    slot: &'a mut Slot<T>,
    key: u64,
    stage: &str,
    runs: &mut usize,
    compute: impl FnOnce() -> Result<T>,
) -> Result<(u64, &'a T)> {
    match slot.take() {
        Some(cached) if cached.key == key => {
            log::trace!("[Pipeline] {}: cache hit ({:016x})", stage, key);
            Ok((key, &slot.insert(cached).value))
        }
        _ => {
            log::debug!("[Pipeline] {}: computing ({:016x})", stage, key);
            let value = compute()?;
            *runs += 1;
            Ok((key, &slot.insert(Cached { key, value }).value))
        }
    }
}

fn ensure_points<'a>(
    slot: &'a mut Slot<Vec<DVec2>>,
    counts: &mut StageCounts,
    config: &MapConfig,
) -> Result<(u64, &'a [DVec2])> {
    let key = fingerprint(&(
        "points",
        config.seed,
        config.count,
        config.width.to_bits(),
        config.height.to_bits(),
        config.sampling,
    ));
    let (key, points) = refresh(slot, key, "points", &mut counts.points, || sample_points(config))?;
    Ok((key, points.as_slice()))
}

fn ensure_base<'a, Tr: Triangulator>(
    slot: &'a mut Slot<Tr::Output>,
    counts: &mut StageCounts,
    (points_key, points): (u64, &[DVec2]),
    triangulator: &Tr,
) -> Result<(u64, &'a Tr::Output)> {
    let key = fingerprint(&("triangulation", points_key));
    refresh(slot, key, "triangulation", &mut counts.triangulation, || {
        triangulator.triangulate(points)
    })
}

fn ensure_relaxed<'a, Tr>(
    slot: &'a mut Slot<Relaxation<Tr::Output>>,
    counts: &mut StageCounts,
    (base_key, base): (u64, &Tr::Output),
    config: &MapConfig,
    triangulator: &Tr,
) -> Result<(u64, &'a Relaxation<Tr::Output>)>
where
    Tr: Triangulator,
    Tr::Output: Clone,
{
    let bounds = config.bounds();
    let key = fingerprint(&(
        "relaxation",
        base_key,
        config.lloyd_iterations,
        config.lloyd_convergence.to_bits(),
        bounds_key(bounds),
    ));
    refresh(slot, key, "relaxation", &mut counts.relaxation, || {
        relax_triangulation(base, bounds, lloyd_options(config), triangulator)
    })
}

/// Triangulation chosen by the relaxation mode
///
/// Zero Lloyd iterations select the base triangulation directly.
fn select<'a, Tr>(
    points_slot: &'a mut Slot<Vec<DVec2>>,
    base_slot: &'a mut Slot<Tr::Output>,
    relaxed_slot: &'a mut Slot<Relaxation<Tr::Output>>,
    counts: &mut StageCounts,
    config: &MapConfig,
    triangulator: &Tr,
) -> Result<(u64, &'a Tr::Output)>
where
    Tr: Triangulator,
    Tr::Output: Clone,
{
    let points = ensure_points(points_slot, counts, config)?;
    let base = ensure_base(base_slot, counts, points, triangulator)?;

    match config.relaxation {
        RelaxationMode::Lloyd if config.lloyd_iterations > 0 => {
            let (key, relaxed) = ensure_relaxed(relaxed_slot, counts, base, config, triangulator)?;
            Ok((key, &relaxed.triangulation))
        }
        _ => Ok(base),
    }
}

fn ensure_diagram<'a, T: Triangulation>(
    slot: &'a mut Slot<VoronoiDiagram>,
    counts: &mut StageCounts,
    (selected_key, selected): (u64, &T),
    bounds: Bounds,
) -> Result<(u64, &'a VoronoiDiagram)> {
    let key = fingerprint(&("diagram", selected_key, bounds_key(bounds)));
    refresh(slot, key, "diagram", &mut counts.diagram, || selected.voronoi(bounds))
}

fn ensure_heights<'a, T: Triangulation>(
    slot: &'a mut Slot<HeightField>,
    counts: &mut StageCounts,
    diagram_key: u64,
    adjacency: &T,
    seeds: &[Seed],
    config: &MapConfig,
) -> Result<(u64, &'a HeightField)> {
    let seed_bits: Vec<(usize, u64)> =
        seeds.iter().map(|s| (s.index, s.height.to_bits())).collect();
    let options = config.diffusion;
    let key = fingerprint(&(
        "heights",
        diagram_key,
        seed_bits,
        config.height_seed,
        options.min_step.to_bits(),
        options.max_step.to_bits(),
        options.max_pops,
        options.floor.map(f64::to_bits),
    ));
    refresh(slot, key, "heights", &mut counts.heights, || {
        let mut rng = ChaCha8Rng::seed_from_u64(config.height_seed);
        diffuse_heights_with_options(adjacency, seeds, options, &mut rng)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapConfigBuilder, SamplingStrategy};

    fn config() -> MapConfig {
        MapConfigBuilder::new()
            .seed(42)
            .dimensions(120.0, 90.0)
            .unwrap()
            .count(80)
            .sampling(SamplingStrategy::Uniform)
            .lloyd_iterations(2)
            .unwrap()
            .build()
            .unwrap()
    }

    fn pipeline() -> MapPipeline {
        let mut pipeline = MapPipeline::new(config());
        pipeline.set_height_seeds(vec![Seed::new(0, 1.0), Seed::new(40, 0.6)]);
        pipeline
    }

    #[test]
    fn test_repeated_access_is_cached() {
        let mut pipeline = pipeline();
        let first = pipeline.heights().unwrap().clone();
        let second = pipeline.heights().unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(
            pipeline.stage_counts(),
            StageCounts {
                points: 1,
                triangulation: 1,
                relaxation: 1,
                diagram: 1,
                heights: 1,
            }
        );
    }

    #[test]
    fn test_seed_change_only_reruns_heights() {
        let mut pipeline = pipeline();
        pipeline.heights().unwrap();

        pipeline.set_height_seeds(vec![Seed::new(5, 2.0)]);
        let heights = pipeline.heights().unwrap();
        assert_eq!(heights.get(5), Some(2.0));

        let counts = pipeline.stage_counts();
        assert_eq!(counts.points, 1);
        assert_eq!(counts.relaxation, 1);
        assert_eq!(counts.diagram, 1);
        assert_eq!(counts.heights, 2);
    }

    #[test]
    fn test_mode_switch_reuses_both_paths() {
        let mut pipeline = pipeline();
        let relaxed_sites = pipeline.sites().unwrap().to_vec();

        let mut config = config();
        config.relaxation = RelaxationMode::Base;
        pipeline.set_config(config);
        let base_sites = pipeline.sites().unwrap().to_vec();

        assert_ne!(relaxed_sites, base_sites);
        assert_eq!(base_sites, pipeline.points().unwrap());

        // Switching back hits the cached relaxation
        config.relaxation = RelaxationMode::Lloyd;
        pipeline.set_config(config);
        assert_eq!(pipeline.sites().unwrap(), relaxed_sites.as_slice());

        let counts = pipeline.stage_counts();
        assert_eq!(counts.points, 1);
        assert_eq!(counts.triangulation, 1);
        assert_eq!(counts.relaxation, 1);
    }

    #[test]
    fn test_upstream_change_invalidates_downstream() {
        let mut pipeline = pipeline();
        pipeline.heights().unwrap();

        let mut config = config();
        config.seed = 43;
        pipeline.set_config(config);
        pipeline.heights().unwrap();

        assert_eq!(
            pipeline.stage_counts(),
            StageCounts {
                points: 2,
                triangulation: 2,
                relaxation: 2,
                diagram: 2,
                heights: 2,
            }
        );
    }

    #[test]
    fn test_height_seed_change_keeps_geometry() {
        let mut pipeline = pipeline();
        pipeline.build().unwrap();

        let mut config = config();
        config.height_seed = 1234;
        pipeline.set_config(config);
        pipeline.build().unwrap();

        let counts = pipeline.stage_counts();
        assert_eq!(counts.diagram, 1);
        assert_eq!(counts.heights, 2);
    }

    #[test]
    fn test_zero_iterations_select_base() {
        let mut config = config();
        config.lloyd_iterations = 0;
        let mut pipeline = MapPipeline::new(config);

        let sites = pipeline.sites().unwrap().to_vec();
        assert_eq!(sites, pipeline.points().unwrap());
        assert_eq!(pipeline.stage_counts().relaxation, 0);
    }

    #[test]
    fn test_build_matches_stages() {
        let mut pipeline = pipeline();
        let map = pipeline.build().unwrap();
        let heights = pipeline.heights().unwrap().clone();

        assert_eq!(map.cell_count(), 80);
        for cell in map.cells() {
            assert_eq!(cell.height, heights.get(cell.id));
        }
        assert_eq!(map.get_cell(0).unwrap().height, Some(1.0));
    }

    #[test]
    fn test_clear_forces_recompute() {
        let mut pipeline = pipeline();
        pipeline.points().unwrap();
        pipeline.clear();
        pipeline.points().unwrap();
        assert_eq!(pipeline.stage_counts().points, 1);
    }

    #[test]
    fn test_errors_surface() {
        let mut pipeline = pipeline();
        pipeline.set_height_seeds(vec![Seed::new(10_000, 1.0)]);
        assert!(pipeline.heights().is_err());
        // Geometry stays cached after a failed height stage
        assert_eq!(pipeline.stage_counts().diagram, 1);
    }
}
