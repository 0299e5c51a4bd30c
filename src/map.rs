//! VoronoiMap main structure

use std::collections::HashSet;

use crate::cell::MapCell;
use crate::config::{Bounds, MapConfig};
use crate::error::Result;
use crate::pipeline::MapPipeline;
use crate::terrain::Seed;

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;
#[cfg(feature = "spatial-index")]
use glam::DVec2;

/// A complete Voronoi-tessellated height map
///
/// Holds every generated cell in memory for queries and traversal. Built
/// from the cached stages of a [`MapPipeline`], or in one shot with
/// [`VoronoiMap::generate`].
///
/// # Examples
///
/// ```
/// use voronoi_heightmap::*;
///
/// let config = MapConfigBuilder::new()
///     .seed(42)
///     .count(200)
///     .build()
///     .unwrap();
///
/// let map = VoronoiMap::generate(config, &[Seed::new(0, 1.0)]).unwrap();
/// println!("Generated {} cells", map.cell_count());
///
/// if let Some(cell) = map.get_cell(0) {
///     println!("Cell 0 height: {:?}", cell.height);
/// }
/// ```
#[derive(Clone)]
pub struct VoronoiMap {
    /// Configuration used to generate this map
    config: MapConfig,

    /// All cells, indexed by site id
    cells: Vec<MapCell>,

    /// Spatial index for fast position-to-cell lookups (requires spatial-index feature)
    #[cfg(feature = "spatial-index")]
    spatial_index: SpatialIndex,
}

impl VoronoiMap {
    /// Generate a map and diffuse heights from `seeds`
    ///
    /// Runs every stage once without keeping the cache around. Use a
    /// [`MapPipeline`] to regenerate cheaply after small changes.
    ///
    /// # Example
    ///
    /// ```
    /// use voronoi_heightmap::*;
    ///
    /// let config = MapConfigBuilder::new()
    ///     .seed(12345)
    ///     .dimensions(400.0, 300.0)
    ///     .unwrap()
    ///     .count(150)
    ///     .lloyd_iterations(3)
    ///     .unwrap()
    ///     .build()
    ///     .unwrap();
    ///
    /// let map = VoronoiMap::generate(config, &[]).unwrap();
    /// assert!(map.cell_count() > 0);
    /// assert!(map.cells().iter().all(|c| c.height.is_none()));
    /// ```
    pub fn generate(config: MapConfig, seeds: &[Seed]) -> Result<Self> {
        let mut pipeline = MapPipeline::new(config);
        pipeline.set_height_seeds(seeds.to_vec());
        pipeline.build()
    }

    pub(crate) fn from_cells(config: MapConfig, cells: Vec<MapCell>) -> Self {
        #[cfg(feature = "spatial-index")]
        let spatial_index = {
            let sites: Vec<DVec2> = cells.iter().map(|c| c.site).collect();
            SpatialIndex::new(&sites)
        };

        Self {
            config,
            cells,
            #[cfg(feature = "spatial-index")]
            spatial_index,
        }
    }

    /// Get the configuration used to generate this map
    #[inline]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Map extent
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.config.bounds()
    }

    /// Get the number of cells on this map
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Get a cell by ID
    ///
    /// Returns `None` if the cell ID is out of bounds.
    #[inline]
    pub fn get_cell(&self, id: usize) -> Option<&MapCell> {
        self.cells.get(id)
    }

    /// Get all cells as a slice
    #[inline]
    pub fn cells(&self) -> &[MapCell] {
        &self.cells
    }

    /// Get neighbor IDs for a cell
    ///
    /// Returns empty slice if cell ID is invalid.
    pub fn get_neighbors(&self, cell_id: usize) -> &[usize] {
        self.cells
            .get(cell_id)
            .map(|c| c.neighbors.as_slice())
            .unwrap_or(&[])
    }

    /// Height of a cell, `None` if unreached or invalid
    pub fn height_of(&self, cell_id: usize) -> Option<f64> {
        self.cells.get(cell_id).and_then(|c| c.height)
    }

    /// Find the cell containing a position (requires spatial-index feature)
    ///
    /// Uses the KD-tree over cell sites; the nearest site owns the position.
    ///
    /// # Example
    ///
    /// ```
    /// # use voronoi_heightmap::*;
    /// # #[cfg(feature = "spatial-index")]
    /// # {
    /// # let map = VoronoiMap::generate(MapConfig::default(), &[]).unwrap();
    /// let cell_id = map.find_cell_at(DVec2::new(400.0, 300.0));
    /// assert!(cell_id.is_some());
    /// # }
    /// ```
    #[cfg(feature = "spatial-index")]
    pub fn find_cell_at(&self, position: DVec2) -> Option<usize> {
        self.spatial_index.find_nearest(position)
    }

    /// Find cells within a given hop count from a center cell (BFS)
    ///
    /// Includes the center cell. Returns sorted ids, or an empty vec if
    /// `center_id` is invalid.
    pub fn find_cells_within_radius(&self, center_id: usize, hops: usize) -> Vec<usize> {
        if center_id >= self.cells.len() {
            return vec![];
        }

        let mut visited = HashSet::new();
        let mut current = vec![center_id];
        visited.insert(center_id);

        for _ in 0..hops {
            let mut next = Vec::new();
            for &cell_id in &current {
                for &neighbor in self.get_neighbors(cell_id) {
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            current = next;
        }

        let mut found: Vec<usize> = visited.into_iter().collect();
        found.sort_unstable();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapConfigBuilder, SamplingStrategy};

    fn config() -> MapConfig {
        MapConfigBuilder::new()
            .seed(42)
            .dimensions(300.0, 200.0)
            .unwrap()
            .count(150)
            .sampling(SamplingStrategy::Uniform)
            .build()
            .unwrap()
    }

    #[test]
    fn test_map_generation() {
        let map = VoronoiMap::generate(config(), &[Seed::new(0, 1.0)]).unwrap();

        assert_eq!(map.cell_count(), 150);
        assert_eq!(map.config().seed, 42);
        assert_eq!(map.height_of(0), Some(1.0));
        assert!(map.cells().iter().filter(|c| c.height.is_some()).count() > 1);
        for cell in map.cells() {
            assert!(map.bounds().contains(cell.site));
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = VoronoiMap::generate(config(), &[Seed::new(3, 0.8)]).unwrap();
        let b = VoronoiMap::generate(config(), &[Seed::new(3, 0.8)]).unwrap();
        assert_eq!(a.cells(), b.cells());
    }

    #[test]
    fn test_get_cell() {
        let map = VoronoiMap::generate(config(), &[]).unwrap();

        assert!(map.get_cell(0).is_some());
        assert!(map.get_cell(map.cell_count()).is_none());
        assert_eq!(map.height_of(0), None);
    }

    #[test]
    fn test_get_neighbors() {
        let map = VoronoiMap::generate(config(), &[]).unwrap();

        let neighbors = map.get_neighbors(0);
        assert!(!neighbors.is_empty());
        for &n in neighbors {
            assert!(map.get_neighbors(n).contains(&0), "Adjacency should be symmetric");
        }
    }

    #[cfg(feature = "spatial-index")]
    #[test]
    fn test_find_cell_at() {
        let map = VoronoiMap::generate(config(), &[]).unwrap();

        for id in [0, 17, 149] {
            let site = map.get_cell(id).unwrap().site;
            assert_eq!(map.find_cell_at(site), Some(id));
        }
    }

    #[test]
    fn test_find_cells_within_radius() {
        let map = VoronoiMap::generate(config(), &[]).unwrap();

        let cells_r0 = map.find_cells_within_radius(0, 0);
        assert_eq!(cells_r0, vec![0]);

        let cells_r1 = map.find_cells_within_radius(0, 1);
        let neighbors = map.get_neighbors(0);
        assert_eq!(cells_r1.len(), 1 + neighbors.len());

        let cells_r2 = map.find_cells_within_radius(0, 2);
        assert!(cells_r2.len() > cells_r1.len());

        let everything = map.find_cells_within_radius(0, 1000);
        assert_eq!(everything.len(), map.cell_count());
    }

    #[test]
    fn test_invalid_cell_id() {
        let map = VoronoiMap::generate(config(), &[]).unwrap();

        assert!(map.get_neighbors(999999).is_empty());
        assert!(map.find_cells_within_radius(999999, 5).is_empty());
        assert_eq!(map.height_of(999999), None);
    }

    #[test]
    fn test_bad_seed_is_an_error() {
        assert!(VoronoiMap::generate(config(), &[Seed::new(150, 1.0)]).is_err());
    }
}
