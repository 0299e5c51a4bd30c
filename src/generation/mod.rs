//! Core cell map generation
//!
//! Samples sites, relaxes them with Lloyd's algorithm, and builds Voronoi
//! cells through a Delaunay triangulation service.

mod delaunay;
mod lloyd;
mod points;
mod poisson;
mod voronoi;

pub use delaunay::{
    Adjacency, DelaunayTriangulation, DelaunayTriangulator, Triangulation, Triangulator,
    VoronoiDiagram,
};
pub use lloyd::{
    relax, relax_triangulation, vertex_centroid, LloydOptions, Relaxation, RelaxedPoints,
};
pub use points::sample_uniform;
pub use poisson::{
    min_distance, sample_poisson_disc, sample_poisson_disc_with_options, PoissonDiscOptions,
    SampleGrid,
};
pub use voronoi::{build_dual, circumcenter, CircumcenterDual};

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{MapConfig, SamplingStrategy};
use crate::error::{Result, VoronoiError};

/// A Voronoi cell without height (geometry only)
///
/// This is an intermediate representation used during generation.
/// Heights are added later to create the final [`MapCell`](crate::MapCell).
#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    /// Site index
    pub id: usize,
    /// Site position
    pub site: DVec2,
    /// IDs of neighboring cells
    pub neighbors: Vec<usize>,
    /// Clipped cell boundary
    pub polygon: Vec<DVec2>,
}

/// Sample the initial sites for `config`, seeded from `config.seed`
pub fn sample_points(config: &MapConfig) -> Result<Vec<DVec2>> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    sample_points_with_rng(config, &mut rng)
}

/// Sample the initial sites for `config` from an explicit random source
pub fn sample_points_with_rng<R: Rng + ?Sized>(
    config: &MapConfig,
    rng: &mut R,
) -> Result<Vec<DVec2>> {
    match config.sampling {
        SamplingStrategy::Uniform => {
            sample_uniform(config.count, config.width, config.height, rng)
        }
        SamplingStrategy::PoissonDisc => {
            sample_poisson_disc(config.count, config.width, config.height, rng)
        }
    }
}

/// Lloyd options derived from `config`
pub fn lloyd_options(config: &MapConfig) -> LloydOptions {
    LloydOptions {
        max_iterations: config.lloyd_iterations,
        convergence_threshold: config.lloyd_convergence,
    }
}

/// Pair a triangulation's sites and adjacency with its clipped cells
///
/// This is the geometry half of a finished map; the pipeline attaches
/// heights to produce [`MapCell`](crate::MapCell)s.
///
/// # Errors
///
/// Returns `InvalidConfig` if `diagram` does not hold one cell per site.
pub fn raw_cells<T: Triangulation>(
    triangulation: &T,
    diagram: &VoronoiDiagram,
) -> Result<Vec<RawCell>> {
    let points = triangulation.points();
    if diagram.len() != points.len() {
        return Err(VoronoiError::InvalidConfig(format!(
            "diagram has {} cells for {} sites",
            diagram.len(),
            points.len()
        )));
    }

    Ok(diagram
        .cell_polygons()
        .zip(points)
        .enumerate()
        .map(|(id, (polygon, &site))| RawCell {
            id,
            site,
            neighbors: triangulation.neighbors(id).to_vec(),
            polygon: polygon.to_vec(),
        })
        .collect())
}
