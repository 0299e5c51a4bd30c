//! Lloyd's Relaxation for evenly spaced sites
//!
//! Lloyd's Relaxation iteratively improves the spacing of the sites by
//! moving each one to the centroid of its Voronoi cell.

use glam::DVec2;
use std::time::Instant;

use super::delaunay::{Adjacency, Triangulation, Triangulator, VoronoiDiagram};
use crate::config::Bounds;
use crate::error::{Result, VoronoiError};

/// Options for Lloyd's relaxation algorithm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LloydOptions {
    /// Maximum number of iterations to run
    pub max_iterations: usize,
    /// Convergence threshold as a fraction of the bounds diagonal - stop
    /// when max displacement < threshold * diagonal.
    /// Set to 0.0 to disable early termination
    pub convergence_threshold: f64,
}

impl Default for LloydOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            convergence_threshold: 0.0,
        }
    }
}

/// Base and relaxed site sets side by side
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxedPoints {
    /// Sites before relaxation
    pub base_points: Vec<DVec2>,
    /// Sites after relaxation
    pub relaxed_points: Vec<DVec2>,
}

/// Outcome of relaxing a triangulated site set
#[derive(Debug, Clone)]
pub struct Relaxation<T> {
    /// Triangulation of the relaxed sites
    pub triangulation: T,
    /// Rounds actually run
    pub iterations_run: usize,
    /// True if the run stopped early on the convergence threshold
    pub converged: bool,
}

impl<T: Triangulation> Relaxation<T> {
    /// Relaxed sites in index order
    pub fn points(&self) -> &[DVec2] {
        self.triangulation.points()
    }
}

/// Arithmetic mean of a polygon's vertices
///
/// This is the vertex centroid, not the area centroid. Degenerate polygons
/// (collinear or with repeated vertices) still average whatever vertices
/// they have.
///
/// # Errors
///
/// Returns `EmptyPolygon` when the polygon has no vertices.
pub fn vertex_centroid(site: usize, polygon: &[DVec2]) -> Result<DVec2> {
    if polygon.is_empty() {
        return Err(VoronoiError::EmptyPolygon { site });
    }
    let sum: DVec2 = polygon.iter().copied().sum();
    Ok(sum / polygon.len() as f64)
}

/// Apply `iterations` rounds of Lloyd's Relaxation
///
/// `iterations == 0` returns the input unchanged without triangulating.
///
/// # Arguments
///
/// * `points` - Initial sites, all inside `bounds`
/// * `iterations` - Number of relaxation rounds
/// * `bounds` - Clip rectangle for the Voronoi cells
/// * `triangulator` - Triangulation service
///
/// # Returns
///
/// The base and relaxed site sets, index-aligned
pub fn relax<Tr>(
    points: &[DVec2],
    iterations: usize,
    bounds: Bounds,
    triangulator: &Tr,
) -> Result<RelaxedPoints>
where
    Tr: Triangulator,
    Tr::Output: Clone,
{
    if iterations == 0 {
        return Ok(RelaxedPoints {
            base_points: points.to_vec(),
            relaxed_points: points.to_vec(),
        });
    }

    let base = triangulator.triangulate(points)?;
    let options = LloydOptions {
        max_iterations: iterations,
        convergence_threshold: 0.0,
    };
    let relaxation = relax_triangulation(&base, bounds, options, triangulator)?;

    Ok(RelaxedPoints {
        base_points: points.to_vec(),
        relaxed_points: relaxation.points().to_vec(),
    })
}

/// Relax an existing triangulation with custom options
///
/// Each round:
/// 1. Query the clipped Voronoi cell of every site in index order
/// 2. Move each site to the vertex centroid of its cell
/// 3. Re-triangulate the moved sites for the next round
///
/// The base triangulation is left untouched, so callers can keep both.
pub fn relax_triangulation<Tr>(
    base: &Tr::Output,
    bounds: Bounds,
    options: LloydOptions,
    triangulator: &Tr,
) -> Result<Relaxation<Tr::Output>>
where
    Tr: Triangulator,
    Tr::Output: Clone,
{
    let convergence_threshold = options.convergence_threshold * bounds.diagonal();
    let total_start = Instant::now();

    log::debug!(
        "[Lloyd] Starting: {} points, max {} iterations, threshold {:.4} (abs: {:.4})",
        base.site_count(),
        options.max_iterations,
        options.convergence_threshold,
        convergence_threshold
    );

    let mut current = base.clone();
    let mut iterations_run = 0;
    let mut converged = false;

    for iteration in 0..options.max_iterations {
        let iter_start = Instant::now();

        let diagram = current.voronoi(bounds)?;
        let (new_points, max_displacement) = compute_new_points(current.points(), &diagram)?;
        current = triangulator.triangulate(&new_points)?;
        iterations_run = iteration + 1;

        log::debug!(
            "[Lloyd] Iter {}: total={:?}, max_disp={:.4}",
            iteration + 1,
            iter_start.elapsed(),
            max_displacement
        );

        if convergence_threshold > 0.0 && max_displacement < convergence_threshold {
            converged = true;
            log::debug!(
                "[Lloyd] Converged at iteration {} (max_disp {:.4} < threshold {:.4})",
                iteration + 1,
                max_displacement,
                convergence_threshold
            );
            break;
        }
    }

    log::debug!(
        "[Lloyd] Finished: {} iterations (of max {}), converged={}, total={:?}",
        iterations_run,
        options.max_iterations,
        converged,
        total_start.elapsed()
    );

    Ok(Relaxation {
        triangulation: current,
        iterations_run,
        converged,
    })
}

/// Compute new site positions and track maximum displacement
fn compute_new_points(points: &[DVec2], diagram: &VoronoiDiagram) -> Result<(Vec<DVec2>, f64)> {
    let mut max_displacement: f64 = 0.0;

    let new_points = points
        .iter()
        .enumerate()
        .map(|(site, old_pos)| {
            let centroid = vertex_centroid(site, diagram.cell_polygon(site)?)?;
            max_displacement = max_displacement.max(centroid.distance(*old_pos));
            Ok(centroid)
        })
        .collect::<Result<Vec<DVec2>>>()?;

    Ok((new_points, max_displacement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::delaunay::DelaunayTriangulator;
    use crate::generation::points::sample_uniform;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random_points(count: usize, seed: u64) -> Vec<DVec2> {
        sample_uniform(count, 100.0, 100.0, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap()
    }

    /// Coefficient of variation of nearest-neighbor distances (lower is more even)
    fn nearest_neighbor_spread(points: &[DVec2]) -> f64 {
        let nearest: Vec<f64> = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                points
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, q)| p.distance(*q))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let mean = nearest.iter().sum::<f64>() / nearest.len() as f64;
        let variance =
            nearest.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / nearest.len() as f64;
        variance.sqrt() / mean
    }

    #[test]
    fn test_square_centroid() {
        let square = [
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
        ];
        assert_eq!(vertex_centroid(0, &square).unwrap(), DVec2::new(1.0, 1.0));
    }

    #[test]
    fn test_degenerate_centroid() {
        let segment = [DVec2::new(0.0, 0.0), DVec2::new(4.0, 2.0)];
        assert_eq!(vertex_centroid(0, &segment).unwrap(), DVec2::new(2.0, 1.0));

        assert_eq!(
            vertex_centroid(3, &[]).unwrap_err(),
            VoronoiError::EmptyPolygon { site: 3 }
        );
    }

    #[test]
    fn test_zero_iterations_is_identity() {
        let points = random_points(40, 42);
        let result = relax(&points, 0, Bounds::new(100.0, 100.0), &DelaunayTriangulator).unwrap();

        assert_eq!(result.base_points, points);
        assert_eq!(result.relaxed_points, points);
    }

    #[test]
    fn test_zero_iterations_needs_no_triangulation() {
        let points = vec![DVec2::new(1.0, 1.0)];
        let result = relax(&points, 0, Bounds::new(10.0, 10.0), &DelaunayTriangulator).unwrap();
        assert_eq!(result.relaxed_points, points);
    }

    #[test]
    fn test_coincident_sites_fail_relaxation() {
        let points = vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(9.0, 1.0),
            DVec2::new(9.0, 9.0),
            DVec2::new(1.0, 9.0),
            DVec2::new(5.0, 5.0),
            DVec2::new(5.0, 5.0),
        ];
        let err = relax(&points, 1, Bounds::new(10.0, 10.0), &DelaunayTriangulator).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Triangulation);
    }

    #[test]
    fn test_lloyd_relaxation() {
        let points = random_points(100, 42);
        let bounds = Bounds::new(100.0, 100.0);
        let result = relax(&points, 3, bounds, &DelaunayTriangulator).unwrap();

        assert_eq!(result.relaxed_points.len(), 100);
        assert_eq!(result.base_points, points);

        for p in &result.relaxed_points {
            assert!(bounds.contains(*p), "relaxed point {:?} left the bounds", p);
        }
    }

    #[test]
    fn test_lloyd_evens_spacing() {
        let points = random_points(150, 7);
        let result = relax(&points, 5, Bounds::new(100.0, 100.0), &DelaunayTriangulator).unwrap();

        assert!(nearest_neighbor_spread(&result.relaxed_points) < nearest_neighbor_spread(&points));
    }

    #[test]
    fn test_lloyd_relaxation_determinism() {
        let bounds = Bounds::new(100.0, 100.0);
        let relaxed1 = relax(&random_points(50, 12345), 2, bounds, &DelaunayTriangulator).unwrap();
        let relaxed2 = relax(&random_points(50, 12345), 2, bounds, &DelaunayTriangulator).unwrap();

        for (p1, p2) in relaxed1.relaxed_points.iter().zip(&relaxed2.relaxed_points) {
            assert_relative_eq!(p1.x, p2.x);
            assert_relative_eq!(p1.y, p2.y);
        }
    }

    #[test]
    fn test_relax_triangulation_keeps_base() {
        let points = random_points(60, 3);
        let base = DelaunayTriangulator.triangulate(&points).unwrap();
        let options = LloydOptions {
            max_iterations: 2,
            convergence_threshold: 0.0,
        };
        let relaxation =
            relax_triangulation(&base, Bounds::new(100.0, 100.0), options, &DelaunayTriangulator)
                .unwrap();

        assert_eq!(relaxation.iterations_run, 2);
        assert!(!relaxation.converged);
        assert_eq!(base.points(), points.as_slice());
        assert_ne!(relaxation.points(), points.as_slice());
    }

    #[test]
    fn test_lloyd_convergence_stops_early() {
        let points = random_points(60, 5);
        let base = DelaunayTriangulator.triangulate(&points).unwrap();
        let options = LloydOptions {
            max_iterations: 20,
            convergence_threshold: 0.5,
        };
        let relaxation =
            relax_triangulation(&base, Bounds::new(100.0, 100.0), options, &DelaunayTriangulator)
                .unwrap();

        // Nothing moves half a diagonal, so the first round already converges
        assert_eq!(relaxation.iterations_run, 1);
        assert!(relaxation.converged);
    }

    #[test]
    fn test_lloyd_options_default() {
        let options = LloydOptions::default();
        assert_eq!(options.max_iterations, 5);
        assert_eq!(options.convergence_threshold, 0.0);
    }
}
