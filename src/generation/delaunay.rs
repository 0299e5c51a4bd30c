//! Delaunay triangulation and bounded Voronoi cells
//!
//! Site adjacency, the triangle index buffer, and clipped cell polygons come
//! from a triangulation service described by the [`Triangulator`] and
//! [`Triangulation`] traits. [`DelaunayTriangulator`] is the default service,
//! a thin wrapper around the `voronoice` crate (Delaunator triangulation plus
//! bounding-box clipping).

use glam::DVec2;
use voronoice::{BoundingBox, Point, Voronoi, VoronoiBuilder};

use crate::config::Bounds;
use crate::error::{Result, VoronoiError};

/// Site adjacency graph
///
/// Sites are dense indices in `[0, site_count())`. Lists are expected to be
/// symmetric but consumers must not rely on it.
pub trait Adjacency {
    /// Number of sites in the graph
    fn site_count(&self) -> usize;

    /// Neighbors of `site`; empty for an unknown site
    fn neighbors(&self, site: usize) -> &[usize];
}

impl Adjacency for [Vec<usize>] {
    fn site_count(&self) -> usize {
        self.len()
    }

    fn neighbors(&self, site: usize) -> &[usize] {
        self.get(site).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Adjacency for Vec<Vec<usize>> {
    fn site_count(&self) -> usize {
        self.len()
    }

    fn neighbors(&self, site: usize) -> &[usize] {
        self.as_slice().neighbors(site)
    }
}

/// A triangulated point set
pub trait Triangulation: Adjacency {
    /// Sites in index order
    fn points(&self) -> &[DVec2];

    /// Flat triangle buffer, three site indices per triangle
    fn triangles(&self) -> &[usize];

    /// Voronoi cells of every site clipped to `bounds`
    fn voronoi(&self, bounds: Bounds) -> Result<VoronoiDiagram>;

    /// Number of triangles
    fn triangle_count(&self) -> usize {
        self.triangles().len() / 3
    }
}

/// Builds triangulations from point sets
pub trait Triangulator {
    type Output: Triangulation;

    /// Triangulate `points`; defined for at least 3 non-collinear points
    fn triangulate(&self, points: &[DVec2]) -> Result<Self::Output>;
}

/// Clipped Voronoi cells, one polygon per site
///
/// Polygons are open rings (the first vertex is not repeated at the end).
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiDiagram {
    bounds: Bounds,
    polygons: Vec<Vec<DVec2>>,
}

impl VoronoiDiagram {
    /// Wrap precomputed cell polygons
    pub fn from_polygons(bounds: Bounds, polygons: Vec<Vec<DVec2>>) -> Self {
        Self { bounds, polygons }
    }

    /// Polygon of one cell
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `site` is not a site of this diagram
    pub fn cell_polygon(&self, site: usize) -> Result<&[DVec2]> {
        self.polygons
            .get(site)
            .map(Vec::as_slice)
            .ok_or(VoronoiError::IndexOutOfRange {
                index: site,
                len: self.polygons.len(),
            })
    }

    /// All cell polygons in site order
    pub fn cell_polygons(&self) -> impl ExactSizeIterator<Item = &[DVec2]> + '_ {
        self.polygons.iter().map(Vec::as_slice)
    }

    /// Clipping rectangle
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// Default triangulation service backed by `voronoice`
#[derive(Debug, Clone, Copy, Default)]
pub struct DelaunayTriangulator;

impl Triangulator for DelaunayTriangulator {
    type Output = DelaunayTriangulation;

    fn triangulate(&self, points: &[DVec2]) -> Result<DelaunayTriangulation> {
        DelaunayTriangulation::new(points)
    }
}

/// Delaunay triangulation of a planar point set
///
/// Keeps the input order, so site `i` is `points()[i]`.
#[derive(Debug, Clone)]
pub struct DelaunayTriangulation {
    points: Vec<DVec2>,
    triangles: Vec<usize>,
    neighbors: Vec<Vec<usize>>,
}

impl DelaunayTriangulation {
    /// Triangulate `points`
    ///
    /// # Errors
    ///
    /// Returns `TriangulationFailed` for fewer than 3 points, non-finite or
    /// coincident sites, or a degenerate (for example fully collinear) point set.
    pub fn new(points: &[DVec2]) -> Result<Self> {
        if points.len() < 3 {
            return Err(VoronoiError::TriangulationFailed(format!(
                "need at least 3 points (got {})",
                points.len()
            )));
        }

        // Delaunay topology does not depend on the clip box as long as every
        // site lies inside it.
        let enclosing = enclosing_bounds(points);
        let voronoi = build_voronoi(points, enclosing)?;
        let triangles = voronoi.triangulation().triangles.clone();
        let neighbors = build_neighbor_lists(&triangles, points.len());

        log::trace!(
            "[Delaunay] {} points -> {} triangles",
            points.len(),
            triangles.len() / 3
        );

        Ok(Self {
            points: points.to_vec(),
            triangles,
            neighbors,
        })
    }
}

impl Adjacency for DelaunayTriangulation {
    fn site_count(&self) -> usize {
        self.points.len()
    }

    fn neighbors(&self, site: usize) -> &[usize] {
        self.neighbors.neighbors(site)
    }
}

impl Triangulation for DelaunayTriangulation {
    fn points(&self) -> &[DVec2] {
        &self.points
    }

    fn triangles(&self) -> &[usize] {
        &self.triangles
    }

    fn voronoi(&self, bounds: Bounds) -> Result<VoronoiDiagram> {
        if let Some(site) = self.points.iter().position(|p| !bounds.contains(*p)) {
            return Err(VoronoiError::InvalidConfig(format!(
                "site {} at ({}, {}) lies outside the clip bounds",
                site, self.points[site].x, self.points[site].y
            )));
        }

        let voronoi = build_voronoi(&self.points, bounds)?;
        let polygons = (0..self.points.len())
            .map(|site| {
                voronoi
                    .cell(site)
                    .iter_vertices()
                    .map(|v| DVec2::new(v.x, v.y))
                    .collect()
            })
            .collect();

        Ok(VoronoiDiagram::from_polygons(bounds, polygons))
    }
}

fn build_voronoi(points: &[DVec2], bounds: Bounds) -> Result<Voronoi> {
    check_sites(points)?;

    let sites: Vec<Point> = points.iter().map(|p| Point { x: p.x, y: p.y }).collect();
    let center = bounds.center();

    let voronoi = VoronoiBuilder::default()
        .set_sites(sites)
        .set_bounding_box(BoundingBox::new(
            Point { x: center.x, y: center.y },
            bounds.width(),
            bounds.height(),
        ))
        .set_lloyd_relaxation_iterations(0)
        .build()
        .ok_or_else(|| {
            VoronoiError::TriangulationFailed(format!(
                "could not triangulate {} points (collinear or duplicate sites?)",
                points.len()
            ))
        })?;

    if voronoi.sites().len() != points.len() {
        return Err(VoronoiError::TriangulationFailed(format!(
            "{} of {} sites dropped while clipping",
            points.len() - voronoi.sites().len(),
            points.len()
        )));
    }

    Ok(voronoi)
}

/// Reject sites `voronoice` cannot place in its mesh
///
/// Coincident sites leave one of them unreachable in the triangulation.
fn check_sites(points: &[DVec2]) -> Result<()> {
    if let Some(site) = points.iter().position(|p| !p.is_finite()) {
        return Err(VoronoiError::TriangulationFailed(format!(
            "site {} has non-finite coordinates ({}, {})",
            site, points[site].x, points[site].y
        )));
    }

    // Adding 0.0 folds -0.0 into 0.0 so equal coordinates share their bits
    let key = |i: usize| {
        let p = points[i];
        ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
    };
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_unstable_by_key(|&i| (key(i), i));

    for pair in order.windows(2) {
        if key(pair[0]) == key(pair[1]) {
            return Err(VoronoiError::TriangulationFailed(format!(
                "site {} duplicates site {} at ({}, {})",
                pair[1], pair[0], points[pair[1]].x, points[pair[1]].y
            )));
        }
    }

    Ok(())
}

/// Rectangle strictly containing every point
fn enclosing_bounds(points: &[DVec2]) -> Bounds {
    let (min, max) = points.iter().fold(
        (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    );
    let margin = (max - min).max_element() * 0.1 + 1.0;

    Bounds {
        min: min - DVec2::splat(margin),
        max: max + DVec2::splat(margin),
    }
}

/// Neighbor lists from a flat triangle buffer
///
/// Two sites are neighbors if they share a triangle. Lists are sorted for
/// deterministic traversal order.
fn build_neighbor_lists(triangles: &[usize], site_count: usize) -> Vec<Vec<usize>> {
    let mut neighbors = vec![Vec::new(); site_count];

    for triangle in triangles.chunks_exact(3) {
        for i in 0..3 {
            let a = triangle[i];
            let b = triangle[(i + 1) % 3];
            if a < site_count && b < site_count {
                neighbors[a].push(b);
                neighbors[b].push(a);
            }
        }
    }

    for list in &mut neighbors {
        list.sort_unstable();
        list.dedup();
    }

    neighbors
}
