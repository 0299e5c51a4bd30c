//! Voronoi vertices straight from a triangle buffer
//!
//! Every Delaunay triangle's circumcenter is a Voronoi vertex, and the cell
//! of a site is bounded by the circumcenters of the triangles around it. This
//! builds that dual without asking the triangulation service for cells.

use glam::DVec2;
use std::collections::BTreeMap;

use crate::error::{Result, VoronoiError};

/// Map from site index to the circumcenters of its incident triangles
type SiteCircumcenterMap = BTreeMap<usize, Vec<DVec2>>;

/// Circumcenters grouped by site
///
/// `all()` holds one circumcenter per triangle, in buffer order. Each site's
/// list holds the circumcenters of its incident triangles in the order the
/// triangles appear; use [`CircumcenterDual::cell_polygon`] for a boundary
/// ordered around the site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CircumcenterDual {
    per_site: SiteCircumcenterMap,
    all: Vec<DVec2>,
}

impl CircumcenterDual {
    /// Circumcenters of all triangles, one per triangle
    pub fn all(&self) -> &[DVec2] {
        &self.all
    }

    /// Circumcenters of triangles incident to `site` (empty if none)
    pub fn circumcenters_of(&self, site: usize) -> &[DVec2] {
        self.per_site.get(&site).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(site, circumcenters)` in ascending site order
    pub fn per_site(&self) -> impl Iterator<Item = (usize, &[DVec2])> + '_ {
        self.per_site.iter().map(|(&site, list)| (site, list.as_slice()))
    }

    /// Number of triangles the dual was built from
    pub fn triangle_count(&self) -> usize {
        self.all.len()
    }

    /// Cell boundary of `site`: its circumcenters sorted counter-clockwise
    ///
    /// Hull sites yield an open fan rather than a closed cell, since their
    /// cell is unbounded.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `site` is not an index into `points`.
    pub fn cell_polygon(&self, site: usize, points: &[DVec2]) -> Result<Vec<DVec2>> {
        let center = *points.get(site).ok_or(VoronoiError::IndexOutOfRange {
            index: site,
            len: points.len(),
        })?;
        Ok(order_around(self.circumcenters_of(site), center))
    }
}

/// Circumcenter of triangle `abc`
///
/// Returns `None` when the points are collinear (the shared denominator is
/// zero) or the result is not finite.
pub fn circumcenter(a: DVec2, b: DVec2, c: DVec2) -> Option<DVec2> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d == 0.0 {
        return None;
    }

    let a2 = a.length_squared();
    let b2 = b.length_squared();
    let c2 = c.length_squared();

    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;

    let center = DVec2::new(ux, uy);
    center.is_finite().then_some(center)
}

/// Build the circumcenter dual of a triangle buffer
///
/// # Arguments
///
/// * `triangles` - Flat buffer, each consecutive triple names one triangle
/// * `points` - Site coordinates indexed by the buffer
///
/// # Errors
///
/// - `InvalidConfig` if the buffer length is not a multiple of 3
/// - `IndexOutOfRange` if the buffer names a site outside `points`
/// - `DegenerateTriangle` for a collinear triangle
///
/// # Example
///
/// ```rust
/// use glam::DVec2;
/// use voronoi_heightmap::generation::build_dual;
///
/// let points = [DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0), DVec2::new(0.0, 2.0)];
/// let dual = build_dual(&[0, 1, 2], &points).unwrap();
/// assert_eq!(dual.all(), &[DVec2::new(1.0, 1.0)]);
/// ```
pub fn build_dual(triangles: &[usize], points: &[DVec2]) -> Result<CircumcenterDual> {
    if triangles.len() % 3 != 0 {
        return Err(VoronoiError::InvalidConfig(format!(
            "triangle buffer length must be a multiple of 3 (got {})",
            triangles.len()
        )));
    }

    let mut dual = CircumcenterDual {
        per_site: SiteCircumcenterMap::new(),
        all: Vec::with_capacity(triangles.len() / 3),
    };

    for (tri_idx, triangle) in triangles.chunks_exact(3).enumerate() {
        let corner = |site: usize| {
            points.get(site).copied().ok_or(VoronoiError::IndexOutOfRange {
                index: site,
                len: points.len(),
            })
        };
        let (a, b, c) = (corner(triangle[0])?, corner(triangle[1])?, corner(triangle[2])?);

        let center = circumcenter(a, b, c)
            .ok_or(VoronoiError::DegenerateTriangle { triangle: tri_idx })?;

        dual.all.push(center);
        for &site in triangle {
            dual.per_site.entry(site).or_default().push(center);
        }
    }

    Ok(dual)
}

/// Sort vertices counter-clockwise by angle around `center`
fn order_around(vertices: &[DVec2], center: DVec2) -> Vec<DVec2> {
    let mut with_angles: Vec<(DVec2, f64)> = vertices
        .iter()
        .map(|&v| {
            let to_v = v - center;
            (v, to_v.y.atan2(to_v.x))
        })
        .collect();

    with_angles.sort_by(|a, b| a.1.total_cmp(&b.1));
    with_angles.into_iter().map(|(v, _)| v).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_equilateral_circumcenter() {
        let s3 = 3.0_f64.sqrt();
        let center = circumcenter(DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0), DVec2::new(1.0, s3))
            .unwrap();

        assert_relative_eq!(center.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(center.y, s3 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_circumcenter_is_equidistant() {
        let (a, b, c) = (DVec2::new(0.3, -1.0), DVec2::new(4.0, 2.5), DVec2::new(-2.0, 3.0));
        let center = circumcenter(a, b, c).unwrap();

        assert_relative_eq!(center.distance(a), center.distance(b), epsilon = 1e-9);
        assert_relative_eq!(center.distance(a), center.distance(c), epsilon = 1e-9);
    }

    #[test]
    fn test_collinear_circumcenter() {
        assert!(circumcenter(DVec2::ZERO, DVec2::new(1.0, 1.0), DVec2::new(2.0, 2.0)).is_none());
    }

    #[test]
    fn test_shared_site_collects_every_triangle() {
        // Fan of three triangles around site 0
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(1.0, 2.0),
            DVec2::new(-1.0, 2.0),
            DVec2::new(-2.0, 0.0),
        ];
        let triangles = [0, 1, 2, 0, 2, 3, 0, 3, 4];
        let dual = build_dual(&triangles, &points).unwrap();

        assert_eq!(dual.circumcenters_of(0).len(), 3);
        assert_eq!(dual.circumcenters_of(2).len(), 2);
        assert_eq!(dual.circumcenters_of(4).len(), 1);
        assert!(dual.circumcenters_of(99).is_empty());
    }

    #[test]
    fn test_one_circumcenter_per_triangle() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(0.0, 4.0),
            DVec2::new(2.0, 1.0),
        ];
        let triangles = [0, 1, 4, 1, 2, 4, 2, 3, 4, 3, 0, 4];
        let dual = build_dual(&triangles, &points).unwrap();

        assert_eq!(dual.all().len(), triangles.len() / 3);
        assert_eq!(dual.triangle_count(), 4);
        assert_eq!(dual.per_site().count(), 5);
    }

    #[test]
    fn test_degenerate_triangle_reports_index() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(2.0, 0.0),
        ];
        // Second triangle is collinear along the x axis
        let err = build_dual(&[0, 1, 2, 0, 1, 3], &points).unwrap_err();
        assert_eq!(err, VoronoiError::DegenerateTriangle { triangle: 1 });
    }

    #[test]
    fn test_bad_buffers() {
        let points = [DVec2::ZERO, DVec2::X, DVec2::Y];
        assert!(matches!(
            build_dual(&[0, 1], &points),
            Err(VoronoiError::InvalidConfig(_))
        ));
        assert_eq!(
            build_dual(&[0, 1, 5], &points).unwrap_err(),
            VoronoiError::IndexOutOfRange { index: 5, len: 3 }
        );
    }

    #[test]
    fn test_empty_buffer() {
        let dual = build_dual(&[], &[]).unwrap();
        assert!(dual.all().is_empty());
    }

    #[test]
    fn test_cell_polygon_is_counter_clockwise() {
        // Interior site 4 surrounded by four triangles
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(0.0, 4.0),
            DVec2::new(2.0, 1.0),
        ];
        let triangles = [3, 0, 4, 2, 3, 4, 0, 1, 4, 1, 2, 4];
        let dual = build_dual(&triangles, &points).unwrap();
        let polygon = dual.cell_polygon(4, &points).unwrap();

        assert_eq!(polygon.len(), 4);
        let signed_area: f64 = (0..polygon.len())
            .map(|i| polygon[i].perp_dot(polygon[(i + 1) % polygon.len()]))
            .sum();
        assert!(signed_area > 0.0, "polygon should wind counter-clockwise");

        assert!(dual.cell_polygon(9, &points).is_err());
    }
}
