//! Map Cell Structure
//!
//! Represents an individual cell of the map with its site, boundary,
//! neighbors, and elevation.

use glam::DVec2;

use crate::generation::RawCell;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single Voronoi cell of the map
///
/// Each cell represents a discrete region of the map with:
/// - A site index for identification
/// - The site position
/// - Neighbor connectivity for traversal
/// - A clipped boundary polygon for rendering
/// - An elevation, if diffusion reached it
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MapCell {
    /// Site index (0 to cell_count-1)
    ///
    /// Stable for one configuration: the same config yields the same ids
    /// in the same positions.
    pub id: usize,

    /// Site position inside the map bounds
    pub site: DVec2,

    /// IDs of adjacent cells (neighbors in the Delaunay graph)
    ///
    /// Sorted ascending.
    pub neighbors: Vec<usize>,

    /// Boundary polygon, clipped to the map bounds
    ///
    /// An open ring; the first vertex is not repeated.
    pub polygon: Vec<DVec2>,

    /// Elevation, or `None` if no seed reaches this cell
    pub height: Option<f64>,
}

impl MapCell {
    /// Create a new map cell
    ///
    /// This is typically called during map generation, not by user code.
    pub fn new(
        id: usize,
        site: DVec2,
        neighbors: Vec<usize>,
        polygon: Vec<DVec2>,
        height: Option<f64>,
    ) -> Self {
        Self {
            id,
            site,
            neighbors,
            polygon,
            height,
        }
    }

    /// Attach a height to generated cell geometry
    pub fn from_raw(raw: RawCell, height: Option<f64>) -> Self {
        Self::new(raw.id, raw.site, raw.neighbors, raw.polygon, height)
    }

    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Check if this cell is a neighbor of another cell
    #[inline]
    pub fn is_neighbor_of(&self, other_cell_id: usize) -> bool {
        self.neighbors.binary_search(&other_cell_id).is_ok()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.polygon.len()
    }

    /// Polygon area by the shoelace formula
    pub fn area(&self) -> f64 {
        if self.polygon.len() < 3 {
            return 0.0;
        }

        let twice_area: f64 = (0..self.polygon.len())
            .map(|i| self.polygon[i].perp_dot(self.polygon[(i + 1) % self.polygon.len()]))
            .sum();
        twice_area.abs() * 0.5
    }

    /// Mean of the boundary vertices, or `None` for an empty polygon
    pub fn vertex_centroid(&self) -> Option<DVec2> {
        crate::generation::vertex_centroid(self.id, &self.polygon).ok()
    }

    /// Euclidean distance between the two sites
    #[inline]
    pub fn distance_to(&self, other: &MapCell) -> f64 {
        self.site.distance(other.site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_cell() -> MapCell {
        MapCell::new(
            0,
            DVec2::new(0.5, 0.5),
            vec![1, 2, 3],
            vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(1.0, 0.0),
                DVec2::new(1.0, 1.0),
                DVec2::new(0.0, 1.0),
            ],
            Some(0.4),
        )
    }

    #[test]
    fn test_cell_creation() {
        let cell = unit_square_cell();

        assert_eq!(cell.id, 0);
        assert_eq!(cell.neighbor_count(), 3);
        assert_eq!(cell.vertex_count(), 4);
        assert!(cell.is_neighbor_of(2));
        assert!(!cell.is_neighbor_of(99));
        assert_eq!(cell.height, Some(0.4));
    }

    #[test]
    fn test_from_raw() {
        let raw = RawCell {
            id: 7,
            site: DVec2::new(2.0, 3.0),
            neighbors: vec![1, 4],
            polygon: vec![DVec2::ZERO, DVec2::X, DVec2::Y],
        };
        let cell = MapCell::from_raw(raw, Some(0.25));

        assert_eq!(cell.id, 7);
        assert_eq!(cell.site, DVec2::new(2.0, 3.0));
        assert!(cell.is_neighbor_of(4));
        assert_eq!(cell.vertex_count(), 3);
        assert_eq!(cell.height, Some(0.25));
    }

    #[test]
    fn test_area() {
        assert_eq!(unit_square_cell().area(), 1.0);

        let sliver = MapCell::new(1, DVec2::ZERO, vec![], vec![DVec2::ZERO, DVec2::X], None);
        assert_eq!(sliver.area(), 0.0);
    }

    #[test]
    fn test_vertex_centroid() {
        assert_eq!(unit_square_cell().vertex_centroid(), Some(DVec2::new(0.5, 0.5)));

        let empty = MapCell::new(2, DVec2::ZERO, vec![], vec![], None);
        assert_eq!(empty.vertex_centroid(), None);
    }

    #[test]
    fn test_distance_to() {
        let a = MapCell::new(0, DVec2::new(0.0, 0.0), vec![], vec![], None);
        let b = MapCell::new(1, DVec2::new(3.0, 4.0), vec![], vec![], None);
        assert_eq!(a.distance_to(&b), 5.0);
    }
}
