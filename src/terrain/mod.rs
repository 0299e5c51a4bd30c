//! Elevation over the cell graph
//!
//! Heights are spread from seed cells across cell adjacency by
//! [`diffuse_heights`], producing a [`HeightField`].

mod diffusion;

pub use diffusion::{diffuse_heights, diffuse_heights_with_options, DiffusionOptions};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Starting condition for diffusion: a site and its height
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    pub index: usize,
    pub height: f64,
}

impl Seed {
    pub fn new(index: usize, height: f64) -> Self {
        Self { index, height }
    }
}

/// Height per site index
///
/// A site that diffusion never reached has no entry. That is different from
/// a site whose height was computed to be zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightField {
    heights: Vec<Option<f64>>,
}

impl HeightField {
    pub(crate) fn new(site_count: usize) -> Self {
        Self {
            heights: vec![None; site_count],
        }
    }

    pub(crate) fn assign(&mut self, site: usize, height: f64) {
        self.heights[site] = Some(height);
    }

    /// Height of `site`, or `None` if it was never reached (or does not exist)
    #[inline]
    pub fn get(&self, site: usize) -> Option<f64> {
        self.heights.get(site).copied().flatten()
    }

    #[inline]
    pub fn is_assigned(&self, site: usize) -> bool {
        self.get(site).is_some()
    }

    /// Number of sites covered, assigned or not
    #[inline]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Number of sites that received a height
    pub fn assigned_count(&self) -> usize {
        self.heights.iter().filter(|h| h.is_some()).count()
    }

    /// `(site, height)` for every assigned site, in site order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.heights
            .iter()
            .enumerate()
            .filter_map(|(site, h)| h.map(|h| (site, h)))
    }

    /// Raw per-site view
    pub fn as_slice(&self) -> &[Option<f64>] {
        &self.heights
    }

    /// Lowest assigned height
    pub fn min(&self) -> Option<f64> {
        self.iter().map(|(_, h)| h).reduce(f64::min)
    }

    /// Highest assigned height
    pub fn max(&self) -> Option<f64> {
        self.iter().map(|(_, h)| h).reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_field_absent_vs_zero() {
        let mut field = HeightField::new(3);
        field.assign(1, 0.0);

        assert_eq!(field.get(0), None);
        assert_eq!(field.get(1), Some(0.0));
        assert!(field.is_assigned(1));
        assert!(!field.is_assigned(2));
        assert_eq!(field.get(10), None);
        assert_eq!(field.len(), 3);
        assert_eq!(field.assigned_count(), 1);
    }

    #[test]
    fn test_height_field_iter_and_extremes() {
        let mut field = HeightField::new(4);
        field.assign(0, 0.5);
        field.assign(3, -0.25);

        assert_eq!(field.iter().collect::<Vec<_>>(), vec![(0, 0.5), (3, -0.25)]);
        assert_eq!(field.min(), Some(-0.25));
        assert_eq!(field.max(), Some(0.5));
        assert_eq!(HeightField::new(2).max(), None);
    }
}
