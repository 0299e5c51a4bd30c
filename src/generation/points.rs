//! Uniform random site placement

use glam::DVec2;
use rand::Rng;

use crate::error::{check_dimensions, Result};

/// Draw `count` independent points uniformly over `[0, width) × [0, height)`
///
/// There is no spacing constraint between points, so clusters and gaps are
/// expected. Lloyd's relaxation evens them out afterwards.
///
/// # Errors
///
/// Returns `InvalidConfig` unless both dimensions are finite and positive.
///
/// # Example
///
/// ```rust
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use voronoi_heightmap::generation::sample_uniform;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(42);
/// let points = sample_uniform(100, 10.0, 5.0, &mut rng).unwrap();
/// assert_eq!(points.len(), 100);
/// ```
pub fn sample_uniform<R: Rng + ?Sized>(
    count: usize,
    width: f64,
    height: f64,
    rng: &mut R,
) -> Result<Vec<DVec2>> {
    check_dimensions(width, height)?;

    Ok((0..count)
        .map(|_| DVec2::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_uniform_point_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for count in [0, 1, 10, 1000] {
            let points = sample_uniform(count, 20.0, 10.0, &mut rng).unwrap();
            assert_eq!(points.len(), count);
        }
    }

    #[test]
    fn test_uniform_points_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let points = sample_uniform(5000, 3.0, 2.0, &mut rng).unwrap();

        for p in &points {
            assert!(p.x >= 0.0 && p.x < 3.0, "x={} out of range", p.x);
            assert!(p.y >= 0.0 && p.y < 2.0, "y={} out of range", p.y);
        }
    }

    #[test]
    fn test_uniform_determinism() {
        let points1 = sample_uniform(50, 10.0, 10.0, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let points2 = sample_uniform(50, 10.0, 10.0, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        assert_eq!(points1, points2);
    }

    #[test]
    fn test_uniform_invalid_dimensions() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(sample_uniform(10, 0.0, 1.0, &mut rng).is_err());
        assert!(sample_uniform(10, 1.0, -1.0, &mut rng).is_err());
    }
}
