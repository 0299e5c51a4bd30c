//! Error types for map generation

use thiserror::Error;

/// Broad category of a [`VoronoiError`]
///
/// Lets callers decide whether to skip or abort without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad counts, dimensions, or options
    InvalidConfiguration,
    /// Collinear triangle or empty cell polygon
    DegenerateGeometry,
    /// A site, seed, or neighbor index outside `[0, N)`
    IndexOutOfRange,
    /// The triangulation service could not triangulate the point set
    Triangulation,
}

/// Errors that can occur during map generation or queries
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VoronoiError {
    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The three sites of a triangle are collinear, so it has no circumcenter
    #[error("degenerate geometry: triangle {triangle} is collinear")]
    DegenerateTriangle {
        /// Triangle index in the triangle buffer (offset / 3)
        triangle: usize,
    },

    /// A cell polygon has no vertices, so its centroid is undefined
    #[error("degenerate geometry: cell polygon of site {site} has no vertices")]
    EmptyPolygon {
        /// Owning site index
        site: usize,
    },

    /// An index does not name an existing site
    #[error("index {index} out of range for {len} sites")]
    IndexOutOfRange { index: usize, len: usize },

    /// Delaunay triangulation failed
    #[error("triangulation failed: {0}")]
    TriangulationFailed(String),
}

impl VoronoiError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VoronoiError::InvalidConfig(_) => ErrorKind::InvalidConfiguration,
            VoronoiError::DegenerateTriangle { .. } | VoronoiError::EmptyPolygon { .. } => {
                ErrorKind::DegenerateGeometry
            }
            VoronoiError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            VoronoiError::TriangulationFailed(_) => ErrorKind::Triangulation,
        }
    }
}

/// Result type alias for map generation
pub type Result<T> = std::result::Result<T, VoronoiError>;

/// Check that `width` and `height` describe a usable sampling area
pub(crate) fn check_dimensions(width: f64, height: f64) -> Result<()> {
    if !(width.is_finite() && width > 0.0) {
        return Err(VoronoiError::InvalidConfig(format!(
            "width must be finite and positive (got {})",
            width
        )));
    }
    if !(height.is_finite() && height > 0.0) {
        return Err(VoronoiError::InvalidConfig(format!(
            "height must be finite and positive (got {})",
            height
        )));
    }
    Ok(())
}
