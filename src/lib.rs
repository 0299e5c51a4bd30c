//! Voronoi height map generation
//!
//! A standalone library for generating 2D Voronoi cell maps with diffused
//! elevation, suitable for procedural terrain in any engine or renderer.
//!
//! Generation runs in stages: sample sites in a rectangle, relax them with
//! Lloyd's algorithm, triangulate, clip the Voronoi cells, then spread
//! heights from seed cells across the cell graph.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use voronoi_heightmap::*;
//!
//! // Generate a map
//! let config = MapConfigBuilder::new()
//!     .seed(42)
//!     .dimensions(1024.0, 768.0).unwrap()
//!     .count(2000)
//!     .lloyd_iterations(3).unwrap()
//!     .build().unwrap();
//!
//! let mut pipeline = MapPipeline::new(config);
//! pipeline.set_height_seeds(vec![Seed::new(0, 1.0), Seed::new(900, 0.7)]);
//!
//! let map = pipeline.build().unwrap();
//! println!("Generated {} cells", map.cell_count());
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): Enables O(log n) position-to-cell lookups using KD-tree
//! - `serde`: Enables serialization support for configuration and cells

// Modules
pub mod error;
pub mod config;
pub mod cell;
pub mod generation;
pub mod terrain;
pub mod pipeline;
pub mod map;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{ErrorKind, Result, VoronoiError};
pub use config::{Bounds, MapConfig, MapConfigBuilder, RelaxationMode, SamplingStrategy};
pub use cell::MapCell;
pub use map::VoronoiMap;
pub use pipeline::{MapPipeline, StageCounts};
pub use terrain::{
    diffuse_heights, diffuse_heights_with_options, DiffusionOptions, HeightField, Seed,
};
pub use generation::{
    build_dual, relax, sample_points, CircumcenterDual, DelaunayTriangulator, LloydOptions,
    raw_cells, RawCell, Triangulation, Triangulator, VoronoiDiagram,
};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
