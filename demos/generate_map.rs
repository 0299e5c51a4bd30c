//! Example: Generate a Voronoi height map
//!
//! Demonstrates the cached pipeline and a seed change that only reruns
//! the height stage.

use voronoi_heightmap::*;

fn main() {
    println!("Voronoi Height Map Generation Example");
    println!("=====================================\n");

    let config = MapConfigBuilder::new()
        .seed(42)
        .dimensions(800.0, 600.0)
        .unwrap()
        .count(1000)
        .lloyd_iterations(3)
        .unwrap()
        .build()
        .unwrap();

    println!("Configuration:");
    println!("  Seed: {}", config.seed);
    println!("  Size: {} x {}", config.width, config.height);
    println!("  Requested sites: {}", config.count);
    println!("  Sampling: {:?}", config.sampling);
    println!("  Lloyd Iterations: {}", config.lloyd_iterations);
    println!();

    let mut pipeline = MapPipeline::new(config);
    pipeline.set_height_seeds(vec![Seed::new(0, 1.0), Seed::new(500, 0.8)]);

    println!("Generating map...");
    let map = pipeline.build().expect("Failed to generate map");
    println!("Generated {} cells\n", map.cell_count());

    let total_neighbors: usize = map.cells().iter().map(|c| c.neighbor_count()).sum();
    let avg_neighbors = total_neighbors as f64 / map.cell_count() as f64;

    let total_vertices: usize = map.cells().iter().map(|c| c.vertex_count()).sum();
    let avg_vertices = total_vertices as f64 / map.cell_count() as f64;

    let total_area: f64 = map.cells().iter().map(|c| c.area()).sum();
    let reached = map.cells().iter().filter(|c| c.height.is_some()).count();

    println!("Statistics:");
    println!("  Average neighbors per cell: {:.2}", avg_neighbors);
    println!("  Average vertices per cell: {:.2}", avg_vertices);
    println!("  Covered area: {:.1} of {:.1}", total_area, config.width * config.height);
    println!("  Cells with a height: {}", reached);
    println!();

    println!("Sample cells:");
    for cell in map.cells().iter().take(5) {
        println!(
            "  Cell {}: site=({:.2}, {:.2}), neighbors={}, vertices={}, height={:?}",
            cell.id,
            cell.site.x,
            cell.site.y,
            cell.neighbor_count(),
            cell.vertex_count(),
            cell.height
        );
    }

    // New seeds: geometry comes from the cache
    pipeline.set_height_seeds(vec![Seed::new(250, 1.0)]);
    let reseeded = pipeline.build().expect("Failed to rebuild map");
    let counts = pipeline.stage_counts();
    println!(
        "\nReseeded: {} cells with a height (diagram runs: {}, height runs: {})",
        reseeded.cells().iter().filter(|c| c.height.is_some()).count(),
        counts.diagram,
        counts.heights
    );

    println!("\nGeneration complete!");
}
