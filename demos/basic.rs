use eikonal_march::{descend, default_max_steps, FmmDary, NDGrid, Solver};

const MAP_SIZE: u32 = 40;

fn main() {
    let mut grid: NDGrid<2> = NDGrid::new([MAP_SIZE, MAP_SIZE], 1.0);

    // Carve a wall with a single gap, so the shortest path has to bend
    // around it instead of cutting straight across.
    for y in 0..MAP_SIZE {
        if y != MAP_SIZE / 2 {
            let idx = grid.coord_to_idx([MAP_SIZE / 2, y]);
            grid.set_occupancy([(idx, false)]);
        }
    }

    let source = grid.coord_to_idx([2, 2]);
    let goal = grid.coord_to_idx([MAP_SIZE - 3, MAP_SIZE - 3]);

    let mut solver: FmmDary<2> = FmmDary::new();
    solver.set_grid(grid);
    solver.set_sources(vec![source], Some(goal));
    solver.setup().expect("valid problem");
    solver.compute();

    println!(
        "arrival time at goal: {:.2}",
        solver.grid().cell(goal).value()
    );

    let path = descend(solver.grid(), goal, 1.0, default_max_steps(solver.grid()));
    println!(
        "path from goal back to source: {} points, complete = {}",
        path.points.len(),
        path.complete
    );
    for p in &path.points {
        println!("  ({:.1}, {:.1})", p[0], p[1]);
    }
}
