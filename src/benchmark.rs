//! Drives a fixed grid/problem through a list of solvers, repeating each one
//! `runs` times and recording wall-clock time.

use crate::config::BenchmarkConfig;
use crate::error::Result;
use crate::grid::NDGrid;
use crate::solver::{Ddqm, Fim, FmmDary, FmmFib, FmmStar, Fsm, Gmm, Heuristic, Lsm, Sfmm, Solver, Ufmm};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// One line of `benchmark.log`: a single solver invocation's result.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub run_id: usize,
    pub solver_name: String,
    pub ndims: usize,
    pub dimsize: Vec<u32>,
    pub time_ms: f64,
}

/// Builds a boxed solver instance from a `solvers.<name>` configuration key.
/// Returns `None` for an unrecognized name; [`BenchmarkConfig::from_file`]
/// already rejects those before a `Benchmark` is built, so this is purely
/// defensive.
///
/// `sfmmstar` is mapped onto the same [`FmmStar`] engine as `fmmstar`: the
/// `fmm`/`sfmm` split is a narrow-band implementation choice (decrease-key
/// heap vs duplicate-push queue) that `FmmStar`'s bespoke `T + h`-keyed heap
/// has no analogous second form of.
#[must_use]
pub fn construct_solver<const N: usize>(name: &str) -> Option<Box<dyn Solver<N>>> {
    match name {
        "fmm" => Some(Box::new(FmmDary::<N>::new())),
        "fmmfib" => Some(Box::new(FmmFib::<N>::new())),
        "sfmm" => Some(Box::new(Sfmm::<N>::new())),
        "gmm" => Some(Box::new(Gmm::<N>::default())),
        "fim" => Some(Box::new(Fim::<N>::default())),
        "ufmm" => Some(Box::new(Ufmm::<N>::new())),
        "fsm" => Some(Box::new(Fsm::<N>::default())),
        "lsm" => Some(Box::new(Lsm::<N>::default())),
        "ddqm" => Some(Box::new(Ddqm::<N>::default())),
        "fmmstar" | "sfmmstar" => Some(Box::new(FmmStar::<N>::new(Heuristic::Time))),
        _ => None,
    }
}

/// Owns the problem grid and a list of solvers to run over it, writing
/// `benchmark.log` and optional per-run grid dumps under `results_<name>/`.
pub struct Benchmark<const N: usize> {
    grid: NDGrid<N>,
    start: usize,
    goal: Option<usize>,
    solvers: Vec<Box<dyn Solver<N>>>,
    runs: u32,
    name: String,
    savegrid: bool,
}

impl<const N: usize> Benchmark<N> {
    #[must_use]
    pub fn new(
        grid: NDGrid<N>,
        start: usize,
        goal: Option<usize>,
        solvers: Vec<Box<dyn Solver<N>>>,
        runs: u32,
        name: String,
        savegrid: bool,
    ) -> Self {
        Self {
            grid,
            start,
            goal,
            solvers,
            runs,
            name,
            savegrid,
        }
    }

    /// Builds a `Benchmark<N>` from a parsed configuration. The caller
    /// selects `N` (2 or 3) based on `config.ndims` before calling this, since
    /// `N` must be known at compile time.
    ///
    /// # Panics
    ///
    /// Panics if `config.ndims != N`, or if `config.dimsize`/`start`/`goal`
    /// have a different length than `N` — both already validated by
    /// [`BenchmarkConfig::from_file`], so this indicates a caller bug rather
    /// than a malformed file.
    #[must_use]
    pub fn from_config(config: &BenchmarkConfig) -> Self {
        assert_eq!(config.ndims, N, "config.ndims does not match N");

        let mut dimsize = [0u32; N];
        dimsize.copy_from_slice(&config.dimsize);
        let grid = NDGrid::new(dimsize, 1.0);

        let mut start_coord = [0u32; N];
        start_coord.copy_from_slice(&config.start);
        let start = grid.coord_to_idx(start_coord);

        let goal = config.goal.as_ref().map(|g| {
            let mut coord = [0u32; N];
            coord.copy_from_slice(g);
            grid.coord_to_idx(coord)
        });

        let solvers: Vec<Box<dyn Solver<N>>> = config
            .solvers
            .iter()
            .filter_map(|name| construct_solver::<N>(name))
            .collect();

        Self::new(
            grid,
            start,
            goal,
            solvers,
            config.runs,
            config.name.clone(),
            config.savegrid,
        )
    }

    fn output_dir(&self) -> PathBuf {
        PathBuf::from(format!("results_{}", self.name))
    }

    /// Runs every solver `runs` times against a fresh copy of the grid,
    /// appending one tab-separated line per run to `benchmark.log` and, if
    /// `savegrid` was set, writing `<run_id>.grid` alongside it.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::error::EikonalError`] raised by creating the
    /// output directory, writing files, or a solver's `setup`.
    pub fn run(&mut self) -> Result<Vec<RunRecord>> {
        let dir = self.output_dir();
        fs::create_dir_all(&dir)?;

        let mut log = BufWriter::new(File::create(dir.join("benchmark.log"))?);
        let mut records = Vec::new();
        let mut run_id = 0usize;

        let dimsize: Vec<u32> = self.grid.dim_sizes().to_vec();
        let dimsize_str: Vec<String> = dimsize.iter().map(ToString::to_string).collect();

        for solver in &mut self.solvers {
            solver.set_grid(self.grid.clone());
            solver.set_sources(vec![self.start], self.goal);

            for run in 0..self.runs {
                if run > 0 {
                    solver.reset();
                }
                solver.setup()?;
                solver.compute();
                let time_ms = solver.time_ms();

                info!(run_id, solver = solver.name(), time_ms, "benchmark run complete");

                writeln!(
                    log,
                    "{run_id}\t{}\t{N}\t{}\t{time_ms}",
                    solver.name(),
                    dimsize_str.join(" ")
                )?;

                if self.savegrid {
                    crate::io::write_grid_values(
                        dir.join(format!("{run_id}.grid")),
                        solver.grid(),
                        solver.name(),
                    )?;
                }

                records.push(RunRecord {
                    run_id,
                    solver_name: solver.name().to_string(),
                    ndims: N,
                    dimsize: dimsize.clone(),
                    time_ms,
                });
                run_id += 1;
            }

            let _ = std::mem::replace(solver.grid_mut(), NDGrid::new([1u32; N], 1.0));
            solver.clear();
        }

        Ok(records)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn run_produces_one_record_per_solver_per_run() {
        let grid: NDGrid<2> = NDGrid::new([10, 10], 1.0);
        let start = grid.coord_to_idx([1, 1]);
        let solvers: Vec<Box<dyn Solver<2>>> =
            vec![Box::new(FmmDary::<2>::new()), Box::new(Sfmm::<2>::new())];

        let name = format!("eikonal_march_bench_test_{}", std::process::id());

        let mut bench = Benchmark::new(grid, start, None, solvers, 2, name.clone(), false);
        let records = bench.run().unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.time_ms >= 0.0));

        std::fs::remove_dir_all(format!("results_{name}")).ok();
    }

    #[test]
    fn construct_solver_rejects_unknown_name() {
        assert!(construct_solver::<2>("not-a-solver").is_none());
    }
}
