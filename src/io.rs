//! Readers and writers for the plain-text grid, path, and occupancy-map
//! formats, plus a PNG-backed occupancy loader.

use crate::error::{EikonalError, Result};
use crate::grid::NDGrid;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

fn io_err(msg: impl Into<String>) -> EikonalError {
    EikonalError::Io(io::Error::new(io::ErrorKind::InvalidData, msg.into()))
}

fn next_line(lines: &mut impl Iterator<Item = io::Result<String>>, what: &str) -> Result<String> {
    match lines.next() {
        Some(line) => Ok(line?),
        None => Err(io_err(format!("unexpected end of file reading {what}"))),
    }
}

fn parse<T: std::str::FromStr>(s: &str, what: &str) -> Result<T> {
    s.trim()
        .parse()
        .map_err(|_| io_err(format!("could not parse {what} from {s:?}")))
}

/// Writes a grid's arrival times in the ASCII grid-value format: cell-type
/// tag, leafsize, `N`, dimension sizes, then one value per line in flat
/// index order.
pub fn write_grid_values<const N: usize>(
    path: impl AsRef<Path>,
    grid: &NDGrid<N>,
    cell_type: &str,
) -> Result<()> {
    write_grid(path, grid, cell_type, |cell| cell.value())
}

/// Writes a grid's propagation speeds in the same layout as
/// [`write_grid_values`], emitting `velocity` instead of `value`.
pub fn write_grid_velocities<const N: usize>(
    path: impl AsRef<Path>,
    grid: &NDGrid<N>,
    cell_type: &str,
) -> Result<()> {
    write_grid(path, grid, cell_type, |cell| cell.velocity())
}

fn write_grid<const N: usize>(
    path: impl AsRef<Path>,
    grid: &NDGrid<N>,
    cell_type: &str,
    field: impl Fn(&crate::cell::Cell) -> f64,
) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{cell_type}")?;
    writeln!(w, "{}", grid.leafsize())?;
    writeln!(w, "{N}")?;
    for d in grid.dim_sizes() {
        writeln!(w, "{d}")?;
    }
    for i in 0..grid.size() {
        writeln!(w, "{}", field(grid.cell(i)))?;
    }
    Ok(())
}

/// Reads a grid-value file into a fresh `NDGrid<N>`, setting each cell's
/// arrival time from the file. Velocity and occupancy are left at their
/// defaults.
///
/// # Errors
///
/// Returns [`EikonalError::Io`] if the file is truncated, malformed, or its
/// declared dimension count does not match `N`.
pub fn read_grid_values<const N: usize>(path: impl AsRef<Path>) -> Result<NDGrid<N>> {
    read_grid(path, |cell, v| cell.set_value(v))
}

/// Reads a velocity-dump file (see [`write_grid_velocities`]) into a fresh
/// `NDGrid<N>`, setting each cell's velocity from the file.
///
/// # Errors
///
/// Returns [`EikonalError::Io`] on the same conditions as
/// [`read_grid_values`].
pub fn read_grid_velocities<const N: usize>(path: impl AsRef<Path>) -> Result<NDGrid<N>> {
    read_grid(path, |cell, v| cell.set_velocity(v))
}

fn read_grid<const N: usize>(
    path: impl AsRef<Path>,
    apply: impl Fn(&mut crate::cell::Cell, f64),
) -> Result<NDGrid<N>> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let _cell_type = next_line(&mut lines, "cell-type tag")?;
    let leafsize: f64 = parse(&next_line(&mut lines, "leafsize")?, "leafsize")?;
    let ndims: usize = parse(&next_line(&mut lines, "dimension count")?, "dimension count")?;
    if ndims != N {
        return Err(io_err(format!(
            "file declares {ndims} dimensions, expected {N}"
        )));
    }

    let mut dimsize = [0u32; N];
    for d in &mut dimsize {
        *d = parse(&next_line(&mut lines, "dimension size")?, "dimension size")?;
    }

    let mut grid = NDGrid::new(dimsize, leafsize);
    for i in 0..grid.size() {
        let v: f64 = parse(&next_line(&mut lines, "cell value")?, "cell value")?;
        apply(grid.cell_mut(i), v);
    }
    Ok(grid)
}

/// Writes a waypoint path in the ASCII path format: leafsize, `N`, dimension
/// sizes, then one whitespace-separated coordinate tuple per line.
pub fn write_path<const N: usize>(
    path: impl AsRef<Path>,
    leafsize: f64,
    dimsize: [u32; N],
    points: &[[f64; N]],
) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{leafsize}")?;
    writeln!(w, "{N}")?;
    for d in dimsize {
        writeln!(w, "{d}")?;
    }
    for point in points {
        let coords: Vec<String> = point.iter().map(ToString::to_string).collect();
        writeln!(w, "{}", coords.join(" "))?;
    }
    Ok(())
}

/// Reads a path file, returning `(leafsize, dimsize, points)`.
///
/// # Errors
///
/// Returns [`EikonalError::Io`] if the file is truncated, malformed, or its
/// declared dimension count does not match `N`.
pub fn read_path<const N: usize>(path: impl AsRef<Path>) -> Result<(f64, [u32; N], Vec<[f64; N]>)> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let leafsize: f64 = parse(&next_line(&mut lines, "leafsize")?, "leafsize")?;
    let ndims: usize = parse(&next_line(&mut lines, "dimension count")?, "dimension count")?;
    if ndims != N {
        return Err(io_err(format!(
            "file declares {ndims} dimensions, expected {N}"
        )));
    }
    let mut dimsize = [0u32; N];
    for d in &mut dimsize {
        *d = parse(&next_line(&mut lines, "dimension size")?, "dimension size")?;
    }

    let mut points = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut point = [0.0f64; N];
        let mut tokens = line.split_whitespace();
        for p in &mut point {
            let tok = tokens
                .next()
                .ok_or_else(|| io_err("waypoint has fewer than N coordinates"))?;
            *p = parse(tok, "waypoint coordinate")?;
        }
        points.push(point);
    }
    Ok((leafsize, dimsize, points))
}

/// Writes a 2D occupancy map in the ASCII occupancy format: header
/// `leafsize N width height`, then `width*height` `0`/`1` tokens in
/// row-major order. `occupied[i] == true` marks flat index `i` as an
/// obstacle, the same `true == obstacle` polarity [`read_occupancy_image`]
/// uses.
pub fn write_occupancy_map(
    path: impl AsRef<Path>,
    leafsize: f64,
    width: u32,
    height: u32,
    occupied: &[bool],
) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{leafsize} 2 {width} {height}")?;
    for row in occupied.chunks(width as usize) {
        let tokens: Vec<&str> = row.iter().map(|&b| if b { "1" } else { "0" }).collect();
        writeln!(w, "{}", tokens.join(" "))?;
    }
    Ok(())
}

/// Reads a 2D occupancy map, returning `(leafsize, width, height, occupied)`.
/// `occupied[i] == true` marks flat index `i` as an obstacle; see
/// [`write_occupancy_map`] and [`NDGrid::from_occupancy`].
///
/// # Errors
///
/// Returns [`EikonalError::Io`] if the header's dimension count is not `2`,
/// or the file is truncated or malformed.
pub fn read_occupancy_map(path: impl AsRef<Path>) -> Result<(f64, u32, u32, Vec<bool>)> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let header = next_line(&mut lines, "occupancy header")?;
    let mut tokens = header.split_whitespace();
    let leafsize: f64 = parse(
        tokens.next().ok_or_else(|| io_err("missing leafsize"))?,
        "leafsize",
    )?;
    let ndims: usize = parse(
        tokens.next().ok_or_else(|| io_err("missing dimension count"))?,
        "dimension count",
    )?;
    if ndims != 2 {
        return Err(io_err(format!(
            "occupancy maps are 2D only, file declares {ndims}"
        )));
    }
    let width: u32 = parse(
        tokens.next().ok_or_else(|| io_err("missing width"))?,
        "width",
    )?;
    let height: u32 = parse(
        tokens.next().ok_or_else(|| io_err("missing height"))?,
        "height",
    )?;

    let mut occupied = Vec::with_capacity(width as usize * height as usize);
    for line in lines {
        let line = line?;
        for tok in line.split_whitespace() {
            occupied.push(match tok {
                "0" => false,
                "1" => true,
                other => return Err(io_err(format!("expected 0 or 1, got {other:?}"))),
            });
        }
    }
    if occupied.len() != width as usize * height as usize {
        return Err(io_err(format!(
            "expected {} occupancy tokens, found {}",
            width as usize * height as usize,
            occupied.len()
        )));
    }
    Ok((leafsize, width, height, occupied))
}

/// Converts an occupancy mask (`true == obstacle`, as returned by
/// [`read_occupancy_map`] or [`read_occupancy_image`]) into the flat indices
/// [`NDGrid::from_occupancy`] expects.
#[must_use]
pub fn obstacle_indices_from_mask(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &obstacle)| obstacle.then_some(i))
        .collect()
}

/// Loads a PNG (or any format `image` decodes) as a 2D occupancy mask: a
/// pixel is marked obstacle (`true`) if it is not white, matching the
/// convention that a clear path shows as a blank image. Image row `0` is the
/// top of the picture; it is flipped here so row `0` of the returned mask is
/// grid `y = 0`, matching the rest of this crate's row-major, Y-up layout.
///
/// This mask uses `true == obstacle`, the opposite polarity from
/// [`crate::cell::Cell::occupied`] (`true == passable`). Feed it through
/// [`NDGrid::from_occupancy`] rather than zipping it directly into
/// [`NDGrid::set_occupancy`].
///
/// # Errors
///
/// Returns [`EikonalError::Io`] if the file cannot be read or decoded.
pub fn read_occupancy_image(path: impl AsRef<Path>) -> Result<(u32, u32, Vec<bool>)> {
    let img = image::open(path)
        .map_err(|e| io_err(format!("could not decode image: {e}")))?
        .to_luma8();
    let (width, height) = img.dimensions();
    let mut occupied = vec![false; width as usize * height as usize];
    for (x, y, pixel) in img.enumerate_pixels() {
        let grid_y = height - 1 - y;
        let is_white = pixel.0[0] == 255;
        occupied[(grid_y * width + x) as usize] = !is_white;
    }
    Ok((width, height, occupied))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grid_values_round_trip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!(
            "eikonal_march_test_grid_{}.txt",
            std::process::id()
        ));

        let mut grid: NDGrid<2> = NDGrid::new([3, 3], 0.5);
        for i in 0..grid.size() {
            grid.cell_mut(i).set_value(i as f64);
        }
        write_grid_values(&path, &grid, "default").unwrap();

        let read_back: NDGrid<2> = read_grid_values(&path).unwrap();
        assert_eq!(read_back.leafsize(), 0.5);
        assert_eq!(read_back.dim_sizes(), [3, 3]);
        for i in 0..read_back.size() {
            assert_eq!(read_back.cell(i).value(), i as f64);
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn wrong_dimension_count_is_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!(
            "eikonal_march_test_dims_{}.txt",
            std::process::id()
        ));
        let grid: NDGrid<3> = NDGrid::new([2, 2, 2], 1.0);
        write_grid_values(&path, &grid, "default").unwrap();

        let result: Result<NDGrid<2>> = read_grid_values(&path);
        assert!(result.is_err());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn path_round_trips() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!(
            "eikonal_march_test_path_{}.txt",
            std::process::id()
        ));
        let points = vec![[0.0, 0.0], [1.5, 2.5], [3.0, 3.0]];
        write_path(&path, 1.0, [10, 10], &points).unwrap();

        let (leafsize, dimsize, read_back): (f64, [u32; 2], Vec<[f64; 2]>) =
            read_path(&path).unwrap();
        assert_eq!(leafsize, 1.0);
        assert_eq!(dimsize, [10, 10]);
        assert_eq!(read_back, points);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn occupancy_map_round_trips() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!(
            "eikonal_march_test_occ_{}.txt",
            std::process::id()
        ));
        let occupied = vec![false, true, true, false];
        write_occupancy_map(&path, 1.0, 2, 2, &occupied).unwrap();

        let (leafsize, width, height, read_back) = read_occupancy_map(&path).unwrap();
        assert_eq!(leafsize, 1.0);
        assert_eq!((width, height), (2, 2));
        assert_eq!(read_back, occupied);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn loaded_occupancy_map_paints_obstacles_into_a_grid() {
        use crate::fm2::Fm2;
        use crate::solver::FmmDary;

        let dir = std::env::temp_dir();
        let path = dir.join(format!(
            "eikonal_march_test_occ_fm2_{}.txt",
            std::process::id()
        ));

        // A vertical wall at x=5 save one gap at y=2, written true == obstacle.
        let width = 10u32;
        let height = 10u32;
        let mut mask = vec![false; (width * height) as usize];
        for y in 0..height {
            if y != 2 {
                mask[(y * width + 5) as usize] = true;
            }
        }
        write_occupancy_map(&path, 1.0, width, height, &mask).unwrap();

        let (leafsize, width, height, read_back) = read_occupancy_map(&path).unwrap();
        assert_eq!(read_back, mask);

        let obstacles = obstacle_indices_from_mask(&read_back);
        let grid: NDGrid<2> = NDGrid::from_occupancy([width, height], leafsize, obstacles);

        // The wall cell is impassable, the gap cell stays passable.
        let wall_cell = grid.coord_to_idx([5, 0]);
        let gap_cell = grid.coord_to_idx([5, 2]);
        assert!(!grid.cell(wall_cell).occupied());
        assert!(grid.cell(gap_cell).occupied());

        let start = grid.coord_to_idx([1, 1]);
        let goal = grid.coord_to_idx([8, 8]);
        let mut fm2: Fm2<FmmDary<2>, 2> = Fm2::new();
        let result = fm2.compute(grid, start, Some(goal)).unwrap();
        assert_eq!(result.cell(goal).value(), 0.0);
        assert!(result.cell(start).value().is_finite());

        std::fs::remove_file(&path).ok();
    }
}
