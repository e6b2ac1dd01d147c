//! The per-cell update kernel, expressed in Rust.
//!
//! This is the reference form of what `kernel.wgsl` runs on the device: the
//! boundary resolver, the neighbor counter and the update of a single cell.
//! The GPU pipeline is generated from the same `BoundaryPolicy` and
//! `RuleTable` values, and the tests use this form to predict its output.

use crate::grid::{to_index, GridDims};
use crate::render::visualization_sample;
use crate::rules::RuleTable;

/// Moore neighborhood offsets, `{-1, 0, 1}^2` without the origin.
#[rustfmt::skip]
pub const MOORE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// How neighbors beyond the grid edge are found. Fixed for a run: resuming a
/// grid under the other policy changes edge behavior without any error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// Off-grid neighbors do not exist and count as dead.
    Clamped,
    /// Coordinates wrap on all four edges.
    #[default]
    Toroidal,
}

impl BoundaryPolicy {
    /// Linear index of the neighbor of `(x, y)` at offset `(dx, dy)`, or
    /// `None` if it lies off the grid under the clamped policy.
    #[inline]
    pub fn resolve(&self, dims: GridDims, x: u32, y: u32, dx: i32, dy: i32) -> Option<usize> {
        let w = dims.width as i64;
        let h = dims.height as i64;
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        match self {
            BoundaryPolicy::Clamped => {
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    return None;
                }
                Some(to_index(nx as u32, ny as u32, dims.width))
            }
            BoundaryPolicy::Toroidal => {
                let wx = ((nx % w) + w) % w;
                let wy = ((ny % h) + h) % h;
                Some(to_index(wx as u32, wy as u32, dims.width))
            }
        }
    }
}

/// Everything one invocation writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellUpdate {
    pub index: usize,
    pub state: u32,
    pub pixel: [f32; 4],
}

/// Configured kernel: grid shape, boundary policy and rule tables.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    pub dims: GridDims,
    pub boundary: BoundaryPolicy,
    pub rules: RuleTable,
}

impl Kernel {
    pub fn new(dims: GridDims, boundary: BoundaryPolicy, rules: RuleTable) -> Self {
        Self {
            dims,
            boundary,
            rules,
        }
    }

    /// Live cells among the 8 neighbors of `(x, y)` in `input`.
    pub fn count_live_neighbors(&self, input: &[u32], x: u32, y: u32) -> u32 {
        MOORE_OFFSETS
            .iter()
            .filter_map(|&(dx, dy)| self.boundary.resolve(self.dims, x, y, dx, dy))
            .map(|idx| input[idx])
            .sum()
    }

    /// One kernel invocation for cell `(x, y)`. Reads only `input`.
    pub fn invoke(&self, input: &[u32], x: u32, y: u32) -> CellUpdate {
        let index = to_index(x, y, self.dims.width);
        let old = input[index];
        let n = self.count_live_neighbors(input, x, y);
        let state = self.rules.next_state(old, n);
        CellUpdate {
            index,
            state,
            pixel: visualization_sample(state),
        }
    }
}

/// Workgroup tile size. Only affects scheduling, never the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
}

impl Tile {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn invocations(&self) -> u64 {
        self.x as u64 * self.y as u64
    }

    /// Workgroup counts covering the whole grid. Edge tiles may overhang the
    /// grid; those invocations exit without touching memory.
    pub fn workgroups(&self, dims: GridDims) -> (u32, u32) {
        (dims.width.div_ceil(self.x), dims.height.div_ceil(self.y))
    }

    /// Global invocation ids of a dispatch that land on the grid, in an
    /// arbitrary but deterministic order.
    pub fn covered_cells(&self, dims: GridDims) -> impl Iterator<Item = (u32, u32)> {
        let tile = *self;
        let (gx, gy) = self.workgroups(dims);
        (0..gy).flat_map(move |wy| {
            (0..gx).flat_map(move |wx| {
                (0..tile.y).flat_map(move |ly| {
                    (0..tile.x).map(move |lx| (wx * tile.x + lx, wy * tile.y + ly))
                })
            })
        })
        .filter(move |&(x, y)| x < dims.width && y < dims.height)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::new(8, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::rules::Pattern;

    fn kernel(w: u32, h: u32, boundary: BoundaryPolicy) -> Kernel {
        Kernel::new(GridDims::new(w, h), boundary, RuleTable::CONWAY)
    }

    /// Runs every invocation of a dispatch, recording how often each output
    /// slot is written.
    fn dispatch(kernel: &Kernel, tile: Tile, input: &[u32]) -> (Vec<u32>, Vec<u32>) {
        let mut output = vec![u32::MAX; input.len()];
        let mut writes = vec![0u32; input.len()];
        for (x, y) in tile.covered_cells(kernel.dims) {
            let update = kernel.invoke(input, x, y);
            output[update.index] = update.state;
            writes[update.index] += 1;
        }
        (output, writes)
    }

    #[test]
    fn toroidal_corner_sees_opposite_corner() {
        let dims = GridDims::new(5, 4);
        let neighbors: Vec<usize> = MOORE_OFFSETS
            .iter()
            .filter_map(|&(dx, dy)| BoundaryPolicy::Toroidal.resolve(dims, 0, 0, dx, dy))
            .collect();
        assert_eq!(neighbors.len(), 8);
        assert!(neighbors.contains(&to_index(4, 3, 5)));

        let mut grid = Grid::new(dims);
        grid.set(4, 3, true);
        let k = kernel(5, 4, BoundaryPolicy::Toroidal);
        assert_eq!(k.count_live_neighbors(grid.cells(), 0, 0), 1);
    }

    #[test]
    fn clamped_corner_sees_three_neighbors() {
        let dims = GridDims::new(4, 4);
        let resolved = MOORE_OFFSETS
            .iter()
            .filter_map(|&(dx, dy)| BoundaryPolicy::Clamped.resolve(dims, 0, 0, dx, dy))
            .count();
        assert_eq!(resolved, 3);

        let full = vec![1; dims.cell_count()];
        let k = kernel(4, 4, BoundaryPolicy::Clamped);
        assert_eq!(k.count_live_neighbors(&full, 0, 0), 3);
        assert_eq!(k.count_live_neighbors(&full, 3, 3), 3);
        assert_eq!(k.count_live_neighbors(&full, 1, 0), 5);
        assert_eq!(k.count_live_neighbors(&full, 1, 1), 8);
    }

    #[test]
    fn clamped_ignores_wrapped_cell() {
        let mut grid = Grid::new(GridDims::new(5, 5));
        grid.set(4, 4, true);
        let k = kernel(5, 5, BoundaryPolicy::Clamped);
        assert_eq!(k.count_live_neighbors(grid.cells(), 0, 0), 0);
    }

    #[test]
    fn toroidal_wraps_on_one_wide_grid() {
        // Every offset wraps back onto the single column.
        let k = kernel(1, 3, BoundaryPolicy::Toroidal);
        let input = vec![1, 0, 0];
        assert_eq!(k.count_live_neighbors(&input, 0, 1), 3);
    }

    #[test]
    fn dead_grid_stays_dead() {
        for boundary in [BoundaryPolicy::Clamped, BoundaryPolicy::Toroidal] {
            let k = kernel(9, 7, boundary);
            let input = vec![0; 63];
            let (output, _) = dispatch(&k, Tile::default(), &input);
            assert!(output.iter().all(|&c| c == 0), "{boundary:?}");
        }
    }

    #[test]
    fn glider_on_five_by_five_torus() {
        let dims = GridDims::new(5, 5);
        let mut grid = Grid::new(dims);
        for (x, y) in Pattern::Glider.cells(0, 0) {
            grid.set(x as u32, y as u32, true);
        }
        let k = kernel(5, 5, BoundaryPolicy::Toroidal);
        let (output, _) = dispatch(&k, Tile::new(5, 5), grid.cells());
        let next = Grid::from_cells(dims, output).unwrap();
        // .O.. / ..O. / OOO.  ->  .... / O.O. / .OO. / .O..
        assert_eq!(next.live_cells(), vec![(0, 1), (2, 1), (1, 2), (2, 2), (1, 3)]);
    }

    #[test]
    fn blinker_oscillates() {
        let dims = GridDims::new(5, 5);
        let mut grid = Grid::new(dims);
        for (x, y) in Pattern::Blinker.cells(2, 1) {
            grid.set(x as u32, y as u32, true);
        }
        let k = kernel(5, 5, BoundaryPolicy::Clamped);
        let (once, _) = dispatch(&k, Tile::default(), grid.cells());
        assert_eq!(
            Grid::from_cells(dims, once.clone()).unwrap().live_cells(),
            vec![(1, 2), (2, 2), (3, 2)]
        );
        let (twice, _) = dispatch(&k, Tile::default(), &once);
        assert_eq!(twice, grid.cells());
    }

    #[test]
    fn every_cell_written_exactly_once() {
        let dims = GridDims::new(13, 7);
        let input: Vec<u32> = (0..dims.cell_count() as u32).map(|i| (i * 7 + 3) % 5 / 3).collect();
        for tile in [Tile::new(5, 5), Tile::new(8, 8), Tile::new(1, 1), Tile::new(16, 4)] {
            let k = kernel(13, 7, BoundaryPolicy::Toroidal);
            let (output, writes) = dispatch(&k, tile, &input);
            assert!(writes.iter().all(|&w| w == 1), "tile {tile:?}");
            assert!(output.iter().all(|&c| c <= 1));
        }
    }

    #[test]
    fn tile_choice_does_not_change_result() {
        let dims = GridDims::new(11, 9);
        let input: Vec<u32> = (0..dims.cell_count() as u32).map(|i| (i * i + i / 3) % 2).collect();
        let k = kernel(11, 9, BoundaryPolicy::Clamped);
        let (a, _) = dispatch(&k, Tile::new(5, 5), &input);
        let (b, _) = dispatch(&k, Tile::new(8, 8), &input);
        assert_eq!(a, b);
    }

    #[test]
    fn workgroups_round_up() {
        let dims = GridDims::new(13, 8);
        assert_eq!(Tile::new(8, 8).workgroups(dims), (2, 1));
        assert_eq!(Tile::new(5, 5).workgroups(dims), (3, 2));
    }

    #[test]
    fn invoke_writes_pixel_from_new_state() {
        let k = kernel(3, 3, BoundaryPolicy::Clamped);
        let input = vec![0, 1, 0, 0, 1, 0, 0, 1, 0];
        let center = k.invoke(&input, 1, 1);
        assert_eq!(center.state, 1);
        assert_eq!(center.pixel, [1.0, 1.0, 1.0, 1.0]);
        let top = k.invoke(&input, 1, 0);
        assert_eq!(top.state, 0);
        assert_eq!(top.pixel, [0.0, 0.0, 0.0, 1.0]);
    }
}
