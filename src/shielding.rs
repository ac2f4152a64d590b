//! Shielding neighbourhood over a square source grid.
//!
//! For cost matrices derived from a geometric embedding of the sources on a
//! `g×g` grid (`g = ⌈√m⌉`), an optimal basis has its support contained in
//! the *shield* of the current basic support: for each source, its own
//! support columns, the support columns of its up-to-4 grid neighbours, and
//! every destination inside the axis-aligned rectangle bounded by the
//! neighbours' support. The shielding pricing policy prices only this set.
//!
//! The intended instances have sources and destinations on the same grid,
//! so grid point ids double as destination indices; ids that fall outside
//! `0..n` are skipped.

use crate::pricing::Candidate;

// -------------------------------------------------------------------------------------------------
// Main structs.

/// Grid position and neighbour ids of one source.
#[derive(Debug, Clone, Default)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub neigh: Vec<usize>,
}

/// The `g×g` board: `table[r][c]` holds the grid point id, `cells[i]` the
/// position and neighbourhood of source `i`.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    pub table: Vec<Vec<usize>>,
    pub cells: Vec<GridCell>,
}

/// Axis-aligned bounding rectangle in grid coordinates, all bounds
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: usize,
    pub right: usize,
    pub up: usize,
    pub down: usize,
}

// -------------------------------------------------------------------------------------------------
// Grid construction.

/// Lay `sources` points row-major onto a `size×size` board and record each
/// point's up-to-4 neighbours.
pub fn square_grid(sources: usize, size: usize) -> Grid {
    let mut table = vec![vec![0usize; size]; size];
    let mut id = 0usize;
    for row in table.iter_mut() {
        for slot in row.iter_mut() {
            *slot = id;
            id += 1;
        }
    }

    let mut cells = Vec::with_capacity(sources);
    for i in 0..sources {
        let mut cell = GridCell {
            row: i / size,
            col: i % size,
            neigh: Vec::with_capacity(4),
        };
        if i % size != 0 {
            cell.neigh.push(i - 1);
        }
        if (i + 1) % size != 0 && i + 1 < sources {
            cell.neigh.push(i + 1);
        }
        if i >= size {
            cell.neigh.push(i - size);
        }
        if i + size < sources {
            cell.neigh.push(i + size);
        }
        cells.push(cell);
    }

    Grid { table, cells }
}

impl Grid {
    pub fn size(&self) -> usize {
        self.table.len()
    }
}

// -------------------------------------------------------------------------------------------------
// Shield computation.

/// The rectangle spanned by the support columns of `i`'s grid neighbours.
/// A neighbour left of `i` pushes the left bound to its rightmost support
/// column, a neighbour to the right pulls the right bound to its leftmost,
/// and symmetrically for up/down; neighbours without support leave the
/// board bounds in place.
pub fn support_rectangle(grid: &Grid, supp: &[Vec<usize>], i: usize) -> Rect {
    let size = grid.size();
    let mut rect = Rect {
        left: 0,
        right: size - 1,
        up: 0,
        down: size - 1,
    };

    for &a in &grid.cells[i].neigh {
        let supp_a: Vec<usize> = supp[a]
            .iter()
            .copied()
            .filter(|&t| t < grid.cells.len())
            .collect();
        if supp_a.is_empty() {
            continue;
        }
        if grid.cells[i].row == grid.cells[a].row {
            if grid.cells[i].col < grid.cells[a].col {
                rect.right = supp_a
                    .iter()
                    .map(|&t| grid.cells[t].col)
                    .min()
                    .unwrap_or(rect.right);
            } else {
                rect.left = supp_a
                    .iter()
                    .map(|&t| grid.cells[t].col)
                    .max()
                    .unwrap_or(rect.left);
            }
        } else if grid.cells[i].row < grid.cells[a].row {
            rect.down = supp_a
                .iter()
                .map(|&t| grid.cells[t].row)
                .min()
                .unwrap_or(rect.down);
        } else {
            rect.up = supp_a
                .iter()
                .map(|&t| grid.cells[t].row)
                .max()
                .unwrap_or(rect.up);
        }
    }
    rect
}

/// Build the shield candidate set from the current basic support.
///
/// Three contributions per source with positive remaining supply: its own
/// support, the neighbours' support, and the destinations inside the
/// neighbour rectangle (those with positive demand). Duplicates are
/// suppressed through a dense seen-mask.
pub fn compute_shields(
    costs: &[f64],
    m: usize,
    n: usize,
    grid: &Grid,
    supp: &[Vec<usize>],
    sources: &[f64],
    destinations: &[f64],
    threshold: f64,
) -> Vec<Candidate> {
    let mut seen = vec![false; m * n];
    let mut shield = Vec::new();
    let mut push = |seen: &mut Vec<bool>, shield: &mut Vec<Candidate>, i: usize, t: usize| {
        if !seen[i * n + t] {
            seen[i * n + t] = true;
            shield.push(Candidate::new(i, t, costs[i * n + t], 0.0));
        }
    };

    for i in 0..m {
        if !(sources[i] > threshold) {
            continue;
        }

        for &t in &supp[i] {
            push(&mut seen, &mut shield, i, t);
            for &nb in &grid.cells[i].neigh {
                push(&mut seen, &mut shield, nb, t);
            }
        }

        let rect = support_rectangle(grid, supp, i);
        for h in rect.up..=rect.down {
            for k in rect.left..=rect.right {
                let t = grid.table[h][k];
                if t < n && destinations[t] > threshold && !seen[i * n + t] {
                    seen[i * n + t] = true;
                    shield.push(Candidate::new(i, t, costs[i * n + t], 0.0));
                }
            }
        }
    }
    shield
}

// -------------------------------------------------------------------------------------------------
// Unit tests.
