use std::ops::{Index, IndexMut};

use crate::Coordinate;

/// A dense 2D grid keyed by [`Coordinate`].
///
/// Stores elements of type `T` in a flat vector using row-major order. Any
/// coordinate with a negative component or past the extent is simply absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`.
    pub fn new(rows: usize, cols: usize) -> Self
    where
        T: Default + Clone,
    {
        Self::filled(rows, cols, T::default())
    }

    /// Creates a new grid with every cell set to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self
    where
        T: Clone,
    {
        let size = rows.checked_mul(cols).expect("Grid size overflow");
        Grid {
            rows,
            cols,
            cells: vec![value; size],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Converts a coordinate to a flat vector index.
    ///
    /// Returns `None` if the coordinate is out of bounds.
    #[inline]
    pub fn index_of(&self, coord: Coordinate) -> Option<usize> {
        let row = usize::try_from(coord.row).ok()?;
        let col = usize::try_from(coord.col).ok()?;
        if row < self.rows && col < self.cols {
            Some(row * self.cols + col)
        } else {
            None
        }
    }

    /// Returns the cell at `coord`, or `None` outside the grid.
    pub fn get(&self, coord: Coordinate) -> Option<&T> {
        self.cells.get(self.index_of(coord)?)
    }

    /// Overwrites every cell with `value`, keeping the allocation.
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.cells.fill(value);
    }

    /// Returns an iterator over the rows of the grid, top to bottom.
    pub fn row_slices(&self) -> impl Iterator<Item = &[T]> {
        // chunks panics on zero; an empty grid simply has no rows.
        self.cells.chunks(self.cols.max(1))
    }
}

impl<T> Index<Coordinate> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, coord: Coordinate) -> &Self::Output {
        match self.index_of(coord) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index {} out of bounds for grid size {}x{}",
                coord, self.rows, self.cols
            ),
        }
    }
}

impl<T> IndexMut<Coordinate> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, coord: Coordinate) -> &mut Self::Output {
        match self.index_of(coord) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index {} out of bounds for grid size {}x{}",
                coord, self.rows, self.cols
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_overflowing_coordinates_are_absent() {
        let grid: Grid<u8> = Grid::new(2, 3);
        assert_eq!(grid.index_of(Coordinate::new(1, 2)), Some(5));
        assert_eq!(grid.get(Coordinate::new(-1, 0)), None);
        assert_eq!(grid.get(Coordinate::new(0, -1)), None);
        assert_eq!(grid.get(Coordinate::new(2, 0)), None);
        assert_eq!(grid.get(Coordinate::new(0, 3)), None);
        assert_eq!(grid.get(Coordinate::new(i32::MIN, i32::MAX)), None);
    }

    #[test]
    fn rows_are_row_major_slices() {
        let mut grid = Grid::filled(2, 3, '.');
        grid[Coordinate::new(1, 0)] = '#';
        let rows: Vec<String> = grid.row_slices().map(|row| row.iter().collect()).collect();
        assert_eq!(rows, vec!["...", "#.."]);
    }

    #[test]
    fn fill_resets_every_cell() {
        let mut grid: Grid<Option<u8>> = Grid::new(3, 3);
        grid[Coordinate::new(2, 2)] = Some(1);
        grid.fill(None);
        assert_eq!(grid.get(Coordinate::new(2, 2)), Some(&None));
        assert!(grid.row_slices().flatten().all(Option::is_none));
        assert_eq!(grid.row_slices().count(), 3);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn indexing_outside_panics() {
        let grid: Grid<u8> = Grid::new(1, 1);
        let _ = grid[Coordinate::new(1, 0)];
    }
}
