//! Test data generators for creating synthetic land-use grids.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite. All grids are row-major
//! (row 0 first, then row 1, etc.).

/// Creates a categorical land-use grid made of square blocks.
///
/// Each `block` × `block` square takes the next code from `codes`,
/// cycling diagonally so neighbouring blocks differ.
///
/// # Panics
///
/// Panics if `codes` is empty or `block` is zero.
pub fn create_class_grid(width: usize, height: usize, block: usize, codes: &[i16]) -> Vec<i16> {
    assert!(!codes.is_empty(), "at least one class code is required");
    assert!(block > 0, "block size must be non-zero");

    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let idx = (col / block + row / block) % codes.len();
            data.push(codes[idx]);
        }
    }
    data
}

/// Creates a fractional land-use grid with values in `[0, 1]`.
///
/// Values increase left-to-right and top-to-bottom, reaching exactly 1.0
/// in the bottom-right cell.
pub fn create_fraction_grid(width: usize, height: usize) -> Vec<f32> {
    let span = (width + height).saturating_sub(2).max(1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col + row) as f32 / span);
        }
    }
    data
}

/// Replace a centred square of `size` cells with `sentinel`.
///
/// Simulates a hole of invalid data, such as water bodies in a land-use mask.
pub fn punch_hole<T: Copy>(data: &mut [T], width: usize, height: usize, size: usize, sentinel: T) {
    let start_col = width.saturating_sub(size) / 2;
    let start_row = height.saturating_sub(size) / 2;
    for row in start_row..(start_row + size).min(height) {
        for col in start_col..(start_col + size).min(width) {
            data[row * width + col] = sentinel;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_class_grid_blocks() {
        let grid = create_class_grid(4, 4, 2, &[1, 2]);
        assert_eq!(&grid[0..4], &[1, 1, 2, 2]);
        assert_eq!(&grid[8..12], &[2, 2, 1, 1]);
    }

    #[test]
    fn test_create_fraction_grid_range() {
        let grid = create_fraction_grid(5, 4);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[grid.len() - 1], 1.0);
        assert!(grid.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_punch_hole() {
        let mut grid = vec![0.0f32; 16];
        punch_hole(&mut grid, 4, 4, 2, -9999.0);
        let holes = grid.iter().filter(|v| **v == -9999.0).count();
        assert_eq!(holes, 4);
        assert_eq!(grid[5], -9999.0);
        assert_eq!(grid[0], 0.0);
    }
}
