//! Core allocator types
//!
//! Identifiers for processes and resource types, plus the dense row-major
//! matrix that holds one vector per process. All types here are pure data.

use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Process identifier (row index into the allocation and max matrices)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub usize);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Resource type identifier (column index)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub usize);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Dense `rows x cols` matrix of resource units, stored row-major.
///
/// Sized once at construction and never resized.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<u32>,
}

impl Matrix {
    /// Create a matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: alloc::vec![0; rows * cols],
        }
    }

    /// Build a matrix from nested rows, checking the shape.
    ///
    /// `name` labels the matrix in the returned error.
    pub fn from_rows(
        name: &'static str,
        rows: Vec<Vec<u32>>,
        expected_rows: usize,
        cols: usize,
    ) -> Result<Self, StateError> {
        if rows.len() != expected_rows {
            return Err(StateError::RowCount {
                matrix: name,
                expected: expected_rows,
                found: rows.len(),
            });
        }

        let mut data = Vec::with_capacity(expected_rows * cols);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(StateError::RowLength {
                    matrix: name,
                    row: index,
                    expected: cols,
                    found: row.len(),
                });
            }
            data.extend(row);
        }

        Ok(Self {
            rows: expected_rows,
            cols,
            data,
        })
    }

    /// Number of rows (processes)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (resource types)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrow one row.
    ///
    /// Panics if `row` is out of range; callers index with validated ids.
    pub fn row(&self, row: usize) -> &[u32] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [u32] {
        let start = row * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Get a single cell, or `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Iterate over rows in ascending order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[u32]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    /// Sum of one column, widened so it cannot overflow.
    pub fn column_sum(&self, col: usize) -> u64 {
        self.iter_rows().map(|row| u64::from(row[col])).sum()
    }

    /// Copy out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.iter_rows().map(<[u32]>::to_vec).collect()
    }
}

/// Find the first resource where `lhs[j] > rhs[j]`.
///
/// Both slices must have the same length.
pub fn first_excess(lhs: &[u32], rhs: &[u32]) -> Option<ResourceId> {
    lhs.iter()
        .zip(rhs)
        .position(|(l, r)| l > r)
        .map(ResourceId)
}

/// `lhs[j] <= rhs[j]` for every resource
pub fn fits_within(lhs: &[u32], rhs: &[u32]) -> bool {
    first_excess(lhs, rhs).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_matrix_from_rows() {
        let m = Matrix::from_rows("allocation", vec![vec![1, 2], vec![3, 4]], 2, 2).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 2);
        assert_eq!(m.row(1), &[3, 4]);
        assert_eq!(m.get(0, 1), Some(2));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.column_sum(0), 4);
        assert_eq!(m.to_rows(), vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_matrix_from_rows_wrong_row_count() {
        let err = Matrix::from_rows("max", vec![vec![1, 2]], 2, 2).unwrap_err();
        assert_eq!(
            err,
            StateError::RowCount {
                matrix: "max",
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_matrix_from_rows_ragged() {
        let err = Matrix::from_rows("max", vec![vec![1, 2], vec![3]], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            StateError::RowLength {
                row: 1,
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_first_excess() {
        assert_eq!(first_excess(&[1, 2, 3], &[1, 2, 3]), None);
        assert_eq!(first_excess(&[1, 3, 4], &[1, 2, 3]), Some(ResourceId(1)));
        assert!(fits_within(&[0, 0], &[0, 0]));
        assert!(!fits_within(&[1, 0], &[0, 5]));
    }

    #[test]
    fn test_display_ids() {
        assert_eq!(alloc::format!("{}", ProcessId(3)), "P3");
        assert_eq!(alloc::format!("{}", ResourceId(0)), "R0");
    }
}
