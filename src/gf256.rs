//! Arithmetic in GF(2^8).
//!
//! This module implements the finite field GF(2^8) used by the HAS Reed-Solomon
//! erasure code, with primitive polynomial `x^8 + x^7 + x^2 + x + 1` (0x187)
//! and primitive element `alpha = 0x02`. Multiplication and inversion are
//! implemented with exp/log tables built once at first use, following the
//! classic construction used by the reference decoder.

use std::sync::OnceLock;

const PRIMITIVE_POLY: u16 = 0x187;
const FIELD_SIZE: usize = 256;

struct Tables {
    exp: [u8; 2 * (FIELD_SIZE - 1)],
    log: [u8; FIELD_SIZE],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn tables() -> &'static Tables {
    TABLES.get_or_init(|| {
        let mut exp = [0u8; 2 * (FIELD_SIZE - 1)];
        let mut log = [0u8; FIELD_SIZE];
        let mut x: u16 = 1;
        for i in 0..(FIELD_SIZE - 1) {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & FIELD_SIZE as u16 != 0 {
                x ^= PRIMITIVE_POLY;
            }
        }
        // Duplicate the table so that exp[i] for i in 0..510 can be indexed
        // without a modular reduction at every lookup site.
        for i in 0..(FIELD_SIZE - 1) {
            exp[i + FIELD_SIZE - 1] = exp[i];
        }
        Tables { exp, log }
    })
}

/// Adds two elements of GF(2^8).
///
/// Addition (and subtraction) in GF(2^8) is XOR.
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Multiplies two elements of GF(2^8).
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = tables();
    let la = t.log[a as usize] as usize;
    let lb = t.log[b as usize] as usize;
    t.exp[la + lb]
}

/// Returns the multiplicative inverse of a nonzero element of GF(2^8).
///
/// # Panics
///
/// Panics if `a` is zero.
pub fn inv(a: u8) -> u8 {
    assert_ne!(a, 0, "zero has no multiplicative inverse in GF(2^8)");
    let t = tables();
    let la = t.log[a as usize] as usize;
    t.exp[(FIELD_SIZE - 1 - la) % (FIELD_SIZE - 1)]
}

/// Raises the primitive element `alpha = 0x02` to the given power.
pub fn alpha_pow(power: u32) -> u8 {
    let t = tables();
    t.exp[(power as usize) % (FIELD_SIZE - 1)]
}

/// A matrix over GF(2^8), stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl Matrix {
    /// Builds a matrix from a row-major vector of entries.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn from_rows(rows: usize, cols: usize, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), rows * cols);
        Matrix { rows, cols, data }
    }

    /// Builds the `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut data = vec![0u8; n * n];
        for i in 0..n {
            data[i * n + i] = 1;
        }
        Matrix { rows: n, cols: n, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, r: usize, c: usize) -> u8 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: u8) {
        self.data[r * self.cols + c] = v;
    }

    /// Returns the rows of the matrix at the given indices, in order, as a
    /// new matrix.
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &r in indices {
            data.extend_from_slice(&self.data[r * self.cols..(r + 1) * self.cols]);
        }
        Matrix {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }

    /// Multiplies two matrices over GF(2^8).
    ///
    /// # Panics
    ///
    /// Panics if `self.cols() != other.rows()`.
    pub fn mul(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.cols, other.rows);
        let mut data = vec![0u8; self.rows * other.cols];
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                if a == 0 {
                    continue;
                }
                for j in 0..other.cols {
                    let b = other.get(k, j);
                    data[i * other.cols + j] = add(data[i * other.cols + j], mul(a, b));
                }
            }
        }
        Matrix {
            rows: self.rows,
            cols: other.cols,
            data,
        }
    }

    /// Inverts a square matrix over GF(2^8) by Gauss-Jordan elimination.
    ///
    /// Returns `None` if the matrix is singular.
    pub fn invert(&self) -> Option<Matrix> {
        assert_eq!(self.rows, self.cols, "only square matrices can be inverted");
        let n = self.rows;
        let mut left = self.clone();
        let mut right = Matrix::identity(n);

        for col in 0..n {
            // Find a pivot row with a nonzero entry in this column.
            let pivot = (col..n).find(|&r| left.get(r, col) != 0)?;
            if pivot != col {
                for c in 0..n {
                    left.data.swap(col * n + c, pivot * n + c);
                    right.data.swap(col * n + c, pivot * n + c);
                }
            }
            let pivot_inv = inv(left.get(col, col));
            for c in 0..n {
                left.set(col, c, mul(left.get(col, c), pivot_inv));
                right.set(col, c, mul(right.get(col, c), pivot_inv));
            }
            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = left.get(r, col);
                if factor == 0 {
                    continue;
                }
                for c in 0..n {
                    let v = add(left.get(r, c), mul(factor, left.get(col, c)));
                    left.set(r, c, v);
                    let v = add(right.get(r, c), mul(factor, right.get(col, c)));
                    right.set(r, c, v);
                }
            }
        }
        Some(right)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_is_xor() {
        assert_eq!(add(0x53, 0xca), 0x53 ^ 0xca);
    }

    #[test]
    fn mul_by_zero_and_one() {
        assert_eq!(mul(0xaa, 0), 0);
        assert_eq!(mul(0xaa, 1), 0xaa);
    }

    #[test]
    fn mul_inverse_roundtrip() {
        for a in 1..=255u8 {
            let ai = inv(a);
            assert_eq!(mul(a, ai), 1);
        }
    }

    #[test]
    fn alpha_powers_cycle() {
        assert_eq!(alpha_pow(0), 1);
        assert_eq!(alpha_pow(255), alpha_pow(0));
    }

    #[test]
    fn invert_identity() {
        let id = Matrix::identity(4);
        assert_eq!(id.invert().unwrap(), id);
    }

    #[test]
    fn invert_roundtrip() {
        // A simple Vandermonde-like 3x3 matrix built from powers of alpha.
        let mut data = Vec::with_capacity(9);
        for i in 0..3u32 {
            for j in 0..3u32 {
                data.push(alpha_pow(i * j));
            }
        }
        let m = Matrix::from_rows(3, 3, data);
        let inv_m = m.invert().expect("matrix should be invertible");
        let product = m.mul(&inv_m);
        assert_eq!(product, Matrix::identity(3));
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Matrix::from_rows(2, 2, vec![1, 1, 1, 1]);
        assert_eq!(m.invert(), None);
    }
}
