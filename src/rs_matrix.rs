//! Systematic Reed-Solomon RS(255,32) encoding matrix and erasure decoding.
//!
//! The HAS correction stream is protected by a systematic RS(255,32) code
//! over GF(2^8): a message of up to 32 pages is encoded into 255 possible
//! page slots (selected by page ID), and any 32 of the 255 encoded pages
//! suffice to recover the original message. This mirrors the construction
//! in the reference decoder, which derives the encoding matrix from the
//! generating polynomial built out of consecutive powers of the primitive
//! element, then solves for the systematic form by inverting the bottom
//! `k` rows.

use crate::error::DecodeError;
use crate::gf256::{self, Matrix};
use std::sync::OnceLock;

/// Code length: number of distinct page IDs / codeword symbols.
pub const N: usize = 255;
/// Code dimension: maximum number of pages in a HAS message.
pub const K: usize = 32;

static ENCODING_MATRIX: OnceLock<Matrix> = OnceLock::new();

/// Returns the `255 x 32` systematic RS encoding matrix.
///
/// Row `page_id` of this matrix gives the linear combination of the 32
/// message symbols that produces the codeword symbol broadcast with that
/// page ID. The matrix is systematic: rows `223..255` (page IDs `223..255`,
/// 0-based) form the `32 x 32` identity.
pub fn encoding_matrix() -> &'static Matrix {
    ENCODING_MATRIX.get_or_init(build_encoding_matrix)
}

/// Builds the generating polynomial coefficients, in ascending order, for
/// an RS(`N`, `K`) code: `prod_{i=1}^{N-K} (z + alpha^i)`.
fn generator_poly() -> Vec<u8> {
    let pdeg = N - K;
    // Start with (z + alpha^1): ascending coefficients [alpha^1, 1].
    let mut poly = vec![gf256::alpha_pow(1), 1];
    for i in 2..=pdeg {
        let factor = [gf256::alpha_pow(i as u32), 1];
        poly = poly_mul(&poly, &factor);
    }
    poly
}

/// Multiplies two polynomials given by ascending-order coefficient vectors.
fn poly_mul(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] = gf256::add(out[i + j], gf256::mul(ai, bj));
        }
    }
    out
}

fn build_encoding_matrix() -> Matrix {
    let poly = generator_poly();
    debug_assert_eq!(poly.len(), N - K + 1);

    // gcol holds the first N-K+1 entries as the reversed (descending)
    // generator coefficients, zero-padded to length N.
    let mut gcol = vec![0u8; N];
    for (i, &c) in poly.iter().rev().enumerate() {
        gcol[i] = c;
    }

    // G is the N x K matrix whose column ii is gcol rolled (cyclically
    // shifted) by ii positions.
    let mut g = Matrix::from_rows(N, K, vec![0u8; N * K]);
    for col in 0..K {
        for row in 0..N {
            let src = (row + N - col) % N;
            g.set(row, col, gcol[src]);
        }
    }

    // Gk is the bottom K rows of G; invert it to find the transform that
    // turns those rows into the identity.
    let gk_rows: Vec<usize> = (N - K..N).collect();
    let gk = g.select_rows(&gk_rows);
    let gk_inv = gk
        .invert()
        .expect("RS(255,32) generator submatrix is invertible by construction");

    // H's bottom K rows are the identity; its top N-K rows are the
    // corresponding rows of G transformed by Gk^-1.
    let mut h = Matrix::from_rows(N, K, vec![0u8; N * K]);
    for i in 0..K {
        h.set(N - K + i, i, 1);
    }
    let top_rows: Vec<usize> = (0..N - K).collect();
    let g_top = g.select_rows(&top_rows);
    let h_top = g_top.mul(&gk_inv);
    for r in 0..N - K {
        for c in 0..K {
            h.set(r, c, h_top.get(r, c));
        }
    }
    h
}

/// Recovers the original `size` message symbols (each a row of `symbol_len`
/// bytes) from `size` received codeword rows, given by their page IDs
/// (0-based, in `0..255`, matching row `i` of [`encoding_matrix`]) and their
/// symbol bytes.
///
/// `page_ids` and `rows` must have the same length, equal to `size`, and
/// `size` must be at most [`K`]. Returns the decoded rows in original page
/// order (index 0 is the first page of the message).
pub fn decode(
    page_ids: &[u8],
    rows: &[Vec<u8>],
    size: usize,
    symbol_len: usize,
) -> Result<Vec<Vec<u8>>, DecodeError> {
    assert_eq!(page_ids.len(), rows.len());
    assert_eq!(page_ids.len(), size);
    assert!(size <= K);

    let full = encoding_matrix();
    // Select the first `size` columns (shortened code for messages smaller
    // than the maximum of 32 pages) and the rows named by the page IDs.
    let row_indices: Vec<usize> = page_ids.iter().map(|&id| usize::from(id)).collect();
    let mut reduced = Matrix::from_rows(size, size, vec![0u8; size * size]);
    for (r, &row_idx) in row_indices.iter().enumerate() {
        for c in 0..size {
            reduced.set(r, c, full.get(row_idx, c));
        }
    }

    let inv = reduced.invert().ok_or(DecodeError::SingularMatrix)?;

    // received is a `size x symbol_len` matrix; multiply inv (size x size)
    // by it to recover the `size x symbol_len` message matrix.
    let mut received = Matrix::from_rows(size, symbol_len, vec![0u8; size * symbol_len]);
    for (r, row) in rows.iter().enumerate() {
        assert_eq!(row.len(), symbol_len);
        for (c, &b) in row.iter().enumerate() {
            received.set(r, c, b);
        }
    }

    let decoded = inv.mul(&received);
    let mut out = Vec::with_capacity(size);
    for r in 0..size {
        let mut row = Vec::with_capacity(symbol_len);
        for c in 0..symbol_len {
            row.push(decoded.get(r, c));
        }
        out.push(row);
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encoding_matrix_is_systematic() {
        let h = encoding_matrix();
        assert_eq!(h.rows(), N);
        assert_eq!(h.cols(), K);
        for i in 0..K {
            for j in 0..K {
                let expect = if i == j { 1 } else { 0 };
                assert_eq!(h.get(N - K + i, j), expect);
            }
        }
    }

    #[test]
    fn roundtrip_with_no_erasures() {
        // Encode a synthetic message of 4 symbols each 1 byte wide using
        // the first 4 rows of the systematic matrix's tail (which are the
        // identity), then decode using those same page IDs.
        let message: Vec<u8> = vec![0x11, 0x22, 0x33, 0x44];
        let size = message.len();
        let h = encoding_matrix();

        // Compute codeword symbols for the first `size` page IDs (0-based).
        let page_ids: Vec<u8> = (0..size as u8).collect();
        let rows: Vec<Vec<u8>> = page_ids
            .iter()
            .map(|&id| {
                let row_idx = usize::from(id);
                let mut acc = 0u8;
                for c in 0..size {
                    acc = gf256::add(acc, gf256::mul(h.get(row_idx, c), message[c]));
                }
                vec![acc]
            })
            .collect();

        let decoded = decode(&page_ids, &rows, size, 1).unwrap();
        let flat: Vec<u8> = decoded.into_iter().map(|r| r[0]).collect();
        assert_eq!(flat, message);
    }

    #[test]
    fn roundtrip_with_erasures() {
        let message: Vec<u8> = vec![0xaa, 0xbb, 0xcc];
        let size = message.len();
        let h = encoding_matrix();

        // Use page IDs that are not simply 0..size to exercise the general
        // erasure-recovery path (any `size` distinct page IDs should work).
        let page_ids: Vec<u8> = vec![9, 199, 254];
        let rows: Vec<Vec<u8>> = page_ids
            .iter()
            .map(|&id| {
                let row_idx = usize::from(id);
                let mut acc = 0u8;
                for c in 0..size {
                    acc = gf256::add(acc, gf256::mul(h.get(row_idx, c), message[c]));
                }
                vec![acc]
            })
            .collect();

        let decoded = decode(&page_ids, &rows, size, 1).unwrap();
        let flat: Vec<u8> = decoded.into_iter().map(|r| r[0]).collect();
        assert_eq!(flat, message);
    }
}
