//! System, satellite, and signal mask parsing.
//!
//! Masks describe which satellites and signals a HAS message's correction
//! blocks apply to. They are parsed once, when an MT1 header's Mask flag
//! is set, and then retained by the decoder across subsequent messages
//! until a new Mask block replaces them (see [`crate::decoder`]).

use crate::bitreader::BitReader;
use crate::error::DecodeError;

/// GNSS identifier as carried in a mask (and elsewhere in the body).
///
/// Only GPS and Galileo are defined by the ICD; other values are reserved
/// and rejected where the bit width of a dependent field (such as
/// `gnss_iod`) is GNSS-specific.
pub type GnssId = u8;

/// GPS GNSS ID value.
pub const GNSS_GPS: GnssId = 0;
/// Galileo GNSS ID value.
pub const GNSS_GALILEO: GnssId = 2;

/// One system/satellite/signal mask, as produced by [`parse_masks`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Mask {
    /// GNSS this mask applies to.
    pub gnss_id: GnssId,
    /// PRNs present in the satellite mask, in ascending bit-position
    /// order (bit `j`, MSB-first, set means PRN `j + 1` is present).
    pub prns: Vec<u8>,
    /// Signal codes present in the signal mask, in ascending bit-position
    /// order (bit `j`, MSB-first, set means signal `j + 1` is present).
    pub signals: Vec<u8>,
    /// Whether a per-satellite cell mask follows the signal mask.
    pub cell_mask_flag: bool,
    /// If `cell_mask_flag` is set, one bitmap per PRN (in `prns` order),
    /// each of width `signals.len()`, MSB-first: bit `k` set means
    /// `signals[k]` applies to that satellite.
    pub cell_mask: Vec<Vec<bool>>,
    /// 3-bit navigation message type indicator.
    pub nav_message: u8,
}

impl Mask {
    /// Returns the signals that apply to the `index`-th PRN in [`Mask::prns`],
    /// honoring [`Mask::cell_mask_flag`].
    pub fn signals_for_prn(&self, index: usize) -> Vec<u8> {
        if !self.cell_mask_flag {
            return self.signals.clone();
        }
        let bitmap = &self.cell_mask[index];
        self.signals
            .iter()
            .zip(bitmap.iter())
            .filter_map(|(&sig, &present)| present.then_some(sig))
            .collect()
    }
}

/// Parses the `Nsys` masks following a set MT1 Mask flag.
///
/// On success, returns the parsed masks; `reader` is left positioned right
/// after the trailing 6 reserved bits, per the ICD layout.
pub fn parse_masks(reader: &mut BitReader<'_>) -> Result<Vec<Mask>, DecodeError> {
    let nsys = reader.read_u8(4)?;
    let mut masks = Vec::with_capacity(usize::from(nsys));
    for _ in 0..nsys {
        masks.push(parse_one_mask(reader)?);
    }
    let _reserved = reader.read_u8(6)?;
    Ok(masks)
}

fn parse_one_mask(reader: &mut BitReader<'_>) -> Result<Mask, DecodeError> {
    let gnss_id = reader.read_u8(4)?;

    let sat_mask = reader.read_u64(40)?;
    let prns = bitmap_to_list(sat_mask, 40);

    let sig_mask = reader.read_u32(16)?;
    let signals = bitmap_to_list(u64::from(sig_mask), 16);

    let cell_mask_flag = reader.read_bit()?;

    let mut cell_mask = Vec::new();
    if cell_mask_flag {
        let nsig = signals.len();
        for _ in 0..prns.len() {
            let raw = reader.read_u32(nsig)?;
            cell_mask.push(bitmap_to_bools(u64::from(raw), nsig));
        }
    }

    let nav_message = reader.read_u8(3)?;

    Ok(Mask {
        gnss_id,
        prns,
        signals,
        cell_mask_flag,
        cell_mask,
        nav_message,
    })
}

/// Interprets a `width`-bit MSB-first bitmap as a list of 1-based
/// positions, in ascending order.
fn bitmap_to_list(bitmap: u64, width: u32) -> Vec<u8> {
    (0..width)
        .filter_map(|j| {
            let bit = (bitmap >> (width - 1 - j)) & 1;
            (bit == 1).then_some((j + 1) as u8)
        })
        .collect()
}

/// Interprets a `width`-bit MSB-first bitmap as a list of booleans, one
/// per bit position in ascending order.
fn bitmap_to_bools(bitmap: u64, width: usize) -> Vec<bool> {
    (0..width)
        .map(|j| (bitmap >> (width - 1 - j)) & 1 == 1)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn bits_from_msb(pattern: &[(usize, u64, u32)]) -> Vec<u8> {
        // Helper: packs (value, width) pairs MSB-first into bytes.
        let total_bits: u32 = pattern.iter().map(|&(_, _, w)| w).sum();
        let total_bytes = ((total_bits + 7) / 8) as usize;
        let mut buf = vec![0u8; total_bytes];
        let mut bit_pos = 0usize;
        for &(_, value, width) in pattern {
            for b in (0..width).rev() {
                let bit = (value >> b) & 1;
                if bit == 1 {
                    buf[bit_pos / 8] |= 1 << (7 - (bit_pos % 8));
                }
                bit_pos += 1;
            }
        }
        buf
    }

    #[test]
    fn single_galileo_mask_prn_and_signal_extraction() {
        // Nsys=1, gnss_id=2 (Galileo), sat_mask bit0 set (PRN1) and bit4
        // set (PRN5), sig_mask bit0 set (signal1), cell_mask_flag=0,
        // nav_message=0, reserved=0.
        let sat_mask: u64 = (1u64 << 39) | (1u64 << 35); // bits 0 and 4 from MSB
        let data = bits_from_msb(&[
            (0, 1, 4),         // Nsys
            (0, 2, 4),         // gnss_id
            (0, sat_mask, 40), // sat_mask
            (0, 1u64 << 15, 16), // sig_mask: bit0 set -> signal 1
            (0, 0, 1),         // cell_mask_flag
            (0, 0, 3),         // nav_message
            (0, 0, 6),         // reserved
        ]);
        let mut reader = BitReader::new(&data);
        let masks = parse_masks(&mut reader).unwrap();
        assert_eq!(masks.len(), 1);
        assert_eq!(masks[0].gnss_id, GNSS_GALILEO);
        assert_eq!(masks[0].prns, vec![1, 5]);
        assert_eq!(masks[0].signals, vec![1]);
        assert!(!masks[0].cell_mask_flag);
    }

    #[test]
    fn cell_mask_selects_per_prn_signals() {
        let mask = Mask {
            gnss_id: GNSS_GALILEO,
            prns: vec![1, 2],
            signals: vec![1, 2, 3],
            cell_mask_flag: true,
            cell_mask: vec![vec![true, false, true], vec![false, true, false]],
            nav_message: 0,
        };
        assert_eq!(mask.signals_for_prn(0), vec![1, 3]);
        assert_eq!(mask.signals_for_prn(1), vec![2]);
    }
}
