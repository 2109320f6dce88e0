//! Typed correction records and their bit-stream parsers.
//!
//! Each HAS correction block (orbit, clock full-set, clock subset, code
//! bias, phase bias) is parsed against the masks retained by the decoder
//! and turned into a [`Correction`] variant. Following the re-architecture
//! called for by the source's use of class polymorphism, corrections are
//! represented as a single tagged enum rather than a class hierarchy; the
//! common fields live in [`CorrectionHeader`], embedded in every variant.

use crate::bitreader::{two_complement, BitReader};
use crate::error::DecodeError;
use crate::mask::{Mask, GNSS_GALILEO, GNSS_GPS};
use std::collections::HashMap;

/// Validity intervals in seconds, indexed by the 4-bit validity index
/// (Table 13 of the ICD). The last entry means "indefinite".
const VALIDITY_TABLE: [Option<u32>; 16] = [
    Some(5),
    Some(10),
    Some(15),
    Some(20),
    Some(30),
    Some(60),
    Some(90),
    Some(120),
    Some(180),
    Some(240),
    Some(300),
    Some(600),
    Some(900),
    Some(1800),
    Some(3600),
    None,
];

/// Maps a 4-bit validity index to a validity interval in seconds, or
/// `None` for "indefinite".
pub fn validity_seconds(index: u8) -> Option<u32> {
    VALIDITY_TABLE[usize::from(index) & 0xF]
}

/// Key under which an orbit correction's `gnss_iod` is retained for later
/// clock/bias corrections in the same correction session.
pub type IodKey = (u8, u8);

/// Table mapping `(gnss_id, prn)` to the `gnss_iod` of the most recent
/// orbit correction, owned by the decoder and cleared at the start of
/// every orbit block.
pub type IodTable = HashMap<IodKey, u16>;

/// Fields common to every correction record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionHeader {
    pub tow: u32,
    pub toh: u32,
    /// IOD Set ID from the MT1 header.
    pub iod: u8,
    pub validity: Option<u32>,
    pub gnss_id: u8,
    pub prn: u8,
}

impl CorrectionHeader {
    fn csv_prefix(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.tow,
            self.toh,
            self.iod,
            self.validity.map_or(-1, |v| v as i64),
            self.gnss_id,
            self.prn
        )
    }
}

/// Status of a clock correction's delta C0 value.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ClockStatus {
    Ok,
    NotAvailable,
    ShallNotBeUsed,
}

impl std::fmt::Display for ClockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ClockStatus::Ok => 0,
            ClockStatus::NotAvailable => 1,
            ClockStatus::ShallNotBeUsed => 2,
        };
        write!(f, "{}", code)
    }
}

/// A single signal's code bias entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodeBiasEntry {
    pub signal: u8,
    pub bias_m: f64,
    pub available: bool,
}

/// A single signal's phase bias entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseBiasEntry {
    pub signal: u8,
    pub bias_cycles: f64,
    pub available: bool,
    pub phase_discontinuity_index: u8,
}

/// A parsed HAS correction record.
#[derive(Debug, Clone, PartialEq)]
pub enum Correction {
    Orbit {
        header: CorrectionHeader,
        gnss_iod: u16,
        delta_radial_m: f64,
        delta_in_track_m: f64,
        delta_cross_track_m: f64,
    },
    Clock {
        header: CorrectionHeader,
        multiplier: u8,
        delta_clock_c0_m: f64,
        status: ClockStatus,
        gnss_iod: Option<u16>,
    },
    CodeBias {
        header: CorrectionHeader,
        entries: Vec<CodeBiasEntry>,
    },
    PhaseBias {
        header: CorrectionHeader,
        entries: Vec<PhaseBiasEntry>,
    },
}

/// Column header for the orbit CSV schema.
pub const ORBIT_CSV_HEADER: &str =
    "ToW,ToH,IOD,validity,gnssID,PRN,gnssIOD,delta_radial,delta_in_track,delta_cross_track";
/// Column header for the clock CSV schema.
pub const CLOCK_CSV_HEADER: &str = "ToW,ToH,IOD,validity,gnssID,PRN,multiplier,delta_clock_c0,status";
/// Column header for the code bias CSV schema.
pub const CODE_BIAS_CSV_HEADER: &str = "ToW,ToH,IOD,validity,gnssID,PRN,signal,code_bias,av_flag";
/// Column header for the phase bias CSV schema.
pub const PHASE_BIAS_CSV_HEADER: &str =
    "ToW,ToH,IOD,validity,gnssID,PRN,signal,phase_bias,av_flag,phase_discontinuity_ind";

impl Correction {
    /// Renders this correction as one or more CSV rows (without a trailing
    /// newline), in the column order documented by the constant matching
    /// its type. Code/phase bias records with no selected signals render
    /// as an empty string and should be suppressed by the caller.
    pub fn to_csv_rows(&self) -> String {
        match self {
            Correction::Orbit {
                header,
                gnss_iod,
                delta_radial_m,
                delta_in_track_m,
                delta_cross_track_m,
            } => format!(
                "{},{},{},{},{}",
                header.csv_prefix(),
                gnss_iod,
                fmt_f64(*delta_radial_m),
                fmt_f64(*delta_in_track_m),
                fmt_f64(*delta_cross_track_m)
            ),
            Correction::Clock {
                header,
                multiplier,
                delta_clock_c0_m,
                status,
                ..
            } => format!(
                "{},{},{},{}",
                header.csv_prefix(),
                multiplier,
                fmt_f64(*delta_clock_c0_m),
                status
            ),
            Correction::CodeBias { header, entries } => entries
                .iter()
                .map(|e| {
                    format!(
                        "{},{},{},{}",
                        header.csv_prefix(),
                        e.signal,
                        fmt_f64(e.bias_m),
                        e.available as u8
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Correction::PhaseBias { header, entries } => entries
                .iter()
                .map(|e| {
                    format!(
                        "{},{},{},{},{}",
                        header.csv_prefix(),
                        e.signal,
                        fmt_f64(e.bias_cycles),
                        e.available as u8,
                        e.phase_discontinuity_index
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

fn fmt_f64(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else {
        v.to_string()
    }
}

fn gnss_iod_width(gnss_id: u8) -> Result<u32, DecodeError> {
    match gnss_id {
        GNSS_GPS => Ok(8),
        GNSS_GALILEO => Ok(10),
        other => Err(DecodeError::UnsupportedGnss(other)),
    }
}

/// Parses an orbit correction block.
///
/// Clears and repopulates `iod_table` with one entry per `(gnss_id, prn)`
/// encountered in this block.
pub fn parse_orbit(
    reader: &mut BitReader<'_>,
    masks: &[Mask],
    iod_table: &mut IodTable,
    tow: u32,
    toh: u32,
    iod: u8,
) -> Result<Vec<Correction>, DecodeError> {
    let validity = validity_seconds(reader.read_u8(4)?);
    iod_table.clear();

    let mut out = Vec::new();
    for mask in masks {
        let width = gnss_iod_width(mask.gnss_id)?;
        for &prn in &mask.prns {
            let gnss_iod = reader.read_u16(width as usize)?;
            iod_table.insert((mask.gnss_id, prn), gnss_iod);

            let raw_radial = reader.read_u16(13)?;
            let delta_radial_m = if raw_radial == 0x1000 {
                f64::NAN
            } else {
                two_complement(u64::from(raw_radial), 13) as f64 * 0.0025
            };

            let raw_in_track = reader.read_u16(12)?;
            let delta_in_track_m = if raw_in_track == 0x800 {
                f64::NAN
            } else {
                two_complement(u64::from(raw_in_track), 12) as f64 * 0.008
            };

            let raw_cross_track = reader.read_u16(12)?;
            let delta_cross_track_m = if raw_cross_track == 0x800 {
                f64::NAN
            } else {
                two_complement(u64::from(raw_cross_track), 12) as f64 * 0.008
            };

            out.push(Correction::Orbit {
                header: CorrectionHeader {
                    tow,
                    toh,
                    iod,
                    validity,
                    gnss_id: mask.gnss_id,
                    prn,
                },
                gnss_iod,
                delta_radial_m,
                delta_in_track_m,
                delta_cross_track_m,
            });
        }
    }
    Ok(out)
}

fn decode_clock_delta(raw: u16) -> (f64, ClockStatus) {
    match raw {
        0x1000 => (0.0, ClockStatus::NotAvailable),
        0xFFF => (0.0, ClockStatus::ShallNotBeUsed),
        _ => (two_complement(u64::from(raw), 13) as f64 * 0.0025, ClockStatus::Ok),
    }
}

/// Parses a clock full-set correction block.
pub fn parse_clock_full(
    reader: &mut BitReader<'_>,
    masks: &[Mask],
    iod_table: &IodTable,
    tow: u32,
    toh: u32,
    iod: u8,
) -> Result<Vec<Correction>, DecodeError> {
    let validity = validity_seconds(reader.read_u8(4)?);

    let mut multipliers = Vec::with_capacity(masks.len());
    for _ in masks {
        multipliers.push(reader.read_u8(2)? + 1);
    }

    let mut out = Vec::new();
    for (mask, &multiplier) in masks.iter().zip(multipliers.iter()) {
        for &prn in &mask.prns {
            let raw = reader.read_u16(13)?;
            let (delta_clock_c0_m, status) = decode_clock_delta(raw);
            let gnss_iod = iod_table.get(&(mask.gnss_id, prn)).copied();
            out.push(Correction::Clock {
                header: CorrectionHeader {
                    tow,
                    toh,
                    iod,
                    validity,
                    gnss_id: mask.gnss_id,
                    prn,
                },
                multiplier,
                delta_clock_c0_m,
                status,
                gnss_iod,
            });
        }
    }
    Ok(out)
}

/// Parses a clock subset correction block.
pub fn parse_clock_subset(
    reader: &mut BitReader<'_>,
    masks: &[Mask],
    tow: u32,
    toh: u32,
    iod: u8,
) -> Result<Vec<Correction>, DecodeError> {
    let validity = validity_seconds(reader.read_u8(4)?);
    let nsys = reader.read_u8(4)?;

    let mut out = Vec::new();
    for _ in 0..nsys {
        let gnss_id = reader.read_u8(4)?;
        let mask = masks
            .iter()
            .find(|m| m.gnss_id == gnss_id)
            .ok_or(DecodeError::MissingMask(gnss_id))?;
        let multiplier = reader.read_u8(2)? + 1;
        let nprn = mask.prns.len();
        let subset_bits = if nprn > 0 { reader.read_u64(nprn)? } else { 0 };

        for (k, &prn) in mask.prns.iter().enumerate() {
            let selected = (subset_bits >> (nprn - 1 - k)) & 1 == 1;
            if !selected {
                continue;
            }
            let raw = reader.read_u16(13)?;
            let (delta_clock_c0_m, status) = decode_clock_delta(raw);
            out.push(Correction::Clock {
                header: CorrectionHeader {
                    tow,
                    toh,
                    iod,
                    validity,
                    gnss_id,
                    prn,
                },
                multiplier,
                delta_clock_c0_m,
                status,
                gnss_iod: None,
            });
        }
    }
    Ok(out)
}

/// Parses a code bias correction block.
pub fn parse_code_bias(
    reader: &mut BitReader<'_>,
    masks: &[Mask],
    tow: u32,
    toh: u32,
    iod: u8,
) -> Result<Vec<Correction>, DecodeError> {
    let validity = validity_seconds(reader.read_u8(4)?);
    let mut out = Vec::new();
    for mask in masks {
        for (i, &prn) in mask.prns.iter().enumerate() {
            let signals = mask.signals_for_prn(i);
            let mut entries = Vec::with_capacity(signals.len());
            for signal in signals {
                let raw = reader.read_u16(11)?;
                let (bias_m, available) = if raw == 0x400 {
                    (0.0, false)
                } else {
                    (two_complement(u64::from(raw), 11) as f64 * 0.02, true)
                };
                entries.push(CodeBiasEntry {
                    signal,
                    bias_m,
                    available,
                });
            }
            if entries.is_empty() {
                continue;
            }
            out.push(Correction::CodeBias {
                header: CorrectionHeader {
                    tow,
                    toh,
                    iod,
                    validity,
                    gnss_id: mask.gnss_id,
                    prn,
                },
                entries,
            });
        }
    }
    Ok(out)
}

/// Parses a phase bias correction block.
pub fn parse_phase_bias(
    reader: &mut BitReader<'_>,
    masks: &[Mask],
    tow: u32,
    toh: u32,
    iod: u8,
) -> Result<Vec<Correction>, DecodeError> {
    let validity = validity_seconds(reader.read_u8(4)?);
    let mut out = Vec::new();
    for mask in masks {
        for (i, &prn) in mask.prns.iter().enumerate() {
            let signals = mask.signals_for_prn(i);
            let mut entries = Vec::with_capacity(signals.len());
            for signal in signals {
                let raw = reader.read_u16(11)?;
                let (bias_cycles, available) = if raw == 0x400 {
                    (0.0, false)
                } else {
                    (two_complement(u64::from(raw), 11) as f64 * 0.01, true)
                };
                let phase_discontinuity_index = reader.read_u8(2)?;
                entries.push(PhaseBiasEntry {
                    signal,
                    bias_cycles,
                    available,
                    phase_discontinuity_index,
                });
            }
            if entries.is_empty() {
                continue;
            }
            out.push(Correction::PhaseBias {
                header: CorrectionHeader {
                    tow,
                    toh,
                    iod,
                    validity,
                    gnss_id: mask.gnss_id,
                    prn,
                },
                entries,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validity_table_matches_scenario_c() {
        assert_eq!(validity_seconds(0), Some(5));
        assert_eq!(validity_seconds(7), Some(120));
        assert_eq!(validity_seconds(14), Some(3600));
        assert_eq!(validity_seconds(15), None);
    }

    #[test]
    fn orbit_sentinel_produces_nan() {
        // validity_index=0, one Galileo mask with one PRN, gnss_iod (10
        // bits) = 0, delta_radial = 0x1000 (sentinel), delta_in_track=0,
        // delta_cross_track=0.
        let mut bits = bitvec::bitvec![u8, bitvec::order::Msb0;];
        push_bits(&mut bits, 0, 4); // validity index
        push_bits(&mut bits, 0, 10); // gnss_iod
        push_bits(&mut bits, 0x1000, 13); // delta_radial sentinel
        push_bits(&mut bits, 0, 12);
        push_bits(&mut bits, 0, 12);
        let bytes = bits.into_vec();

        let mask = Mask {
            gnss_id: GNSS_GALILEO,
            prns: vec![7],
            signals: vec![],
            cell_mask_flag: false,
            cell_mask: vec![],
            nav_message: 0,
        };
        let mut reader = BitReader::new(&bytes);
        let mut iod_table = IodTable::new();
        let corrections = parse_orbit(&mut reader, &[mask], &mut iod_table, 0, 0, 0).unwrap();
        assert_eq!(corrections.len(), 1);
        match &corrections[0] {
            Correction::Orbit {
                delta_radial_m, ..
            } => assert!(delta_radial_m.is_nan()),
            _ => panic!("expected orbit correction"),
        }
    }

    #[test]
    fn orbit_sentinel_negative_value() {
        // raw 0x1FFF (13 bits all set) -> two's complement -1, * 0.0025
        let raw = two_complement(0x1FFF, 13) as f64 * 0.0025;
        assert_eq!(raw, -0.0025);
    }

    fn push_bits(bits: &mut bitvec::vec::BitVec<u8, bitvec::order::Msb0>, value: u64, width: u32) {
        for b in (0..width).rev() {
            bits.push((value >> b) & 1 == 1);
        }
    }
}
