//! Decoder driver: routes pages to assemblers, evicts stale messages, and
//! dispatches completed MT1 messages to the mask and correction parsers.

use crate::assembler::{Assembler, AssemblerState};
use crate::bitreader::BitReader;
use crate::corrections::{self, Correction, IodTable};
use crate::error::DecodeError;
use crate::mask::Mask;
use crate::page::Page;
use crate::types::CNAV_WORDS_PER_PAGE;
use log::{debug, warn};

/// Maximum number of assemblers kept alive simultaneously. Bounds the
/// working set against pathological or malicious input.
pub const MAX_ASSEMBLERS: usize = 64;

/// The nine fields of the MT1 header, extracted MSB-first from its first
/// 32 bits.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Mt1Header {
    pub toh: u32,
    pub mask_present: bool,
    pub orbit_present: bool,
    pub clock_full_present: bool,
    pub clock_subset_present: bool,
    pub code_bias_present: bool,
    pub phase_bias_present: bool,
    pub mask_id: u8,
    pub iod_set_id: u8,
}

/// Parses the 32-bit MT1 header from the first 4 bytes of a decoded
/// message body.
pub fn interpret_mt1_header(bytes: &[u8; 4]) -> Mt1Header {
    let mut reader = BitReader::new(bytes);
    let toh = reader.read_u32(12).unwrap();
    let mask_present = reader.read_bit().unwrap();
    let orbit_present = reader.read_bit().unwrap();
    let clock_full_present = reader.read_bit().unwrap();
    let clock_subset_present = reader.read_bit().unwrap();
    let code_bias_present = reader.read_bit().unwrap();
    let phase_bias_present = reader.read_bit().unwrap();
    let _reserved = reader.read_u8(2).unwrap();
    let mask_id = reader.read_u8(5).unwrap();
    let iod_set_id = reader.read_u8(7).unwrap();
    Mt1Header {
        toh,
        mask_present,
        orbit_present,
        clock_full_present,
        clock_subset_present,
        code_bias_present,
        phase_bias_present,
        mask_id,
        iod_set_id,
    }
}

/// A fully decoded MT1 message: its header and every correction record
/// parsed from its body.
#[derive(Debug, Clone, Default)]
pub struct DecodedMessage {
    pub header: Option<Mt1Header>,
    pub corrections: Vec<Correction>,
}

/// Owns the set of in-flight assemblers, the retained masks, and the
/// cross-correction IOD table.
pub struct Decoder {
    assemblers: Vec<Assembler>,
    masks: Vec<Mask>,
    iod_table: IodTable,
    page_id_offset: u8,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Decoder {
    /// Creates a new decoder.
    ///
    /// `page_id_offset` selects between the pre- and post-ICD-transition
    /// page numbering conventions (0 or 1); it is subtracted from every
    /// page ID seen by [`Decoder::update`] before it reaches the assembler
    /// and RS decoder, which both use the 0-based convention internally
    /// (row `i` of the encoding matrix corresponds to page ID `i`, for
    /// `i` in `0..255`).
    pub fn new(page_id_offset: u8) -> Self {
        Decoder {
            assemblers: Vec::new(),
            masks: Vec::new(),
            iod_table: IodTable::new(),
            page_id_offset,
        }
    }

    /// Currently retained masks, if any message has set the Mask flag so
    /// far.
    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    /// Processes one epoch's worth of pages.
    ///
    /// `pages` are raw 16-word CNAV pages that passed CRC (the caller is
    /// responsible for filtering on `crc_passed` before calling this).
    /// Returns every message that completed and was successfully decoded
    /// during this call, in the order their assemblers were created.
    pub fn update(&mut self, tow: u32, pages: &[[u32; CNAV_WORDS_PER_PAGE]]) -> Vec<DecodedMessage> {
        let mut touched = vec![false; self.assemblers.len()];

        for words in pages {
            let mut page = match Page::from_words(words) {
                Ok(p) => p,
                Err(DecodeError::DummyHasPage) => {
                    debug!("dropping dummy HAS page");
                    continue;
                }
                Err(e) => {
                    warn!("failed to extract page: {}", e);
                    continue;
                }
            };
            page.header.page_id = page.header.page_id.wrapping_sub(self.page_id_offset);

            let key = page.message_key();
            let idx = match self.assemblers.iter().position(|a| a.key() == key) {
                Some(idx) => idx,
                None => {
                    if self.assemblers.len() >= MAX_ASSEMBLERS {
                        warn!("assembler table full, dropping oldest");
                        self.assemblers.remove(0);
                        touched.remove(0);
                    }
                    self.assemblers.push(Assembler::new(key));
                    touched.push(false);
                    self.assemblers.len() - 1
                }
            };
            self.assemblers[idx].add_page(&page.header, &page.body);
            touched[idx] = true;
        }

        for (asm, was_touched) in self.assemblers.iter_mut().zip(touched.iter()) {
            if !was_touched {
                asm.increase_age();
            }
        }

        self.assemblers.retain(|a| {
            if a.is_expired() {
                warn!("message {:?} expired before completion", a.key());
                false
            } else {
                true
            }
        });

        let mut completed_indices = Vec::new();
        for (i, asm) in self.assemblers.iter().enumerate() {
            if asm.state() == AssemblerState::Complete {
                completed_indices.push(i);
            }
        }

        let mut results = Vec::new();
        // Remove from the back so earlier indices stay valid.
        for &i in completed_indices.iter().rev() {
            let asm = self.assemblers.remove(i);
            if asm.key().mtype != 1 {
                continue;
            }
            match asm.decode() {
                Ok(bytes) => {
                    let decoded = self.interpret_mt1(tow, &bytes);
                    results.push(decoded);
                }
                Err(e) => warn!("RS decoding failed for {:?}: {}", asm.key(), e),
            }
        }
        results.reverse();
        results
    }

    fn interpret_mt1(&mut self, tow: u32, bytes: &[u8]) -> DecodedMessage {
        if bytes.len() < 4 {
            return DecodedMessage::default();
        }
        let header_bytes: [u8; 4] = bytes[0..4].try_into().unwrap();
        let header = interpret_mt1_header(&header_bytes);
        let mut reader = BitReader::new(&bytes[4..]);
        let mut corrections = Vec::new();

        if header.mask_present {
            match crate::mask::parse_masks(&mut reader) {
                Ok(masks) => self.masks = masks,
                Err(e) => {
                    warn!("mask parsing failed, message aborted: {}", e);
                    return DecodedMessage {
                        header: Some(header),
                        corrections,
                    };
                }
            }
        }

        if header.orbit_present {
            match corrections::parse_orbit(
                &mut reader,
                &self.masks,
                &mut self.iod_table,
                tow,
                header.toh,
                header.iod_set_id,
            ) {
                Ok(mut c) => corrections.append(&mut c),
                Err(e) => {
                    warn!("orbit block aborted: {}", e);
                    return DecodedMessage {
                        header: Some(header),
                        corrections,
                    };
                }
            }
        }

        if header.clock_full_present {
            match corrections::parse_clock_full(
                &mut reader,
                &self.masks,
                &self.iod_table,
                tow,
                header.toh,
                header.iod_set_id,
            ) {
                Ok(mut c) => corrections.append(&mut c),
                Err(e) => {
                    warn!("clock full-set block aborted: {}", e);
                    return DecodedMessage {
                        header: Some(header),
                        corrections,
                    };
                }
            }
        }

        if header.clock_subset_present {
            match corrections::parse_clock_subset(&mut reader, &self.masks, tow, header.toh, header.iod_set_id) {
                Ok(mut c) => corrections.append(&mut c),
                Err(e) => {
                    warn!("clock subset block aborted: {}", e);
                    return DecodedMessage {
                        header: Some(header),
                        corrections,
                    };
                }
            }
        }

        if header.code_bias_present {
            match corrections::parse_code_bias(&mut reader, &self.masks, tow, header.toh, header.iod_set_id) {
                Ok(mut c) => corrections.append(&mut c),
                Err(e) => {
                    warn!("code bias block aborted: {}", e);
                    return DecodedMessage {
                        header: Some(header),
                        corrections,
                    };
                }
            }
        }

        if header.phase_bias_present {
            match corrections::parse_phase_bias(&mut reader, &self.masks, tow, header.toh, header.iod_set_id) {
                Ok(mut c) => corrections.append(&mut c),
                Err(e) => warn!("phase bias block aborted: {}", e),
            }
        }

        DecodedMessage {
            header: Some(header),
            corrections,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mt1_header_bit_layout() {
        // toh=3599 (0xE0F), mask=1, orbit=0, clock_full=1, clock_subset=0,
        // code_bias=0, phase_bias=1, reserved=0, mask_id=5, iod_set_id=9.
        let mut val: u32 = 0;
        val |= 3599 << 20; // bits 0..11 in MSB-first 32-bit word -> top 12 bits
        val |= 1 << 19; // mask present (bit 12)
        val |= 0 << 18; // orbit (bit 13)
        val |= 1 << 17; // clock full (bit 14)
        val |= 0 << 16; // clock subset (bit 15)
        val |= 0 << 15; // code bias (bit 16)
        val |= 1 << 14; // phase bias (bit 17)
        // bits 18..19 reserved = 0
        val |= 5 << 7; // mask id, bits 20..24 (5 bits)
        val |= 9; // iod set id, bits 25..31 (7 bits)
        let bytes = val.to_be_bytes();
        let header = interpret_mt1_header(&bytes);
        assert_eq!(header.toh, 3599);
        assert!(header.mask_present);
        assert!(!header.orbit_present);
        assert!(header.clock_full_present);
        assert!(!header.clock_subset_present);
        assert!(!header.code_bias_present);
        assert!(header.phase_bias_present);
        assert_eq!(header.mask_id, 5);
        assert_eq!(header.iod_set_id, 9);
    }

    #[test]
    fn empty_decoder_returns_no_messages() {
        let mut decoder = Decoder::default();
        let result = decoder.update(0, &[]);
        assert!(result.is_empty());
    }
}
