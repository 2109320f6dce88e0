//! Raw HAS page extraction from receiver words.
//!
//! A HAS page is carried inside a Galileo E6-B CNAV page, which the
//! receiver adapter hands to the core as 16 big-endian 32-bit words. This
//! module slices those words into the 24-bit page header and the 53-byte
//! page body, following the bit layout fixed by the ICD (reproduced in full
//! here rather than re-derived from any single receiver's byte-shuffling
//! convention).

use crate::error::DecodeError;
use crate::types::{CNAV_WORDS_PER_PAGE, DUMMY_PAGE_HEADER, HAS_PAGE_BODY_BYTES};
use bitvec::prelude::*;

/// The header fields of a HAS page, extracted from the first 24 bits of
/// the CNAV page.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PageHeader {
    /// Message type (0..3). Only `1` (MT1) is interpreted further.
    pub mtype: u8,
    /// Message ID (0..31).
    pub id: u8,
    /// Message size in pages (1..32).
    pub size: u8,
    /// Page ID (0..255).
    pub page_id: u8,
}

/// A single decoded HAS page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Header fields extracted alongside the body.
    pub header: PageHeader,
    /// The 53 payload bytes of the page.
    pub body: [u8; HAS_PAGE_BODY_BYTES],
}

impl Page {
    /// Extracts a [`Page`] from 16 big-endian 32-bit CNAV words.
    ///
    /// The caller is expected to have already checked `crc_passed` for this
    /// epoch's page; this function only rejects the reserved dummy header
    /// value `0xAF3BC3`, matching the filtering policy of the core (status
    /// bits are left for the adapter to interpret; see
    /// [`DecodeError::UnknownStatus`]).
    pub fn from_words(words: &[u32; CNAV_WORDS_PER_PAGE]) -> Result<Self, DecodeError> {
        let mut buf = [0u8; CNAV_WORDS_PER_PAGE * 4];
        for (i, w) in words.iter().enumerate() {
            buf[i * 4..i * 4 + 4].copy_from_slice(&w.to_be_bytes());
        }
        let bits = BitSlice::<u8, Msb0>::from_slice(&buf);

        let header_bits = &bits[0..24];
        let raw_header: u32 = header_bits.load_be();
        if raw_header == DUMMY_PAGE_HEADER {
            return Err(DecodeError::DummyHasPage);
        }

        let mtype = ((raw_header >> 18) & 0x3) as u8;
        let id = ((raw_header >> 13) & 0x1F) as u8;
        let size = (((raw_header >> 8) & 0x1F) + 1) as u8;
        let page_id = (raw_header & 0xFF) as u8;

        let body_bits = &bits[24..24 + HAS_PAGE_BODY_BYTES * 8];
        let mut body = [0u8; HAS_PAGE_BODY_BYTES];
        for (i, byte_bits) in body_bits.chunks(8).enumerate() {
            body[i] = byte_bits.load_be();
        }

        Ok(Page {
            header: PageHeader {
                mtype,
                id,
                size,
                page_id,
            },
            body,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode_words(header: u32, body: &[u8; HAS_PAGE_BODY_BYTES]) -> [u32; CNAV_WORDS_PER_PAGE] {
        let mut buf = [0u8; CNAV_WORDS_PER_PAGE * 4];
        {
            let bits = BitSlice::<u8, Msb0>::from_slice_mut(&mut buf);
            bits[0..24].store_be(header);
            let body_bits = &mut bits[24..24 + HAS_PAGE_BODY_BYTES * 8];
            for (i, chunk) in body_bits.chunks_mut(8).enumerate() {
                chunk.store_be(body[i]);
            }
        }
        let mut words = [0u32; CNAV_WORDS_PER_PAGE];
        for (i, w) in words.iter_mut().enumerate() {
            *w = u32::from_be_bytes(buf[i * 4..i * 4 + 4].try_into().unwrap());
        }
        words
    }

    #[test]
    fn extracts_header_fields() {
        // mtype=1, id=5, size-1=9 (size=10), page_id=200
        let header = (1u32 << 18) | (5u32 << 13) | (9u32 << 8) | 200u32;
        let body = [0xAAu8; HAS_PAGE_BODY_BYTES];
        let words = encode_words(header, &body);
        let page = Page::from_words(&words).unwrap();
        assert_eq!(page.header.mtype, 1);
        assert_eq!(page.header.id, 5);
        assert_eq!(page.header.size, 10);
        assert_eq!(page.header.page_id, 200);
        assert_eq!(page.body, body);
    }

    #[test]
    fn dummy_page_is_rejected() {
        let body = [0u8; HAS_PAGE_BODY_BYTES];
        let words = encode_words(DUMMY_PAGE_HEADER, &body);
        assert_eq!(Page::from_words(&words), Err(DecodeError::DummyHasPage));
    }
}
