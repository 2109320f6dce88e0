//! Types used throughout the galileo_has crate.

/// A slice of bits.
///
/// A [`BitSlice`](bitvec::slice::BitSlice) from the `bitvec` crate used to
/// represent binary data that is not byte aligned within its containing
/// message.
///
/// The HAS message body is transmitted most-significant-bit first within
/// each byte, so we use the [`Msb0`](bitvec::order::Msb0) ordering.
pub type BitSlice = bitvec::slice::BitSlice<u8, bitvec::order::Msb0>;

/// Number of 32-bit words in a raw CNAV page as delivered by the receiver.
pub const CNAV_WORDS_PER_PAGE: usize = 16;

/// Number of bytes in the HAS message body carried by a single page.
pub const HAS_PAGE_BODY_BYTES: usize = 53;

/// Number of bits in the HAS page header (message type, ID, size, page ID).
pub const HAS_PAGE_HEADER_BITS: usize = 24;

/// Maximum number of pages in a HAS message (the dimension of the
/// RS(255,32) code).
pub const HAS_MAX_PAGES: usize = 32;

/// Reserved page header value that identifies a "dummy" HAS page, i.e. one
/// carrying no useful correction data.
pub const DUMMY_PAGE_HEADER: u32 = 0xAF3BC3;

/// Time of week, in seconds, as reported by the navigation message carrying
/// a page.
pub type TimeOfWeek = u32;
