//! Decoder error types.
//!
//! This module contains the error types produced by the different stages of
//! the HAS decoding pipeline. Following the error handling policy of the
//! system, all of these are recoverable at the epoch or message-block level:
//! none of them should cause a host application to abort a run.

use core::fmt;

/// Errors that can occur while decoding a HAS correction stream.
///
/// All the variants here are transient: the decoder recovers from them by
/// discarding the smallest unit of work that triggered the error (a page, a
/// correction block, or a whole message) and continuing with the next one.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum DecodeError {
    /// The CRC check on a raw navigation page did not pass.
    CrcFailed,
    /// The page header matched the reserved dummy HAS page marker
    /// (`0xAF3BC3`).
    DummyHasPage,
    /// The page status bits held a value the receiver adapter does not
    /// recognize.
    ///
    /// The core itself only filters on [`DecodeError::DummyHasPage`] and
    /// [`DecodeError::CrcFailed`]; this variant exists for adapters that want
    /// to reuse the same error type when filtering on status bits extracted
    /// from [`Page`](crate::page::PageHeader).
    UnknownStatus(u8),
    /// A bit-stream read would have run past the end of the buffer.
    BitOverrun,
    /// A clock-subset correction named a `gnss_id` for which no retained mask
    /// exists.
    MissingMask(u8),
    /// An orbit correction named a `gnss_id` other than GPS or Galileo, for
    /// which the width of the `gnss_iod` field is not defined.
    UnsupportedGnss(u8),
    /// The reduced encoding submatrix selected by a set of page IDs was not
    /// invertible over GF(2^8).
    ///
    /// This should never happen for page IDs drawn from a genuine RS(255,32)
    /// codeword, since the code is MDS.
    SingularMatrix,
    /// A message was evicted because it aged out before it could be
    /// completed.
    IncompleteExpired,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::CrcFailed => "CRC check failed on raw page".fmt(f),
            DecodeError::DummyHasPage => "page header matches the reserved dummy marker".fmt(f),
            DecodeError::UnknownStatus(s) => write!(f, "unrecognized page status {}", s),
            DecodeError::BitOverrun => "bit-stream read past end of buffer".fmt(f),
            DecodeError::MissingMask(id) => {
                write!(f, "no retained mask for gnss_id {}", id)
            }
            DecodeError::UnsupportedGnss(id) => write!(f, "unsupported gnss_id {}", id),
            DecodeError::SingularMatrix => {
                "reduced Reed-Solomon encoding matrix is singular".fmt(f)
            }
            DecodeError::IncompleteExpired => {
                "message aged out before it could be completed".fmt(f)
            }
        }
    }
}

impl std::error::Error for DecodeError {}
