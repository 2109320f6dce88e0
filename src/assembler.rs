//! Per-message page assembly and Reed-Solomon recovery.
//!
//! An [`Assembler`] accumulates the distinct pages of one logical HAS
//! message (identified by message type, ID, and size) until enough of them
//! have arrived to invert the reduced RS(255,32) encoding submatrix and
//! recover the original message bytes.

use crate::error::DecodeError;
use crate::page::{Page, PageHeader};
use crate::rs_matrix;
use crate::types::HAS_PAGE_BODY_BYTES;

/// Age, in epochs, after which an incomplete assembler is evicted.
pub const LIMIT_AGE: u32 = 120;

/// State of an [`Assembler`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AssemblerState {
    /// No pages received yet.
    Empty,
    /// Some but not all pages received.
    Partial,
    /// All `size` distinct pages received; ready to decode.
    Complete,
}

/// Identity of a logical HAS message: message type, ID, and declared size.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct MessageKey {
    pub mtype: u8,
    pub id: u8,
    pub size: u8,
}

/// Accumulates distinct pages for one logical HAS message.
#[derive(Debug, Clone)]
pub struct Assembler {
    key: MessageKey,
    page_ids: Vec<u8>,
    bodies: Vec<[u8; HAS_PAGE_BODY_BYTES]>,
    age: u32,
}

impl Assembler {
    /// Creates a new, empty assembler for the given message identity.
    pub fn new(key: MessageKey) -> Self {
        Assembler {
            key,
            page_ids: Vec::with_capacity(usize::from(key.size)),
            bodies: Vec::with_capacity(usize::from(key.size)),
            age: 0,
        }
    }

    /// The identity of the message this assembler is collecting.
    pub fn key(&self) -> MessageKey {
        self.key
    }

    /// Current number of distinct pages collected.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Current age in epochs since the last update (including duplicates).
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Current assembly state.
    pub fn state(&self) -> AssemblerState {
        if self.page_ids.is_empty() {
            AssemblerState::Empty
        } else if self.page_ids.len() == usize::from(self.key.size) {
            AssemblerState::Complete
        } else {
            AssemblerState::Partial
        }
    }

    /// Adds a page to the assembler if it belongs to this message and is
    /// not a duplicate.
    ///
    /// Returns `true` iff the page was newly added. The age is reset to
    /// zero on any call that targets this message, whether or not the page
    /// was a duplicate, matching the reference decoder's behavior of
    /// resetting age before checking for duplication.
    pub fn add_page(&mut self, header: &PageHeader, body: &[u8; HAS_PAGE_BODY_BYTES]) -> bool {
        debug_assert_eq!(header.mtype, self.key.mtype);
        debug_assert_eq!(header.id, self.key.id);
        debug_assert_eq!(header.size, self.key.size);
        self.age = 0;
        if self.page_ids.len() == usize::from(self.key.size) {
            return false;
        }
        if self.page_ids.contains(&header.page_id) {
            return false;
        }
        self.page_ids.push(header.page_id);
        self.bodies.push(*body);
        true
    }

    /// Increments the age by one epoch.
    pub fn increase_age(&mut self) {
        self.age += 1;
    }

    /// Whether this assembler has aged past [`LIMIT_AGE`] without
    /// completing.
    pub fn is_expired(&self) -> bool {
        self.age > LIMIT_AGE
    }

    /// Runs RS erasure decoding, recovering the original message bytes.
    ///
    /// Only defined in the [`AssemblerState::Complete`] state and only for
    /// `mtype == 1` (MT1); other message types have no defined decoding.
    pub fn decode(&self) -> Result<Vec<u8>, DecodeError> {
        assert_eq!(self.state(), AssemblerState::Complete);
        let size = usize::from(self.key.size);
        let rows: Vec<Vec<u8>> = self.bodies.iter().map(|b| b.to_vec()).collect();
        let decoded = rs_matrix::decode(&self.page_ids, &rows, size, HAS_PAGE_BODY_BYTES)?;
        Ok(decoded.into_iter().flatten().collect())
    }
}

impl Page {
    /// Convenience accessor used by the assembler table to group pages by
    /// message identity.
    pub fn message_key(&self) -> MessageKey {
        MessageKey {
            mtype: self.header.mtype,
            id: self.header.id,
            size: self.header.size,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn key() -> MessageKey {
        MessageKey {
            mtype: 1,
            id: 3,
            size: 2,
        }
    }

    fn header(page_id: u8) -> PageHeader {
        PageHeader {
            mtype: 1,
            id: 3,
            size: 2,
            page_id,
        }
    }

    #[test]
    fn duplicate_add_is_idempotent() {
        let mut asm = Assembler::new(key());
        let body = [0x11u8; HAS_PAGE_BODY_BYTES];
        assert!(asm.add_page(&header(5), &body));
        assert_eq!(asm.page_count(), 1);
        assert!(!asm.add_page(&header(5), &body));
        assert_eq!(asm.page_count(), 1);
    }

    #[test]
    fn age_resets_on_update_and_grows_otherwise() {
        let mut asm = Assembler::new(key());
        asm.increase_age();
        asm.increase_age();
        assert_eq!(asm.age(), 2);
        let body = [0u8; HAS_PAGE_BODY_BYTES];
        asm.add_page(&header(1), &body);
        assert_eq!(asm.age(), 0);
    }

    #[test]
    fn becomes_complete_after_size_distinct_pages() {
        let mut asm = Assembler::new(key());
        let body = [0u8; HAS_PAGE_BODY_BYTES];
        assert_eq!(asm.state(), AssemblerState::Empty);
        asm.add_page(&header(1), &body);
        assert_eq!(asm.state(), AssemblerState::Partial);
        asm.add_page(&header(2), &body);
        assert_eq!(asm.state(), AssemblerState::Complete);
    }

    #[test]
    fn expires_past_limit_age() {
        let mut asm = Assembler::new(key());
        for _ in 0..=LIMIT_AGE {
            asm.increase_age();
        }
        assert!(asm.is_expired());
    }
}
