//! Galileo High Accuracy Service (HAS) correction stream decoder.
//!
//! This crate assembles HAS pages carried inside Galileo E6-B CNAV pages
//! into logical messages, recovers each message from partial page sets via
//! RS(255,32) erasure decoding over GF(2^8), and interprets MT1 message
//! bodies into typed orbit, clock, code-bias, and phase-bias correction
//! records.
//!
//! The entry point for a host application is [`decoder::Decoder`]: feed it
//! per-epoch batches of CRC-passed CNAV pages via
//! [`decoder::Decoder::update`], and collect the [`decoder::DecodedMessage`]
//! values it returns.

pub mod assembler;
pub mod bitreader;
pub mod corrections;
pub mod decoder;
pub mod error;
pub mod gf256;
pub mod mask;
pub mod page;
pub mod rs_matrix;
pub mod types;

pub use decoder::Decoder;
pub use error::DecodeError;
