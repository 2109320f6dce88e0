use galileo_has::{assembler::Assembler, corrections::Correction, decoder::Decoder, page::Page};
use std::mem::size_of;

fn main() {
    dbg!(size_of::<Decoder>());
    dbg!(size_of::<Assembler>());
    dbg!(size_of::<Page>());
    dbg!(size_of::<Correction>());
}
