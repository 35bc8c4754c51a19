//! Machine definition for the RM-20, a small register machine with a 20-bit
//! word, sixteen general purpose registers (`r0`-`r15`) and sixteen
//! instructions.
//!
//! This crate knows nothing about source text or files. It provides the
//! [`Word`](type.Word.html) type, the bit layout of encoded words
//! ([`constants`](constants/index.html)), the instruction set catalog
//! ([`find_inst`](fn.find_inst.html)) and the functions that build encoded
//! words. The assembler in the `rasm` crate drives all of it.

pub mod constants;
pub mod instructions;

pub use crate::constants::*;
pub use crate::instructions::*;

/// Machine word. Only the low 20 bits are meaningful; a signed 32-bit
/// integer holds them with room to spare.
pub type Word = i32;
