//! Two-pass assembler for the [rm20](../rm20/index.html) register machine.
//!
//! The assembler takes a source listing (an `.as` file), expands its macros
//! into an `.am` file on disk, and translates the expanded text in two
//! passes into an object listing (`.ob`) plus, when the source asks for
//! them, an entry point listing (`.ent`) and an external reference listing
//! (`.ext`). The listing formats live in the [obfile](../obfile/index.html)
//! crate.
//!
//! # RM-20 Assembly Language
//!
//! One statement per line, at most 80 characters per line. A line is either
//! blank, a comment (first non-blank character `;`), a directive, or an
//! instruction; directives and instructions may be preceded by a label
//! (up to 31 alphanumeric characters followed by `:`).
//!
//! ## Directives
//!
//! Directive | Description | Example
//! ----------|-------------|--------
//! `.data`   | a comma separated list of decimal integers, one data word each | `.data 7, -3, 12`
//! `.string` | a double quoted string, one data word per character plus a zero terminator | `.string "hello"`
//! `.extern` | declares a label that another program unit defines | `.extern PrintFn`
//! `.entry`  | exports a label defined in this file | `.entry MAIN`
//!
//! ## Instructions
//!
//! Sixteen mnemonics: `mov`, `cmp`, `add`, `sub`, `lea` (two operands),
//! `clr`, `not`, `inc`, `dec`, `jmp`, `bne`, `jsr`, `red`, `prn` (one
//! operand) and `rts`, `stop` (none). Operands are separated by commas and
//! written in one of four addressing modes:
//!
//! Mode            | Syntax       | Example
//! ----------------|--------------|--------
//! immediate       | `#N`         | `mov #-1, r2`
//! direct          | `label`      | `jmp Loop`
//! index           | `label[rK]`  | `mov Table[r3], r0`
//! register direct | `rK`         | `add r1, r2`
//!
//! Registers are `r0` through `r15`. Which modes each operand position
//! accepts is listed in the [instruction catalog](../rm20/instructions/index.html).
//!
//! ## Macros
//!
//! A macro names a block of lines and is expanded wherever its name appears
//! as the first field of a line:
//!
//! ```text
//! macro countdown
//!     dec r1
//!     bne Loop
//! endm
//! ```
//!
//! Macros are pure text; their bodies are copied into the expanded file
//! verbatim.
//!
//! ## Diagnostics
//!
//! Every rejected line produces one diagnostic on standard output carrying
//! the pass name and the line number in the original source file. A file
//! with rejected lines produces no output artifacts.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Prints a diagnostic for an offending source line.
macro_rules! line_error {
    ($pass:expr, $line:expr, $($arg:tt)*) => {
        println!("{}: error: line {}: {}", $pass, $line, format_args!($($arg)*))
    };
}

mod firstpass;
mod lex;
mod preprocessor;
mod secondpass;
mod shared;
mod symtable;

#[cfg(test)]
mod test;

pub use crate::firstpass::{firstpass, firstpass_file};
pub use crate::preprocessor::{preprocess, preprocess_file};
pub use crate::secondpass::{secondpass, secondpass_file, Artifacts};
pub use crate::shared::{InstData, Shared};
pub use crate::symtable::{Symbol, SymbolTable};

/// Marker for a source line that was rejected. The diagnostic has already
/// been printed when this value is constructed.
pub(crate) struct Rejected;

pub(crate) type LineResult = std::result::Result<(), Rejected>;

/// Error produced while assembling one input file.
#[derive(Debug)]
pub enum Error {
    /// The file could not be opened, read or written.
    Io(PathBuf, io::Error),
    /// Lines were rejected by a pass; diagnostics went to standard output.
    BadSource(u32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(path, err) => write!(f, "{}: {}", path.display(), err),
            Error::BadSource(errors) => {
                write!(f, "{} line(s) rejected, see diagnostics above", errors)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
