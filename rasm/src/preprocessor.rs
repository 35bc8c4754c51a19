//! Macro expansion.
//!
//! The preprocessor reads the raw source line by line and writes an expanded
//! copy in which every macro reference is replaced by the macro's body and
//! every `macro` ... `endm` block is removed. Wherever the output's line
//! numbering diverges from the source, a `;#N` marker comment is written so
//! the passes can keep reporting errors against the original file.

use crate::lex::{is_whitespace_string, Cursor};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;

const PASS: &str = "preprocess";

enum State {
    Outside,
    Collecting { name: String, body: String },
}

/// Expands all macros in `input`, writing the expanded text to `output`.
/// Input without macros passes through unchanged.
pub fn preprocess<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<()> {
    let mut macro_table: HashMap<String, String> = HashMap::new();
    let mut state = State::Outside;
    let mut line = String::new();
    let mut line_no = 0u32;

    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        line_no += 1;

        let mut cursor = Cursor::new(&line);
        let field = cursor.next_field();

        state = match state {
            State::Collecting { name, mut body } => {
                if field == "endm" {
                    macro_table.insert(name, body);
                    // The definition block leaves no lines in the output.
                    writeln!(output, ";#{}", line_no)?;
                    State::Outside
                } else {
                    body.push_str(&line);
                    State::Collecting { name, body }
                }
            }

            State::Outside => {
                if field == "macro" {
                    let name = cursor.next_field();
                    if name.is_empty() {
                        println!("{}: line {}: macro missing name, ignoring line.", PASS, line_no);
                        writeln!(output, ";#{}", line_no)?;
                        State::Outside
                    } else if !is_whitespace_string(cursor.rest()) {
                        println!(
                            "{}: line {}: extraneous text after macro name, ignoring line.",
                            PASS, line_no
                        );
                        writeln!(output, ";#{}", line_no)?;
                        State::Outside
                    } else {
                        State::Collecting {
                            name: name.to_owned(),
                            body: String::new(),
                        }
                    }
                } else if let Some(body) = macro_table.get(field) {
                    output.write_all(body.as_bytes())?;
                    writeln!(output, ";#{}", line_no)?;
                    State::Outside
                } else {
                    output.write_all(line.as_bytes())?;
                    State::Outside
                }
            }
        };
    }

    // A macro left open at end of file is discarded.
    Ok(())
}

/// Preprocesses `infile` into `outfile`.
pub fn preprocess_file(infile: &Path, outfile: &Path) -> Result<()> {
    let input = File::open(infile).map_err(|err| Error::Io(infile.to_owned(), err))?;
    let output = File::create(outfile).map_err(|err| Error::Io(outfile.to_owned(), err))?;

    let mut writer = BufWriter::new(output);
    preprocess(BufReader::new(input), &mut writer)
        .and_then(|_| writer.flush())
        .map_err(|err| Error::Io(outfile.to_owned(), err))
}
