//! Second pass: resolves symbolic operands, completes the words the first
//! pass reserved, collects entry points and external references, and emits
//! the output listings.
//!
//! The pass re-reads the expanded source only to walk it line by line in
//! step with the instruction metadata; all validation already happened in
//! the first pass, and nothing is emitted unless this pass is clean too.

use crate::lex::{parse_number, Cursor};
use crate::shared::{InstData, Shared};
use crate::symtable::SymbolTable;
use crate::{Error, LineResult, Rejected, Result};
use obfile::{EntryPoint, ExternalRef, Listing};
use rm20::*;
use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

const PASS: &str = "secondpass";

/// Listings collected on top of the completed code segment.
#[derive(Debug, Default)]
pub struct Artifacts {
    /// Symbols exported with `.entry`, in source order.
    pub entrypoints: Vec<EntryPoint>,
    /// Code words referencing external symbols, in completion order.
    pub externals: Vec<ExternalRef>,
}

/// Internal state for the second pass.
#[derive(Default)]
struct State {
    /// Current line number, reported in diagnostics.
    line_no: u32,
    /// Index of the next instruction to complete.
    instruction_index: usize,
    artifacts: Artifacts,
}

/// Completes the reserved words of one instruction. For every operand that
/// recorded a label, the words at `address + 2` and `address + 3` receive
/// the symbol's base address and offset, flagged R for local symbols and E
/// for external ones.
fn complete_instruction(
    st: &mut State,
    symtable: &SymbolTable,
    data: &InstData,
    code_seg: &mut [Word],
) -> LineResult {
    // Segment index of the instruction's first word.
    let base = (data.address - CODE_BASE_ADDR) as usize;

    for i in 0..data.num_operands {
        let label = &data.operand_symbols[i];
        if label.is_empty() {
            continue;
        }

        let sym = match symtable.find(label) {
            Some(sym) => sym,
            None => {
                line_error!(
                    PASS,
                    st.line_no,
                    "could not find symbol {} referenced by operand #{}.",
                    label,
                    i + 1
                );
                return Err(Rejected);
            }
        };

        let linkage = if sym.ext {
            Linkage::External
        } else {
            Linkage::Relocatable
        };

        code_seg[base + 2] = make_extra_inst_word(sym.base_addr, linkage);
        code_seg[base + 3] = make_extra_inst_word(sym.offset, linkage);

        if sym.ext {
            st.artifacts.externals.push(ExternalRef {
                label: label.clone(),
                base_word_addr: data.address + 2,
                offset_word_addr: data.address + 3,
            });
        }
    }

    Ok(())
}

/// Process a line of expanded assembly code.
fn process_line(st: &mut State, shared: &mut Shared, line: &str) -> LineResult {
    st.line_no += 1;

    let mut cursor = Cursor::new(line);
    let mut field = cursor.next_field();

    if field.is_empty() {
        return Ok(());
    }

    if field.starts_with(';') {
        if let Some(reset) = field.strip_prefix(";#").and_then(parse_number) {
            st.line_no = reset as u32;
        }
        return Ok(());
    }

    if field.ends_with(':') {
        // The first pass already validated the label.
        field = cursor.next_field();
        if field.is_empty() {
            return Ok(());
        }
    }

    if let Some(directive) = field.strip_prefix('.') {
        if directive != "entry" {
            // Side effects of the other directives were applied in the
            // first pass.
            return Ok(());
        }

        let label = cursor.next_field();
        if label.is_empty() {
            line_error!(PASS, st.line_no, "missing symbol name in .entry directive.");
            return Err(Rejected);
        }

        let sym = match shared.symtable.find(label) {
            Some(sym) => sym,
            None => {
                line_error!(PASS, st.line_no, "could not find symbol {} in symbol table.", label);
                return Err(Rejected);
            }
        };

        st.artifacts.entrypoints.push(EntryPoint {
            label: label.to_owned(),
            base_addr: sym.base_addr,
            offset: sym.offset,
        });

        Ok(())
    } else {
        let index = st.instruction_index;
        st.instruction_index += 1;

        let data = match shared.instructions.get(index) {
            Some(data) => data,
            None => {
                line_error!(PASS, st.line_no, "statement was not seen by the first pass.");
                return Err(Rejected);
            }
        };

        complete_instruction(st, &shared.symtable, data, &mut shared.code_seg)
    }
}

/// Runs the second pass over preprocessed source, completing the code
/// segment in `shared`. Returns the collected artifacts and the number of
/// rejected lines.
pub fn secondpass<R: BufRead>(mut input: R, shared: &mut Shared) -> io::Result<(Artifacts, u32)> {
    let mut st = State::default();
    let mut errors = 0;
    let mut line = String::new();

    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        if process_line(&mut st, shared, &line).is_err() {
            errors += 1;
        }
    }

    Ok((st.artifacts, errors))
}

/// Runs the second pass over `infile` and, when it is clean, writes the
/// object listing and any entry point and external reference listings.
pub fn secondpass_file(
    infile: &Path,
    obfile_path: &Path,
    entfile: &Path,
    extfile: &Path,
    shared: &mut Shared,
) -> Result<()> {
    let input = File::open(infile).map_err(|err| Error::Io(infile.to_owned(), err))?;
    let (artifacts, errors) =
        secondpass(BufReader::new(input), shared).map_err(|err| Error::Io(infile.to_owned(), err))?;

    if errors > 0 {
        return Err(Error::BadSource(errors));
    }

    if !artifacts.entrypoints.is_empty() {
        obfile::write_entries_file(entfile, &artifacts.entrypoints)
            .map_err(|err| Error::Io(entfile.to_owned(), err))?;
    }

    if !artifacts.externals.is_empty() {
        obfile::write_externals_file(extfile, &artifacts.externals)
            .map_err(|err| Error::Io(extfile.to_owned(), err))?;
    }

    let listing = Listing::copy_from(&shared.code_seg, &shared.data_seg);
    obfile::write_listing_file(obfile_path, &listing)
        .map_err(|err| Error::Io(obfile_path.to_owned(), err))?;

    Ok(())
}
