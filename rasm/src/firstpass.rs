//! First pass: lexes and validates each line of the expanded source, lays
//! out the code and data segments, partially encodes instructions, and
//! builds the symbol table.
//!
//! Words an instruction owes to a symbolic operand are reserved here as
//! zeros and completed by the second pass. Data symbols get provisional
//! addresses counted from zero; once the code segment length is known they
//! are rebased so the data segment follows the code segment.

use crate::lex::{is_eol, parse_number, Cursor};
use crate::shared::{InstData, Shared};
use crate::{Error, LineResult, Rejected, Result};
use matches::debug_assert_matches;
use rm20::*;
use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

const PASS: &str = "firstpass";

/// Internal state for the first pass.
struct State {
    /// Instruction counter.
    ic: Word,
    /// Current line number, reported in diagnostics.
    line_no: u32,
    /// Label of the current line, when it has one.
    label: Option<String>,
    /// Labels of data symbols, rebased at the end of the pass.
    data_symbols: Vec<String>,
}

/// A parsed instruction operand.
#[derive(Debug, PartialEq)]
enum Operand {
    Immediate(Word),
    Direct(String),
    Index(String, Word),
    RegisterDirect(Word),
}

impl Operand {
    fn mode(&self) -> AddressingMode {
        match self {
            Operand::Immediate(_) => AddressingMode::Immediate,
            Operand::Direct(_) => AddressingMode::Direct,
            Operand::Index(_, _) => AddressingMode::Index,
            Operand::RegisterDirect(_) => AddressingMode::RegisterDirect,
        }
    }

    /// Register stored in the register/funct word; 0 when the operand has
    /// none.
    fn register(&self) -> Word {
        match *self {
            Operand::Index(_, reg) | Operand::RegisterDirect(reg) => reg,
            _ => 0,
        }
    }

    /// Label the operand references; empty for non-symbolic operands.
    fn label(&self) -> &str {
        match self {
            Operand::Direct(label) | Operand::Index(label, _) => label,
            _ => "",
        }
    }
}

/// Outcome of scanning a single operand token.
enum OperandScan {
    /// A well formed operand.
    Operand(Operand),
    /// The token was not a valid operand; a diagnostic was printed.
    Bad,
    /// The token was blank.
    Empty,
}

/// Processes the first field of a labeled line. On success the label is
/// remembered in the state for the statement handlers.
fn process_label_field(st: &mut State, shared: &Shared, field: &str) -> LineResult {
    let label = &field[..field.len() - 1]; // drop the ':'

    if label.is_empty() {
        line_error!(PASS, st.line_no, "label is empty.");
        return Err(Rejected);
    }

    if label.chars().count() > MAX_LABEL_LENGTH {
        line_error!(
            PASS,
            st.line_no,
            "label is too long (max number of characters in a label is {}).",
            MAX_LABEL_LENGTH
        );
        return Err(Rejected);
    }

    if let Some(c) = label.chars().find(|c| !c.is_ascii_alphanumeric()) {
        line_error!(
            PASS,
            st.line_no,
            "invalid character '{}' in label (only alphanumeric characters allowed)",
            c
        );
        return Err(Rejected);
    }

    if shared.symtable.find(label).is_some() {
        line_error!(PASS, st.line_no, "label {} already defined.", label);
        return Err(Rejected);
    }

    st.label = Some(label.to_owned());
    Ok(())
}

/// Defines a code symbol for the current line's label, if any. The label was
/// checked against the table when it was read, so the definition cannot
/// clash.
fn define_label(st: &State, shared: &mut Shared, addr: Word) {
    if let Some(label) = &st.label {
        if let Some(sym) = shared.symtable.define(label) {
            sym.set_address(addr);
        }
    }
}

/// Appends one word to the code segment and advances the instruction
/// counter.
fn push_code_word(st: &mut State, shared: &mut Shared, word: Word) -> LineResult {
    if shared.code_seg.len() >= MAX_CODE_SEGMENT_LEN {
        line_error!(PASS, st.line_no, "code segment overflow.");
        return Err(Rejected);
    }
    shared.code_seg.push(word);
    st.ic += 1;
    Ok(())
}

/// Reserves zeroed code words to be completed by the second pass.
fn reserve_code_words(st: &mut State, shared: &mut Shared, count: usize) -> LineResult {
    if shared.code_seg.len() + count > MAX_CODE_SEGMENT_LEN {
        line_error!(PASS, st.line_no, "code segment overflow.");
        return Err(Rejected);
    }
    shared.code_seg.resize(shared.code_seg.len() + count, 0);
    st.ic += count as Word;
    Ok(())
}

/// Process data after a `.data` directive.
fn process_data_directive(st: &mut State, shared: &mut Shared, rest: &str) -> LineResult {
    let rest = rest.trim();
    if rest.is_empty() {
        line_error!(PASS, st.line_no, "missing data after data directive.");
        return Err(Rejected);
    }

    let start = shared.data_seg.len();

    for tok in rest.split(',') {
        let value = match parse_number(tok) {
            Some(value) => value,
            None => {
                line_error!(PASS, st.line_no, "invalid data after data directive.");
                shared.data_seg.truncate(start);
                return Err(Rejected);
            }
        };

        if shared.data_seg.len() >= MAX_DATA_SEGMENT_LEN {
            line_error!(PASS, st.line_no, "data overflow; no more room in data segment.");
            shared.data_seg.truncate(start);
            return Err(Rejected);
        }

        shared.data_seg.push(make_data_word(value));
    }

    if let Some(label) = st.label.clone() {
        if let Some(sym) = shared.symtable.define(&label) {
            sym.set_address(start as Word);
        }
        st.data_symbols.push(label);
    }

    Ok(())
}

/// Process data after a `.string` directive.
fn process_string_directive(st: &mut State, shared: &mut Shared, rest: &str) -> LineResult {
    let rest = rest.trim_start();
    if rest.is_empty() {
        line_error!(PASS, st.line_no, "missing string data after string directive.");
        return Err(Rejected);
    }

    let body = match rest.strip_prefix('"') {
        Some(body) => body,
        None => {
            line_error!(PASS, st.line_no, "string data missing opening double quotes.");
            return Err(Rejected);
        }
    };

    let start = shared.data_seg.len();
    let mut closed = false;

    for c in body.chars() {
        if c == '"' {
            closed = true;
            break;
        }
        if is_eol(c) {
            break;
        }
        if shared.data_seg.len() >= MAX_DATA_SEGMENT_LEN {
            line_error!(PASS, st.line_no, "data overflow; no more room in data segment.");
            shared.data_seg.truncate(start);
            return Err(Rejected);
        }
        shared.data_seg.push(make_data_word(c as Word));
    }

    if !closed {
        line_error!(PASS, st.line_no, "string data missing closing double quotes.");
        shared.data_seg.truncate(start);
        return Err(Rejected);
    }

    if shared.data_seg.len() >= MAX_DATA_SEGMENT_LEN {
        line_error!(PASS, st.line_no, "data overflow; no more room in data segment.");
        shared.data_seg.truncate(start);
        return Err(Rejected);
    }
    shared.data_seg.push(make_data_word(0)); // terminator

    if let Some(label) = st.label.clone() {
        if let Some(sym) = shared.symtable.define(&label) {
            sym.set_address(start as Word);
        }
        st.data_symbols.push(label);
    }

    Ok(())
}

/// Process a `.extern` directive.
fn process_extern_directive(st: &mut State, shared: &mut Shared, cursor: &mut Cursor) -> LineResult {
    let label = cursor.next_field();
    if label.is_empty() {
        line_error!(PASS, st.line_no, ".extern directive missing label reference.");
        return Err(Rejected);
    }

    match shared.symtable.define(label) {
        Some(sym) => {
            sym.ext = true;
            Ok(())
        }
        None => {
            line_error!(PASS, st.line_no, "label {} already defined.", label);
            Err(Rejected)
        }
    }
}

fn parse_operand(st: &mut State, tok: &str) -> OperandScan {
    let tok = tok.trim();
    if tok.is_empty() {
        return OperandScan::Empty;
    }

    if let Some(imm) = tok.strip_prefix('#') {
        return match parse_number(imm) {
            Some(value) => OperandScan::Operand(Operand::Immediate(value)),
            None => {
                line_error!(PASS, st.line_no, "could not parse immediate number in operand.");
                OperandScan::Bad
            }
        };
    }

    if let Some(reg_tok) = tok.strip_prefix('r') {
        if let Some(reg) = parse_number(reg_tok) {
            if reg < 0 || reg >= REGISTER_COUNT {
                line_error!(
                    PASS,
                    st.line_no,
                    "register value out of range: {} (must be between 0 and {})",
                    reg,
                    REGISTER_COUNT - 1
                );
                return OperandScan::Bad;
            }
            return OperandScan::Operand(Operand::RegisterDirect(reg));
        }
    }

    // Direct or index mode: a label, optionally subscripted by a register.
    let end = tok
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or_else(|| tok.len());
    let label = &tok[..end];
    let rest = &tok[end..];

    if label.chars().count() > MAX_LABEL_LENGTH {
        line_error!(PASS, st.line_no, "label too long.");
        return OperandScan::Bad;
    }

    if let Some(c) = rest.chars().next() {
        if !c.is_whitespace() && c != '[' {
            line_error!(
                PASS,
                st.line_no,
                "invalid label (non-alphanumeric character: '{}').",
                c
            );
            return OperandScan::Bad;
        }
    }

    if label.is_empty() {
        line_error!(PASS, st.line_no, "label is empty.");
        return OperandScan::Bad;
    }

    let rest = rest.trim_start();
    if rest.is_empty() {
        return OperandScan::Operand(Operand::Direct(label.to_owned()));
    }

    if !rest.starts_with('[') {
        line_error!(PASS, st.line_no, "direct addressing operand has extraneous characters.");
        return OperandScan::Bad;
    }

    // Register subscript.
    let close = match rest.find(']') {
        Some(close) => close,
        None => {
            line_error!(PASS, st.line_no, "could not read register value from brackets.");
            return OperandScan::Bad;
        }
    };

    let reg = match rest[1..close].trim().strip_prefix('r').and_then(parse_number) {
        Some(reg) => reg,
        None => {
            line_error!(PASS, st.line_no, "could not read register value from brackets.");
            return OperandScan::Bad;
        }
    };

    if reg < 0 || reg >= REGISTER_COUNT {
        line_error!(
            PASS,
            st.line_no,
            "register value out of range: {} (must be between 0 and {})",
            reg,
            REGISTER_COUNT - 1
        );
        return OperandScan::Bad;
    }

    if !crate::lex::is_whitespace_string(&rest[close + 1..]) {
        line_error!(PASS, st.line_no, "extraneous characters after register subscript.");
        return OperandScan::Bad;
    }

    OperandScan::Operand(Operand::Index(label.to_owned(), reg))
}

/// Splits the remainder of the line on commas and parses each piece. A blank
/// piece is only tolerated when the operand list as a whole is empty.
fn process_operands(st: &mut State, rest: &str) -> std::result::Result<Vec<Operand>, Rejected> {
    let mut ops = Vec::new();
    let mut tokens = rest.split(',').peekable();

    while let Some(tok) = tokens.next() {
        match parse_operand(st, tok) {
            OperandScan::Bad => return Err(Rejected),

            OperandScan::Empty => {
                if tokens.peek().is_some() || !ops.is_empty() {
                    line_error!(PASS, st.line_no, "malformed operand list.");
                    return Err(Rejected);
                }
                // No operands at all.
                return Ok(ops);
            }

            OperandScan::Operand(op) => {
                if ops.len() >= MAX_OPERANDS {
                    line_error!(PASS, st.line_no, "too many operands.");
                    return Err(Rejected);
                }
                ops.push(op);
            }
        }
    }

    Ok(ops)
}

/// Writes or reserves the extra words an operand needs. Immediates are
/// complete now; symbolic operands leave two words for the second pass.
fn write_extra_words(st: &mut State, shared: &mut Shared, op: &Operand) -> LineResult {
    match *op {
        Operand::Immediate(value) => {
            push_code_word(st, shared, make_extra_inst_word(value, Linkage::Absolute))
        }
        Operand::Direct(_) | Operand::Index(_, _) => reserve_code_words(st, shared, 2),
        Operand::RegisterDirect(_) => Ok(()),
    }
}

/// Process an instruction statement.
fn process_instruction(
    st: &mut State,
    shared: &mut Shared,
    mnemonic: &str,
    rest: &str,
) -> LineResult {
    let desc = match find_inst(mnemonic) {
        Some(desc) => desc,
        None => {
            line_error!(PASS, st.line_no, "bad instruction mnemonic: {}", mnemonic);
            return Err(Rejected);
        }
    };

    let ops = process_operands(st, rest)?;

    if ops.len() != desc.noperands {
        line_error!(
            PASS,
            st.line_no,
            "incorrect number of operands (expected {}, got {})",
            desc.noperands,
            ops.len()
        );
        return Err(Rejected);
    }

    for (i, op) in ops.iter().enumerate() {
        if desc.addr_modes[i] & op.mode().mask() == 0 {
            line_error!(PASS, st.line_no, "operand {} has invalid addressing mode.", i + 1);
            return Err(Rejected);
        }
    }

    if shared.instructions.len() >= MAX_CODE_SEGMENT_LEN {
        line_error!(PASS, st.line_no, "too many instructions.");
        return Err(Rejected);
    }

    let address = st.ic;

    push_code_word(
        st,
        shared,
        make_first_inst_word(desc.opcode, Linkage::Absolute),
    )?;

    if !ops.is_empty() {
        // With one operand it is the destination; with two the first is the
        // source. Absent sides encode as mode index 0, register 0.
        let (src_mode, src_reg, dst) = match &ops[..] {
            [dst] => (0, 0, dst),
            [src, dst] => (enum_to_word(src.mode()), src.register(), dst),
            _ => unreachable!(),
        };

        push_code_word(
            st,
            shared,
            make_second_inst_word(
                enum_to_word(dst.mode()),
                dst.register(),
                src_mode,
                src_reg,
                desc.funct,
                Linkage::Absolute,
            ),
        )?;

        for op in &ops {
            write_extra_words(st, shared, op)?;
        }
    }

    let mut data = InstData {
        address,
        num_operands: desc.noperands,
        operand_symbols: Default::default(),
    };
    for (i, op) in ops.iter().enumerate() {
        data.operand_symbols[i] = op.label().to_owned();
    }
    shared.instructions.push(data);

    define_label(st, shared, address);

    Ok(())
}

/// Process a line of expanded assembly code.
fn process_line(st: &mut State, shared: &mut Shared, line: &str) -> LineResult {
    st.line_no += 1;
    st.label = None;

    let content = line.trim_end_matches(|c| c == '\n' || c == '\r');
    if content.chars().count() > MAX_LINE_LENGTH {
        line_error!(
            PASS,
            st.line_no,
            "line is too long (max {} characters).",
            MAX_LINE_LENGTH
        );
        return Err(Rejected);
    }

    let mut cursor = Cursor::new(line);
    let mut field = cursor.next_field();

    if field.is_empty() {
        return Ok(());
    }

    if field.starts_with(';') {
        // A ";#N" marker from the preprocessor resets the line counter.
        if let Some(reset) = field.strip_prefix(";#").and_then(parse_number) {
            st.line_no = reset as u32;
        }
        return Ok(());
    }

    if field.ends_with(':') {
        process_label_field(st, shared, field)?;
        field = cursor.next_field();
    }

    if field.is_empty() {
        // Nothing after the label; it names the current code address.
        debug_assert_matches!(st.label, Some(_));
        define_label(st, shared, st.ic);
        return Ok(());
    }

    if let Some(directive) = field.strip_prefix('.') {
        match directive {
            "data" => process_data_directive(st, shared, cursor.rest()),
            "string" => process_string_directive(st, shared, cursor.rest()),
            "extern" => process_extern_directive(st, shared, &mut cursor),
            "entry" => Ok(()), // handled by the second pass
            _ => {
                line_error!(PASS, st.line_no, "unrecognized directive {}", directive);
                Err(Rejected)
            }
        }
    } else {
        process_instruction(st, shared, field, cursor.rest())
    }
}

/// Runs the first pass over preprocessed source, filling `shared`. Returns
/// the number of rejected lines; diagnostics go to standard output.
pub fn firstpass<R: BufRead>(mut input: R, shared: &mut Shared) -> io::Result<u32> {
    let mut st = State {
        ic: CODE_BASE_ADDR,
        line_no: 0,
        label: None,
        data_symbols: Vec::new(),
    };
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

    // Rebase data symbols: the data segment follows the code segment, whose
    // length is only known now.
    for label in &st.data_symbols {
        if let Some(sym) = shared.symtable.find_mut(label) {
            sym.set_address(st.ic + sym.address());
        }
    }

    Ok(errors)
}

/// Runs the first pass over `infile`.
pub fn firstpass_file(infile: &Path, shared: &mut Shared) -> Result<()> {
    let input = File::open(infile).map_err(|err| Error::Io(infile.to_owned(), err))?;
    let errors = firstpass(BufReader::new(input), shared)
        .map_err(|err| Error::Io(infile.to_owned(), err))?;

    if errors > 0 {
        Err(Error::BadSource(errors))
    } else {
        Ok(())
    }
}
