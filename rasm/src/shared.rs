use crate::symtable::SymbolTable;
use rm20::constants::MAX_OPERANDS;
use rm20::Word;

/// Metadata the first pass records for one encoded instruction so the second
/// pass can complete its reserved words.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstData {
    /// Word address of the instruction's opcode word.
    pub address: Word,
    pub num_operands: usize,
    /// Label referenced by each operand; empty when the operand has none.
    pub operand_symbols: [String; MAX_OPERANDS],
}

/// Assembly state built by the first pass and consumed by the second.
///
/// The first pass mutates everything here; the second pass reads the symbol
/// table and instruction list and overwrites only the code segment slots the
/// first pass reserved.
pub struct Shared {
    pub code_seg: Vec<Word>,
    pub data_seg: Vec<Word>,
    /// One entry per instruction, in source order.
    pub instructions: Vec<InstData>,
    pub symtable: SymbolTable,
}

impl Shared {
    pub fn new() -> Shared {
        Shared {
            code_seg: Vec::new(),
            data_seg: Vec::new(),
            instructions: Vec::new(),
            symtable: SymbolTable::new(),
        }
    }
}
