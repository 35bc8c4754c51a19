use super::Word;

pub const WORD_WIDTH         : u32 = 20;

pub const VALUE_MASK         : Word = 0xFFFF;
pub const MODE_FIELD_MASK    : Word = 0x3;
pub const REG_FIELD_MASK     : Word = 0xFF;
pub const FUNCT_FIELD_MASK   : Word = 0xFF;

pub const DST_MODE_OFFSET    : u32 = 0;
pub const DST_REG_OFFSET     : u32 = 2;
pub const SRC_MODE_OFFSET    : u32 = 6;
pub const SRC_REG_OFFSET     : u32 = 8;
pub const FUNCT_OFFSET       : u32 = 12;

pub const E_FLAG             : Word = 1 << 16;
pub const R_FLAG             : Word = 1 << 17;
pub const A_FLAG             : Word = 1 << 18;

pub const REGISTER_COUNT     : Word = 16;
pub const MAX_OPERANDS       : usize = 2;

/// Address at which the code segment is loaded.
pub const CODE_BASE_ADDR     : Word = 100;

pub const MAX_CODE_SEGMENT_LEN : usize = 8192;
pub const MAX_DATA_SEGMENT_LEN : usize = 8192;

/// Symbol addresses are split into a base aligned to this many words plus a
/// small offset.
pub const SYMBOL_ALIGNMENT   : Word = 16;

pub const MAX_LINE_LENGTH    : usize = 80;
pub const MAX_LABEL_LENGTH   : usize = 31;
