use crate::constants;
use crate::Word;
use num::traits::ToPrimitive;
use num_derive::{FromPrimitive, ToPrimitive};

// Encoded instruction layout
//
//           +---+---+---+----------------------------------+
//           |18 |17 |16 |15                               0|
//           +---+---+---+----------------------------------+
// Word 1    | A | R | E |         1 << opcode              |
//           +---+---+---+----------+--------+------+-------+
// Word 2    | A | R | E |  funct   | srcreg |srcmd | dstrg/|
//           |   |   |   | (12..15) | (8..11)|(6..7)| dstmd |
//           +---+---+---+----------+--------+------+-------+
// Extra     | A | R | E |       16-bit value               |
//           +---+---+---+----------------------------------+
//
// Immediate operands add one extra word, direct and index operands add two
// (base address and offset), register-direct operands add none.

/// Operand addressing mode. The discriminant is the two-bit index stored in
/// the register/funct word of an encoded instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum AddressingMode {
    /// `#N`: a literal carried in an extra instruction word.
    Immediate,
    /// `label`: a symbolic reference resolved by the assembler.
    Direct,
    /// `label[rK]`: a symbolic reference subscripted by a register.
    Index,
    /// `rK`: the value held in a register.
    RegisterDirect,
}

impl AddressingMode {
    /// Bit used to test this mode against an instruction's legal-mode mask.
    #[inline]
    pub fn mask(self) -> u8 {
        1 << self as u8
    }
}

pub const MODE_IMMEDIATE       : u8 = 1 << AddressingMode::Immediate as u8;
pub const MODE_DIRECT          : u8 = 1 << AddressingMode::Direct as u8;
pub const MODE_INDEX           : u8 = 1 << AddressingMode::Index as u8;
pub const MODE_REGISTER_DIRECT : u8 = 1 << AddressingMode::RegisterDirect as u8;
pub const MODE_ALL             : u8 =
    MODE_IMMEDIATE | MODE_DIRECT | MODE_INDEX | MODE_REGISTER_DIRECT;

/// Linkage class of an encoded word, stored as the E/R/A flag triplet. Every
/// word carries exactly one of the three flags.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Linkage {
    /// The value is a placeholder completed by the loader (E flag).
    External,
    /// The value is a local address adjusted at load time (R flag).
    Relocatable,
    /// The value is a literal (A flag).
    Absolute,
}

impl Linkage {
    #[inline]
    fn flags(self) -> Word {
        match self {
            Linkage::External => constants::E_FLAG,
            Linkage::Relocatable => constants::R_FLAG,
            Linkage::Absolute => constants::A_FLAG,
        }
    }
}

/// Describes the encoding and operand constraints of one instruction.
pub struct InstDesc {
    /// Mnemonic as written in source.
    pub mnemonic: &'static str,
    /// Opcode, stored one-hot in the first encoded word.
    pub opcode: Word,
    /// Function code, stored in the register/funct word.
    pub funct: Word,
    /// Number of operands.
    pub noperands: usize,
    /// Legal addressing modes per operand (bitfield of `MODE_*`).
    pub addr_modes: [u8; constants::MAX_OPERANDS],
}

static INSTRUCTION_SET: [InstDesc; 16] = [
    InstDesc { mnemonic: "mov",  opcode: 0,  funct: 0,  noperands: 2, addr_modes: [MODE_ALL, MODE_ALL & !MODE_IMMEDIATE] },
    InstDesc { mnemonic: "cmp",  opcode: 1,  funct: 0,  noperands: 2, addr_modes: [MODE_ALL, MODE_ALL] },
    InstDesc { mnemonic: "add",  opcode: 2,  funct: 10, noperands: 2, addr_modes: [MODE_ALL, MODE_ALL & !MODE_IMMEDIATE] },
    InstDesc { mnemonic: "sub",  opcode: 2,  funct: 11, noperands: 2, addr_modes: [MODE_ALL, MODE_ALL & !MODE_IMMEDIATE] },
    InstDesc { mnemonic: "lea",  opcode: 4,  funct: 0,  noperands: 2, addr_modes: [MODE_DIRECT | MODE_INDEX, MODE_ALL & !MODE_IMMEDIATE] },
    InstDesc { mnemonic: "clr",  opcode: 5,  funct: 10, noperands: 1, addr_modes: [MODE_ALL & !MODE_IMMEDIATE, 0] },
    InstDesc { mnemonic: "not",  opcode: 5,  funct: 11, noperands: 1, addr_modes: [MODE_ALL & !MODE_IMMEDIATE, 0] },
    InstDesc { mnemonic: "inc",  opcode: 5,  funct: 12, noperands: 1, addr_modes: [MODE_ALL & !MODE_IMMEDIATE, 0] },
    InstDesc { mnemonic: "dec",  opcode: 5,  funct: 13, noperands: 1, addr_modes: [MODE_ALL & !MODE_IMMEDIATE, 0] },
    InstDesc { mnemonic: "jmp",  opcode: 9,  funct: 10, noperands: 1, addr_modes: [MODE_DIRECT | MODE_INDEX, 0] },
    InstDesc { mnemonic: "bne",  opcode: 9,  funct: 11, noperands: 1, addr_modes: [MODE_DIRECT | MODE_INDEX, 0] },
    InstDesc { mnemonic: "jsr",  opcode: 9,  funct: 12, noperands: 1, addr_modes: [MODE_DIRECT | MODE_INDEX, 0] },
    InstDesc { mnemonic: "red",  opcode: 12, funct: 0,  noperands: 1, addr_modes: [MODE_ALL & !MODE_IMMEDIATE, 0] },
    InstDesc { mnemonic: "prn",  opcode: 13, funct: 0,  noperands: 1, addr_modes: [MODE_ALL, 0] },
    InstDesc { mnemonic: "rts",  opcode: 14, funct: 0,  noperands: 0, addr_modes: [0, 0] },
    InstDesc { mnemonic: "stop", opcode: 15, funct: 0,  noperands: 0, addr_modes: [0, 0] },
];

/// Finds the description of an instruction by its mnemonic. The set has
/// sixteen entries, so a linear scan is plenty.
pub fn find_inst(mnemonic: &str) -> Option<&'static InstDesc> {
    INSTRUCTION_SET.iter().find(|desc| desc.mnemonic == mnemonic)
}

#[inline]
pub fn enum_to_word<T: ToPrimitive + Copy>(val: T) -> Word {
    val.to_i32().unwrap()
}

/// Constructs the opcode word of an encoded instruction.
#[inline]
pub fn make_first_inst_word(opcode: Word, linkage: Linkage) -> Word {
    (1 << opcode) | linkage.flags()
}

/// Constructs the register/funct word of an encoded instruction. Addressing
/// modes are passed as their two-bit indices.
#[inline]
pub fn make_second_inst_word(
    dst_mode: Word,
    dst_reg: Word,
    src_mode: Word,
    src_reg: Word,
    funct: Word,
    linkage: Linkage,
) -> Word {
    ((dst_mode & constants::MODE_FIELD_MASK) << constants::DST_MODE_OFFSET)
        | ((dst_reg & constants::REG_FIELD_MASK) << constants::DST_REG_OFFSET)
        | ((src_mode & constants::MODE_FIELD_MASK) << constants::SRC_MODE_OFFSET)
        | ((src_reg & constants::REG_FIELD_MASK) << constants::SRC_REG_OFFSET)
        | ((funct & constants::FUNCT_FIELD_MASK) << constants::FUNCT_OFFSET)
        | linkage.flags()
}

/// Constructs an extra instruction word holding a 16-bit value.
#[inline]
pub fn make_extra_inst_word(value: Word, linkage: Linkage) -> Word {
    (value & constants::VALUE_MASK) | linkage.flags()
}

/// Encodes a literal datum. Data words always carry the A flag.
#[inline]
pub fn make_data_word(value: Word) -> Word {
    (value & constants::VALUE_MASK) | constants::A_FLAG
}

/// Splits an address into a 16-word-aligned base and a 0-15 offset, the form
/// used by the two-word encoding of symbolic references.
#[inline]
pub fn split_address(addr: Word) -> (Word, Word) {
    (
        (addr / constants::SYMBOL_ALIGNMENT) * constants::SYMBOL_ALIGNMENT,
        addr % constants::SYMBOL_ALIGNMENT,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::*;
    use num::traits::FromPrimitive;

    #[test]
    fn find_inst_known_mnemonics() {
        let mov = find_inst("mov").unwrap();
        assert_eq!(mov.opcode, 0);
        assert_eq!(mov.noperands, 2);

        let sub = find_inst("sub").unwrap();
        assert_eq!(sub.opcode, 2);
        assert_eq!(sub.funct, 11);

        assert!(find_inst("halt").is_none());
        assert!(find_inst("MOV").is_none());
    }

    #[test]
    fn lea_source_must_be_addressable() {
        let lea = find_inst("lea").unwrap();
        assert_eq!(lea.addr_modes[0] & MODE_IMMEDIATE, 0);
        assert_eq!(lea.addr_modes[0] & MODE_REGISTER_DIRECT, 0);
        assert_ne!(lea.addr_modes[0] & MODE_DIRECT, 0);
        assert_ne!(lea.addr_modes[0] & MODE_INDEX, 0);
    }

    #[test]
    fn mode_index_round_trip() {
        for index in 0..4 {
            let mode = AddressingMode::from_i32(index).unwrap();
            assert_eq!(enum_to_word(mode), index);
        }
    }

    #[test]
    fn first_word_is_one_hot() {
        assert_eq!(make_first_inst_word(15, Linkage::Absolute), (1 << 15) | A_FLAG);
        assert_eq!(make_first_inst_word(0, Linkage::Absolute), 1 | A_FLAG);
    }

    #[test]
    fn second_word_packs_fields() {
        let word = make_second_inst_word(3, 1, 1, 0, 10, Linkage::Absolute);
        assert_eq!(word & 0x3, 3);
        assert_eq!((word >> DST_REG_OFFSET) & 0xF, 1);
        assert_eq!((word >> SRC_MODE_OFFSET) & 0x3, 1);
        assert_eq!((word >> SRC_REG_OFFSET) & 0xF, 0);
        assert_eq!((word >> FUNCT_OFFSET) & 0xF, 10);
        assert_eq!(word & A_FLAG, A_FLAG);
    }

    #[test]
    fn negative_value_does_not_leak_into_flags() {
        let word = make_extra_inst_word(-1, Linkage::Absolute);
        assert_eq!(word, 0xFFFF | A_FLAG);

        let word = make_data_word(-3);
        assert_eq!(word, 0xFFFD | A_FLAG);
    }

    #[test]
    fn external_words_carry_only_the_e_flag() {
        let word = make_extra_inst_word(0, Linkage::External);
        assert_eq!(word, E_FLAG);
    }

    #[test]
    fn split_address_alignment() {
        assert_eq!(split_address(0), (0, 0));
        assert_eq!(split_address(100), (96, 4));
        assert_eq!(split_address(103), (96, 7));
        assert_eq!(split_address(112), (112, 0));
    }
}
