use derive_more::Display;
use enum_map::{Enum, EnumMap};
use static_assertions::const_assert;
use std::convert::TryFrom;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

pub type Word = u16;
pub type Nibble = u8;

/// Byte address in program memory.
pub type Addr = u32;

pub const NIBBLE_WIDTH: u32 = 4;
pub const WORD_WIDTH: u32 = 16;
pub const NIBBLE_MAX: Nibble = 0xF;

const_assert!(WORD_WIDTH == 4 * NIBBLE_WIDTH);

/*
    Notes on instruction encoding:

    Every instruction word is 16 bits, split into four nibbles. From low to high:

        3333 2222 1111 OOOO
                       ^^^^ opcode (shared by every member of an instruction group)

    Which of `field1`, `field2` and `field3` carry registers, the group's fixed sub-field
    (`func1`/`func2`/`func3`) or a short immediate depends on the instruction format, see
    `crate::spec::isa::Format`.

    Two-cycle instructions are followed by a second word holding a full 16-bit immediate
    (a constant, or a label resolved absolutely or relative to the instruction's own address).
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, EnumIter)]
pub enum Field {
    Opcode,
    One,
    Two,
    Three,
}

impl Field {
    pub const fn shift(self) -> u32 {
        (self as u32) * NIBBLE_WIDTH
    }

    pub const fn encode(self, val: Nibble) -> Word {
        ((val & NIBBLE_MAX) as Word) << self.shift()
    }

    pub const fn decode(self, word: Word) -> Nibble {
        ((word >> self.shift()) as Nibble) & NIBBLE_MAX
    }

    pub fn encode_all(fields: &EnumMap<Field, Nibble>) -> Word {
        Field::iter().fold(0, |word, field| word | field.encode(fields[field]))
    }
}

/// The width of an immediate field, in hex digits.
///
/// "A"-class immediates live inline in a single nibble of a one-cycle instruction,
/// "B"-class immediates occupy the whole second word of a two-cycle instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ImmWidth {
    #[display(fmt = "A")]
    A,
    #[display(fmt = "B")]
    B,
}

impl ImmWidth {
    pub const fn digits(self) -> usize {
        match self {
            ImmWidth::A => 1,
            ImmWidth::B => 4,
        }
    }

    pub const fn bits(self) -> u32 {
        self.digits() as u32 * NIBBLE_WIDTH
    }

    pub const fn modulus(self) -> i64 {
        1 << self.bits()
    }

    pub const fn max(self) -> u32 {
        (1 << self.bits()) - 1
    }

    /// Reduce `val` into the field, two's-complement style.
    pub fn wrap(self, val: i64) -> Word {
        // `rem_euclid` lands in `0..modulus`, which always fits.
        Word::try_from(val.rem_euclid(self.modulus())).unwrap_or_default()
    }
}

/// The number of words an instruction occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Cycles {
    #[display(fmt = "1")]
    One,
    #[display(fmt = "2")]
    Two,
}

impl Cycles {
    pub const fn words(self) -> usize {
        match self {
            Cycles::One => 1,
            Cycles::Two => 2,
        }
    }

    pub const fn bytes(self) -> Addr {
        2 * self.words() as Addr
    }
}

impl TryFrom<u8> for Cycles {
    type Error = u8;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            1 => Ok(Cycles::One),
            2 => Ok(Cycles::Two),
            _ => Err(val),
        }
    }
}

/// Running byte address of the next instruction. Both assembler passes step one of
/// these through the program identically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramCounter {
    addr: Addr,
}

impl ProgramCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn addr(self) -> Addr {
        self.addr
    }

    pub fn advance(&mut self, cycles: Cycles) {
        self.addr += cycles.bytes();
    }
}
