use super::types::hw::{Cycles, Nibble, NIBBLE_MAX};
use crate::common;
use derive_more::Constructor;
use serde::Deserialize;
use std::fmt::Display;

/*
    The instruction set is described in two tiers:

        1.  Root-level instructions. These are always R-format and own their opcode outright.

        2.  Grouped instructions. A group declares an opcode which every instruction nested inside
            it shares; the members are told apart by a fixed sub-field. Which sub-field a member
            declares (`func1`, `func2` or `func3`) decides its format (S, U or J). Groups may nest,
            in which case a member takes the opcode of its nearest enclosing group.

    `Builder` performs this derivation, and the resulting `Catalog` is immutable.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMode {
    Absolute,
    #[serde(alias = "pc-relative")]
    Relative,
}

/// The fixed sub-field a grouped instruction declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubField {
    Func1(Nibble),
    Func2(Nibble),
    Func3(Nibble),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    R,
    S { func1: Nibble },
    U { func2: Nibble },
    J { func3: Nibble },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstDesc {
    pub mnemonic: String,
    pub opcode: Nibble,
    pub format: Format,
    pub cycles: Cycles,
    pub addressing: Option<AddressingMode>,
}

/// A single instruction as written in an ISA description, before its format and
/// (for grouped instructions) opcode have been derived.
#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct Entry {
    pub name: String,
    pub opcode: Option<Nibble>,
    pub sub_field: Option<SubField>,
    pub cycles: Cycles,
    pub addressing: Option<AddressingMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    UnknownMnemonic(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    MissingOpcode(String),
    MissingSubField(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnknownMnemonic(name) => write!(f, "Unknown mnemonic '{}'", name),
        }
    }
}

impl std::error::Error for Error {}

impl Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::MissingOpcode(name) => {
                write!(f, "Root-level instruction '{}' declares no opcode", name)
            }
            BuildError::MissingSubField(name) => write!(
                f,
                "Grouped instruction '{}' declares none of func1, func2 or func3",
                name
            ),
        }
    }
}

impl std::error::Error for BuildError {}

impl Display for AddressingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressingMode::Absolute => write!(f, "absolute"),
            AddressingMode::Relative => write!(f, "pc-relative"),
        }
    }
}

impl SubField {
    pub fn value(self) -> Nibble {
        match self {
            SubField::Func1(v) | SubField::Func2(v) | SubField::Func3(v) => v,
        }
    }
}

impl Format {
    fn from_sub_field(sub_field: SubField) -> Self {
        match sub_field {
            SubField::Func1(func1) => Format::S { func1 },
            SubField::Func2(func2) => Format::U { func2 },
            SubField::Func3(func3) => Format::J { func3 },
        }
    }

    pub fn sub_field(self) -> Option<SubField> {
        match self {
            Format::R => None,
            Format::S { func1 } => Some(SubField::Func1(func1)),
            Format::U { func2 } => Some(SubField::Func2(func2)),
            Format::J { func3 } => Some(SubField::Func3(func3)),
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::R => write!(f, "R"),
            Format::S { .. } => write!(f, "S"),
            Format::U { .. } => write!(f, "U"),
            Format::J { .. } => write!(f, "J"),
        }
    }
}

impl Display for SubField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubField::Func1(v) => write!(f, "func1={:04b}", v),
            SubField::Func2(v) => write!(f, "func2={:04b}", v),
            SubField::Func3(v) => write!(f, "func3={:04b}", v),
        }
    }
}

impl InstDesc {
    pub fn new(
        mnemonic: String,
        opcode: Nibble,
        format: Format,
        cycles: Cycles,
        addressing: Option<AddressingMode>,
    ) -> Self {
        assert!(opcode <= NIBBLE_MAX);
        assert!(format
            .sub_field()
            .map_or(true, |sf| sf.value() <= NIBBLE_MAX));

        InstDesc {
            mnemonic,
            opcode,
            format,
            cycles,
            addressing,
        }
    }

    pub fn matches(&self, mnemonic: &str) -> bool {
        common::eq_ignore_case(&self.mnemonic, mnemonic)
    }
}

impl Display for InstDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{: <8} {}  opc={:04b}  {: <10} cycles={}",
            self.mnemonic,
            self.format,
            self.opcode,
            self.format
                .sub_field()
                .map(|sf| sf.to_string())
                .unwrap_or_default(),
            self.cycles
        )?;
        if let Some(mode) = self.addressing {
            write!(f, "  {}", mode)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    descs: Vec<InstDesc>,
}

impl Catalog {
    /// Case-insensitive lookup. If the description contained duplicate mnemonics, the
    /// first registered one wins.
    pub fn lookup(&self, mnemonic: &str) -> Result<&InstDesc, Error> {
        self.descs
            .iter()
            .find(|desc| desc.matches(mnemonic))
            .ok_or_else(|| Error::UnknownMnemonic(mnemonic.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstDesc> {
        self.descs.iter()
    }

    pub fn len(&self) -> usize {
        self.descs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Builder {
    catalog: Catalog,
    groups: Vec<Nibble>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> Catalog {
        assert!(self.groups.is_empty());
        self.catalog
    }

    pub fn enter_group(&mut self, opcode: Nibble) {
        assert!(opcode <= NIBBLE_MAX);
        self.groups.push(opcode);
    }

    pub fn leave_group(&mut self) {
        assert!(self.groups.pop().is_some());
    }

    pub fn register(&mut self, entry: Entry) -> Result<(), BuildError> {
        let desc = match self.groups.last() {
            // At the root we never look at the sub-field, everything is R-format.
            None => {
                let opcode = entry
                    .opcode
                    .ok_or_else(|| BuildError::MissingOpcode(entry.name.clone()))?;
                InstDesc::new(entry.name, opcode, Format::R, entry.cycles, entry.addressing)
            }
            Some(&group_opcode) => {
                let sub_field = entry
                    .sub_field
                    .ok_or_else(|| BuildError::MissingSubField(entry.name.clone()))?;
                InstDesc::new(
                    entry.name,
                    group_opcode,
                    Format::from_sub_field(sub_field),
                    entry.cycles,
                    entry.addressing,
                )
            }
        };

        self.catalog.descs.push(desc);
        Ok(())
    }
}
