use super::labels::LabelTable;
use crate::spec::types::hw::{Nibble, NIBBLE_MAX, NIBBLE_WIDTH};
use std::convert::TryFrom;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Malformed(String, &'static str),
    OutOfRange(String, u32),
    InvalidAddressingMode(String),
}

/// A register reference `rN`, already range-checked to fit in one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reg(Nibble);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand<'a> {
    Reg(Reg),
    /// `disp(rN)`. An empty displacement stands for zero.
    Displaced { disp: &'a str, reg: Reg },
    Label(&'a str),
    Imm(&'a str),
}

impl Reg {
    pub fn num(self) -> Nibble {
        self.0
    }

    /// `Ok(None)` if `tok` isn't shaped like a register reference at all.
    fn parse(tok: &str) -> Result<Option<Reg>, Error> {
        let digits = match tok.strip_prefix('r').or_else(|| tok.strip_prefix('R')) {
            Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
                digits
            }
            _ => return Ok(None),
        };

        digits
            .parse::<u32>()
            .ok()
            .and_then(|num| Nibble::try_from(num).ok())
            .filter(|num| *num <= NIBBLE_MAX)
            .map(|num| Some(Reg(num)))
            .ok_or_else(|| Error::OutOfRange(tok.to_owned(), NIBBLE_WIDTH))
    }
}

impl Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl<'a> Operand<'a> {
    pub fn classify(tok: &'a str, labels: &LabelTable) -> Result<Self, Error> {
        if let Some(displaced) = Operand::parse_displaced(tok)? {
            return Ok(displaced);
        }

        if let Some(reg) = Reg::parse(tok)? {
            return Ok(Operand::Reg(reg));
        }

        if labels.contains(tok) {
            Ok(Operand::Label(tok))
        } else {
            Ok(Operand::Imm(tok))
        }
    }

    fn parse_displaced(tok: &'a str) -> Result<Option<Self>, Error> {
        let (open, close) = match (tok.find('('), tok.rfind(')')) {
            (Some(open), Some(close)) if open < close => (open, close),
            _ => return Ok(None),
        };

        if close != tok.len() - 1 {
            return Err(Error::Malformed(
                tok.to_owned(),
                "unexpected text after displaced address",
            ));
        }

        let inner = &tok[open + 1..close];
        let reg = Reg::parse(inner)?.ok_or_else(|| {
            Error::Malformed(tok.to_owned(), "expected a register inside parentheses")
        })?;

        Ok(Some(Operand::Displaced {
            disp: &tok[..open],
            reg,
        }))
    }
}
