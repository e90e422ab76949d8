use super::labels::LabelTable;
use super::operand::Error;
use crate::spec::isa::AddressingMode;
use crate::spec::types::hw::{Addr, ImmWidth, Word};
use derive_more::Constructor;
use std::fmt::Display;

/// A value reduced into an immediate field. Always renders as exactly
/// `width.digits()` uppercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Imm {
    val: Word,
    width: ImmWidth,
}

/// Everything a label reference needs in order to be resolved.
#[derive(Debug, Clone, Copy, Constructor)]
pub struct Context<'a> {
    labels: &'a LabelTable,
    addressing: Option<AddressingMode>,
    pc: Addr,
}

impl Imm {
    pub fn value(self) -> Word {
        self.val
    }
}

impl Display for Imm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:0width$X}", self.val, width = self.width.digits())
    }
}

fn strip_radix_prefix<'a>(raw: &'a str, lower: &str, upper: &str) -> Option<&'a str> {
    raw.strip_prefix(lower).or_else(|| raw.strip_prefix(upper))
}

fn parse_unsigned(raw: &str, digits: &str, radix: u32, width: ImmWidth) -> Result<Imm, Error> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(Error::Malformed(
            raw.to_owned(),
            if radix == 16 {
                "expected hexadecimal digits"
            } else {
                "expected binary digits"
            },
        ));
    }

    // Anything which doesn't survive as a `u32` certainly doesn't fit.
    let val = u32::from_str_radix(digits, radix)
        .ok()
        .filter(|val| *val <= width.max())
        .ok_or_else(|| Error::OutOfRange(raw.to_owned(), width.bits()))?;

    Ok(Imm {
        val: val as Word,
        width,
    })
}

fn parse_decimal(raw: &str, width: ImmWidth) -> Result<Imm, Error> {
    let digits = raw.strip_prefix('-').or_else(|| raw.strip_prefix('+')).unwrap_or(raw);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Malformed(
            raw.to_owned(),
            "expected a label, or a decimal, hexadecimal (0x) or binary (0b) literal",
        ));
    }

    let min = -(width.modulus() / 2);
    let val = raw
        .parse::<i64>()
        .ok()
        .filter(|val| (min..width.modulus()).contains(val))
        .ok_or_else(|| Error::OutOfRange(raw.to_owned(), width.bits()))?;

    Ok(Imm {
        val: width.wrap(val),
        width,
    })
}

fn resolve_label(label: &str, addr: Addr, width: ImmWidth, ctx: Context) -> Result<Imm, Error> {
    let val = match ctx.addressing {
        Some(AddressingMode::Absolute) => i64::from(addr),
        Some(AddressingMode::Relative) => i64::from(addr) - i64::from(ctx.pc),
        None => return Err(Error::InvalidAddressingMode(label.to_owned())),
    };

    Ok(Imm {
        val: width.wrap(val),
        width,
    })
}

/// Resolve an immediate operand: a label (per the instruction's addressing mode), then
/// a `0x`/`0b` literal, then a signed decimal.
pub fn resolve(raw: &str, width: ImmWidth, ctx: Context) -> Result<Imm, Error> {
    if let Some(addr) = ctx.labels.get(raw) {
        return resolve_label(raw, addr, width, ctx);
    }

    if let Some(digits) = strip_radix_prefix(raw, "0x", "0X") {
        return parse_unsigned(raw, digits, 16, width);
    }

    if let Some(digits) = strip_radix_prefix(raw, "0b", "0B") {
        return parse_unsigned(raw, digits, 2, width);
    }

    parse_decimal(raw, width)
}

pub fn format(raw: &str, width: ImmWidth, ctx: Context) -> Result<String, Error> {
    resolve(raw, width, ctx).map(|imm| imm.to_string())
}
