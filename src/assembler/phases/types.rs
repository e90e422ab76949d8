use crate::assembler::operand;
use crate::spec::isa;
use derive_more::Constructor;
use std::fmt::Display;

/*
    Phases:

        1.  Preprocessing: The source is split into lines, comments (from ';' to the end of a line)
            are stripped, surrounding whitespace is trimmed, and empty lines are dropped. Each
            surviving `Line` keeps its physical line number.

        2.  Resolution: A single pass over the lines records every label definition against the
            current program counter, and drops the label definitions from the stream. Every other
            line must start with a known mnemonic, since we need its cycle count to step the
            program counter.

        3.  Generation: Each remaining line is encoded against the complete label table into one
            or two words. The program counter is stepped again, identically, so that relative
            label references can be computed against the address of the instruction itself.

    Nothing is emitted unless every line makes it through generation.
*/

/// A cleaned source line, with its (1-based) physical line number.
#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct Line {
    pub number: usize,
    pub text: String,
}

impl Line {
    /// Number a sequence of already-cleaned lines from 1.
    pub fn numbered<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Vec<Line> {
        lines
            .into_iter()
            .enumerate()
            .map(|(idx, text)| Line::new(idx + 1, text.into()))
            .collect()
    }
}

impl Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(line {}: `{}`)", self.number, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct Located<T> {
    line: Line,
    val: T,
}

impl<T> Located<T> {
    pub fn line(&self) -> &Line {
        &self.line
    }

    pub fn value(&self) -> &T {
        &self.val
    }

    pub fn into_value(self) -> T {
        self.val
    }
}

impl<T: Display> Display for Located<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}: {}", self.line, self.val)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No catalog entry matches the mnemonic.
    UnknownMnemonic(String),
    /// The resolution pass could not classify a line (its mnemonic is unknown).
    UnresolvableLine(String),
    MalformedOperand(String, &'static str),
    /// The operand does not fit in a field of the given number of bits.
    OperandOutOfRange(String, u32),
    /// A label was used by an instruction which declares no addressing mode.
    InvalidAddressingMode(String),
}

pub type Error = Located<ErrorKind>;

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UnknownMnemonic(name) => write!(f, "Unknown mnemonic '{}'", name),
            ErrorKind::UnresolvableLine(name) => write!(
                f,
                "Cannot interpret line, '{}' is neither a label nor a known mnemonic",
                name
            ),
            ErrorKind::MalformedOperand(tok, why) => {
                write!(f, "Malformed operand '{}': {}", tok, why)
            }
            ErrorKind::OperandOutOfRange(tok, bits) => write!(
                f,
                "Operand '{}' does not fit in a {}-bit field",
                tok, bits
            ),
            ErrorKind::InvalidAddressingMode(label) => write!(
                f,
                "Label '{}' used by an instruction with no addressing mode",
                label
            ),
        }
    }
}

impl std::error::Error for Located<ErrorKind> {}

impl From<isa::Error> for ErrorKind {
    fn from(err: isa::Error) -> Self {
        match err {
            isa::Error::UnknownMnemonic(name) => ErrorKind::UnknownMnemonic(name),
        }
    }
}

impl From<operand::Error> for ErrorKind {
    fn from(err: operand::Error) -> Self {
        match err {
            operand::Error::Malformed(tok, why) => ErrorKind::MalformedOperand(tok, why),
            operand::Error::OutOfRange(tok, bits) => ErrorKind::OperandOutOfRange(tok, bits),
            operand::Error::InvalidAddressingMode(label) => {
                ErrorKind::InvalidAddressingMode(label)
            }
        }
    }
}
