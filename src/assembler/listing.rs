use super::labels::LabelTable;
use super::phases::types::Line;
use crate::spec::types::hw::{Addr, Cycles, Word};
use derive_more::Constructor;
use itertools::Itertools;
use std::fmt::Display;

/// The second word of a two-cycle instruction, along with the operand text it came from.
#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct ImmWord {
    pub val: Word,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct Encoding {
    pub addr: Addr,
    pub inst: Word,
    pub imm: Option<ImmWord>,
    pub line: Line,
}

/// The assembled program: every encoded instruction in program order, plus the label
/// table it was resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct Listing {
    labels: LabelTable,
    encodings: Vec<Encoding>,
}

impl ImmWord {
    pub fn zero() -> Self {
        ImmWord::new(0, "0".to_owned())
    }
}

impl Encoding {
    pub fn cycles(&self) -> Cycles {
        match self.imm {
            None => Cycles::One,
            Some(_) => Cycles::Two,
        }
    }

    pub fn words(&self) -> Vec<Word> {
        match &self.imm {
            None => vec![self.inst],
            Some(imm) => vec![self.inst, imm.val],
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04X}  //{}", self.inst, self.line.text)?;
        if let Some(imm) = &self.imm {
            write!(f, "\n{:04X}  //  imm {}", imm.val, imm.src)?;
        }
        Ok(())
    }
}

impl Listing {
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn words(&self) -> Vec<Word> {
        self.encodings.iter().flat_map(Encoding::words).collect()
    }

    /// The address one past the last instruction.
    pub fn end_addr(&self) -> Addr {
        self.encodings
            .last()
            .map_or(0, |enc| enc.addr + enc.cycles().bytes())
    }

    /// One `HHHH  //comment` line per word, newline-terminated.
    pub fn render(&self) -> String {
        if self.encodings.is_empty() {
            return String::new();
        }

        format!("{}\n", self.encodings.iter().join("\n"))
    }
}

impl Display for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn listing() -> Listing {
        Listing::new(
            LabelTable::new(),
            vec![
                Encoding::new(0, 0x3211, None, Line::new(1, "ADD r1,r2,r3".to_owned())),
                Encoding::new(
                    2,
                    0x0218,
                    Some(ImmWord::new(0xFFFC, "-4".to_owned())),
                    Line::new(2, "LD r1, -4(r2)".to_owned()),
                ),
            ],
        )
    }

    #[test]
    fn render_lines() {
        assert_eq!(
            listing().render(),
            "3211  //ADD r1,r2,r3\n0218  //LD r1, -4(r2)\nFFFC  //  imm -4\n"
        );
    }

    #[test]
    fn words_and_end() {
        let listing = listing();
        assert_eq!(listing.words(), vec![0x3211, 0x0218, 0xFFFC]);
        assert_eq!(listing.end_addr(), 6);
    }

    #[test]
    fn empty() {
        let listing = Listing::new(LabelTable::new(), vec![]);
        assert_eq!(listing.render(), "");
        assert_eq!(listing.end_addr(), 0);
    }
}
