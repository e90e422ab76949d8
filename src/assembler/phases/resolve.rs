use super::types::{Error, ErrorKind, Line, Located};
use crate::assembler::labels::LabelTable;
use crate::common;
use crate::spec::isa::Catalog;
use crate::spec::types::hw::ProgramCounter;

/// A line defines a label if it has a ':' somewhere after its first character, and the
/// text before it is a single token, optionally followed by whitespace. Anything after the ':' is an instruction sharing
/// the label's address.
pub(crate) fn split_label(text: &str) -> Option<(&str, &str)> {
    let pos = text.find(':')?;
    let (name, rest) = (text[..pos].trim_end(), &text[pos + 1..]);
    if name.is_empty() || name.contains(|c: char| c == ',' || c.is_whitespace()) {
        return None;
    }

    Some((name, rest.trim()))
}

/// Record every label against the program counter at its definition, returning the
/// label table and the instruction lines with label definitions removed.
pub fn resolve(lines: Vec<Line>, catalog: &Catalog) -> Result<(LabelTable, Vec<Line>), Error> {
    let mut labels = LabelTable::new();
    let mut insts = Vec::new();
    let mut pc = ProgramCounter::new();

    for line in lines {
        let inst_text = match split_label(&line.text) {
            Some((name, rest)) => {
                if labels.define(name, pc.addr()) {
                    log::debug!("label '{}' at {:#06X}", name, pc.addr());
                } else {
                    log::warn!(
                        "label '{}' redefined {}, keeping the first definition",
                        name,
                        line
                    );
                }
                rest.to_owned()
            }
            None => line.text.clone(),
        };

        if inst_text.is_empty() {
            continue;
        }

        // A lone ':' or similar lands here too, and fails the lookup.
        let mnemonic = common::split_tokens(&inst_text)
            .first()
            .map_or_else(|| inst_text.clone(), |m| (*m).to_owned());
        let desc = catalog.lookup(&mnemonic).map_err(|_| {
            Located::new(line.clone(), ErrorKind::UnresolvableLine(mnemonic.clone()))
        })?;

        pc.advance(desc.cycles);
        insts.push(Line::new(line.number, inst_text));
    }

    Ok((labels, insts))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spec::isa::{Builder, Entry, SubField};
    use crate::spec::types::hw::Cycles;

    fn catalog() -> Catalog {
        let mut builder = Builder::new();
        builder
            .register(Entry::new("ADD".to_owned(), Some(1), None, Cycles::One, None))
            .unwrap();
        builder.enter_group(0b1000);
        builder
            .register(Entry::new(
                "LD".to_owned(),
                None,
                Some(SubField::Func1(0)),
                Cycles::Two,
                None,
            ))
            .unwrap();
        builder.leave_group();
        builder.build()
    }

    #[test]
    fn split_label_forms() {
        assert_eq!(split_label("loop:"), Some(("loop", "")));
        assert_eq!(split_label("START: ADD r1,r2,r3"), Some(("START", "ADD r1,r2,r3")));
        assert_eq!(split_label(":"), None);
        assert_eq!(split_label("LOOP : ADD r1,r2,r3"), Some(("LOOP", "ADD r1,r2,r3")));
        assert_eq!(split_label("LOOP\t:"), Some(("LOOP", "")));
        assert_eq!(split_label("  :"), None);
        assert_eq!(split_label("ADD r1, r2:"), None);
        assert_eq!(split_label("ADD r1,r2,r3"), None);
    }

    #[test]
    fn addresses_follow_cycle_counts() {
        let lines = Line::numbered(vec![
            "a:",
            "ADD r1,r2,r3",
            "b:",
            "LD r1, 4(r2)",
            "c: ADD r1,r1,r1",
            "d:",
        ]);
        let (labels, insts) = resolve(lines, &catalog()).unwrap();

        assert_eq!(labels.get("a"), Some(0));
        assert_eq!(labels.get("b"), Some(2));
        assert_eq!(labels.get("c"), Some(6));
        assert_eq!(labels.get("d"), Some(8));
        assert_eq!(
            insts,
            vec![
                Line::new(2, "ADD r1,r2,r3".to_owned()),
                Line::new(4, "LD r1, 4(r2)".to_owned()),
                Line::new(5, "ADD r1,r1,r1".to_owned()),
            ]
        );
    }

    #[test]
    fn redefinition_keeps_first() {
        let lines = Line::numbered(vec!["x:", "ADD r1,r2,r3", "x:"]);
        let (labels, _) = resolve(lines, &catalog()).unwrap();
        assert_eq!(labels.get("x"), Some(0));
    }

    #[test]
    fn unknown_mnemonic_is_unresolvable() {
        let lines = Line::numbered(vec!["ADD r1,r2,r3", "FOO r1,r2,r3"]);
        let err = resolve(lines, &catalog()).unwrap_err();
        assert_eq!(
            err,
            Located::new(
                Line::new(2, "FOO r1,r2,r3".to_owned()),
                ErrorKind::UnresolvableLine("FOO".to_owned())
            )
        );
    }

    #[test]
    fn lone_colon_is_unresolvable() {
        let err = resolve(Line::numbered(vec![":"]), &catalog()).unwrap_err();
        assert_eq!(err.value(), &ErrorKind::UnresolvableLine(":".to_owned()));
    }
}
