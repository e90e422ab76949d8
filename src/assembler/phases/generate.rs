use super::types::{Error, ErrorKind, Line, Located};
use crate::assembler::immediate::{self, Context};
use crate::assembler::labels::LabelTable;
use crate::assembler::listing::{Encoding, ImmWord};
use crate::assembler::operand::Operand;
use crate::common;
use crate::spec::isa::{Catalog, Format, InstDesc};
use crate::spec::types::hw::{Addr, Cycles, Field, ImmWidth, Nibble, ProgramCounter};
use enum_map::EnumMap;
use itertools::Itertools;

/*
    Field layout per format (nibbles, high to low), and where each field comes from:

        R:  reg(op3)    reg(op2)    reg(op1)    opcode
        S:  base(op2)   reg(op1)    func1       opcode
        U:  imm(op2)    func2       reg(op1)    opcode
        J:  func3       base(op2)   reg(op1)    opcode

    `base` is either a plain register or the register of a displaced address `disp(rN)`.
    For two-cycle instructions the displacement (S, J) or the immediate (U) goes in the
    second word instead, and the U-format inline immediate is left zero.
*/

type Arg<'a> = (&'a str, Operand<'a>);

fn expect_arity(mnemonic: &str, args: &[Arg], format: Format) -> Result<(), ErrorKind> {
    let (arity, msg) = match format {
        Format::R => (3, "expected exactly three operands"),
        Format::S { .. } | Format::U { .. } | Format::J { .. } => {
            (2, "expected exactly two operands")
        }
    };

    if args.len() == arity {
        Ok(())
    } else {
        Err(ErrorKind::MalformedOperand(mnemonic.to_owned(), msg))
    }
}

fn expect_reg((tok, op): Arg) -> Result<Nibble, ErrorKind> {
    match op {
        Operand::Reg(reg) => Ok(reg.num()),
        _ => Err(ErrorKind::MalformedOperand(
            tok.to_owned(),
            "expected a register",
        )),
    }
}

/// A register, or a displaced address. Returns the register and the displacement text,
/// if there was one.
fn expect_base<'a>((tok, op): Arg<'a>) -> Result<(Nibble, Option<&'a str>), ErrorKind> {
    match op {
        Operand::Reg(reg) => Ok((reg.num(), None)),
        Operand::Displaced { disp, reg } => Ok((reg.num(), Some(disp))),
        _ => Err(ErrorKind::MalformedOperand(
            tok.to_owned(),
            "expected a register or a displaced address",
        )),
    }
}

fn expect_imm<'a>((tok, op): Arg<'a>) -> Result<&'a str, ErrorKind> {
    match op {
        Operand::Label(raw) | Operand::Imm(raw) => Ok(raw),
        _ => Err(ErrorKind::MalformedOperand(
            tok.to_owned(),
            "expected an immediate or a label",
        )),
    }
}

fn displacement(
    tok: &str,
    disp: Option<&str>,
    cycles: Cycles,
    ctx: Context,
) -> Result<Option<ImmWord>, ErrorKind> {
    match (cycles, disp) {
        (Cycles::One, None) | (Cycles::One, Some("")) => Ok(None),
        (Cycles::One, Some(_)) => Err(ErrorKind::MalformedOperand(
            tok.to_owned(),
            "a displacement needs a two-cycle instruction",
        )),
        (Cycles::Two, None) | (Cycles::Two, Some("")) => Ok(Some(ImmWord::zero())),
        (Cycles::Two, Some(disp)) => {
            let imm = immediate::resolve(disp, ImmWidth::B, ctx)?;
            Ok(Some(ImmWord::new(imm.value(), disp.to_owned())))
        }
    }
}

fn encode_fields(
    desc: &InstDesc,
    args: &[Arg],
    ctx: Context,
) -> Result<(EnumMap<Field, Nibble>, Option<ImmWord>), ErrorKind> {
    expect_arity(&desc.mnemonic, args, desc.format)?;

    let mut fields = EnumMap::new();
    fields[Field::Opcode] = desc.opcode;

    let imm = match desc.format {
        Format::R => {
            fields[Field::One] = expect_reg(args[0])?;
            fields[Field::Two] = expect_reg(args[1])?;
            fields[Field::Three] = expect_reg(args[2])?;
            None
        }
        Format::S { func1 } => {
            let (base, disp) = expect_base(args[1])?;
            fields[Field::One] = func1;
            fields[Field::Two] = expect_reg(args[0])?;
            fields[Field::Three] = base;
            displacement(args[1].0, disp, desc.cycles, ctx)?
        }
        Format::U { func2 } => {
            let raw = expect_imm(args[1])?;
            fields[Field::One] = expect_reg(args[0])?;
            fields[Field::Two] = func2;
            match desc.cycles {
                Cycles::One => {
                    fields[Field::Three] = immediate::resolve(raw, ImmWidth::A, ctx)?.value() as Nibble;
                    None
                }
                Cycles::Two => {
                    let imm = immediate::resolve(raw, ImmWidth::B, ctx)?;
                    Some(ImmWord::new(imm.value(), raw.to_owned()))
                }
            }
        }
        Format::J { func3 } => {
            let (base, disp) = expect_base(args[1])?;
            fields[Field::One] = expect_reg(args[0])?;
            fields[Field::Two] = base;
            fields[Field::Three] = func3;
            displacement(args[1].0, disp, desc.cycles, ctx)?
        }
    };

    // Two-cycle instructions always carry their second word, even if nothing filled it.
    let imm = match desc.cycles {
        Cycles::One => None,
        Cycles::Two => Some(imm.unwrap_or_else(ImmWord::zero)),
    };

    Ok((fields, imm))
}

fn encode_line(
    line: &Line,
    addr: Addr,
    catalog: &Catalog,
    labels: &LabelTable,
) -> Result<Encoding, ErrorKind> {
    let toks = common::split_tokens(&line.text);
    let (mnemonic, operands) = toks
        .split_first()
        .ok_or_else(|| ErrorKind::UnknownMnemonic(line.text.clone()))?;

    let desc = catalog.lookup(mnemonic)?;
    let args = operands
        .iter()
        .map(|&tok| Operand::classify(tok, labels).map(|op| (tok, op)))
        .collect::<Result<Vec<Arg>, _>>()?;

    let ctx = Context::new(labels, desc.addressing, addr);
    let (fields, imm) = encode_fields(desc, &args, ctx)?;

    Ok(Encoding::new(addr, Field::encode_all(&fields), imm, line.clone()))
}

/// Encode every instruction line against the complete label table. Fails on the first
/// bad line, in which case nothing is returned.
pub fn generate(
    lines: Vec<Line>,
    catalog: &Catalog,
    labels: &LabelTable,
) -> Result<Vec<Encoding>, Error> {
    let mut pc = ProgramCounter::new();
    let mut encodings = Vec::with_capacity(lines.len());

    for line in lines {
        let enc = encode_line(&line, pc.addr(), catalog, labels)
            .map_err(|kind| Located::new(line.clone(), kind))?;

        log::debug!(
            "{:#06X}: {} -> {}",
            enc.addr,
            line.text,
            enc.words().iter().map(|w| format!("{:04X}", w)).join(" ")
        );

        pc.advance(enc.cycles());
        encodings.push(enc);
    }

    Ok(encodings)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spec::isa::{AddressingMode, Builder, Entry, SubField};

    fn add(
        builder: &mut Builder,
        name: &str,
        opcode: Option<Nibble>,
        sub_field: Option<SubField>,
        cycles: Cycles,
        addressing: Option<AddressingMode>,
    ) {
        builder
            .register(Entry::new(
                name.to_owned(),
                opcode,
                sub_field,
                cycles,
                addressing,
            ))
            .unwrap();
    }

    fn catalog() -> Catalog {
        let abs = Some(AddressingMode::Absolute);
        let rel = Some(AddressingMode::Relative);

        let mut b = Builder::new();
        add(&mut b, "ADD", Some(0b0101), None, Cycles::One, None);
        add(&mut b, "ADDX", Some(0b0110), None, Cycles::Two, None);
        b.enter_group(0b1000);
        add(&mut b, "LDR", None, Some(SubField::Func1(0b0001)), Cycles::One, None);
        add(&mut b, "LD", None, Some(SubField::Func1(0b0010)), Cycles::Two, abs);
        add(&mut b, "LI", None, Some(SubField::Func2(0b0011)), Cycles::One, None);
        add(&mut b, "LIW", None, Some(SubField::Func2(0b0100)), Cycles::Two, abs);
        b.leave_group();
        b.enter_group(0b1100);
        add(&mut b, "JR", None, Some(SubField::Func3(0b0001)), Cycles::One, None);
        add(&mut b, "BR", None, Some(SubField::Func3(0b0010)), Cycles::Two, rel);
        b.leave_group();
        b.build()
    }

    fn encode(text: &str, addr: Addr, labels: &LabelTable) -> Result<Encoding, ErrorKind> {
        encode_line(&Line::new(1, text.to_owned()), addr, &catalog(), labels)
    }

    fn words(text: &str) -> Vec<u16> {
        encode(text, 0, &LabelTable::new()).unwrap().words()
    }

    fn kind(text: &str) -> ErrorKind {
        encode(text, 0, &LabelTable::new()).unwrap_err()
    }

    #[test]
    fn r_format_nibble_order() {
        assert_eq!(words("ADD r1,r2,r3"), vec![0x3215]);
        assert_eq!(words("add r15, r0, r10"), vec![0xA0F5]);
    }

    #[test]
    fn r_format_two_cycle_gets_zero_word() {
        assert_eq!(words("ADDX r1,r2,r3"), vec![0x3216, 0x0000]);
    }

    #[test]
    fn s_format() {
        assert_eq!(words("LDR r4, r5"), vec![0x5418]);
        assert_eq!(words("LDR r4, (r5)"), vec![0x5418]);
        assert_eq!(words("LD r4, 6(r5)"), vec![0x5428, 0x0006]);
        assert_eq!(words("LD r4, -2(r5)"), vec![0x5428, 0xFFFE]);
        assert_eq!(words("LD r4, (r5)"), vec![0x5428, 0x0000]);
        assert_eq!(words("LD r4, r5"), vec![0x5428, 0x0000]);
    }

    #[test]
    fn s_format_displacement_on_one_cycle() {
        assert!(matches!(
            kind("LDR r4, 6(r5)"),
            ErrorKind::MalformedOperand(tok, _) if tok == "6(r5)"
        ));
    }

    #[test]
    fn u_format() {
        assert_eq!(words("LI r2, 7"), vec![0x7328]);
        assert_eq!(words("LI r2, -1"), vec![0xF328]);
        assert_eq!(words("LIW r2, 0x1234"), vec![0x0428, 0x1234]);
        assert_eq!(
            kind("LI r2, 16"),
            ErrorKind::OperandOutOfRange("16".to_owned(), 4)
        );
        assert!(matches!(kind("LI r2, r3"), ErrorKind::MalformedOperand(..)));
    }

    #[test]
    fn j_format() {
        assert_eq!(words("JR r1, r2"), vec![0x121C]);
        assert_eq!(words("JR r1, (r2)"), vec![0x121C]);
        assert_eq!(words("BR r1, 8(r2)"), vec![0x221C, 0x0008]);
    }

    #[test]
    fn labels_use_addressing_mode() {
        let mut labels = LabelTable::new();
        labels.define("top", 0x0);
        labels.define("data", 0x40);

        let br = encode("BR r0, top(r0)", 0x10, &labels).unwrap();
        assert_eq!(br.words(), vec![0x200C, 0xFFF0]);

        let liw = encode("LIW r3, data", 0x10, &labels).unwrap();
        assert_eq!(liw.words(), vec![0x0438, 0x0040]);

        assert_eq!(
            encode("LI r3, data", 0, &labels).unwrap_err(),
            ErrorKind::InvalidAddressingMode("data".to_owned())
        );
    }

    #[test]
    fn arity_and_shape() {
        assert!(matches!(kind("ADD r1, r2"), ErrorKind::MalformedOperand(tok, _) if tok == "ADD"));
        assert!(matches!(kind("LD r1, 2(r2), r3"), ErrorKind::MalformedOperand(..)));
        assert!(matches!(kind("ADD r1, r2, 5"), ErrorKind::MalformedOperand(tok, _) if tok == "5"));
        assert_eq!(
            kind("ADD r1, r2, r16"),
            ErrorKind::OperandOutOfRange("r16".to_owned(), 4)
        );
    }

    #[test]
    fn unknown_mnemonic() {
        assert_eq!(kind("FOO r1,r2,r3"), ErrorKind::UnknownMnemonic("FOO".to_owned()));
    }

    #[test]
    fn generate_steps_pc() {
        let lines = Line::numbered(vec!["LD r1, 2(r2)", "ADD r1,r2,r3", "LIW r1, 3"]);
        let encs = generate(lines, &catalog(), &LabelTable::new()).unwrap();
        assert_eq!(
            encs.iter().map(|enc| enc.addr).collect::<Vec<_>>(),
            vec![0, 4, 6]
        );
    }

    #[test]
    fn generate_error_is_located() {
        let lines = Line::numbered(vec!["ADD r1,r2,r3", "ADD r1"]);
        let err = generate(lines, &catalog(), &LabelTable::new()).unwrap_err();
        assert_eq!(err.line(), &Line::new(2, "ADD r1".to_owned()));
    }
}
