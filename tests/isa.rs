mod common;

use swt16::spec::isa::{AddressingMode, Format};
use swt16::spec::types::hw::Cycles;

#[test]
fn demo_catalog_shape() {
    let catalog = common::catalog();
    assert_eq!(catalog.len(), 20);

    let names = catalog.iter().map(|desc| desc.mnemonic.as_str()).collect::<Vec<_>>();
    assert_eq!(&names[..3], &["ADD", "SUB", "AND"]);
    assert_eq!(names.last(), Some(&"CALL"));

    assert!(catalog.iter().take(7).all(|desc| desc.format == Format::R));
}

#[test]
fn demo_catalog_groups() {
    let catalog = common::catalog();

    let ld = catalog.lookup("LD").unwrap();
    assert_eq!(ld.opcode, 0b1000);
    assert_eq!(ld.format, Format::S { func1: 0b0001 });
    assert_eq!(ld.cycles, Cycles::Two);

    let addi = catalog.lookup("addi").unwrap();
    assert_eq!(addi.format, Format::U { func2: 0b0010 });
    assert_eq!(addi.cycles, Cycles::One);

    let bne = catalog.lookup("BNE").unwrap();
    assert_eq!(bne.format, Format::J { func3: 0b0011 });
    assert_eq!(bne.addressing, Some(AddressingMode::Relative));

    let sys = catalog.lookup("SYS").unwrap();
    assert_eq!(sys.opcode, 0b1110);

    let call = catalog.lookup("CALL").unwrap();
    assert_eq!(call.opcode, 0b1101);
    assert_eq!(call.addressing, Some(AddressingMode::Relative));
}

#[test]
fn table_rows() {
    let catalog = common::catalog();
    let row = catalog.lookup("BEQ").unwrap().to_string();
    assert!(row.starts_with("BEQ"));
    assert!(row.contains("opc=1100"));
    assert!(row.contains("func3=0010"));
    assert!(row.ends_with("pc-relative"));
}
