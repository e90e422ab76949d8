#![allow(dead_code)]

use swt16::spec::{isa::Catalog, load};

pub const DEMO_ISA: &str = include_str!("../../isa/swt16.toml");
pub const DEMO_PROG: &str = include_str!("../../asm/demo.asm");

pub fn catalog() -> Catalog {
    load::parse_isa(DEMO_ISA).unwrap()
}

pub fn render(src: &str) -> String {
    swt16::assembler::assemble(src, &catalog()).unwrap().render()
}
