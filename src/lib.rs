pub mod assets;
pub(crate) mod common;

pub mod spec;

pub mod assembler;

pub mod cli;
