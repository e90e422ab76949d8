pub mod isa;
pub mod load;
pub mod types;
