pub mod types;

pub mod generate;
pub mod preprocess;
pub mod resolve;

pub use generate::generate;
pub use preprocess::preprocess;
pub use resolve::resolve;
