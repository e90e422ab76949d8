pub mod immediate;
pub mod labels;
pub mod listing;
pub mod operand;
pub mod phases;

pub use listing::Listing;
pub use phases::types::{Error, ErrorKind, Line, Located};

use crate::spec::isa::Catalog;

/// Assemble raw source text (comments and blank lines allowed) against `catalog`.
pub fn assemble(source: &str, catalog: &Catalog) -> Result<Listing, Error> {
    assemble_lines(phases::preprocess(source), catalog)
}

/// Assemble lines which have already been cleaned of comments and surrounding whitespace.
/// Either every line is encoded, or the first failure is returned and nothing else.
pub fn assemble_lines(lines: Vec<Line>, catalog: &Catalog) -> Result<Listing, Error> {
    let (labels, insts) = phases::resolve(lines, catalog)?;
    let encodings = phases::generate(insts, catalog, &labels)?;
    let listing = Listing::new(labels, encodings);

    log::info!(
        "assembled {} word(s), {} label(s), ending at {:#06X}",
        listing.words().len(),
        listing.labels().len(),
        listing.end_addr()
    );

    Ok(listing)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spec::isa::{Builder, Entry};
    use crate::spec::types::hw::Cycles;

    fn catalog() -> Catalog {
        let mut builder = Builder::new();
        builder
            .register(Entry::new("ADD".to_owned(), Some(1), None, Cycles::One, None))
            .unwrap();
        builder.build()
    }

    #[test]
    fn labelled_instruction() {
        let listing = assemble("START: ADD r1,r2,r3 ; go", &catalog()).unwrap();
        assert_eq!(listing.render(), "3211  //ADD r1,r2,r3\n");
        assert_eq!(listing.labels().get("START"), Some(0));
    }

    #[test]
    fn failure_reports_physical_line() {
        let err = assemble("ADD r1,r2,r3\n\n; nothing\nADD r1,r2,x", &catalog()).unwrap_err();
        assert_eq!(err.line().number, 4);
        assert!(matches!(err.value(), ErrorKind::MalformedOperand(..)));
    }
}
