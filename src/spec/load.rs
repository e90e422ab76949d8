use super::isa::{AddressingMode, BuildError, Builder, Catalog, Entry, SubField};
use super::types::hw::{Cycles, Nibble, NIBBLE_MAX, NIBBLE_WIDTH};
use serde::Deserialize;
use std::convert::TryFrom;
use std::fmt::Display;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum Error {
    Io(PathBuf, std::io::Error),
    Syntax(toml::de::Error),
    BadBits(String, &'static str),
    ConflictingSubFields(String),
    BadCycles(String, u8),
    Catalog(BuildError),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(path, err) => write!(f, "Could not read '{}': {}", path.display(), err),
            Error::Syntax(err) => write!(f, "Malformed ISA description: {}", err),
            Error::BadBits(bits, why) => write!(f, "Bad bit pattern '{}': {}", bits, why),
            Error::ConflictingSubFields(name) => write!(
                f,
                "Instruction '{}' declares more than one of func1, func2 and func3",
                name
            ),
            Error::BadCycles(name, cycles) => write!(
                f,
                "Instruction '{}' has {} cycles, expected 1 or 2",
                name, cycles
            ),
            Error::Catalog(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(_, err) => Some(err),
            Error::Syntax(err) => Some(err),
            Error::Catalog(err) => Some(err),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Syntax(err)
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Error::Catalog(err)
    }
}

/*
    On-disk layout, mirroring the two tiers of `crate::spec::isa`:

        [[instr]]               # root level, R-format
        name = "ADD"
        opc = "0001"

        [[root]]                # a group, members share `opc`
        opc = "1000"
          [[root.instr]]
          name = "LD"
          func1 = "0000"
          cycles = 2
          addressing = "absolute"

    Groups may contain further `[[root.root]]` groups.
*/

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IsaDoc {
    #[serde(default)]
    instr: Vec<InstrDoc>,
    #[serde(default)]
    root: Vec<GroupDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupDoc {
    opc: String,
    #[serde(default)]
    instr: Vec<InstrDoc>,
    #[serde(default)]
    root: Vec<GroupDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstrDoc {
    name: String,
    opc: Option<String>,
    func1: Option<String>,
    func2: Option<String>,
    func3: Option<String>,
    #[serde(default = "InstrDoc::default_cycles")]
    cycles: u8,
    addressing: Option<AddressingMode>,
}

fn parse_nibble(bits: &str) -> Result<Nibble, Error> {
    let digits = bits
        .strip_prefix("0b")
        .or_else(|| bits.strip_prefix("0B"))
        .unwrap_or(bits);

    if digits.is_empty() || !digits.chars().all(|c| c == '0' || c == '1') {
        return Err(Error::BadBits(bits.to_owned(), "expected binary digits"));
    }

    let significant = digits.trim_start_matches('0');
    if significant.len() > NIBBLE_WIDTH as usize {
        return Err(Error::BadBits(bits.to_owned(), "does not fit in a nibble"));
    }

    let val = Nibble::from_str_radix(if significant.is_empty() { "0" } else { significant }, 2)
        .map_err(|_| Error::BadBits(bits.to_owned(), "expected binary digits"))?;
    assert!(val <= NIBBLE_MAX);
    Ok(val)
}

impl InstrDoc {
    fn default_cycles() -> u8 {
        1
    }

    fn sub_field(&self) -> Result<Option<SubField>, Error> {
        let declared = [
            self.func1.as_deref().map(|b| (b, SubField::Func1 as fn(Nibble) -> SubField)),
            self.func2.as_deref().map(|b| (b, SubField::Func2 as fn(Nibble) -> SubField)),
            self.func3.as_deref().map(|b| (b, SubField::Func3 as fn(Nibble) -> SubField)),
        ];

        let mut found = declared.iter().flatten();
        match (found.next(), found.next()) {
            (None, _) => Ok(None),
            (Some((bits, ctor)), None) => Ok(Some(ctor(parse_nibble(bits)?))),
            (Some(_), Some(_)) => Err(Error::ConflictingSubFields(self.name.clone())),
        }
    }

    fn into_entry(self, grouped: bool) -> Result<Entry, Error> {
        let cycles =
            Cycles::try_from(self.cycles).map_err(|c| Error::BadCycles(self.name.clone(), c))?;
        let opcode = self.opc.as_deref().map(parse_nibble).transpose()?;
        // Root-level entries never probe their sub-field attributes.
        let sub_field = if grouped { self.sub_field()? } else { None };

        Ok(Entry::new(
            self.name,
            opcode,
            sub_field,
            cycles,
            self.addressing,
        ))
    }
}

fn register_group(builder: &mut Builder, group: GroupDoc) -> Result<(), Error> {
    builder.enter_group(parse_nibble(&group.opc)?);
    for instr in group.instr {
        builder.register(instr.into_entry(true)?)?;
    }
    for sub in group.root {
        register_group(builder, sub)?;
    }
    builder.leave_group();
    Ok(())
}

pub fn parse_isa(src: &str) -> Result<Catalog, Error> {
    let doc: IsaDoc = toml::from_str(src)?;

    let mut builder = Builder::new();
    for instr in doc.instr {
        builder.register(instr.into_entry(false)?)?;
    }
    for group in doc.root {
        register_group(&mut builder, group)?;
    }

    let catalog = builder.build();
    log::debug!("loaded {} instruction descriptors", catalog.len());
    Ok(catalog)
}

pub fn load_isa(path: &Path) -> Result<Catalog, Error> {
    let src = std::fs::read_to_string(path).map_err(|err| Error::Io(path.to_path_buf(), err))?;
    parse_isa(&src)
}
