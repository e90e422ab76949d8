use crate::assembler::{self, Listing};
use crate::assets;
use crate::spec::{isa::Catalog, load};
use ansi_term::Colour::{Green, Red};
use anyhow::Context;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[cfg(windows)]
pub fn terminal_init() {
    let _ = ansi_term::enable_ansi_support();
}

#[cfg(not(windows))]
pub fn terminal_init() {}

#[derive(StructOpt, Debug)]
#[structopt(name = "swt16")]
pub enum CommandRoot {
    Asm(SubcommandAsm),
    Isa(SubcommandIsa),
}

#[derive(StructOpt, Debug)]
struct IsaOpts {
    /// ISA description to assemble against.
    #[structopt(long, default_value = "isa.toml", parse(from_os_str))]
    isa: PathBuf,
}

#[derive(StructOpt, Debug)]
#[structopt(name = "swasm")]
pub struct SubcommandAsm {
    #[structopt(name = "in.asm", parse(from_os_str))]
    in_src: PathBuf,

    #[structopt(name = "out.hex", parse(from_os_str))]
    out_hex: Option<PathBuf>,

    #[structopt(flatten)]
    isa_opts: IsaOpts,

    /// Print the listing instead of writing a file.
    #[structopt(long)]
    stdout: bool,
}

/// Print the instruction catalog loaded from an ISA description.
#[derive(StructOpt, Debug)]
pub struct SubcommandIsa {
    #[structopt(flatten)]
    isa_opts: IsaOpts,
}

pub fn root(cmd: CommandRoot) -> ! {
    match cmd {
        CommandRoot::Asm(scmd) => asm(scmd),
        CommandRoot::Isa(scmd) => isa(scmd),
    };
}

pub fn asm(cmd: SubcommandAsm) -> ! {
    exit_with(try_asm(cmd))
}

pub fn isa(cmd: SubcommandIsa) -> ! {
    exit_with(try_isa(cmd))
}

fn exit_with(res: anyhow::Result<()>) -> ! {
    match res {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            eprintln!("{} {:#}", Red.bold().paint("error:"), err);
            std::process::exit(1);
        }
    }
}

fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    load::load_isa(path)
        .with_context(|| format!("Could not load ISA description '{}'", path.display()))
}

pub fn assemble_path(path: &Path, catalog: &Catalog) -> anyhow::Result<Listing> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read '{}'", path.display()))?;
    assembler::assemble(&src, catalog)
        .with_context(|| format!("Could not assemble '{}'", path.display()))
}

/// Assemble `in_src` and write its listing to `out_hex`. The file is only written once the
/// whole listing has been rendered, so a failed assembly leaves `out_hex` untouched.
pub fn assemble_to_path(
    in_src: &Path,
    out_hex: &Path,
    catalog: &Catalog,
) -> anyhow::Result<Listing> {
    let listing = assemble_path(in_src, catalog)?;
    std::fs::write(out_hex, listing.render())
        .with_context(|| format!("Could not write '{}'", out_hex.display()))?;
    Ok(listing)
}

fn try_asm(cmd: SubcommandAsm) -> anyhow::Result<()> {
    let SubcommandAsm {
        in_src,
        out_hex,
        isa_opts,
        stdout,
    } = cmd;
    let catalog = load_catalog(&isa_opts.isa)?;

    if stdout {
        print!("{}", assemble_path(&in_src, &catalog)?.render());
        return Ok(());
    }

    let out_name = out_hex.unwrap_or_else(|| assets::default_listing_path(&in_src));
    let listing = assemble_to_path(&in_src, &out_name, &catalog)?;

    eprintln!(
        "{} {} ({} words)",
        Green.bold().paint("wrote"),
        out_name.display(),
        listing.words().len()
    );
    Ok(())
}

fn try_isa(cmd: SubcommandIsa) -> anyhow::Result<()> {
    let catalog = load_catalog(&cmd.isa_opts.isa)?;
    for desc in catalog.iter() {
        println!("{}", desc);
    }
    Ok(())
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

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("swt16-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn writes_listing() {
        let (src, out) = (scratch("ok.asm"), scratch("ok.hex"));
        std::fs::write(&src, "START: ADD r1,r2,r3\n").unwrap();

        let listing = assemble_to_path(&src, &out, &catalog()).unwrap();
        assert_eq!(listing.words(), vec![0x3211]);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "3211  //ADD r1,r2,r3\n");
    }

    #[test]
    fn failed_assembly_writes_nothing() {
        let (src, out) = (scratch("bad.asm"), scratch("bad.hex"));
        std::fs::write(&src, "ADD r1,r2,r3\nFOO r1,r2,r3\n").unwrap();
        let _ = std::fs::remove_file(&out);

        let err = assemble_to_path(&src, &out, &catalog()).unwrap_err();
        assert!(format!("{:#}", err).contains("FOO"));
        assert!(!out.exists());
    }

    #[test]
    fn missing_source() {
        let out = scratch("missing.hex");
        let _ = std::fs::remove_file(&out);

        assert!(assemble_to_path(&scratch("missing.asm"), &out, &catalog()).is_err());
        assert!(!out.exists());
    }
}
