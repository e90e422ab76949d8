use std::path::{Path, PathBuf};

pub const DEFAULT_LISTING_EXT: &str = "hex";

/// `prog.asm` assembles to `prog.hex` in the working directory.
pub fn default_listing_path(in_src: &Path) -> PathBuf {
    PathBuf::from(in_src.file_stem().unwrap_or_else(|| in_src.as_os_str()))
        .with_extension(DEFAULT_LISTING_EXT)
}
