//! Where the diff comes from: named files in order, or stdin.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bstr::BString;
use git_fancy::ByteLines;

pub type Reader = Box<dyn BufRead + Send>;

/// Open every input up front so a missing file fails before any output.
/// No files, or `-`, means stdin.
pub fn open_all(files: &[PathBuf]) -> Result<Vec<Reader>> {
    if files.is_empty() {
        return Ok(vec![stdin()]);
    }
    files.iter().map(|path| open(path)).collect()
}

fn open(path: &Path) -> Result<Reader> {
    if path == Path::new("-") {
        return Ok(stdin());
    }
    let file = File::open(path).with_context(|| format!("cannot open '{}'", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn stdin() -> Reader {
    Box::new(BufReader::new(io::stdin()))
}

/// The lines of all inputs, one after another.
pub fn lines(readers: Vec<Reader>) -> impl Iterator<Item = BString> + Send + 'static {
    readers.into_iter().flat_map(ByteLines::new)
}
