//! Pull-based adapters between byte streams and [`DiffParser`].

use std::io::{self, BufRead, Write};

use bstr::{BString, ByteSlice};

use crate::parser::DiffParser;
use crate::render::RenderOptions;
use crate::Result;

/// Raw lines of a reader, without their `\n` (or `\r\n`) terminator.
///
/// A read error ends the stream like EOF would; the parser then closes
/// its open block normally.
#[derive(Debug)]
pub struct ByteLines<R> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> ByteLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for ByteLines<R> {
    type Item = BString;

    fn next(&mut self) -> Option<BString> {
        if self.done {
            return None;
        }
        self.buf.clear();
        loop {
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    tracing::warn!(target: "fancy::input", error = %err, "input ended early");
                    self.done = true;
                    return None;
                }
            }
        }
        let line = self.buf.strip_suffix(b"\n").unwrap_or(&self.buf[..]);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Some(BString::from(line))
    }
}

/// Rendered lines of an input line iterator.
///
/// Each call pulls input only until the parser has something to say, so
/// memory stays bounded by the largest open block.
#[derive(Debug)]
pub struct FancyLines<I> {
    input: I,
    parser: DiffParser,
    finished: bool,
}

impl<I, L> FancyLines<I>
where
    I: Iterator<Item = L>,
    L: AsRef<[u8]>,
{
    pub fn new(input: I, options: RenderOptions) -> Self {
        Self {
            input,
            parser: DiffParser::new(options),
            finished: false,
        }
    }
}

impl<I, L> Iterator for FancyLines<I>
where
    I: Iterator<Item = L>,
    L: AsRef<[u8]>,
{
    type Item = Result<BString>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.parser.pop() {
                return Some(Ok(line));
            }
            if self.finished {
                return None;
            }
            match self.input.next() {
                Some(line) => {
                    if let Err(err) = self.parser.feed(line.as_ref()) {
                        self.finished = true;
                        return Some(Err(err));
                    }
                }
                None => {
                    self.parser.finish();
                    self.finished = true;
                }
            }
        }
    }
}

/// Render a whole diff held in memory. Every output line ends in `\n`.
pub fn render_to_string(input: &str, options: RenderOptions) -> Result<String> {
    let mut out = Vec::with_capacity(input.len());
    write_fancy(ByteSlice::lines(input.as_bytes()), options, &mut out)?;
    Ok(out.to_str_lossy().into_owned())
}

/// Render `lines` into `out`, one `\n`-terminated line at a time.
pub fn write_fancy<I, L, W>(lines: I, options: RenderOptions, out: &mut W) -> Result<()>
where
    I: Iterator<Item = L>,
    L: AsRef<[u8]>,
    W: Write + ?Sized,
{
    for line in FancyLines::new(lines, options) {
        let line = line?;
        out.write_all(&line)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
