use log::{debug, info};
use snafu::ResultExt;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Instant;

use crate::error::*;

/// Iterates over the lines of an input, with their line numbers (starting
/// at 1). The line endings are removed.
pub struct NumberedLines<R> {
    reader: R,
    path: String,
    lineno: usize,
    started: Instant,
}

impl<R: BufRead> NumberedLines<R> {
    pub fn new(reader: R, path: &str) -> NumberedLines<R> {
        NumberedLines {
            reader,
            path: path.to_string(),
            lineno: 0,
            started: Instant::now(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The number of lines read so far.
    pub fn lineno(&self) -> usize {
        self.lineno
    }

    /// Calls `f` on every non-blank line, with its line number.
    ///
    /// The first failure stops the pass and is reported with the path, the
    /// line number and the raw line. Returns the number of lines processed.
    pub fn process<F>(self, mut f: F) -> WinedsResult<usize>
    where
        F: FnMut(usize, &str) -> LineResult<()>,
    {
        let path = self.path.clone();
        let mut count = 0;
        for line_r in self {
            let (lineno, line) = line_r?;
            if line.trim().is_empty() {
                continue;
            }
            f(lineno, &line).context(LineSnafu {
                path: path.as_str(),
                lineno,
                line: line.as_str(),
            })?;
            count += 1;
        }
        Ok(count)
    }
}

impl<R: BufRead> Iterator for NumberedLines<R> {
    type Item = WinedsResult<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = String::new();
        match self.reader.read_line(&mut buf) {
            Ok(0) => {
                info!(
                    "parsed: {} lines from {} in {:.3} seconds",
                    self.lineno,
                    self.path,
                    self.started.elapsed().as_secs_f64()
                );
                None
            }
            Ok(_) => {
                self.lineno += 1;
                let line = buf.trim_end_matches(&['\r', '\n'][..]).to_string();
                Some(Ok((self.lineno, line)))
            }
            Err(e) => Some(Err(e).context(ReadingFileSnafu {
                path: self.path.clone(),
                lineno: self.lineno,
            })),
        }
    }
}

/// Opens a file for a new pass over its lines.
pub fn open_lines(path: &str) -> WinedsResult<NumberedLines<BufReader<File>>> {
    info!("opening: {}", path);
    let f = File::open(path).context(OpeningFileSnafu { path })?;
    debug!("opened: {}", path);
    Ok(NumberedLines::new(BufReader::new(f), path))
}
