//! Semicolon-delimited tables.
//!
//! Every tabular artifact of a run uses `;` as separator, a single header
//! line, and minimal quoting: a field is wrapped in double quotes only when it
//! contains the separator, a quote, or a line break. Embedded quotes are
//! doubled. Quoted fields spanning lines are not supported.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::errors::CoreError;

pub const SEPARATOR: char = ';';

/// An in-memory table: header plus rows of raw cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Position of a header column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Read a table from `path`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Io` when the file cannot be read and
    /// `CoreError::MalformedCsv` when a row's width differs from the header.
    pub fn read(path: &Path) -> Result<Self, CoreError> {
        let reader = BufReader::new(File::open(path)?);
        Self::from_reader(reader, &path.display().to_string())
    }

    /// Parse a table from any buffered reader. `origin` names the source in errors.
    ///
    /// # Errors
    ///
    /// See [`Table::read`].
    pub fn from_reader<R: BufRead>(reader: R, origin: &str) -> Result<Self, CoreError> {
        let mut lines = reader.lines().enumerate();
        let header = match lines.next() {
            Some((_, line)) => split_line(strip_bom(&line?)),
            None => return Ok(Self::default()),
        };
        let mut table = Self::new(header);
        for (index, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let cells = split_line(&line);
            if cells.len() != table.header.len() {
                return Err(CoreError::MalformedCsv {
                    path: origin.to_string(),
                    line: index + 1,
                    message: format!(
                        "expected {} fields, found {}",
                        table.header.len(),
                        cells.len()
                    ),
                });
            }
            table.rows.push(cells);
        }
        Ok(table)
    }

    /// Write the table to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Io` on any write failure.
    pub fn write(&self, path: &Path) -> Result<(), CoreError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize the table; every line ends with `\n`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Io` on any write failure.
    pub fn to_writer<W: Write>(&self, writer: &mut W) -> Result<(), CoreError> {
        writeln!(writer, "{}", join_line(&self.header))?;
        for row in &self.rows {
            writeln!(writer, "{}", join_line(row))?;
        }
        Ok(())
    }
}

fn strip_bom(line: &str) -> &str {
    line.strip_prefix('\u{feff}').unwrap_or(line)
}

/// Join cells into one line, quoting where needed.
#[must_use]
pub fn join_line<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|c| quote(c.as_ref()))
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

fn quote(cell: &str) -> String {
    if cell.contains([SEPARATOR, '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Split one line into cells, honouring quoted fields.
#[must_use]
pub fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            c if c == SEPARATOR && !in_quotes => cells.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    cells.push(current);
    cells
}
