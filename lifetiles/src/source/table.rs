//! Header-indexed TSV reader over `csv`.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::SourceError;

/// A data row borrowed from the reader's record buffer.
pub(super) struct Row<'a> {
    /// 1-based line number.
    pub line: usize,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    /// Field at `col`; missing trailing fields read as empty.
    pub fn get(&self, col: usize) -> &'a str {
        self.record.get(col).unwrap_or("")
    }
}

pub(super) struct Table<R> {
    reader: csv::Reader<R>,
    header: Vec<String>,
    record: StringRecord,
}

impl<R: Read> Table<R> {
    /// Tab-delimited, unquoted, `#` comments, ragged rows allowed.
    pub fn new(reader: R) -> Result<Self, SourceError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .comment(Some(b'#'))
            .quoting(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let header: Vec<String> = reader
            .headers()?
            .iter()
            .map(str::to_ascii_lowercase)
            .collect();
        if header.iter().all(String::is_empty) {
            return Err(SourceError::MissingHeader);
        }

        Ok(Self {
            reader,
            header,
            record: StringRecord::new(),
        })
    }

    /// Index of the first header matching any of `names`.
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.header.iter().position(|h| h == name))
    }

    /// Like [`column`](Self::column) but required.
    pub fn require(&self, names: &[&str], label: &'static str) -> Result<usize, SourceError> {
        self.column(names).ok_or(SourceError::MissingColumn(label))
    }

    /// Next data row; blank and comment lines never reach here.
    pub fn next_row(&mut self) -> Result<Option<Row<'_>>, SourceError> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        let line = self
            .record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or_default();
        Ok(Some(Row {
            line,
            record: &self.record,
        }))
    }
}
