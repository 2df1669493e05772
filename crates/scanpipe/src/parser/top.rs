//! Page-list (`.top`) reader.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Split};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::catalog::model::Page;
use crate::error::ParseError;

use super::page_code::{split_classic_row, split_map_row, PageCode};

/// Classic page lists start with a fixed header of this many lines.
pub const CLASSIC_HEADER_LINES: usize = 4;

/// Suffix of page lists written in the three-column map grammar.
pub const MAP_SUFFIX: &str = ".top.map";
pub const CLASSIC_SUFFIX: &str = ".top";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopGrammar {
    /// Four header lines, then `code[label]` rows.
    Classic,
    /// Whitespace columns `code label? type?`, no header.
    Map,
}

impl TopGrammar {
    /// Chooses the grammar from the file name suffix.
    pub fn from_path(path: &Path) -> Self {
        let is_map = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(MAP_SUFFIX))
            .unwrap_or(false);

        if is_map {
            TopGrammar::Map
        } else {
            TopGrammar::Classic
        }
    }

    fn header_lines(&self) -> usize {
        match self {
            TopGrammar::Classic => CLASSIC_HEADER_LINES,
            TopGrammar::Map => 0,
        }
    }
}

/// Streams a volume's page list as [`Page`] records in file order.
///
/// Running page numbers start at 1 and advance only for rows whose code
/// decodes; header rows, malformed codes and repeated codes are skipped
/// without consuming a number. The iterator stops after the first read error.
pub struct TopFileParser<R: BufRead> {
    lines: Split<R>,
    grammar: TopGrammar,
    volume_id: String,
    path: PathBuf,
    line_number: usize,
    next_running_num: u32,
    seen: HashSet<String>,
    finished: bool,
}

impl TopFileParser<BufReader<File>> {
    pub fn open(path: &Path, volume_id: &str) -> Result<Self, ParseError> {
        let file = File::open(path).map_err(|e| ParseError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(Self::from_reader(
            BufReader::new(file),
            TopGrammar::from_path(path),
            volume_id,
            path,
        ))
    }
}

impl<R: BufRead> TopFileParser<R> {
    pub fn from_reader(reader: R, grammar: TopGrammar, volume_id: &str, path: &Path) -> Self {
        Self {
            lines: reader.split(b'\n'),
            grammar,
            volume_id: volume_id.to_string(),
            path: path.to_path_buf(),
            line_number: 0,
            next_running_num: 1,
            seen: HashSet::new(),
            finished: false,
        }
    }

    fn parse_row(&mut self, line: &str) -> Option<Page> {
        let (name, label) = match self.grammar {
            TopGrammar::Classic => split_classic_row(line),
            TopGrammar::Map => split_map_row(line),
        };

        let code = match PageCode::decode(&name) {
            Ok(code) => code,
            Err(reason) => {
                if !name.is_empty() {
                    debug!(
                        "Skipping '{}' at {}:{}: {}",
                        name,
                        self.path.display(),
                        self.line_number,
                        reason
                    );
                }
                return None;
            }
        };

        if !self.seen.insert(name) {
            warn!(
                "Page '{}' listed again at {}:{}, keeping the first entry",
                code,
                self.path.display(),
                self.line_number
            );
            return None;
        }

        let page = Page::new(
            &self.volume_id,
            &code,
            self.next_running_num,
            label.as_deref(),
        );
        self.next_running_num += 1;
        Some(page)
    }
}

impl<R: BufRead> Iterator for TopFileParser<R> {
    type Item = Result<Page, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let raw = match self.lines.next() {
                Some(Ok(raw)) => raw,
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(ParseError::Read {
                        path: self.path.clone(),
                        line: self.line_number + 1,
                        source: e,
                    }));
                }
                None => {
                    self.finished = true;
                    return None;
                }
            };
            self.line_number += 1;

            if self.line_number <= self.grammar.header_lines() {
                continue;
            }

            let line = String::from_utf8_lossy(&raw);
            if let Some(page) = self.parse_row(&line) {
                return Some(Ok(page));
            }
        }
    }
}
