//! Article-list (`.dat`) reader.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Split};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::model::Article;
use crate::catalog::Catalog;
use crate::error::ParseError;

use super::page_code::PageCode;

/// Columns before the first page reference: bibcode and two unused fields.
const PAGE_TOKENS_START: usize = 3;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s|]+").expect("Invalid regex"));

/// Splits an article-list row on runs of whitespace and pipes.
pub fn tokenize(line: &str) -> Vec<&str> {
    SEPARATORS
        .split(line)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Streams a volume's article list, linking each article to its pages.
///
/// Every row is written to the catalog as it is read: the article is
/// fetched or created by bibcode and its page set replaced by the pages the
/// row references. A reference to a page missing from the volume's catalog
/// ends the stream with [`ParseError::UnknownPage`].
pub struct DatFileParser<'a, R: BufRead> {
    lines: Split<R>,
    catalog: &'a dyn Catalog,
    volume_id: String,
    path: PathBuf,
    line_number: usize,
    finished: bool,
}

impl<'a> DatFileParser<'a, BufReader<File>> {
    pub fn open(path: &Path, volume_id: &str, catalog: &'a dyn Catalog) -> Result<Self, ParseError> {
        let file = File::open(path).map_err(|e| ParseError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::from_reader(BufReader::new(file), volume_id, catalog, path))
    }
}

impl<'a, R: BufRead> DatFileParser<'a, R> {
    pub fn from_reader(reader: R, volume_id: &str, catalog: &'a dyn Catalog, path: &Path) -> Self {
        Self {
            lines: reader.split(b'\n'),
            catalog,
            volume_id: volume_id.to_string(),
            path: path.to_path_buf(),
            line_number: 0,
            finished: false,
        }
    }

    fn link_row(&self, tokens: &[&str]) -> Result<Article, ParseError> {
        let bibcode = tokens[0];

        let mut seen = HashSet::new();
        let mut page_ids = Vec::new();
        let mut start_page_number = None;

        for token in tokens.iter().skip(PAGE_TOKENS_START) {
            if !PageCode::is_valid(token) || !seen.insert(*token) {
                continue;
            }

            let page = self
                .catalog
                .find_page(&self.volume_id, token)?
                .ok_or_else(|| ParseError::UnknownPage {
                    bibcode: bibcode.to_string(),
                    page: token.to_string(),
                    path: self.path.clone(),
                    line: self.line_number,
                })?;

            if start_page_number.is_none() {
                start_page_number = Some(page.volume_running_page_num);
            }
            page_ids.push(page.id);
        }

        let article = Article::new(bibcode, &self.volume_id, start_page_number, page_ids);
        Ok(self.catalog.upsert_article(&article)?)
    }
}

impl<R: BufRead> Iterator for DatFileParser<'_, R> {
    type Item = Result<Article, ParseError>;

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

            let line = String::from_utf8_lossy(&raw);
            let tokens = tokenize(&line);
            if tokens.is_empty() {
                continue;
            }

            let result = self.link_row(&tokens);
            if result.is_err() {
                self.finished = true;
            }
            return Some(result);
        }
    }
}
