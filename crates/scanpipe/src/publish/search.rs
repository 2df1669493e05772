use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::model::JournalVolume;
use crate::catalog::Catalog;
use crate::config::ProjectTable;
use crate::error::PublishError;
use crate::processor::OcrTextReader;

/// The flattened search record written for every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub page_id: String,
    pub volume_id: String,
    pub text: String,
    pub article_bibcodes: Vec<String>,
    pub journal: String,
    pub volume: String,
    pub page_type: String,
    pub page_number: u32,
    pub page_label: String,
    pub page_color: String,
    pub project: String,
}

/// Builds one document per cataloged page of the volume, in page order.
pub fn documents_for_volume(
    catalog: &dyn Catalog,
    volume: &JournalVolume,
    ocr: &OcrTextReader,
    projects: &ProjectTable,
) -> Result<Vec<SearchDocument>, PublishError> {
    let project = projects.lookup(&volume.journal).to_string();

    catalog
        .pages_for_volume(&volume.id)?
        .into_iter()
        .map(|page| {
            Ok(SearchDocument {
                text: ocr.read(&page.name)?,
                article_bibcodes: catalog.bibcodes_for_page(&page.id)?,
                journal: volume.journal.clone(),
                volume: volume.volume.clone(),
                page_type: page.page_type.to_string(),
                page_number: page.volume_running_page_num,
                page_label: page.label,
                page_color: page.color_type.to_string(),
                project: project.clone(),
                volume_id: volume.id.clone(),
                page_id: page.id,
            })
        })
        .collect()
}

pub trait SearchIndex: Send + Sync {
    /// Writes the documents, replacing earlier versions with the same page id.
    fn index(&self, documents: &[SearchDocument]) -> Result<usize, PublishError>;
}

#[derive(Deserialize)]
struct BulkResponse {
    errors: bool,
}

/// Bulk indexer for an OpenSearch-compatible `_bulk` endpoint.
pub struct OpenSearchIndex {
    client: reqwest::blocking::Client,
    url: String,
    index: String,
}

impl OpenSearchIndex {
    pub fn new(url: &str, index: &str, timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Http {
                url: url.to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            index: index.to_string(),
        })
    }

    /// Action/source line pairs, newline terminated. Page ids are the
    /// document ids, so re-indexing a page overwrites it.
    pub fn bulk_body(&self, documents: &[SearchDocument]) -> Result<String, PublishError> {
        let mut body = String::new();
        for document in documents {
            let action = serde_json::json!({
                "index": { "_index": self.index, "_id": document.page_id }
            });
            body.push_str(&serde_json::to_string(&action)?);
            body.push('\n');
            body.push_str(&serde_json::to_string(document)?);
            body.push('\n');
        }
        Ok(body)
    }
}

impl SearchIndex for OpenSearchIndex {
    fn index(&self, documents: &[SearchDocument]) -> Result<usize, PublishError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let url = format!("{}/_bulk", self.url);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(self.bulk_body(documents)?)
            .send()
            .map_err(|e| PublishError::Http {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| PublishError::Http {
            url: url.clone(),
            source: e,
        })?;

        if !(200..300).contains(&status) {
            return Err(PublishError::Rejected { url, status, body });
        }

        let parsed: BulkResponse = serde_json::from_str(&body)?;
        if parsed.errors {
            return Err(PublishError::Rejected { url, status, body });
        }

        debug!("Indexed {} documents into {}", documents.len(), self.index);
        Ok(documents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{Article, Page};
    use crate::catalog::MemoryCatalog;
    use crate::parser::PageCode;
    use crate::publish::test_server::serve_once;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn document(page_id: &str) -> SearchDocument {
        SearchDocument {
            page_id: page_id.to_string(),
            volume_id: "v".to_string(),
            text: "text".to_string(),
            article_bibcodes: vec![],
            journal: "test.".to_string(),
            volume: "0001".to_string(),
            page_type: "Normal".to_string(),
            page_number: 1,
            page_label: "1".to_string(),
            page_color: "BW".to_string(),
            project: String::new(),
        }
    }

    #[test]
    fn test_documents_for_volume() {
        let catalog = MemoryCatalog::new();
        let volume = JournalVolume::new("seri", "test.", "0001");
        catalog.insert_volume(&volume).unwrap();

        let page = catalog
            .upsert_page(&Page::new(
                &volume.id,
                &PageCode::decode("0000255,001").unwrap(),
                1,
                Some("255-01"),
            ))
            .unwrap();
        catalog
            .upsert_article(&Article::new("bib", &volume.id, Some(1), vec![page.id.clone()]))
            .unwrap();

        let ocr_dir = TempDir::new().unwrap();
        std::fs::write(ocr_dir.path().join("0000255,001.txt"), "R&eacute;sum&eacute;").unwrap();

        let projects =
            ProjectTable::from_map(HashMap::from([("test.".to_string(), "PHaEDRA".to_string())]));
        let documents = documents_for_volume(
            &catalog,
            &volume,
            &OcrTextReader::new(ocr_dir.path()),
            &projects,
        )
        .unwrap();

        assert_eq!(documents.len(), 1);
        let doc = &documents[0];
        assert_eq!(doc.page_id, page.id);
        assert_eq!(doc.text, "Résumé");
        assert_eq!(doc.article_bibcodes, vec!["bib".to_string()]);
        assert_eq!(doc.page_type, "FrontMatter");
        assert_eq!(doc.page_label, "255-01");
        assert_eq!(doc.page_color, "BW");
        assert_eq!(doc.project, "PHaEDRA");
    }

    #[test]
    fn test_bulk_body_pairs_lines() {
        let index =
            OpenSearchIndex::new("http://localhost:9200/", "scans", Duration::from_secs(1))
                .unwrap();
        let body = index.bulk_body(&[document("p1"), document("p2")]).unwrap();

        let lines: Vec<_> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        let action: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action["index"]["_id"], "p1");
        assert_eq!(action["index"]["_index"], "scans");
        let source: SearchDocument = serde_json::from_str(lines[3]).unwrap();
        assert_eq!(source.page_id, "p2");
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_index_posts_bulk_request() {
        let (url, server) = serve_once(200, r#"{"took":1,"errors":false,"items":[]}"#);
        let index = OpenSearchIndex::new(&url, "scans", Duration::from_secs(5)).unwrap();

        assert_eq!(index.index(&[document("p1")]).unwrap(), 1);
        let captured = server.join().unwrap();
        assert!(captured.request_line.starts_with("POST /_bulk"));
        assert!(captured.body.contains("\"p1\""));
    }

    #[test]
    fn test_index_reports_item_errors() {
        let (url, server) = serve_once(200, r#"{"took":1,"errors":true,"items":[]}"#);
        let index = OpenSearchIndex::new(&url, "scans", Duration::from_secs(5)).unwrap();

        let result = index.index(&[document("p1")]);
        server.join().unwrap();
        assert!(matches!(result, Err(PublishError::Rejected { status: 200, .. })));
    }

    #[test]
    fn test_empty_batch_sends_nothing() {
        let index =
            OpenSearchIndex::new("http://127.0.0.1:1", "scans", Duration::from_secs(1)).unwrap();
        assert_eq!(index.index(&[]).unwrap(), 0);
    }
}
