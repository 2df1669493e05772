use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::model::JournalVolume;
use crate::catalog::Catalog;
use crate::error::PublishError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub bibcode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePayload {
    pub name: String,
    pub label: String,
    pub format: String,
    pub color_type: String,
    pub page_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub volume_running_page_num: u32,
    pub articles: Vec<ArticleRef>,
}

/// A volume with its pages and their articles, as sent to the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumePayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub journal: String,
    pub volume: String,
    pub pages: Vec<PagePayload>,
}

impl VolumePayload {
    pub fn from_catalog(
        catalog: &dyn Catalog,
        volume: &JournalVolume,
    ) -> Result<Self, PublishError> {
        let pages = catalog
            .pages_for_volume(&volume.id)?
            .into_iter()
            .map(|page| {
                let articles = catalog
                    .bibcodes_for_page(&page.id)?
                    .into_iter()
                    .map(|bibcode| ArticleRef { bibcode })
                    .collect();
                Ok(PagePayload {
                    name: page.name,
                    label: page.label,
                    format: page.format,
                    color_type: page.color_type.to_string(),
                    page_type: page.page_type.to_string(),
                    width: page.width,
                    height: page.height,
                    volume_running_page_num: page.volume_running_page_num,
                    articles,
                })
            })
            .collect::<Result<Vec<_>, PublishError>>()?;

        Ok(Self {
            kind: volume.kind.clone(),
            journal: volume.journal.clone(),
            volume: volume.volume.clone(),
            pages,
        })
    }
}

/// Raw answer of the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResponse {
    pub status: u16,
    pub body: String,
}

impl PushResponse {
    /// Only `200 OK` counts as accepted.
    pub fn is_accepted(&self) -> bool {
        self.status == 200
    }
}

pub trait CatalogPush: Send + Sync {
    /// Sends the volume. Transport failures are errors; any HTTP answer,
    /// accepted or not, is returned as a [`PushResponse`].
    fn push(&self, payload: &VolumePayload) -> Result<PushResponse, PublishError>;

    fn endpoint(&self) -> &str;
}

/// Remote catalog reached with a single JSON `PUT`.
pub struct HttpCatalogPush {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpCatalogPush {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Http {
                url: url.to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl CatalogPush for HttpCatalogPush {
    fn push(&self, payload: &VolumePayload) -> Result<PushResponse, PublishError> {
        let response = self
            .client
            .put(&self.url)
            .json(payload)
            .send()
            .map_err(|e| PublishError::Http {
                url: self.url.clone(),
                source: e,
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| PublishError::Http {
            url: self.url.clone(),
            source: e,
        })?;

        debug!(
            "Pushed {}/{}/{} to {}: {}",
            payload.kind, payload.journal, payload.volume, self.url, status
        );
        Ok(PushResponse { status, body })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
