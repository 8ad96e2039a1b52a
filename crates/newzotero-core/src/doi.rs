//! DOI metadata lookup against Crossref.
//!
//! Called directly from the client; the primary backend is not involved.

use reqwest::Client;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{FileKind, FileMeta, LibraryFile};
use crate::util::compact_text;

/// HTTP client for the Crossref works API.
#[derive(Debug, Clone)]
pub struct CrossrefClient {
    base_url: String,
    client: Client,
}

impl CrossrefClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            base_url: config.crossref_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Look up `doi` and build a library file from its metadata.
    pub async fn lookup(&self, doi: &str) -> Result<LibraryFile> {
        let doi = doi.trim();
        if doi.is_empty() {
            return Err(Error::InvalidInput("Please enter a valid DOI".to_string()));
        }

        let url = format!("{}/works/{}", self.base_url, urlencoding::encode(doi));
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status, body = %compact_text(&body), "Crossref lookup failed");
            return Err(Error::NotFound(format!("No metadata found for DOI {doi}")));
        }

        let payload = response.json::<CrossrefEnvelope>().await?;
        Ok(LibraryFile::from_doi(doi, payload.message.into_meta()))
    }
}

#[derive(Debug, Deserialize)]
struct CrossrefEnvelope {
    message: CrossrefWork,
}

#[derive(Debug, Default, Deserialize)]
struct CrossrefWork {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<CrossrefAuthor>,
    #[serde(default)]
    created: Option<CrossrefDate>,
}

#[derive(Debug, Deserialize)]
struct CrossrefAuthor {
    family: Option<String>,
    given: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrossrefDate {
    #[serde(rename = "date-time")]
    date_time: Option<String>,
}

impl CrossrefWork {
    fn into_meta(self) -> FileMeta {
        let author = self
            .author
            .iter()
            .map(|author| {
                [author.family.as_deref(), author.given.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join(", ");

        FileMeta {
            title: self.title.into_iter().next().unwrap_or_default(),
            author,
            date: self
                .created
                .and_then(|created| created.date_time)
                .unwrap_or_default(),
            page: String::new(),
            kind: FileKind::Doi,
            ..FileMeta::default()
        }
    }
}

/// Parse a Crossref works payload into file metadata.
pub fn parse_crossref_work(payload: &str) -> Result<FileMeta> {
    let envelope: CrossrefEnvelope = serde_json::from_str(payload)?;
    Ok(envelope.message.into_meta())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn maps_title_authors_and_created_date() {
        let meta = parse_crossref_work(
            r#"{
                "status": "ok",
                "message": {
                    "title": ["Attention Is All You Need"],
                    "author": [
                        {"given": "Ashish", "family": "Vaswani"},
                        {"family": "Shazeer"},
                        {"given": "Solo"}
                    ],
                    "created": {"date-time": "2017-06-12T00:00:00Z"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(meta.title, "Attention Is All You Need");
        assert_eq!(meta.author, "Vaswani Ashish, Shazeer, Solo");
        assert_eq!(meta.date, "2017-06-12T00:00:00Z");
        assert_eq!(meta.kind, FileKind::Doi);
    }

    #[test]
    fn missing_fields_map_to_empty_strings() {
        let meta = parse_crossref_work(r#"{"message": {}}"#).unwrap();
        assert_eq!(meta.title, "");
        assert_eq!(meta.author, "");
        assert_eq!(meta.date, "");
    }
}
