//! Request/response pair for asking a page to describe its job posting.
//!
//! Wire shape: `{"action": "extractJD"}` in, `{"jobDescription": "..."}` out.
//! An empty `jobDescription` means the caller should ask for a manual paste.

use anyhow::{Context, Result};
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::parser;
use crate::settings::ExtractorConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    #[serde(rename = "extractJD")]
    ExtractJobDescription,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "jobDescription")]
    pub job_description: String,
}

impl Response {
    pub fn is_empty(&self) -> bool {
        self.job_description.is_empty()
    }
}

pub fn parse_request(raw: &str) -> Result<Request> {
    serde_json::from_str(raw.trim()).context("Unrecognized request")
}

/// Answer a request against an already-parsed page.
pub fn handle(request: &Request, document: &Html, config: &ExtractorConfig) -> Response {
    match request {
        Request::ExtractJobDescription => Response {
            job_description: parser::extract_job_description(document, config),
        },
    }
}

/// Async form of [`handle`]. `Html` is not `Send`, so parsing and extraction
/// happen together on a blocking thread.
pub async fn respond(request: Request, html: String, config: ExtractorConfig) -> Result<Response> {
    tokio::task::spawn_blocking(move || {
        let document = Html::parse_document(&html);
        handle(&request, &document, &config)
    })
    .await
    .context("Extraction task failed")
}
