//! HTTP client for the page-count and page-text endpoints of the extraction service.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::protocol::{
    PageCountResponse, PreviewResponse, FILE_FIELD, GET_PAGES_PATH, PAGE_FIELD, PDF_MIME_TYPE,
    READ_PREVIEW_PATH,
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::{ClientSettings, SettingsError},
    document::SelectedDocument,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("failed to build multipart body for {endpoint}: {source}")]
    Multipart {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} responded with status {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },
    #[error("extraction worker unavailable: {0}")]
    Unavailable(String),
    #[error("could not decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    async fn page_count(&self, document: &SelectedDocument) -> Result<u32, ClientError>;
    async fn page_text(&self, document: &SelectedDocument, page: u32)
        -> Result<String, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpExtractionClient {
    http: Client,
    pages_url: Url,
    preview_url: Url,
}

impl HttpExtractionClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let base_url = settings.base_url()?;
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::Build)?;
        Ok(Self {
            http,
            pages_url: join_endpoint(&base_url, GET_PAGES_PATH)?,
            preview_url: join_endpoint(&base_url, READ_PREVIEW_PATH)?,
        })
    }

    pub fn pages_url(&self) -> &Url {
        &self.pages_url
    }

    pub fn preview_url(&self) -> &Url {
        &self.preview_url
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &Url,
        form: Form,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|source| ClientError::Transport { endpoint, source })?;

        let response = response.error_for_status().map_err(|source| {
            match source.status() {
                Some(status) => ClientError::Status { endpoint, status },
                None => ClientError::Transport { endpoint, source },
            }
        })?;

        response
            .json::<T>()
            .await
            .map_err(|source| ClientError::Decode { endpoint, source })
    }
}

#[async_trait]
impl ExtractionBackend for HttpExtractionClient {
    async fn page_count(&self, document: &SelectedDocument) -> Result<u32, ClientError> {
        let form = Form::new().part(FILE_FIELD, document_part(GET_PAGES_PATH, document)?);
        debug!(
            name = document.name(),
            size_bytes = document.len(),
            "requesting page count"
        );
        let response: PageCountResponse = self
            .post_form(GET_PAGES_PATH, &self.pages_url, form)
            .await
            .inspect_err(|err| warn!("page count request failed: {err}"))?;
        Ok(response.total_pages)
    }

    async fn page_text(
        &self,
        document: &SelectedDocument,
        page: u32,
    ) -> Result<String, ClientError> {
        let form = Form::new()
            .part(FILE_FIELD, document_part(READ_PREVIEW_PATH, document)?)
            .text(PAGE_FIELD, page.to_string());
        debug!(name = document.name(), page, "requesting page text");
        let response: PreviewResponse = self
            .post_form(READ_PREVIEW_PATH, &self.preview_url, form)
            .await
            .inspect_err(|err| warn!(page, "page text request failed: {err}"))?;
        Ok(response.text)
    }
}

fn join_endpoint(base_url: &Url, path: &str) -> Result<Url, SettingsError> {
    base_url
        .join(path)
        .map_err(|err| SettingsError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })
}

fn document_part(endpoint: &'static str, document: &SelectedDocument) -> Result<Part, ClientError> {
    Part::bytes(document.bytes().to_vec())
        .file_name(document.name().to_string())
        .mime_str(PDF_MIME_TYPE)
        .map_err(|source| ClientError::Multipart { endpoint, source })
}
