//! Google Drive v3 remote store.

use super::auth::TokenSource;
use super::{RemoteEntry, RemoteEntryStream, RemoteStore};
use crate::error::{ErrorKind, Result};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size)";
const PAGE_SIZE: &str = "1000";

/// Remote store backed by the Google Drive v3 REST API.
///
/// Obtained from [`DriveAuthenticator`](super::DriveAuthenticator); every
/// request carries a bearer token that is refreshed shortly before it
/// expires.
pub struct DriveRemote {
    name: String,
    client: Client,
    tokens: TokenSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    /// Drive encodes int64 fields as JSON strings.
    size: Option<String>,
}
impl From<DriveFile> for RemoteEntry {
    fn from(file: DriveFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            size: file.size.and_then(|size| size.parse().ok()),
        }
    }
}

impl DriveRemote {
    pub(crate) fn new(client: Client, tokens: TokenSource) -> Self {
        Self {
            name: "google-drive".to_string(),
            client,
            tokens,
        }
    }

    async fn fetch_page(&self, folder_id: &str, page_token: Option<&str>) -> Result<FileList> {
        let bearer = self.tokens.bearer().await?;
        let query = parents_query(folder_id);
        let mut request = self
            .client
            .get(format!("{API_BASE}/files"))
            .bearer_auth(bearer)
            .query(&[("q", query.as_str()), ("fields", LIST_FIELDS), ("pageSize", PAGE_SIZE)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        let response = request
            .send()
            .await
            .or_raise(|| ErrorKind::Network(format!("could not list folder {folder_id}")))?;
        let response = check_status(response, &format!("folder {folder_id}"))?;
        response
            .json::<FileList>()
            .await
            .or_raise(|| ErrorKind::BackendError(format!("malformed listing for folder {folder_id}")))
    }
}

#[async_trait]
impl RemoteStore for DriveRemote {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, folder_id: &'a str) -> RemoteEntryStream<'a> {
        Box::pin(stream! {
            let mut page_token: Option<String> = None;
            loop {
                let page = match self.fetch_page(folder_id, page_token.as_deref()).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        break;
                    },
                };
                for file in page.files {
                    yield Ok(RemoteEntry::from(file));
                }
                match page.next_page_token {
                    Some(token) if !token.is_empty() => {
                        tracing::trace!(folder = folder_id, "Fetching next listing page");
                        page_token = Some(token);
                    },
                    _ => break,
                }
            }
        })
    }

    async fn read(&self, file_id: &str) -> Result<Vec<u8>> {
        let bearer = self.tokens.bearer().await?;
        let response = self
            .client
            .get(format!("{API_BASE}/files/{file_id}"))
            .bearer_auth(bearer)
            .query(&[("alt", "media")])
            .send()
            .await
            .or_raise(|| ErrorKind::Network(format!("could not download file {file_id}")))?;
        let response = check_status(response, &format!("file {file_id}"))?;
        let bytes = response
            .bytes()
            .await
            .or_raise(|| ErrorKind::Network(format!("download of file {file_id} was interrupted")))?;
        tracing::debug!(file = file_id, bytes = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }
}

/// Drive search query selecting the non-trashed direct children of a folder.
fn parents_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}' in parents and trashed=false")
}

fn check_status(response: Response, subject: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    exn::bail!(status_error(status, subject))
}

/// Map a non-success HTTP status onto an actionable error kind.
pub(crate) fn status_error(status: StatusCode, subject: &str) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ErrorKind::PermissionDenied(format!("{subject} (HTTP {})", status.as_u16()))
        },
        StatusCode::NOT_FOUND => ErrorKind::NotFound(subject.to_string()),
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::Network(format!("rate limited on {subject}")),
        s if s.is_server_error() => ErrorKind::Network(format!("server error {} on {subject}", s.as_u16())),
        s => ErrorKind::BackendError(format!("unexpected status {} on {subject}", s.as_u16())),
    }
}
