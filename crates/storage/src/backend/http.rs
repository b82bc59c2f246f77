//! Solid-style HTTP storage backend.
//!
//! Talks to a pod server over plain LDP semantics:
//!
//! | Operation       | Request                                                   |
//! |-----------------|-----------------------------------------------------------|
//! | `exists`        | `HEAD {url}` (404 means absent)                           |
//! | `create_folder` | `PUT {url}/` with an `ldp:BasicContainer` link header     |
//! | `read`          | `GET {url}`                                               |
//! | `write`         | `PUT {url}` with the declared content type                |
//! | `list`          | `GET {url}/` as JSON-LD, children from `ldp:contains`     |
//!
//! Authentication is limited to an optional static bearer token; negotiating
//! one is the pod provider's business.

use crate::backend::ItemInfoStream;
use crate::error::{ErrorKind, Result};
use crate::{ContentType, ItemInfo, StorageBackend, validate_path};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, IF_NONE_MATCH, LINK};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LDP_CONTAINS: [&str; 3] = ["http://www.w3.org/ns/ldp#contains", "ldp:contains", "contains"];
const BASIC_CONTAINER: &str = "<http://www.w3.org/ns/ldp#BasicContainer>; rel=\"type\"";

/// HTTP pod storage backend.
///
/// # Examples
///
/// ```no_run
/// use podanchor_storage::backend::HttpBackend;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = HttpBackend::new("pod", "https://alice.solidcommunity.net/", None, Duration::from_secs(30))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    name: String,
    client: Client,
    /// Pod root URL, always ending in a slash
    endpoint: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            exn::bail!(ErrorKind::InvalidPath(PathBuf::from(endpoint)));
        }
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::BackendError("unable to construct HTTP client".to_string()))?;
        Ok(Self {
            name: name.into(),
            client,
            endpoint,
            token,
        })
    }

    /// Absolute URL of a pod-relative path. Folder URLs end in a slash.
    fn url(&self, path: &Path, folder: bool) -> Result<String> {
        let validated = validate_path(path)?;
        let segments: Vec<_> = validated.iter().map(|segment| segment.to_string_lossy()).collect();
        let mut url = format!("{}{}", self.endpoint, segments.join("/"));
        if folder {
            url.push('/');
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        Ok(self.authorize(request).send().await.map_err(|e| ErrorKind::Network(e.to_string()))?)
    }

    fn status_error(status: StatusCode, path: &Path) -> ErrorKind {
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => ErrorKind::NotFound(path.to_path_buf()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::PermissionDenied(path.to_path_buf()),
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => ErrorKind::AlreadyExists(path.to_path_buf()),
            other => ErrorKind::BackendError(format!("unexpected status {other} for {}", path.display())),
        }
    }

    async fn fetch_listing(&self, folder: &Path) -> Result<Vec<ItemInfo>> {
        let url = self.url(folder, true)?;
        let response = self.send(self.client.get(&url).header(ACCEPT, "application/ld+json")).await?;
        match response.status() {
            // Consistent with the local backend: a missing folder lists as empty.
            StatusCode::NOT_FOUND => return Ok(Vec::new()),
            status if !status.is_success() => exn::bail!(Self::status_error(status, folder)),
            _ => {},
        }
        let body = response.bytes().await.map_err(|e| ErrorKind::Network(e.to_string()))?;
        parse_container(&validate_path(folder)?, &body)
    }
}

/// Extracts the immediate children from a JSON-LD container description.
///
/// Accepts both the expanded form (an array of nodes) and a compacted
/// document with or without `@graph`. Child names are taken verbatim from the
/// last segment of each `@id`, so they stay URL-escaped.
pub(crate) fn parse_container(folder: &Path, body: &[u8]) -> Result<Vec<ItemInfo>> {
    let document: Value = serde_json::from_slice(body)
        .or_raise(|| ErrorKind::BackendError(format!("malformed container listing for {}", folder.display())))?;
    let nodes: Vec<&Value> = match &document {
        Value::Array(nodes) => nodes.iter().collect(),
        Value::Object(object) => match object.get("@graph") {
            Some(Value::Array(nodes)) => nodes.iter().collect(),
            _ => vec![&document],
        },
        _ => Vec::new(),
    };
    let mut items = Vec::new();
    for node in nodes {
        let Some(object) = node.as_object() else { continue };
        let Some(contains) = LDP_CONTAINS.iter().find_map(|key| object.get(*key)) else { continue };
        let children: Vec<&Value> = match contains {
            Value::Array(children) => children.iter().collect(),
            single => vec![single],
        };
        for child in children {
            let id = match child {
                Value::String(id) => id.as_str(),
                Value::Object(child) => match child.get("@id").and_then(Value::as_str) {
                    Some(id) => id,
                    None => continue,
                },
                _ => continue,
            };
            let is_folder = id.ends_with('/');
            let Some(name) = id.trim_end_matches('/').rsplit('/').next().filter(|name| !name.is_empty()) else {
                continue;
            };
            items.push(match is_folder {
                true => ItemInfo::folder(folder, name),
                false => ItemInfo::file(folder, name),
            });
        }
    }
    Ok(items)
}

#[async_trait]
impl StorageBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, folder: &'a Path) -> ItemInfoStream<'a> {
        // Containers describe all their children in one response, so there is
        // nothing to gain from streaming the request itself.
        Box::pin(async_stream::stream! {
            match self.fetch_listing(folder).await {
                Ok(items) => for item in items {
                    yield Ok(item);
                },
                Err(e) => yield Err(e),
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let url = self.url(path, false)?;
        let response = self.send(self.client.head(&url)).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(false),
            // Some servers only answer HEAD on the folder form of the URL.
            StatusCode::MOVED_PERMANENTLY | StatusCode::PERMANENT_REDIRECT => Ok(true),
            status => exn::bail!(Self::status_error(status, path)),
        }
    }

    async fn create_folder(&self, path: &Path) -> Result<()> {
        let url = self.url(path, true)?;
        let request = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, ContentType::Turtle.mime())
            .header(LINK, BASIC_CONTAINER)
            .header(IF_NONE_MATCH, "*");
        let response = self.send(request).await?;
        match response.status() {
            status if status.is_success() => {
                tracing::debug!(backend = %self.name, %url, "Created pod folder");
                Ok(())
            },
            status => exn::bail!(Self::status_error(status, path)),
        }
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let url = self.url(path, false)?;
        let response = self.send(self.client.get(&url)).await?;
        if !response.status().is_success() {
            exn::bail!(Self::status_error(response.status(), path));
        }
        let body = response.bytes().await.map_err(|e| ErrorKind::Network(e.to_string()))?;
        Ok(body.to_vec())
    }

    async fn write(&self, path: &Path, data: &[u8], content_type: ContentType) -> Result<()> {
        let url = self.url(path, false)?;
        let request = self.client.put(&url).header(CONTENT_TYPE, content_type.mime()).body(data.to_vec());
        let response = self.send(request).await?;
        if !response.status().is_success() {
            exn::bail!(Self::status_error(response.status(), path));
        }
        Ok(())
    }
}
