//! Frame retrieval over a byte-range transport
//!
//! A frame is found in two reads: the group's index resource (fetched once,
//! then cached) and the frame's byte range in the group's blob. Transports
//! only know how to read `[start, end)` of a named resource.

use crate::error::{FetchError, TransportError};
use crate::sprite::reader::SpriteIndex;
use crate::sprite::types::*;
use crate::sprite::writer::{render_template, PackOptions};
use futures::stream::{self, StreamExt};
use lru::LruCache;
use std::collections::HashMap;
use std::future::Future;
use std::io::SeekFrom;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Reads a byte range of a named resource
pub trait RangeFetcher: Send + Sync {
    fn fetch_range(
        &self,
        resource: &str,
        range: FrameRange,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Serves resources from a local directory
#[derive(Debug, Clone)]
pub struct FileRangeFetcher {
    root: PathBuf,
}

impl FileRangeFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

async fn read_file_range(path: &Path, range: FrameRange) -> std::io::Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(range.start)).await?;

    // Offsets come from the index and may run past the blob
    let mut buf = Vec::new();
    match range.len() {
        Some(len) => {
            (&mut file).take(len).read_to_end(&mut buf).await?;
            if buf.len() as u64 != len {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("range {} ends past the file ({} of {} bytes read)", range, buf.len(), len),
                ));
            }
        }
        None => {
            file.read_to_end(&mut buf).await?;
        }
    }
    Ok(buf)
}

impl RangeFetcher for FileRangeFetcher {
    async fn fetch_range(&self, resource: &str, range: FrameRange) -> Result<Vec<u8>, TransportError> {
        let path = self.root.join(resource);
        read_file_range(&path, range)
            .await
            .map_err(|e| TransportError::new(resource, e))
    }
}

/// Cut `range` out of a complete resource body
#[cfg_attr(not(feature = "http"), allow(dead_code))]
fn slice_body(body: &[u8], range: FrameRange) -> Option<&[u8]> {
    let start = usize::try_from(range.start).ok()?;
    let end = match range.end {
        Some(end) => usize::try_from(end).ok()?,
        None => body.len(),
    };
    body.get(start..end)
}

/// Serves resources over HTTP with `Range` requests
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpRangeFetcher {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "http")]
impl HttpRangeFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), resource)
    }
}

#[cfg(feature = "http")]
impl RangeFetcher for HttpRangeFetcher {
    async fn fetch_range(&self, resource: &str, range: FrameRange) -> Result<Vec<u8>, TransportError> {
        let whole = range == FrameRange::full();
        let mut request = self.client.get(self.url(resource));
        if !whole {
            let Some(header) = range.http_header() else {
                return Ok(Vec::new());
            };
            request = request.header(reqwest::header::RANGE, header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::new(resource, e))?;
        let status = response.status();
        // An open range starting at the end of the resource is empty
        if status == reqwest::StatusCode::RANGE_NOT_SATISFIABLE && range.is_open() {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(TransportError::new(resource, format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(resource, e))?;

        if whole || status == reqwest::StatusCode::PARTIAL_CONTENT {
            return Ok(body.to_vec());
        }

        // Server ignored the Range header
        log::debug!("{}: range {} not honored, slicing full body", resource, range);
        slice_body(&body, range)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| TransportError::new(resource, format!("range {} outside {} bytes", range, body.len())))
    }
}

/// Maps sprite groups to resource names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLayout {
    pub group_size: u32,
    pub index_template: String,
    pub blob_template: String,
}

impl Default for ResourceLayout {
    fn default() -> Self {
        Self::from(&PackOptions::default())
    }
}

impl From<&PackOptions> for ResourceLayout {
    fn from(options: &PackOptions) -> Self {
        Self {
            group_size: options.group_size,
            index_template: options.index_template.clone(),
            blob_template: options.blob_template.clone(),
        }
    }
}

impl ResourceLayout {
    pub fn index_name(&self, group: u32) -> String {
        render_template(&self.index_template, group)
    }

    pub fn blob_name(&self, group: u32) -> String {
        render_template(&self.blob_template, group)
    }
}

/// Where a frame's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRequest {
    pub key: FrameKey,
    pub blob: String,
    pub range: FrameRange,
}

/// Per-frame result of a batch fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Found(Vec<u8>),
    NotFound,
    Failed(FetchError),
}

impl FrameOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, FrameOutcome::Found(_))
    }
}

/// Fetches frames through a transport, caching parsed group indexes and
/// recently used frame bytes
pub struct FrameFetcher<F> {
    transport: F,
    layout: ResourceLayout,
    indexes: RwLock<HashMap<u32, Arc<SpriteIndex>>>,
    frames: Option<Mutex<LruCache<FrameKey, Vec<u8>>>>,
}

impl<F: RangeFetcher> FrameFetcher<F> {
    pub fn new(transport: F, layout: ResourceLayout) -> Self {
        Self {
            transport,
            layout,
            indexes: RwLock::new(HashMap::new()),
            frames: None,
        }
    }

    /// Keep up to `capacity` frames in memory. Zero disables the cache.
    pub fn with_frame_cache(mut self, capacity: usize) -> Self {
        self.frames = NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        self
    }

    pub fn transport(&self) -> &F {
        &self.transport
    }

    pub fn layout(&self) -> &ResourceLayout {
        &self.layout
    }

    fn cached_index(&self, group: u32) -> Option<Arc<SpriteIndex>> {
        let indexes = match self.indexes.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        indexes.get(&group).cloned()
    }

    fn store_index(&self, group: u32, index: Arc<SpriteIndex>) -> Arc<SpriteIndex> {
        let mut indexes = match self.indexes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // A concurrent load may have won; keep the first one
        indexes.entry(group).or_insert(index).clone()
    }

    fn cached_frame(&self, key: &FrameKey) -> Option<Vec<u8>> {
        let mut cache = self.frames.as_ref()?.lock().ok()?;
        cache.get(key).cloned()
    }

    fn store_frame(&self, key: FrameKey, bytes: &[u8]) {
        if let Some(mut cache) = self.frames.as_ref().and_then(|c| c.lock().ok()) {
            cache.put(key, bytes.to_vec());
        }
    }

    /// Parsed index of a group, fetched on first use
    pub async fn group_index(&self, group: u32) -> Result<Arc<SpriteIndex>, FetchError> {
        if let Some(index) = self.cached_index(group) {
            return Ok(index);
        }

        let resource = self.layout.index_name(group);
        let bytes = self.transport.fetch_range(&resource, FrameRange::full()).await?;
        let index = SpriteIndex::parse(&bytes).map_err(|source| FetchError::Parse {
            resource: resource.clone(),
            source,
        })?;
        log::debug!("loaded {}: {} frames", resource, index.len());

        Ok(self.store_index(group, Arc::new(index)))
    }

    /// Resolve a frame key to a blob and byte range
    pub async fn locate(&self, key: FrameKey) -> Result<Option<FrameRequest>, FetchError> {
        let group = key.group(self.layout.group_size).ok_or(FetchError::InvalidFolder)?;
        let index = self.group_index(group).await?;

        Ok(index.locate(key.folder_id, key.frame_num).map(|range| FrameRequest {
            key,
            blob: self.layout.blob_name(group),
            range,
        }))
    }

    /// Bytes of one frame, `None` if the key is not in its group's index
    pub async fn fetch_frame(&self, key: FrameKey) -> Result<Option<Vec<u8>>, FetchError> {
        if let Some(bytes) = self.cached_frame(&key) {
            return Ok(Some(bytes));
        }

        let Some(request) = self.locate(key).await? else {
            return Ok(None);
        };
        let bytes = self.transport.fetch_range(&request.blob, request.range).await?;
        self.store_frame(key, &bytes);
        Ok(Some(bytes))
    }

    /// Fetch many frames with at most `concurrency` in flight.
    ///
    /// Results come back in input order, one outcome per key.
    pub async fn fetch_frames<I>(&self, keys: I, concurrency: usize) -> Vec<(FrameKey, FrameOutcome)>
    where
        I: IntoIterator<Item = FrameKey>,
    {
        stream::iter(keys)
            .map(|key| async move {
                let outcome = match self.fetch_frame(key).await {
                    Ok(Some(bytes)) => FrameOutcome::Found(bytes),
                    Ok(None) => FrameOutcome::NotFound,
                    Err(e) => {
                        log::warn!("frame {} failed: {}", key, e);
                        FrameOutcome::Failed(e)
                    }
                };
                (key, outcome)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}
