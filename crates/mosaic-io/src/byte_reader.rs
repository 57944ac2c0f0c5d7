//! Byte Reader (C3): `spec.md` §4.3.
//!
//! Asynchronously fetches a byte range from a local file or an
//! object-store URL. Object-store clients and file handles are cached by
//! URL with a 1-minute idle-expiry (configurable), matching the handle
//! cache pattern `mosaic-core::CoreConfig` exposes; on eviction the handle
//! is dropped and, for files, closed.

use std::io::SeekFrom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use mosaic_core::{Error, Result};
use object_store::{path::Path as ObjectPath, GetRange, ObjectStore};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, instrument, warn};

use crate::credentials;

/// Classifies a descriptor URL's access scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    File,
    S3,
}

fn classify(url: &str) -> Scheme {
    if url.starts_with("s3:") {
        Scheme::S3
    } else {
        Scheme::File
    }
}

enum Handle {
    LocalFile(AsyncMutex<tokio::fs::File>),
    ObjectStore { store: Arc<dyn ObjectStore>, path: ObjectPath },
}

struct CachedHandle {
    handle: Handle,
    last_used_millis: AtomicU64,
}

impl CachedHandle {
    fn touch(&self, epoch: Instant) {
        self.last_used_millis
            .store(epoch.elapsed().as_millis() as u64, Ordering::Relaxed);
    }
}

/// Caches byte-reader handles by URL and serves ranged reads against
/// either local files or an object store.
pub struct ByteReader {
    handles: Arc<DashMap<String, Arc<CachedHandle>>>,
    idle_expiry: Duration,
    epoch: Instant,
}

impl ByteReader {
    /// Builds a reader whose cached handles expire after `idle_expiry` of
    /// inactivity.
    pub fn new(idle_expiry: Duration) -> Self {
        Self {
            handles: Arc::new(DashMap::new()),
            idle_expiry,
            epoch: Instant::now(),
        }
    }

    /// Fetches `length` bytes starting at `offset` from `url`.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn read(&self, url: &str, offset: u64, length: u64) -> Result<Bytes> {
        let cached = self.get_or_open(url).await?;
        cached.touch(self.epoch);

        match &cached.handle {
            Handle::LocalFile(file) => {
                let mut guard = file.lock().await;
                guard
                    .seek(SeekFrom::Start(offset))
                    .await
                    .map_err(|e| to_error(e, url))?;
                let mut buf = vec![0u8; length as usize];
                let mut read_total = 0usize;
                while read_total < buf.len() {
                    let n = guard
                        .read(&mut buf[read_total..])
                        .await
                        .map_err(|e| to_error(e, url))?;
                    if n == 0 {
                        buf.truncate(read_total);
                        break;
                    }
                    read_total += n;
                }
                Ok(Bytes::from(buf))
            }
            Handle::ObjectStore { store, path } => {
                let range = offset..offset + length;
                let result = store
                    .get_range(path, GetRange::Bounded(range))
                    .await
                    .map_err(|e| Error::TransientIo(format!("{url}: {e}")))?;
                Ok(result)
            }
        }
    }

    async fn get_or_open(&self, url: &str) -> Result<Arc<CachedHandle>> {
        if let Some(existing) = self.handles.get(url) {
            return Ok(existing.clone());
        }

        let handle = self.open(url).await?;
        let cached = Arc::new(CachedHandle {
            handle,
            last_used_millis: AtomicU64::new(self.epoch.elapsed().as_millis() as u64),
        });
        self.handles.insert(url.to_string(), cached.clone());
        debug!("opened new handle");
        Ok(cached)
    }

    async fn open(&self, url: &str) -> Result<Handle> {
        match classify(url) {
            Scheme::File => {
                let file = tokio::fs::File::open(url)
                    .await
                    .map_err(|e| to_error(e, url))?;
                Ok(Handle::LocalFile(AsyncMutex::new(file)))
            }
            Scheme::S3 => {
                let (endpoint, bucket, object) = parse_s3_url(url)?;
                let creds = credentials::resolve(&endpoint)?;
                let store = crate::objectstore::build_store(&creds, &bucket)?;
                Ok(Handle::ObjectStore { store, path: ObjectPath::from(object) })
            }
        }
    }

    /// Removes handles idle longer than `idle_expiry`. Intended to be
    /// driven by a periodic task the host spawns alongside the Cache
    /// Fabric's stats reporter.
    pub fn sweep_idle(&self) {
        let now_millis = self.epoch.elapsed().as_millis() as u64;
        let expiry_millis = self.idle_expiry.as_millis() as u64;
        self.handles.retain(|url, cached| {
            let last = cached.last_used_millis.load(Ordering::Relaxed);
            let keep = now_millis.saturating_sub(last) < expiry_millis;
            if !keep {
                warn!(%url, "evicting idle byte-reader handle");
            }
            keep
        });
    }
}

fn to_error(e: std::io::Error, url: &str) -> Error {
    use std::io::ErrorKind;
    match e.kind() {
        ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::ConnectionReset => {
            Error::TransientIo(format!("{url}: {e}"))
        }
        _ => Error::Io(format!("{url}: {e}")),
    }
}

/// Splits an `s3:<endpoint>/<bucket>/<object>` descriptor into the
/// endpoint name, the bucket, and the object key `object_store` addresses
/// within it.
fn parse_s3_url(url: &str) -> Result<(String, String, String)> {
    let rest = url
        .strip_prefix("s3:")
        .ok_or_else(|| Error::MalformedDescriptor(url.to_string()))?;
    let (endpoint, rest) = rest
        .split_once('/')
        .ok_or_else(|| Error::MalformedDescriptor(url.to_string()))?;
    let (bucket, object) = rest
        .split_once('/')
        .ok_or_else(|| Error::MalformedDescriptor(url.to_string()))?;
    Ok((endpoint.to_string(), bucket.to_string(), object.to_string()))
}
