//! Media file downloading.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use crate::api::PinterestApi;
use crate::error::{Error, Result};
use crate::fs::{numbered_filename, sanitize_filename};
use crate::media::{extension_for_content_type, extension_from_url, MediaDescriptor};

/// Give up looking for a free name after this many numbered attempts.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Bytes written so far for one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub bytes: u64,
    /// Expected size, when the descriptor or the response declares one.
    pub total: Option<u64>,
}

/// A finished transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Streams resolved media to disk.
pub struct DownloadEngine {
    api: Arc<PinterestApi>,
    progress_interval: Duration,
}

impl DownloadEngine {
    pub fn new(api: Arc<PinterestApi>, progress_interval: Duration) -> Self {
        Self {
            api,
            progress_interval,
        }
    }

    /// Download `descriptor` into `destination` under a name no other file has.
    ///
    /// Alternates are tried only while no file exists yet. Once a file is
    /// created, any failure removes it before the error is returned.
    pub async fn download<F>(
        &self,
        descriptor: &MediaDescriptor,
        destination: &Path,
        mut on_progress: F,
    ) -> Result<DownloadOutcome>
    where
        F: FnMut(DownloadProgress) + Send,
    {
        let (url, response) = self.open_first(descriptor).await?;

        let extension = extension_from_url(url)
            .or_else(|| {
                response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(extension_for_content_type)
            })
            .unwrap_or_else(|| descriptor.kind.default_extension().to_string());
        let stem = sanitize_filename(&format!("{}-{}", descriptor.base_name, descriptor.pin_id))?;
        let expected = descriptor.size_hint.or(response.content_length());

        let (mut file, path) = create_unique(destination, &stem, &extension).await?;
        tracing::debug!("Writing {} to {}", url, path.display());

        match self
            .stream_to_file(response, &mut file, expected, &mut on_progress)
            .await
        {
            Ok(bytes) => Ok(DownloadOutcome { path, bytes }),
            Err(e) => {
                drop(file);
                if let Err(remove_err) = fs::remove_file(&path).await {
                    tracing::warn!(
                        "Could not remove partial file {}: {}",
                        path.display(),
                        remove_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Open the primary URL, falling back to alternates in rank order.
    ///
    /// When every URL is a guessed original and upstream refuses them all,
    /// the pin has no original to offer and resolution failed.
    async fn open_first<'d>(&self, descriptor: &'d MediaDescriptor) -> Result<(&'d str, Response)> {
        let mut last_error = None;
        let mut all_refused = true;
        for url in descriptor.urls() {
            match self.api.open_media(url).await {
                Ok(response) => return Ok((url, response)),
                Err(e) => {
                    tracing::warn!("Media request for pin {} failed: {}", descriptor.pin_id, e);
                    all_refused &= matches!(e, Error::HttpStatus { status, .. } if (400..500).contains(&status));
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(_) if descriptor.inferred_original && all_refused => Err(Error::Resolution(format!(
                "pin {} has no original-quality image",
                descriptor.pin_id
            ))),
            Some(e) => Err(e),
            None => Err(Error::Download(format!(
                "pin {} has no media URL",
                descriptor.pin_id
            ))),
        }
    }

    async fn stream_to_file<F>(
        &self,
        response: Response,
        file: &mut File,
        expected: Option<u64>,
        on_progress: &mut F,
    ) -> Result<u64>
    where
        F: FnMut(DownloadProgress) + Send,
    {
        let chunk_timeout = self.api.request_timeout();
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        let mut last_emit: Option<Instant> = None;

        loop {
            let next = timeout(chunk_timeout, stream.next())
                .await
                .map_err(|_| Error::Download("timed out waiting for data".into()))?;
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk.map_err(|e| Error::Download(format!("Stream error: {}", e)))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;

            let due = last_emit.map_or(true, |at| at.elapsed() >= self.progress_interval);
            if due {
                on_progress(DownloadProgress {
                    bytes: written,
                    total: expected,
                });
                last_emit = Some(Instant::now());
            }
        }

        file.flush().await?;
        file.sync_all().await?;

        if let Some(expected) = expected {
            if expected != written {
                return Err(Error::SizeMismatch {
                    expected,
                    actual: written,
                });
            }
        }

        on_progress(DownloadProgress {
            bytes: written,
            total: expected,
        });
        Ok(written)
    }
}

/// Create `stem.ext`, or the first free `stem_N.ext`, without overwriting.
async fn create_unique(dir: &Path, stem: &str, extension: &str) -> Result<(File, PathBuf)> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(numbered_filename(stem, extension, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(Error::Download(format!(
        "no free filename for {}.{} in {}",
        stem,
        extension,
        dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Endpoints;
    use crate::config::NetworkConfig;
    use crate::error::ErrorKind;
    use crate::media::MediaKind;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_for(server: &MockServer) -> DownloadEngine {
        let config = NetworkConfig {
            max_retries: 0,
            retry_backoff_ms: 1,
            ..NetworkConfig::default()
        };
        let api = PinterestApi::new(&config)
            .unwrap()
            .with_endpoints(Endpoints::single(&server.uri()).unwrap());
        DownloadEngine::new(Arc::new(api), Duration::ZERO)
    }

    fn descriptor(url: String, kind: MediaKind) -> MediaDescriptor {
        MediaDescriptor {
            pin_id: "42".into(),
            kind,
            url,
            alternates: Vec::new(),
            inferred_original: false,
            size_hint: None,
            width: None,
            height: None,
            base_name: "Sunset".into(),
            source: "test",
        }
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_same_name_gets_numeric_suffix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/originals/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 64]))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let engine = engine_for(&server);
        let item = descriptor(format!("{}/originals/a.jpg", server.uri()), MediaKind::Image);

        let first = engine.download(&item, dir.path(), |_| {}).await.unwrap();
        let second = engine.download(&item, dir.path(), |_| {}).await.unwrap();

        assert_eq!(first.path.file_name().unwrap(), "Sunset-42.jpg");
        assert_eq!(second.path.file_name().unwrap(), "Sunset-42_1.jpg");
        assert_eq!(first.bytes, 64);
        assert_eq!(files_in(dir.path()), vec!["Sunset-42.jpg", "Sunset-42_1.jpg"]);
    }

    #[tokio::test]
    async fn test_size_mismatch_removes_partial_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/originals/short.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 10]))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut item = descriptor(format!("{}/originals/short.jpg", server.uri()), MediaKind::Image);
        item.size_hint = Some(1000);

        let err = engine_for(&server)
            .download(&item, dir.path(), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SizeMismatch { expected: 1000, actual: 10 }));
        assert_eq!(err.kind(), ErrorKind::DownloadError);
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_to_alternate_before_writing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/originals/gone.jpg"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/736x/gone.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![2u8; 5]))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut item = descriptor(format!("{}/originals/gone.jpg", server.uri()), MediaKind::Image);
        item.alternates = vec![format!("{}/736x/gone.jpg", server.uri())];

        let outcome = engine_for(&server)
            .download(&item, dir.path(), |_| {})
            .await
            .unwrap();
        assert_eq!(outcome.bytes, 5);
        assert_eq!(files_in(dir.path()), vec!["Sunset-42.jpg"]);
    }

    #[tokio::test]
    async fn test_extension_from_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "video/mp4")
                    .set_body_bytes(vec![0u8; 3]),
            )
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let item = descriptor(format!("{}/videos/stream", server.uri()), MediaKind::Video);

        let outcome = engine_for(&server)
            .download(&item, dir.path(), |_| {})
            .await
            .unwrap();
        assert_eq!(outcome.path.file_name().unwrap(), "Sunset-42.mp4");
    }

    #[tokio::test]
    async fn test_progress_reports_total() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/originals/p.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8; 256]))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let item = descriptor(format!("{}/originals/p.png", server.uri()), MediaKind::Image);

        let mut seen = Vec::new();
        engine_for(&server)
            .download(&item, dir.path(), |p| seen.push(p))
            .await
            .unwrap();

        let last = seen.last().unwrap();
        assert_eq!(last.bytes, 256);
        assert_eq!(last.total, Some(256));
        assert!(seen.windows(2).all(|w| w[0].bytes <= w[1].bytes));
    }

    #[tokio::test]
    async fn test_refused_guessed_original_is_resolution_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/originals/thumb.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut item = descriptor(format!("{}/originals/thumb.jpg", server.uri()), MediaKind::Image);
        item.inferred_original = true;

        let err = engine_for(&server)
            .download(&item, dir.path(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Resolution(_)));
        assert_eq!(err.kind(), ErrorKind::ResolutionFailed);
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_body_cut_short_removes_partial_file() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n0123456789")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let item = descriptor(format!("http://{}/originals/cut.jpg", addr), MediaKind::Image);

        let err = engine_for(&server)
            .download(&item, dir.path(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DownloadError);
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_media_is_network_error_and_leaves_nothing() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let item = descriptor(format!("{}/originals/none.jpg", server.uri()), MediaKind::Image);

        let err = engine_for(&server)
            .download(&item, dir.path(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert!(files_in(dir.path()).is_empty());
    }
}
