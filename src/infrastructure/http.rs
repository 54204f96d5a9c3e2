// SPDX-License-Identifier: MPL-2.0
//! HTTP image loader (implements [`ImageLoader`]).
//!
//! `http`/`https` URLs are fetched with reqwest; `file://` URLs and bare
//! paths are read from disk. Decoding runs on tokio's blocking pool.

use crate::application::port::ImageLoader;
use crate::config::{
    NetworkConfig, DEFAULT_HTTP_CONNECT_TIMEOUT, DEFAULT_HTTP_READ_TIMEOUT, HTTP_USER_AGENT,
    MAX_HTTP_BODY_BYTES, MAX_HTTP_REDIRECTS,
};
use crate::domain::error::LoadError;
use crate::domain::Bitmap;
use crate::media::decode::{decode_bytes, load_image};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use std::path::PathBuf;
use std::time::Duration;

/// Loads images over HTTP(S) or from local files.
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    client: reqwest::Client,
    max_body_bytes: u64,
}

impl HttpImageLoader {
    /// Builds a loader with the default connect and read timeouts.
    /// `timeout` additionally bounds each whole request.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Transport`] if the HTTP client can't be built
    /// (e.g. no TLS backend).
    pub fn new(timeout: Option<Duration>) -> Result<Self, LoadError> {
        Self::with_timeouts(DEFAULT_HTTP_CONNECT_TIMEOUT, DEFAULT_HTTP_READ_TIMEOUT, timeout)
    }

    /// Builds a loader with explicit timeouts. `read` bounds the silence
    /// between two reads, so a stalled host fails even without `total`.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_timeouts(
        connect: Duration,
        read: Duration,
        total: Option<Duration>,
    ) -> Result<Self, LoadError> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_HTTP_REDIRECTS))
            .user_agent(HTTP_USER_AGENT)
            .connect_timeout(connect)
            .read_timeout(read);
        if let Some(total) = total {
            builder = builder.timeout(total);
        }
        let client = builder
            .build()
            .map_err(|e| LoadError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            max_body_bytes: MAX_HTTP_BODY_BYTES,
        })
    }

    /// Replaces the response size limit.
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Builds a loader from the `[network]` settings.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_config(network: &NetworkConfig) -> Result<Self, LoadError> {
        let secs_or = |secs: Option<u64>, default: Duration| secs.map_or(default, Duration::from_secs);
        let loader = Self::with_timeouts(
            secs_or(network.connect_timeout_secs, DEFAULT_HTTP_CONNECT_TIMEOUT),
            secs_or(network.read_timeout_secs, DEFAULT_HTTP_READ_TIMEOUT),
            network.http_timeout_secs.map(Duration::from_secs),
        )?;
        Ok(loader.with_max_body_bytes(network.max_body_bytes.unwrap_or(MAX_HTTP_BODY_BYTES)))
    }

    /// Fetches and decodes the image at `url`.
    ///
    /// # Errors
    ///
    /// - [`LoadError::InvalidUrl`] for unparseable URLs or unsupported schemes
    /// - [`LoadError::Transport`] if the request fails, stalls, or the body
    ///   is larger than the configured limit
    /// - [`LoadError::BadStatus`] for any status other than 200
    /// - [`LoadError::NoData`] for an empty body
    /// - [`LoadError::Undecodable`] if the body isn't an image
    /// - [`LoadError::Io`] if a local file can't be read
    pub async fn fetch(&self, url: &str) -> Result<Bitmap, LoadError> {
        let url = url.trim();
        if !url.contains("://") {
            return load_local(PathBuf::from(url)).await;
        }

        let parsed = Url::parse(url).map_err(|_| LoadError::InvalidUrl(url.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|()| LoadError::InvalidUrl(url.to_string()))?;
                return load_local(path).await;
            }
            _ => return Err(LoadError::InvalidUrl(url.to_string())),
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| LoadError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LoadError::BadStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let limit = self.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(too_large(url, limit));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LoadError::Transport(e.to_string()))?;
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(too_large(url, limit));
            }
            body.extend_from_slice(&chunk);
        }
        if body.is_empty() {
            return Err(LoadError::NoData(url.to_string()));
        }

        log::debug!(
            "Fetched {} bytes ({}) from {url}",
            body.len(),
            content_type.as_deref().unwrap_or("no content type")
        );
        tokio::task::spawn_blocking(move || decode_bytes(&body, content_type.as_deref()))
            .await
            .map_err(|e| LoadError::Undecodable(format!("decoder stopped: {e}")))?
    }
}

fn too_large(url: &str, limit: u64) -> LoadError {
    LoadError::Transport(format!("response from {url} exceeds {limit} bytes"))
}

async fn load_local(path: PathBuf) -> Result<Bitmap, LoadError> {
    tokio::task::spawn_blocking(move || load_image(&path))
        .await
        .map_err(|e| LoadError::Io(format!("reader stopped: {e}")))?
}

impl ImageLoader for HttpImageLoader {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bitmap, LoadError>> {
        self.fetch(url).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Color;
    use crate::media::export::{encode, ExportFormat};
    use tempfile::tempdir;

    fn loader() -> HttpImageLoader {
        HttpImageLoader::new(Some(Duration::from_secs(5))).expect("client builds")
    }

    #[tokio::test]
    async fn unsupported_scheme_is_invalid_url() {
        let err = loader().fetch("ftp://example.com/a.png").await.unwrap_err();
        assert_eq!(err, LoadError::InvalidUrl("ftp://example.com/a.png".to_string()));
    }

    #[tokio::test]
    async fn malformed_url_is_invalid_url() {
        let err = loader().fetch("http://exa mple.com/a.png").await.unwrap_err();
        assert!(matches!(err, LoadError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn bare_path_reads_from_disk() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("red.png");
        let bitmap = Bitmap::filled(3, 2, Color::rgb(255, 0, 0));
        std::fs::write(&path, encode(&bitmap, ExportFormat::Png).expect("encodes"))
            .expect("write png");

        let loaded = loader()
            .fetch(path.to_str().expect("utf-8 path"))
            .await
            .expect("loads");
        assert_eq!(loaded, bitmap);
    }

    #[tokio::test]
    async fn file_url_reads_from_disk() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("blue.png");
        let bitmap = Bitmap::filled(2, 2, Color::rgb(0, 0, 255));
        std::fs::write(&path, encode(&bitmap, ExportFormat::Png).expect("encodes"))
            .expect("write png");

        let url = Url::from_file_path(&path).expect("absolute path");
        let loaded = loader().fetch(url.as_str()).await.expect("loads");
        assert_eq!(loaded.dimensions(), (2, 2));
    }

    #[test]
    fn config_overrides_body_limit() {
        let network = NetworkConfig {
            max_body_bytes: Some(2048),
            ..NetworkConfig::default()
        };
        let configured = HttpImageLoader::from_config(&network).expect("client builds");
        assert_eq!(configured.max_body_bytes, 2048);
        assert_eq!(loader().max_body_bytes, MAX_HTTP_BODY_BYTES);
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() {
        let err = loader().fetch("/definitely/not/here.png").await.unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
