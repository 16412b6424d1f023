//! Progress-tracked streaming downloads with cooperative cancellation
//!
//! Streams a single large file to disk while emitting throttled progress
//! events to the task's subscriber. Each download is correlated by an
//! explicit [`DownloadHandle`] created per call, so two concurrent downloads
//! can never cross progress or cancellation wires.
//!
//! Failure and cancellation are deliberately indistinguishable at this
//! boundary: both resolve to `None` and leave no partial file behind, so
//! callers can treat either outcome as "try again".

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::StreamExt;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::app::client::http::HttpHandler;
use crate::constants::{limits, progress};
use crate::errors::DownloadResult;

/// One progress notification
///
/// `percentage` is `None` when the response carried no `content-length`
/// header, in which case completion cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadProgress {
    pub percentage: Option<f64>,
    pub speed_kbps: f64,
}

/// Per-download task handle carrying cancellation and progress routing
///
/// Cloneable so a UI task can hold the cancel side while the transfer runs.
/// Cancelling one handle affects only its own download.
#[derive(Debug, Clone)]
pub struct DownloadHandle {
    token: CancellationToken,
    progress_tx: mpsc::UnboundedSender<DownloadProgress>,
}

impl DownloadHandle {
    /// Create a handle and the receiving end of its progress channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DownloadProgress>) {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        (
            Self {
                token: CancellationToken::new(),
                progress_tx,
            },
            progress_rx,
        )
    }

    /// Request cancellation of the download bound to this handle
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn emit(&self, update: DownloadProgress) {
        // A dropped receiver just means nobody is watching anymore
        let _ = self.progress_tx.send(update);
    }
}

/// Streaming download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
}

enum StreamOutcome {
    Completed,
    Cancelled,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler) -> Self {
        Self { http_handler }
    }

    /// Streams a mirror path to `destination`, reporting progress
    ///
    /// Resolves to the destination path on success, or `None` when the
    /// transfer failed or was cancelled. Any partially written file is
    /// removed (best effort) before returning `None`.
    pub async fn download_with_progress(
        &self,
        path: &str,
        destination: &Path,
        handle: &DownloadHandle,
    ) -> Option<PathBuf> {
        match self.stream_to_file(path, destination, handle).await {
            Ok(StreamOutcome::Completed) => Some(destination.to_path_buf()),
            Ok(StreamOutcome::Cancelled) => {
                tracing::info!("download cancelled: {}", destination.display());
                let _ = fs::remove_file(destination).await;
                None
            }
            Err(e) => {
                tracing::warn!("download failed for {}: {}", destination.display(), e);
                let _ = fs::remove_file(destination).await;
                None
            }
        }
    }

    async fn stream_to_file(
        &self,
        path: &str,
        destination: &Path,
        handle: &DownloadHandle,
    ) -> DownloadResult<StreamOutcome> {
        let url = self.http_handler.resolve(path)?;
        let response = self
            .http_handler
            .get_with_retries(&url, limits::MAX_RETRIES)
            .await?;
        let total_bytes = response.content_length();

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = File::create(destination).await?;

        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        let started = Instant::now();
        let mut last_emitted: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = handle.token.cancelled() => {
                    let _ = file.shutdown().await;
                    return Ok(StreamOutcome::Cancelled);
                }
                chunk = stream.next() => match chunk {
                    Some(Ok(data)) => {
                        file.write_all(&data).await?;
                        received += data.len() as u64;

                        let due = last_emitted
                            .map(|t| t.elapsed() >= progress::EMIT_INTERVAL)
                            .unwrap_or(true);
                        if due {
                            handle.emit(Self::progress_snapshot(received, total_bytes, started));
                            last_emitted = Some(Instant::now());
                        }
                    }
                    Some(Err(e)) => {
                        let _ = file.shutdown().await;
                        return Err(e.into());
                    }
                    None => break,
                }
            }
        }

        file.flush().await?;
        handle.emit(Self::progress_snapshot(received, total_bytes, started));
        tracing::info!("successfully downloaded: {}", destination.display());
        Ok(StreamOutcome::Completed)
    }

    fn progress_snapshot(received: u64, total_bytes: Option<u64>, started: Instant) -> DownloadProgress {
        let percentage = total_bytes
            .filter(|total| *total > 0)
            .map(|total| received as f64 / total as f64 * 100.0);
        let elapsed = started.elapsed().as_secs_f64();
        let speed_kbps = if elapsed > 0.0 {
            received as f64 / elapsed / 1024.0
        } else {
            0.0
        };
        DownloadProgress {
            percentage,
            speed_kbps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Url;

    use crate::app::client::config::ClientConfig;

    fn handler_for(addr: std::net::SocketAddr) -> HttpHandler {
        let client = ClientConfig::default().build_http_client().unwrap();
        let base = Url::parse(&format!("http://{addr}")).unwrap();
        HttpHandler::new(client, base, 5).unwrap()
    }

    #[test]
    fn test_handle_cancellation_is_scoped() {
        let (first, _rx1) = DownloadHandle::new();
        let (second, _rx2) = DownloadHandle::new();

        first.cancel();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_progress_snapshot_with_known_length() {
        let update = DownloadHandler::progress_snapshot(512, Some(1024), Instant::now());
        let pct = update.percentage.unwrap();
        assert!((pct - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_snapshot_without_length_is_indeterminate() {
        let update = DownloadHandler::progress_snapshot(512, None, Instant::now());
        assert!(update.percentage.is_none());
    }

    #[test]
    fn test_progress_events_reach_subscriber() {
        let (handle, mut rx) = DownloadHandle::new();
        handle.emit(DownloadProgress {
            percentage: Some(12.5),
            speed_kbps: 900.0,
        });
        let update = rx.try_recv().unwrap();
        assert_eq!(update.percentage, Some(12.5));
    }

    #[test]
    fn test_emit_after_receiver_dropped_is_harmless() {
        let (handle, rx) = DownloadHandle::new();
        drop(rx);
        handle.emit(DownloadProgress {
            percentage: None,
            speed_kbps: 0.0,
        });
    }

    #[tokio::test]
    async fn test_cancelled_download_yields_none_and_no_partial_file() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Drip a large body so the transfer is still in flight when the
        // cancel lands
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let header = "HTTP/1.1 200 OK\r\ncontent-length: 1048576\r\n\r\n";
            if socket.write_all(header.as_bytes()).await.is_err() {
                return;
            }
            let chunk = [0u8; 1024];
            loop {
                if socket.write_all(&chunk).await.is_err() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let handler = handler_for(addr);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("partial.bin");
        let (handle, mut progress_rx) = DownloadHandle::new();

        let task_handle = handle.clone();
        let task_dest = dest.clone();
        let transfer = tokio::spawn(async move {
            DownloadHandler::new(&handler)
                .download_with_progress("/big.bin", &task_dest, &task_handle)
                .await
        });

        // The first chunk emits immediately, so a progress event means bytes
        // have already been written to disk
        progress_rx.recv().await.expect("progress before cancellation");
        handle.cancel();

        assert!(transfer.await.unwrap().is_none());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_interrupted_transfer_yields_none_and_no_partial_file() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Promise 4096 bytes, deliver 1024, then drop the connection
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let header = "HTTP/1.1 200 OK\r\ncontent-length: 4096\r\n\r\n";
            let _ = socket.write_all(header.as_bytes()).await;
            let _ = socket.write_all(&[0u8; 1024]).await;
            let _ = socket.shutdown().await;
        });

        let handler = handler_for(addr);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("truncated.bin");
        let (handle, _progress_rx) = DownloadHandle::new();

        let result = DownloadHandler::new(&handler)
            .download_with_progress("/truncated.bin", &dest, &handle)
            .await;

        assert!(result.is_none());
        assert!(!dest.exists());
    }
}
