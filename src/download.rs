use crate::{
    config::DEFAULT_CONCURRENCY,
    logger,
    models::{DownloadOutcome, ImageReference},
    output::image_path,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::{stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::{fs::File, io::AsyncWriteExt};
use tokio_util::sync::CancellationToken;

struct Failure {
    reason: String,
    status: Option<u16>,
}

impl Failure {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            status: None,
        }
    }
}

/// Saves generated images into a directory using a bounded pool of
/// concurrent downloads.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    concurrency: usize,
    show_progress: bool,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
            show_progress: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Saves every reference into `dir` and returns one outcome per
    /// reference, in input order.
    ///
    /// A failed image never stops the batch. Files that fail mid-stream are
    /// left with whatever was written. Once `cancel` fires, in-flight and
    /// queued images are reported as failed with reason `cancelled`.
    pub async fn download_all(
        &self,
        images: &[ImageReference],
        dir: &Path,
        cancel: &CancellationToken,
    ) -> Vec<DownloadOutcome> {
        let total = images.len();
        let completed = AtomicUsize::new(0);
        let progress = self.progress_bar(total);

        log::info!(
            "Saving {} image(s) to {} ({} at a time)",
            total,
            dir.display(),
            self.concurrency
        );

        let completed = &completed;
        let progress = &progress;

        let mut outcomes: Vec<DownloadOutcome> = stream::iter(images.iter().enumerate())
            .map(|(index, image)| async move {
                let source = image.describe(index);

                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Failure::new("cancelled")),
                    saved = self.save(image, dir) => saved,
                };

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                progress.inc(1);
                log::debug!("Processed {}/{} image(s)", done, total);

                match result {
                    Ok((path, bytes)) => {
                        log::info!("💾 Saved {} ({} bytes)", path.display(), bytes);
                        DownloadOutcome::Saved {
                            index,
                            source,
                            path,
                            bytes,
                        }
                    }
                    Err(failure) => {
                        log::warn!("Failed to save {}: {}", source, failure.reason);
                        DownloadOutcome::Failed {
                            index,
                            source,
                            reason: failure.reason,
                            status: failure.status,
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        progress.finish_and_clear();
        if self.show_progress {
            logger::detach_progress_bar();
        }
        outcomes.sort_by_key(DownloadOutcome::index);
        outcomes
    }

    async fn save(&self, image: &ImageReference, dir: &Path) -> Result<(PathBuf, u64), Failure> {
        match image {
            ImageReference::Url(url) => self.fetch(url, dir).await,
            ImageReference::Base64(payload) => write_embedded(payload, dir).await,
        }
    }

    async fn fetch(&self, url: &str, dir: &Path) -> Result<(PathBuf, u64), Failure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Failure::new(format!("request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Failure {
                reason: format!("image host returned {}", status),
                status: Some(status.as_u16()),
            });
        }

        let path = image_path(dir);
        let mut file = File::create(&path)
            .await
            .map_err(|e| Failure::new(format!("cannot create {}: {}", path.display(), e)))?;

        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                Failure::new(format!("body read failed after {} bytes: {}", written, e))
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Failure::new(format!("write to {} failed: {}", path.display(), e)))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| Failure::new(format!("write to {} failed: {}", path.display(), e)))?;

        Ok((path, written))
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("downloading [{bar:30}] {pos}/{len}") {
            bar.set_style(style.progress_chars("=> "));
        }
        logger::attach_progress_bar(&bar);
        bar
    }
}

async fn write_embedded(payload: &str, dir: &Path) -> Result<(PathBuf, u64), Failure> {
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| Failure::new(format!("invalid base64 payload: {}", e)))?;

    let path = image_path(dir);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| Failure::new(format!("write to {} failed: {}", path.display(), e)))?;

    Ok((path, bytes.len() as u64))
}
