use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{info, warn};

const CONCURRENCY: usize = 8;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const USER_AGENT: &str = concat!("resume_tailor/", env!("CARGO_PKG_VERSION"));

/// Where a job posting page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Path(PathBuf),
    Url(String),
}

impl PageSource {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            PageSource::Url(trimmed.to_string())
        } else {
            PageSource::Path(PathBuf::from(trimmed))
        }
    }

    pub fn label(&self) -> String {
        match self {
            PageSource::Path(p) => p.display().to_string(),
            PageSource::Url(u) => u.clone(),
        }
    }
}

/// One loaded page, or the reason it could not be loaded.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub source: String,
    pub html: Option<String>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

pub struct Fetcher {
    client: reqwest::Client,
    base_backoff: Duration,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_backoff: Duration::from_millis(BASE_BACKOFF_MS),
        })
    }

    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.base_backoff = base;
        self
    }

    /// Read a local file or download a URL.
    pub async fn load(&self, source: &PageSource) -> Result<String> {
        match source {
            PageSource::Path(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display())),
            PageSource::Url(url) => self.fetch_with_retry(url).await,
        }
    }

    /// Load several pages concurrently. Failures are reported per page; output keeps input order.
    pub async fn load_all(self: Arc<Self>, sources: Vec<PageSource>) -> Vec<LoadedPage> {
        let total = sources.len();
        let semaphore = Arc::new(Semaphore::new(CONCURRENCY));

        let pb = if total > 1 {
            let pb = ProgressBar::new(total as u64);
            if let Ok(style) =
                ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
            {
                pb.set_style(style.progress_chars("=> "));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let (tx, mut rx) = tokio::sync::mpsc::channel::<(usize, LoadedPage)>(CONCURRENCY * 2);

        for (idx, source) in sources.into_iter().enumerate() {
            let fetcher = Arc::clone(&self);
            let sem = Arc::clone(&semaphore);
            let tx = tx.clone();

            tokio::spawn(async move {
                let label = source.label();
                let page = match sem.acquire().await {
                    Ok(_permit) => {
                        let start = Instant::now();
                        let result = fetcher.load(&source).await;
                        let latency_ms = Some(start.elapsed().as_millis() as i64);
                        match result {
                            Ok(html) => LoadedPage { source: label, html: Some(html), error: None, latency_ms },
                            Err(e) => {
                                warn!("Failed to load {}: {:#}", label, e);
                                LoadedPage { source: label, html: None, error: Some(format!("{:#}", e)), latency_ms }
                            }
                        }
                    }
                    Err(e) => LoadedPage { source: label, html: None, error: Some(e.to_string()), latency_ms: None },
                };
                let _ = tx.send((idx, page)).await;
            });
        }

        // Drop our copy of tx so rx closes when all spawned tasks finish
        drop(tx);

        let mut pages: Vec<Option<LoadedPage>> = vec![None; total];
        while let Some((idx, page)) = rx.recv().await {
            pages[idx] = Some(page);
            pb.inc(1);
        }
        pb.finish_and_clear();

        let pages: Vec<LoadedPage> = pages.into_iter().flatten().collect();
        let ok = pages.iter().filter(|p| p.html.is_some()).count();
        info!("Loaded {} pages ({} ok, {} errors)", total, ok, total - ok);
        pages
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        for attempt in 0..=MAX_RETRIES {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .with_context(|| format!("Request to {} failed", url))?;
            let status = response.status();

            if status.is_success() {
                return response
                    .text()
                    .await
                    .with_context(|| format!("Failed to read body of {}", url));
            }

            let retryable = status.as_u16() == 429 || status.is_server_error();
            if !retryable || attempt == MAX_RETRIES {
                bail!("{} returned {}", url, status);
            }

            let backoff = self.base_backoff * 2u32.pow(attempt);
            warn!(
                "{} from {} (attempt {}/{}), backing off {:.1}s",
                status,
                url,
                attempt + 1,
                MAX_RETRIES,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
        }

        bail!("{} kept failing after {} retries", url, MAX_RETRIES)
    }
}
