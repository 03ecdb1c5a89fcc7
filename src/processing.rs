// WHY: Concurrent per-file segmentation and page queries for the CLI
// Each file owns its buffer, tokens and pages; nothing mutable is shared between parses

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::index::{Index, NameLookup};
use crate::ops::{intersect, subtract, union};
use crate::page::{Addressed, Page};
use crate::reader::{FileLoader, LoaderConfig};

/// Configuration for a processing run
#[derive(Debug, Clone, Default)]
pub struct ProcessingConfig {
    /// Abort the run on the first failing file
    pub fail_fast: bool,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
    pub loader: LoaderConfig,
}

/// Page selection. Every selector narrows the result; exclusions are removed last.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Pages whose first title is this
    pub named: Option<String>,
    /// Pages carrying every one of these tags
    pub tagged: Vec<String>,
    /// Pages carrying any of these as a secondary title
    pub secondary: Vec<String>,
    /// Pages carrying none of these tags
    pub exclude_tagged: Vec<String>,
    /// The page at this address
    pub address: Option<usize>,
    /// Report pages even if no selector is given
    pub list: bool,
}

impl Query {
    /// Whether the query reports any pages at all
    pub fn is_active(&self) -> bool {
        self.list
            || self.named.is_some()
            || self.address.is_some()
            || !self.tagged.is_empty()
            || !self.secondary.is_empty()
            || !self.exclude_tagged.is_empty()
    }

    /// Pages of `index` matching the query, sorted by address
    pub fn select<'p, 'a>(&self, index: &Index<'p, 'a>) -> Vec<&'p Page<'a>> {
        let mut selected: Option<Vec<&'p Page<'a>>> = None;
        let mut narrow = |list: Vec<&'p Page<'a>>| {
            selected = Some(match selected.take() {
                None => list,
                Some(current) => intersect(&current, &list),
            });
        };

        if let Some(name) = &self.named {
            if let NameLookup::Ambiguous { pages, .. } = index.page_named(name) {
                warn!("Name {} is ambiguous: {} pages", name, pages.len());
            }
            narrow(index.pages_named(name).to_vec());
        }
        for tag in &self.tagged {
            narrow(index.pages_tagged(tag).to_vec());
        }
        if !self.secondary.is_empty() {
            let any = self.secondary.iter().fold(Vec::new(), |acc, thing| {
                union(&acc, index.pages_with_secondary_title(thing))
            });
            narrow(any);
        }
        if let Some(address) = self.address {
            narrow(index.page_at(address).into_iter().collect());
        }

        let mut result = selected.unwrap_or_else(|| index.pages().iter().collect());
        for tag in &self.exclude_tagged {
            result = subtract(&result, index.pages_tagged(tag));
        }
        result
    }
}

/// One reported page
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PageMatch {
    pub path: String,
    pub address: usize,
    pub name: String,
    pub hash64: String,
}

impl PageMatch {
    fn new(path: &Path, page: &Page<'_>) -> Self {
        Self {
            path: path.display().to_string(),
            address: page.address(),
            name: page.name().0.to_string(),
            hash64: page.hash64(),
        }
    }
}

/// Per-file processing statistics
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FileStats {
    pub path: String,
    pub bytes_processed: u64,
    /// Classified lines, virtual end line included
    pub line_count: u64,
    pub pages_found: u64,
    pub processing_time_ms: u64,
    /// Processing status (success, failed)
    pub status: String,
    /// Error message if processing failed
    pub error: Option<String>,
}

impl FileStats {
    fn failed(path: &Path, error: &anyhow::Error, elapsed_ms: u64) -> Self {
        Self {
            path: path.display().to_string(),
            bytes_processed: 0,
            line_count: 0,
            pages_found: 0,
            processing_time_ms: elapsed_ms,
            status: "failed".to_string(),
            error: Some(format!("{error:#}")),
        }
    }
}

/// Summary of a whole run, written as JSON
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunStats {
    /// Seconds since the Unix epoch
    pub run_start: u64,
    pub total_processing_time_ms: u64,
    pub total_bytes_processed: u64,
    pub total_pages_found: u64,
    pub files_processed: u64,
    pub files_failed: u64,
    pub file_stats: Vec<FileStats>,
}

/// Output of a run: statistics plus every matching page in file order
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stats: RunStats,
    pub matches: Vec<PageMatch>,
}

/// Expand glob patterns into file paths, in pattern order
pub fn expand_patterns<S: AsRef<str>>(patterns: &[S], fail_fast: bool) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let before = paths.len();
        for entry in glob::glob(pattern).with_context(|| format!("Invalid pattern: {pattern}"))? {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) if fail_fast => return Err(e.into()),
                Err(e) => warn!("Skipping unreadable path: {}", e),
            }
        }
        if paths.len() == before {
            if fail_fast {
                anyhow::bail!("No files match pattern: {pattern}");
            }
            warn!("No files match pattern: {}", pattern);
        }
    }
    Ok(paths)
}

/// Load, segment and query one file
pub async fn process_file(
    loader: &FileLoader,
    path: &Path,
    query: &Query,
) -> Result<(FileStats, Vec<PageMatch>)> {
    let start_time = Instant::now();
    let (file, load_stats) = loader.load(path).await?;
    let query = query.clone();

    // WHY: segmentation is CPU bound; keep it off the async workers
    let (line_count, pages_found, matches) = tokio::task::spawn_blocking(move || -> Result<_> {
        let segmentation = file.segment()?;
        let index = Index::new(&segmentation.pages);
        let matches = if query.is_active() {
            query
                .select(&index)
                .into_iter()
                .map(|page| PageMatch::new(file.path(), page))
                .collect()
        } else {
            Vec::new()
        };
        Ok((segmentation.statistics.line_count, segmentation.pages.len(), matches))
    })
    .await??;

    let stats = FileStats {
        path: path.display().to_string(),
        bytes_processed: load_stats.bytes_read,
        line_count: line_count as u64,
        pages_found: pages_found as u64,
        processing_time_ms: start_time.elapsed().as_millis() as u64,
        status: "success".to_string(),
        error: None,
    };
    info!("Processed {}: {} pages, {} lines", stats.path, stats.pages_found, stats.line_count);
    Ok((stats, matches))
}

/// Process every file concurrently, bounded by the number of CPUs. Results keep
/// the order of `paths`.
pub async fn process_files(
    paths: &[PathBuf],
    config: &ProcessingConfig,
    query: &Query,
) -> Result<RunOutput> {
    let run_start = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let start_time = Instant::now();
    let loader = FileLoader::new(config.loader.clone());

    let progress = if config.show_progress {
        let bar = ProgressBar::new(paths.len() as u64);
        bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);
        bar
    } else {
        ProgressBar::hidden()
    };

    info!("Processing {} files", paths.len());

    let mut results = stream::iter(paths)
        .map(|path| {
            let loader = &loader;
            let progress = &progress;
            async move {
                let file_start = Instant::now();
                let result = process_file(loader, path, query).await;
                progress.inc(1);
                (path, result, file_start.elapsed().as_millis() as u64)
            }
        })
        .buffered(num_cpus::get().max(1));

    let mut file_stats = Vec::with_capacity(paths.len());
    let mut matches = Vec::new();
    while let Some((path, result, elapsed_ms)) = results.next().await {
        match result {
            Ok((stats, found)) => {
                file_stats.push(stats);
                matches.extend(found);
            }
            Err(e) if config.fail_fast => {
                progress.abandon_with_message("failed");
                return Err(e.context(format!("Processing failed for {}", path.display())));
            }
            Err(e) => {
                warn!("Failed to process {}: {:#}", path.display(), e);
                file_stats.push(FileStats::failed(path, &e, elapsed_ms));
            }
        }
    }
    progress.finish_and_clear();

    let files_failed = file_stats.iter().filter(|s| s.error.is_some()).count() as u64;
    let stats = RunStats {
        run_start,
        total_processing_time_ms: start_time.elapsed().as_millis() as u64,
        total_bytes_processed: file_stats.iter().map(|s| s.bytes_processed).sum(),
        total_pages_found: file_stats.iter().map(|s| s.pages_found).sum(),
        files_processed: file_stats.len() as u64 - files_failed,
        files_failed,
        file_stats,
    };

    info!(
        "Run complete: {} processed, {} failed, {} pages",
        stats.files_processed, stats.files_failed, stats.total_pages_found
    );
    Ok(RunOutput { stats, matches })
}

/// Write run statistics as pretty JSON
pub async fn write_run_stats(path: &Path, stats: &RunStats) -> Result<()> {
    let content = serde_json::to_string_pretty(stats)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write stats to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::segment;
    use tempfile::TempDir;

    const NOTES: &[u8] = b"----alpha\n----red\n\none\n\n----beta\n----red\n----blue\n\ntwo\n\n----gamma\n----blue\n\nthree\n\n----alpha\n\nfour\n";

    fn addresses(pages: &[&Page<'_>]) -> Vec<usize> {
        pages.iter().map(|p| p.address()).collect()
    }

    #[test]
    fn test_select_combines_selectors() {
        let seg = segment(NOTES).unwrap();
        let index = Index::new(&seg.pages);

        let query = Query { tagged: vec!["red".into()], ..Default::default() };
        assert_eq!(addresses(&query.select(&index)), vec![1, 6]);

        let query = Query {
            tagged: vec!["red".into(), "blue".into()],
            ..Default::default()
        };
        assert_eq!(addresses(&query.select(&index)), vec![6]);

        let query = Query {
            secondary: vec!["red".into(), "blue".into()],
            exclude_tagged: vec!["beta".into()],
            ..Default::default()
        };
        assert_eq!(addresses(&query.select(&index)), vec![1, 12]);

        let query = Query { named: Some("alpha".into()), ..Default::default() };
        assert_eq!(addresses(&query.select(&index)), vec![1, 17]);

        let query = Query { address: Some(12), list: true, ..Default::default() };
        assert_eq!(addresses(&query.select(&index)), vec![12]);
    }

    #[test]
    fn test_inactive_query_selects_everything() {
        let seg = segment(NOTES).unwrap();
        let index = Index::new(&seg.pages);
        let query = Query::default();
        assert!(!query.is_active());
        assert_eq!(query.select(&index).len(), 4);
    }

    #[test]
    fn test_expand_patterns() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), "x").unwrap();
        std::fs::write(temp_dir.path().join("b.txt"), "y").unwrap();
        let pattern = format!("{}/*.txt", temp_dir.path().display());

        let paths = expand_patterns(&[pattern], false).unwrap();
        assert_eq!(paths.len(), 2);

        let missing = format!("{}/*.md", temp_dir.path().display());
        assert!(expand_patterns(std::slice::from_ref(&missing), false).unwrap().is_empty());
        assert!(expand_patterns(&[missing], true).is_err());
    }

    #[tokio::test]
    async fn test_process_files_records_failures() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.txt");
        std::fs::write(&good, NOTES).unwrap();
        let missing = temp_dir.path().join("missing.txt");

        let config = ProcessingConfig::default();
        let query = Query { list: true, ..Default::default() };
        let output = process_files(&[good.clone(), missing.clone()], &config, &query)
            .await
            .unwrap();

        assert_eq!(output.stats.files_processed, 1);
        assert_eq!(output.stats.files_failed, 1);
        assert_eq!(output.stats.total_pages_found, 4);
        assert_eq!(output.stats.file_stats[0].status, "success");
        assert_eq!(output.stats.file_stats[1].status, "failed");
        assert_eq!(output.matches.len(), 4);
        assert_eq!(output.matches[0].name, "alpha");

        let fail_fast = ProcessingConfig { fail_fast: true, ..Default::default() };
        assert!(process_files(&[good, missing], &fail_fast, &query).await.is_err());
    }

    #[tokio::test]
    async fn test_write_run_stats() {
        let temp_dir = TempDir::new().unwrap();
        let stats_path = temp_dir.path().join("nested").join("stats.json");
        let stats = RunStats {
            run_start: 0,
            total_processing_time_ms: 1,
            total_bytes_processed: 2,
            total_pages_found: 3,
            files_processed: 1,
            files_failed: 0,
            file_stats: Vec::new(),
        };
        write_run_stats(&stats_path, &stats).await.unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&stats_path).unwrap()).unwrap();
        assert_eq!(value["total_pages_found"], 3);
    }
}
