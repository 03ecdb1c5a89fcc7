use anyhow::{Context, Result};
use memmap2::Mmap;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::page::{segment, Segmentation};

/// Configuration for file loading behavior
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Map the file read-only instead of reading it into memory
    pub use_mmap: bool,
    /// Buffer size for async reading (default: 8KB)
    pub buffer_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            use_mmap: false,
            buffer_size: 8192,
        }
    }
}

/// Statistics for one load
#[derive(Debug, Clone)]
pub struct LoadStats {
    pub file_path: String,
    pub bytes_read: u64,
    pub duration_ms: u64,
}

/// Backing storage of a loaded file
#[derive(Debug)]
enum Contents {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for Contents {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Contents::Owned(bytes) => bytes,
            Contents::Mapped(map) => map,
        }
    }
}

/// The whole contents of one file. Every page segmented from it borrows from
/// it, so it outlives them.
#[derive(Debug)]
pub struct LoadedFile {
    path: PathBuf,
    contents: Contents,
}

impl LoadedFile {
    /// Wrap an in-memory buffer
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            contents: Contents::Owned(bytes),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.contents
    }

    /// Split the contents into pages
    pub fn segment(&self) -> Result<Segmentation<'_>> {
        segment(self.bytes()).with_context(|| format!("Failed to parse {}", self.path.display()))
    }
}

/// Async loader producing whole-file buffers
pub struct FileLoader {
    config: LoaderConfig,
}

impl FileLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load the whole file at `file_path`
    pub async fn load<P: AsRef<Path>>(&self, file_path: P) -> Result<(LoadedFile, LoadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();

        debug!("Starting load of file: {}", path.display());

        let file = File::open(path).await.map_err(|e| {
            let error_msg = format!("Failed to open file {}: {}", path.display(), e);
            warn!("{}", error_msg);
            anyhow::anyhow!(error_msg)
        })?;

        let contents = if self.config.use_mmap {
            let std_file = file.into_std().await;
            // SAFETY: the map is read-only; the file must not be truncated while
            // its pages are alive
            let map = unsafe { Mmap::map(&std_file) }
                .with_context(|| format!("Failed to map file {}", path.display()))?;
            Contents::Mapped(map)
        } else {
            let capacity = file.metadata().await.map(|m| m.len() as usize).unwrap_or(0);
            let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
            let mut bytes = Vec::with_capacity(capacity);
            reader.read_to_end(&mut bytes).await.map_err(|e| {
                let error_msg = format!("Failed to read file {}: {}", path.display(), e);
                warn!("{}", error_msg);
                anyhow::anyhow!(error_msg)
            })?;
            Contents::Owned(bytes)
        };

        let stats = LoadStats {
            file_path: path.display().to_string(),
            bytes_read: contents.len() as u64,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Loaded {}: {} bytes in {}ms{}",
            path.display(),
            stats.bytes_read,
            stats.duration_ms,
            if self.config.use_mmap { " (mmap)" } else { "" }
        );

        Ok((
            LoadedFile {
                path: path.to_path_buf(),
                contents,
            },
            stats,
        ))
    }
}

/// Convenience function for loading a single file with default configuration
pub async fn load_file<P: AsRef<Path>>(file_path: P) -> Result<LoadedFile> {
    let loader = FileLoader::new(LoaderConfig::default());
    let (file, _stats) = loader.load(file_path).await?;
    Ok(file)
}
