//! Concurrent content search.
//!
//! One walker task visits the tree in lexical order and feeds file jobs into
//! a bounded queue; a fixed pool of workers drains it, sniffs each file and
//! scans it line by line against a regex. Results are capped, the walk stops
//! descending once the cap is hit, and a single cancellation token stops
//! everything.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::vfs::{DirEntry, FileType, VfsError, VfsOps, VfsResult, is_hidden_name};

mod sniff;

pub use sniff::{OCTET_STREAM, SNIFF_LEN, detect_content_type, is_binary_content};

/// Maximum number of matches one search returns.
pub const MAX_MATCHES: usize = 100;
/// Files larger than this are never opened.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
/// Lower bound on the worker pool size.
pub const MIN_WORKERS: usize = 4;

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Caller-facing path of the file.
    pub file: String,
    /// 1-based line number.
    pub line_number: usize,
    /// The line with surrounding whitespace trimmed.
    pub line_content: String,
}

/// Compile a search pattern.
pub fn compile_pattern(pattern: &str) -> VfsResult<Regex> {
    Regex::new(pattern).map_err(|e| VfsError::InvalidPattern(e.to_string()))
}

/// Compile exclude globs. `*` does not cross `/`.
pub fn compile_excludes<I, S>(patterns: I) -> VfsResult<GlobSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| VfsError::InvalidGlob(format!("{pattern}: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| VfsError::InvalidGlob(e.to_string()))
}

/// Decides whether a backend path reached by the walk may be searched.
pub type PathFilter = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(MIN_WORKERS)
}

/// A configured search over one resolved root.
pub struct ContentSearch {
    fs: Arc<dyn VfsOps>,
    root: PathBuf,
    display_root: String,
    pattern: Regex,
    excludes: GlobSet,
    filter: Option<PathFilter>,
    workers: usize,
    max_file_size: u64,
}

impl ContentSearch {
    /// `root` is a backend path from the provider; `display_root` is what
    /// the caller asked for and prefixes every reported file.
    pub fn new(
        fs: Arc<dyn VfsOps>,
        root: impl Into<PathBuf>,
        display_root: impl Into<String>,
        pattern: Regex,
    ) -> Self {
        Self {
            fs,
            root: root.into(),
            display_root: display_root.into(),
            pattern,
            excludes: GlobSet::empty(),
            filter: None,
            workers: default_workers(),
            max_file_size: MAX_FILE_SIZE,
        }
    }

    pub fn with_excludes(mut self, excludes: GlobSet) -> Self {
        self.excludes = excludes;
        self
    }

    /// Worker pool size (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Only descend into directories and scan files for which `filter`
    /// returns true.
    pub fn with_filter(mut self, filter: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Run the search to completion, the cap, or cancellation.
    ///
    /// Matches come back sorted by file and line. Unreadable files and
    /// directories below the root are skipped; an unreadable root and
    /// cancellation are errors.
    #[tracing::instrument(
        skip_all,
        name = "search",
        fields(root = %self.root.display(), pattern = %self.pattern)
    )]
    pub async fn run(self, cancel: &CancellationToken) -> VfsResult<Vec<SearchMatch>> {
        if cancel.is_cancelled() {
            return Err(VfsError::Canceled);
        }
        let root_attr = self
            .fs
            .getattr(&self.root)
            .await
            .map_err(|e| e.with_path(&self.display_root))?;

        // A hidden root is skipped like any hidden entry below it.
        let root_name = Path::new(&self.display_root).file_name();
        if root_name.is_some_and(|name| is_hidden_name(&name.to_string_lossy())) {
            tracing::debug!(root = %self.display_root, "search root is hidden");
            return Ok(Vec::new());
        }

        let shared = Arc::new(Shared {
            fs: self.fs.clone(),
            pattern: self.pattern,
            max_matches: MAX_MATCHES,
            max_file_size: self.max_file_size,
            count: AtomicUsize::new(0),
            matches: parking_lot::Mutex::new(Vec::new()),
        });

        let (tx, rx) = mpsc::channel::<FileJob>(self.workers * 2);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let mut workers = JoinSet::new();
        for _ in 0..self.workers {
            workers.spawn(worker(shared.clone(), rx.clone(), cancel.clone()));
        }
        // Only workers hold the receiver; once they all exit, sends fail.
        drop(rx);

        let walker = Walker {
            fs: self.fs,
            excludes: self.excludes,
            filter: self.filter,
            display_root: self.display_root,
            max_file_size: self.max_file_size,
            shared: shared.clone(),
            tx,
        };
        let mut first_err = if root_attr.is_dir() {
            walker.walk(self.root, cancel).await.err()
        } else {
            walker.single(self.root, root_attr.size).await;
            None
        };

        while let Some(joined) = workers.join_next().await {
            let result = joined
                .unwrap_or_else(|e| Err(VfsError::other(format!("search worker failed: {e}"))));
            if let Err(e) = result {
                first_err.get_or_insert(e);
            }
        }
        if let Some(e) = first_err {
            return Err(e);
        }

        let mut matches = std::mem::take(&mut *shared.matches.lock());
        matches.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.line_number.cmp(&b.line_number))
        });
        tracing::debug!(matches = matches.len(), "search complete");
        Ok(matches)
    }
}

struct FileJob {
    path: PathBuf,
    display: String,
}

/// State shared by the walker and every worker.
struct Shared {
    fs: Arc<dyn VfsOps>,
    pattern: Regex,
    max_matches: usize,
    max_file_size: u64,
    count: AtomicUsize,
    matches: parking_lot::Mutex<Vec<SearchMatch>>,
}

impl Shared {
    fn is_full(&self) -> bool {
        self.count.load(Ordering::Acquire) >= self.max_matches
    }

    /// Append a match unless the cap is reached. Returns false once full.
    fn record(&self, m: SearchMatch) -> bool {
        if self.is_full() {
            return false;
        }
        let mut matches = self.matches.lock();
        if matches.len() >= self.max_matches {
            return false;
        }
        matches.push(m);
        self.count.store(matches.len(), Ordering::Release);
        matches.len() < self.max_matches
    }
}

struct Walker {
    fs: Arc<dyn VfsOps>,
    excludes: GlobSet,
    filter: Option<PathFilter>,
    display_root: String,
    max_file_size: u64,
    shared: Arc<Shared>,
    tx: mpsc::Sender<FileJob>,
}

impl Walker {
    /// The search root is a file: scan just that file.
    async fn single(self, path: PathBuf, size: u64) {
        if size > self.max_file_size || !self.is_allowed(&path) {
            return;
        }
        let job = FileJob {
            path,
            display: self.display_root.clone(),
        };
        let _ = self.tx.send(job).await;
    }

    /// Depth-first walk in lexical order, the same order a recursive
    /// directory listing would visit entries.
    async fn walk(self, root: PathBuf, cancel: &CancellationToken) -> VfsResult<()> {
        let entries = self.fs.readdir(&root).await?;
        let mut stack: Vec<(PathBuf, String, std::vec::IntoIter<DirEntry>)> =
            vec![(root, String::new(), entries.into_iter())];

        while let Some((dir, rel_dir, iter)) = stack.last_mut() {
            let Some(entry) = iter.next() else {
                stack.pop();
                continue;
            };
            if cancel.is_cancelled() {
                return Err(VfsError::Canceled);
            }
            if self.shared.is_full() {
                break;
            }

            let rel = if rel_dir.is_empty() {
                entry.name.clone()
            } else {
                format!("{rel_dir}/{}", entry.name)
            };
            if entry.is_hidden() || self.is_excluded(&entry.name, &rel) {
                continue;
            }
            let path = dir.join(&entry.name);
            if !self.is_allowed(&path) {
                tracing::debug!(path = %path.display(), "skipping filtered entry");
                continue;
            }

            match entry.kind {
                FileType::Directory => match self.fs.readdir(&path).await {
                    Ok(children) => stack.push((path, rel, children.into_iter())),
                    Err(e) => {
                        tracing::debug!(path = %path.display(), error = %e, "skipping unreadable directory");
                    }
                },
                FileType::File if entry.size <= self.max_file_size => {
                    let job = FileJob {
                        path,
                        display: join_display(&self.display_root, &rel),
                    };
                    if self.tx.send(job).await.is_err() {
                        // Every worker has stopped.
                        break;
                    }
                }
                // Oversized files, symlinks and special files are not scanned.
                _ => {}
            }
        }
        Ok(())
    }

    fn is_allowed(&self, path: &Path) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(path))
    }

    fn is_excluded(&self, name: &str, rel: &str) -> bool {
        !self.excludes.is_empty() && (self.excludes.is_match(name) || self.excludes.is_match(rel))
    }
}

fn join_display(root: &str, rel: &str) -> String {
    if rel.is_empty() {
        root.to_string()
    } else if root.ends_with('/') {
        format!("{root}{rel}")
    } else {
        format!("{root}/{rel}")
    }
}

async fn worker(
    shared: Arc<Shared>,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<FileJob>>>,
    cancel: CancellationToken,
) -> VfsResult<()> {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(VfsError::Canceled),
            job = async { rx.lock().await.recv().await } => job,
        };
        let Some(job) = next else {
            return Ok(());
        };
        if shared.is_full() {
            return Ok(());
        }

        match scan_file(&shared, &job, &cancel).await {
            Ok(()) => {}
            Err(VfsError::Canceled) => return Err(VfsError::Canceled),
            Err(e) => {
                tracing::debug!(path = %job.path.display(), error = %e, "skipping file");
            }
        }
    }
}

async fn scan_file(shared: &Shared, job: &FileJob, cancel: &CancellationToken) -> VfsResult<()> {
    let file = shared.fs.open_read(&job.path).await?;
    if !file.attr.is_file() || file.attr.size > shared.max_file_size {
        return Ok(());
    }

    let mut reader = file.reader.take(shared.max_file_size);
    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut reader).take(SNIFF_LEN as u64).read_to_end(&mut head).await?;
    if is_binary_content(&head) {
        tracing::trace!(path = %job.path.display(), "skipping binary file");
        return Ok(());
    }

    let mut lines = BufReader::new(std::io::Cursor::new(head).chain(reader));
    let mut buf = Vec::new();
    let mut line_number = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(VfsError::Canceled);
        }
        buf.clear();
        if lines.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        line_number += 1;

        let text = String::from_utf8_lossy(strip_newline(&buf));
        if shared.pattern.is_match(&text) {
            let found = SearchMatch {
                file: job.display.clone(),
                line_number,
                line_content: text.trim().to_string(),
            };
            if !shared.record(found) {
                return Ok(());
            }
        }
    }
}

fn strip_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
