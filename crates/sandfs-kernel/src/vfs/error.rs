//! VFS error types.
//!
//! Every message carries a stable substring ("access denied", "no root paths
//! defined", "invalid regex pattern", ...) so callers without access to the
//! enum can still branch on the error class.

use std::io;
use thiserror::Error;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// The provider has no root mappings at all.
    #[error("no root paths defined")]
    NoRootsDefined,

    /// No configured virtual root matches the request path.
    #[error("path {0} is not allowed (no matching root)")]
    NotAllowed(String),

    /// The configured real root is missing or unreadable.
    #[error("failed to resolve root path {path}: {source}")]
    RootResolutionFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A symlink on the path points at something that does not exist.
    #[error("broken symlink: {0}")]
    BrokenSymlink(String),

    /// Symlink mode is DENY and the path touches a symlink.
    #[error("access denied: symlinks are disabled: {0}")]
    SymlinksDisabled(String),

    /// Resolved path escapes the canonical root.
    #[error("access denied: path traversal detected")]
    PathTraversal,

    /// Allow/deny list rejection.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Filesystem is read-only.
    #[error("filesystem is read-only")]
    ReadOnly,

    /// File or directory not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file.
    #[error("path is a directory: {0}")]
    IsADirectory(String),

    /// Devices, sockets, fifos and the like.
    #[error("path is not a regular file: {0}")]
    NotRegularFile(String),

    /// File too large to load.
    #[error("file size exceeds limit of {limit} bytes")]
    SizeLimitExceeded { limit: u64 },

    /// Parent directory could not be created before a write or move.
    #[error("failed to create parent directory: {0}")]
    ParentDirectory(#[source] io::Error),

    /// Search pattern failed to compile.
    #[error("invalid regex pattern: {0}")]
    InvalidPattern(String),

    /// Exclude pattern failed to compile.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// The caller's cancellation token fired.
    #[error("operation canceled")]
    Canceled,

    /// A required tool argument is absent or has the wrong type.
    #[error("{0} is required")]
    MissingArgument(&'static str),

    /// Tool arguments are not a JSON object.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// No tool registered under this name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// No mount registered under this name.
    #[error("unknown mount: {0}")]
    UnknownMount(String),

    /// Configuration could not be loaded or validated.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl VfsError {
    /// Create a NotAllowed error.
    pub fn not_allowed(path: impl Into<String>) -> Self {
        Self::NotAllowed(path.into())
    }

    /// Create a BrokenSymlink error.
    pub fn broken_symlink(path: impl Into<String>) -> Self {
        Self::BrokenSymlink(path.into())
    }

    /// Create a SymlinksDisabled error.
    pub fn symlinks_disabled(path: impl Into<String>) -> Self {
        Self::SymlinksDisabled(path.into())
    }

    /// Create an AccessDenied error.
    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied(reason.into())
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Replace any backend path carried by the error with `path`.
    ///
    /// Resolution and backend errors name real paths; callers only ever
    /// see the virtual path they asked for.
    pub fn with_path(self, path: &str) -> Self {
        let path = path.to_string();
        match self {
            Self::RootResolutionFailed { source, .. } => Self::RootResolutionFailed { path, source },
            Self::BrokenSymlink(_) => Self::BrokenSymlink(path),
            Self::SymlinksDisabled(_) => Self::SymlinksDisabled(path),
            Self::NotFound(_) => Self::NotFound(path),
            Self::NotADirectory(_) => Self::NotADirectory(path),
            Self::IsADirectory(_) => Self::IsADirectory(path),
            Self::NotRegularFile(_) => Self::NotRegularFile(path),
            other => other,
        }
    }

    /// True for the errors a search worker treats as terminal.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Convert VfsError to std::io::Error for compatibility.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::Io(e) => e,
            VfsError::RootResolutionFailed { source, .. } => source,
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            VfsError::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            VfsError::ReadOnly => {
                io::Error::new(io::ErrorKind::ReadOnlyFilesystem, "filesystem is read-only")
            }
            e @ (VfsError::NotAllowed(_)
            | VfsError::SymlinksDisabled(_)
            | VfsError::PathTraversal
            | VfsError::AccessDenied(_)) => {
                io::Error::new(io::ErrorKind::PermissionDenied, e.to_string())
            }
            e @ (VfsError::MissingArgument(_)
            | VfsError::InvalidArguments(_)
            | VfsError::InvalidPattern(_)
            | VfsError::InvalidGlob(_)) => {
                io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
            }
            VfsError::Canceled => io::Error::new(io::ErrorKind::Interrupted, "operation canceled"),
            e => io::Error::other(e.to_string()),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
