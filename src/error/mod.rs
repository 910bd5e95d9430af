// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!              KhError (~24 bytes)
//!                     |
//!   +---------+-------+-------+---------+
//!   |    |    |    |    |    |    |     |
//!   v    v    v    v    v    v    v     v
//! Bail  Repo Tool Proc Cfg  Fs  Net  Io/Other
//!       Box  Box  Box  Box  Box Box  Box<str>
//!
//! Sub-errors (unboxed internally):
//!   Repo    Gix, CloneFailed, PullFailed
//!   Tool    MissingInput, MissingTool
//!   Process SpawnFailed, NonZeroExit
//!   Config  ReadError, ParseError, WriteError
//!   Fs      NotFound, IoError
//!   Network HttpError, DownloadFailed, Reqwest
//!
//! All variants boxed => KhError fits in 24 bytes.
//! ```
//!
//! Severity tiers: symlink conflicts are absorbed by the reconciler (never
//! an error), a tool failure is fatal to one build target, an IO failure is
//! fatal to the whole pass.

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`KhError`].
pub type KhResult<T> = std::result::Result<T, KhError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum KhError {
    /// Fatal error that should terminate the application.
    #[error("fatal error: {0}")]
    Bailed(Box<str>),

    /// Mod repository operation failed.
    #[error("repository error: {0}")]
    Repo(#[from] Box<RepoError>),

    /// External build/patch tool invocation failed.
    #[error("tool error: {0}")]
    Tool(#[from] Box<ToolError>),

    /// Process execution error.
    #[error("process error: {0}")]
    Process(#[from] Box<ProcessError>),

    /// Settings store error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Filesystem error.
    #[error("filesystem error: {0}")]
    Fs(#[from] Box<FsError>),

    /// Network operation failed.
    #[error("network error: {0}")]
    Network(#[from] Box<NetworkError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

/// Create a fatal [`KhError::Bailed`] that terminates the application.
pub fn bail_out(message: impl Into<String>) -> KhError {
    KhError::Bailed(message.into().into_boxed_str())
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for KhError {
                fn from(err: $error) -> Self {
                    KhError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    RepoError => Repo,
    ToolError => Tool,
    ProcessError => Process,
    ConfigError => Config,
    FsError => Fs,
    NetworkError => Network,
    std::io::Error => Io,
}

// --- Gix Errors ---

/// Wrapper for gix-specific errors.
///
/// gix has multiple error types that are converted through this enum.
/// Large error types are boxed to keep enum size manageable.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to discover repository from path.
    #[error("failed to discover repository: {0}")]
    Discover(#[from] Box<gix::discover::Error>),

    /// Failed to resolve HEAD to a commit id.
    #[error("failed to resolve head commit: {0}")]
    HeadId(#[from] Box<gix::reference::head_id::Error>),

    /// Repository has no worktree (bare repository).
    #[error("repository has no worktree (bare repository)")]
    BareRepository,
}

// --- Repository Errors ---

/// Mod repository tracking errors.
///
/// Any of these leaves the mod set in an untrusted, half-updated state, so
/// they are fatal to the current pass and never retried automatically.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Clone operation failed.
    #[error("failed to clone {url}: {message}")]
    CloneFailed { url: String, message: String },

    /// Pull operation failed.
    #[error("failed to pull {path}: {message}")]
    PullFailed { path: String, message: String },

    /// Error from gix library.
    #[error("gix error: {0}")]
    Gix(#[from] GixError),
}

// --- Tool Errors ---

/// Typed validation errors for external tool invocations.
///
/// Raised before spawning, so a missing path produces a readable error
/// instead of an opaque non-zero exit from the tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A path the tool requires does not exist.
    #[error("{tool}: required path does not exist: {path}")]
    MissingInput { tool: String, path: String },

    /// The tool executable itself is missing.
    #[error("tool executable not found: {path}")]
    MissingTool { path: String },
}

// --- Process Errors ---

/// Process execution errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Executable not found in PATH.
    #[error("executable not found: '{name}' (not in PATH)")]
    ExecutableNotFound { name: String },

    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with non-zero status.
    #[error("process '{command}' exited with code {code}")]
    NonZeroExit { command: String, code: i32 },

    /// Failed to read process output.
    #[error("failed to read output from process '{command}': {message}")]
    OutputError { command: String, message: String },
}

// --- Config Errors ---

/// Settings store errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the settings file.
    #[error("failed to read settings file '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the settings file.
    #[error("failed to parse settings file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Failed to write the settings file.
    #[error("failed to write settings file '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A required section is missing for the requested operation.
    #[error("missing settings section '{section}': {message}")]
    MissingSection { section: String, message: String },
}

// --- Filesystem Errors ---

/// Filesystem operation errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path not found.
    #[error("path not found: {0}")]
    NotFound(String),

    /// General I/O error.
    #[error("I/O error on '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// --- Network Errors ---

/// Network operation errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// HTTP error response.
    #[error("http error {status}: {url}")]
    HttpError { status: u16, url: String },

    /// Download failed.
    #[error("download failed: {url} - {message}")]
    DownloadFailed { url: String, message: String },

    /// Error from reqwest library.
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// I/O error during download.
    #[error("io error during download: {0}")]
    Io(#[from] std::io::Error),
}
