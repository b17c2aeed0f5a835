//! Error taxonomy for mod reconciliation and link operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Windows `ERROR_PRIVILEGE_NOT_HELD`, returned by `CreateSymbolicLinkW`
/// without Developer Mode or elevation.
const ERROR_PRIVILEGE_NOT_HELD: i32 = 1314;

pub type ModResult<T> = Result<T, ModError>;

#[derive(Debug, Error)]
pub enum ModError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("Cannot read directory {path:?}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Name collision in {root:?}: {first:?} and {second:?}")]
    DuplicateName {
        root: PathBuf,
        first: String,
        second: String,
    },

    #[error("Not permitted to create symlink {link:?}: {message}")]
    Privilege { link: PathBuf, message: String },

    #[error("{path:?} already exists in the extensions directory")]
    SlotOccupied { path: PathBuf },

    #[error("{path:?} is not a symlink, refusing to remove it")]
    NotASymlink { path: PathBuf },

    #[error("{path:?} points to {actual:?}, expected {expected:?}")]
    StaleTarget {
        path: PathBuf,
        expected: PathBuf,
        actual: PathBuf,
    },

    #[error("Mod '{name}' not found in {root:?}")]
    ModNotFound { name: String, root: PathBuf },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl ModError {
    /// Stable identifier used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ModError::Config(_) => "ConfigError",
            ModError::InvalidPath { .. } => "InvalidPathError",
            ModError::DirectoryUnreadable { .. } => "DirectoryUnreadableError",
            ModError::DuplicateName { .. } => "DuplicateNameError",
            ModError::Privilege { .. } => "PrivilegeError",
            ModError::SlotOccupied { .. } => "SlotOccupiedError",
            ModError::NotASymlink { .. } => "NotASymlinkError",
            ModError::StaleTarget { .. } => "StaleTargetError",
            ModError::ModNotFound { .. } => "ModNotFoundError",
            ModError::Io(_) => "IoError",
        }
    }

    /// Actionable guidance for the user, when there is any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ModError::Privilege { .. } => Some(privilege_hint()),
            ModError::SlotOccupied { .. } | ModError::NotASymlink { .. } => Some(
                "Another mod with this folder name is already in the extensions directory. \
                 Move or remove it manually first.",
            ),
            ModError::StaleTarget { .. } => {
                Some("The link was changed outside modlink. Refresh and check it manually.")
            }
            ModError::Config(_) | ModError::InvalidPath { .. } => {
                Some("Check the mods and extensions directories in the settings.")
            }
            _ => None,
        }
    }

    pub(crate) fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ModError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// What to do when the process may not create symlinks.
pub fn privilege_hint() -> &'static str {
    if cfg!(windows) {
        "Windows only allows symlink creation with Developer Mode enabled \
         (Settings > Privacy & security > For developers) or when running as Administrator."
    } else {
        "The current user cannot create links in the extensions directory. \
         Check its ownership and permissions."
    }
}

/// Find the `io::Error` that caused an anyhow error, if any.
pub(crate) fn io_error(err: &anyhow::Error) -> Option<&io::Error> {
    err.chain().find_map(|e| e.downcast_ref::<io::Error>())
}

/// Whether the OS refused an operation for lack of privileges.
pub(crate) fn is_permission_denied(err: &anyhow::Error) -> bool {
    io_error(err).is_some_and(|e| {
        e.kind() == io::ErrorKind::PermissionDenied
            || e.raw_os_error() == Some(ERROR_PRIVILEGE_NOT_HELD)
    })
}

pub(crate) fn is_already_exists(err: &anyhow::Error) -> bool {
    io_error(err).is_some_and(|e| e.kind() == io::ErrorKind::AlreadyExists)
}
