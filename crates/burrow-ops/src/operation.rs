//! Batch request types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// The kind of operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Copy,
    Move,
    Delete,
    Compress,
    Extract,
    Rename,
    CreateFile,
    CreateDirectory,
}

impl OperationKind {
    /// Phase label shown while the operation runs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Copy => "Copying files...",
            Self::Move => "Moving files...",
            Self::Delete => "Deleting files...",
            Self::Compress => "Compressing files...",
            Self::Extract => "Extracting archive...",
            Self::Rename => "Renaming...",
            Self::CreateFile => "Creating file...",
            Self::CreateDirectory => "Creating folder...",
        }
    }

    /// Past-tense verb used in outcome summaries.
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Copy => "Copied",
            Self::Move => "Moved",
            Self::Delete => "Deleted",
            Self::Compress => "Compressed",
            Self::Extract => "Extracted",
            Self::Rename => "Renamed",
            Self::CreateFile | Self::CreateDirectory => "Created",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "Copy"),
            Self::Move => write!(f, "Move"),
            Self::Delete => write!(f, "Delete"),
            Self::Compress => write!(f, "Compress"),
            Self::Extract => write!(f, "Extract"),
            Self::Rename => write!(f, "Rename"),
            Self::CreateFile => write!(f, "Create file"),
            Self::CreateDirectory => write!(f, "Create directory"),
        }
    }
}

impl FromStr for OperationKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "move" => Ok(Self::Move),
            "delete" => Ok(Self::Delete),
            "compress" => Ok(Self::Compress),
            "extract" => Ok(Self::Extract),
            "rename" => Ok(Self::Rename),
            "create_file" => Ok(Self::CreateFile),
            "create_directory" => Ok(Self::CreateDirectory),
            _ => Err(RequestError::UnknownKind(s.to_string())),
        }
    }
}

/// Archive password. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// The secret itself, for handing to the codec.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One batch unit of work.
///
/// Each variant carries exactly the fields its kind needs, so most malformed
/// requests cannot be expressed. [`OperationRequest::from_parts`] is the
/// checked entry point for loosely-typed callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OperationRequest {
    /// Copy each source into the destination directory.
    Copy {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    /// Move each source into the destination directory.
    Move {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    /// Delete each target, recursively for directories.
    Delete { targets: Vec<PathBuf> },
    /// Write all sources into one archive at `archive`.
    Compress {
        sources: Vec<PathBuf>,
        archive: PathBuf,
        password: Option<Password>,
    },
    /// Expand `archive` into the destination directory.
    Extract {
        archive: PathBuf,
        destination: PathBuf,
        password: Option<Password>,
    },
}

impl OperationRequest {
    /// Create a copy request.
    pub fn copy(sources: Vec<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self::Copy {
            sources,
            destination: destination.into(),
        }
    }

    /// Create a move request.
    pub fn move_to(sources: Vec<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self::Move {
            sources,
            destination: destination.into(),
        }
    }

    /// Create a delete request.
    pub fn delete(targets: Vec<PathBuf>) -> Self {
        Self::Delete { targets }
    }

    /// Create a compress request.
    pub fn compress(
        sources: Vec<PathBuf>,
        archive: impl Into<PathBuf>,
        password: Option<Password>,
    ) -> Self {
        Self::Compress {
            sources,
            archive: archive.into(),
            password,
        }
    }

    /// Create an extract request.
    pub fn extract(
        archive: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        password: Option<Password>,
    ) -> Self {
        Self::Extract {
            archive: archive.into(),
            destination: destination.into(),
            password,
        }
    }

    /// Build a request from loosely-typed parts, rejecting combinations the
    /// kind does not accept.
    pub fn from_parts(
        kind: OperationKind,
        sources: Vec<PathBuf>,
        destination: Option<PathBuf>,
        password: Option<Password>,
    ) -> Result<Self, RequestError> {
        let require_destination = |destination: Option<PathBuf>| {
            destination
                .filter(|d| !d.as_os_str().is_empty())
                .ok_or(RequestError::MissingDestination { kind })
        };
        let reject_password = |password: &Option<Password>| match password {
            Some(_) => Err(RequestError::UnexpectedPassword { kind }),
            None => Ok(()),
        };

        let request = match kind {
            OperationKind::Copy => {
                reject_password(&password)?;
                Self::copy(sources, require_destination(destination)?)
            }
            OperationKind::Move => {
                reject_password(&password)?;
                Self::move_to(sources, require_destination(destination)?)
            }
            OperationKind::Delete => {
                reject_password(&password)?;
                if destination.is_some() {
                    return Err(RequestError::UnexpectedDestination { kind });
                }
                Self::delete(sources)
            }
            OperationKind::Compress => {
                Self::compress(sources, require_destination(destination)?, password)
            }
            OperationKind::Extract => {
                let destination = require_destination(destination)?;
                let [archive]: [PathBuf; 1] =
                    sources
                        .try_into()
                        .map_err(|sources: Vec<PathBuf>| RequestError::SingleArchiveRequired {
                            count: sources.len(),
                        })?;
                Self::extract(archive, destination, password)
            }
            OperationKind::Rename | OperationKind::CreateFile | OperationKind::CreateDirectory => {
                return Err(RequestError::NotBatch { kind });
            }
        };

        request.validate()?;
        Ok(request)
    }

    /// Check the invariants the variant types cannot express.
    pub fn validate(&self) -> Result<(), RequestError> {
        let kind = self.kind();
        match self {
            Self::Copy { destination, .. } | Self::Move { destination, .. } => {
                non_empty(destination, kind)
            }
            Self::Delete { .. } => Ok(()),
            Self::Compress {
                sources, archive, ..
            } => {
                if sources.is_empty() {
                    return Err(RequestError::NoSources { kind });
                }
                non_empty(archive, kind)
            }
            Self::Extract {
                archive,
                destination,
                ..
            } => {
                if archive.as_os_str().is_empty() {
                    return Err(RequestError::SingleArchiveRequired { count: 0 });
                }
                non_empty(destination, kind)
            }
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Copy { .. } => OperationKind::Copy,
            Self::Move { .. } => OperationKind::Move,
            Self::Delete { .. } => OperationKind::Delete,
            Self::Compress { .. } => OperationKind::Compress,
            Self::Extract { .. } => OperationKind::Extract,
        }
    }

    /// Number of top-level items the request names.
    pub fn item_count(&self) -> usize {
        match self {
            Self::Copy { sources, .. }
            | Self::Move { sources, .. }
            | Self::Compress { sources, .. } => sources.len(),
            Self::Delete { targets } => targets.len(),
            Self::Extract { .. } => 1,
        }
    }
}

fn non_empty(path: &Path, kind: OperationKind) -> Result<(), RequestError> {
    if path.as_os_str().is_empty() {
        Err(RequestError::MissingDestination { kind })
    } else {
        Ok(())
    }
}

/// An error that occurred while processing one item of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}
