//! Semantic categories derived from file extensions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Semantic category of a filesystem entry.
///
/// The category is a pure function of (is-directory, lowercased extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Directory,
    Image,
    Video,
    Audio,
    Pdf,
    Document,
    Spreadsheet,
    Presentation,
    Text,
    Archive,
    Package,
    Code,
    Unknown,
}

impl Category {
    /// Look up the category for a file extension (case-insensitive, no dot).
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" => Self::Image,
            "mp4" | "mkv" | "avi" | "mov" | "wmv" | "flv" | "webm" | "3gp" => Self::Video,
            "mp3" | "wav" | "ogg" | "m4a" | "flac" | "aac" | "wma" => Self::Audio,
            "pdf" => Self::Pdf,
            "doc" | "docx" => Self::Document,
            "xls" | "xlsx" => Self::Spreadsheet,
            "ppt" | "pptx" => Self::Presentation,
            "txt" | "log" => Self::Text,
            "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" => Self::Archive,
            "apk" => Self::Package,
            "java" | "kt" | "xml" | "json" | "html" | "css" | "js" | "ts" | "py" | "rs" | "go"
            | "sh" | "cpp" | "c" | "h" => Self::Code,
            _ => Self::Unknown,
        }
    }

    /// Classify an entry. Directories always map to [`Category::Directory`].
    pub fn classify(is_dir: bool, extension: &str) -> Self {
        if is_dir {
            Self::Directory
        } else {
            Self::from_extension(extension)
        }
    }

    /// The storage bucket this category is accounted under.
    ///
    /// Directories are never bucketed.
    pub fn bucket(self) -> Option<StorageBucket> {
        match self {
            Self::Directory => None,
            Self::Image => Some(StorageBucket::Images),
            Self::Video => Some(StorageBucket::Videos),
            Self::Audio => Some(StorageBucket::Audio),
            Self::Pdf | Self::Document | Self::Spreadsheet | Self::Presentation | Self::Text => {
                Some(StorageBucket::Documents)
            }
            Self::Archive => Some(StorageBucket::Archives),
            Self::Package => Some(StorageBucket::Packages),
            Self::Code | Self::Unknown => Some(StorageBucket::Others),
        }
    }

    /// Whether this category belongs to the document family.
    pub fn is_document(self) -> bool {
        self.bucket() == Some(StorageBucket::Documents)
    }
}

/// Display bucket used by storage analysis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
pub enum StorageBucket {
    Images,
    Videos,
    Audio,
    Documents,
    Archives,
    Packages,
    Others,
}

impl StorageBucket {
    /// Bucket for a regular file with the given extension.
    pub fn for_extension(extension: &str) -> Self {
        Category::from_extension(extension)
            .bucket()
            .unwrap_or(StorageBucket::Others)
    }
}
