use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AbscrubError {
    #[error("layout extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("failed to read layout markup: {0}")]
    Xml(String),

    #[error("malformed word file row {line}: {reason}")]
    WordFile { line: usize, reason: String },

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("image archive error: {0}")]
    Archive(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("no image for page {page} of document '{doc_id}' in archive")]
    PageImageMissing { doc_id: String, page: usize },

    #[error("output directory {0} is not empty; pass --overwrite or --resume")]
    OutputNotEmpty(PathBuf),

    #[error("cannot start worker pool: {0}")]
    WorkerPool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<image::ImageError> for AbscrubError {
    fn from(e: image::ImageError) -> Self {
        AbscrubError::Image(e.to_string())
    }
}
