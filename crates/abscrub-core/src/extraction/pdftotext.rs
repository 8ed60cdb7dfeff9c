use crate::error::AbscrubError;
use crate::extraction::LayoutSource;
use std::io::Write;
use std::process::Command;

/// Layout backend using pdftotext (from poppler-utils).
///
/// Runs `pdftotext -bbox` and hands back the word-level XHTML it prints.
pub struct PdftotextSource;

impl PdftotextSource {
    pub fn new() -> Self {
        PdftotextSource
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutSource for PdftotextSource {
    fn layout_markup(&self, pdf_bytes: &[u8]) -> Result<Vec<u8>, AbscrubError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| AbscrubError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| AbscrubError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-bbox")
            .arg(tmpfile.path())
            .arg("-")
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AbscrubError::PdftotextNotFound
                } else {
                    AbscrubError::Extraction(format!("pdftotext -bbox failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(AbscrubError::PdftotextFailed { code, stderr });
        }

        log::debug!("pdftotext produced {} bytes of layout markup", output.stdout.len());
        Ok(output.stdout)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}
