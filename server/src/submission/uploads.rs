use crate::config::UploadsConfig;
use crate::error::{AppError, AppResult};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Upload directory plus the rules files must satisfy before they are stored
pub struct UploadStore {
    dir: PathBuf,
    allowed_extensions: Vec<String>,
    max_file_bytes: usize,
    unsafe_chars: Regex,
}

impl UploadStore {
    pub fn new(config: &UploadsConfig) -> AppResult<Self> {
        std::fs::create_dir_all(&config.dir)?;

        let unsafe_chars = Regex::new(r"[^A-Za-z0-9_.-]")
            .map_err(|e| AppError::Internal(format!("Invalid filename pattern: {e}")))?;

        Ok(Self {
            dir: config.dir.clone(),
            allowed_extensions: config.allowed_extensions.clone(),
            max_file_bytes: config.max_file_bytes,
            unsafe_chars,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_file_bytes(&self) -> usize {
        self.max_file_bytes
    }

    /// Case-insensitive check of the part after the last dot
    pub fn is_allowed(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }

    /// Reduces a client-supplied name to ASCII letters, digits, `_`, `.` and `-`.
    ///
    /// Path separators become word breaks, so `../../etc/passwd` turns into
    /// `etc_passwd`. Returns None when nothing usable is left.
    pub fn sanitize_filename(&self, filename: &str) -> Option<String> {
        let ascii: String = filename
            .chars()
            .filter(|c| c.is_ascii())
            .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
            .collect();

        let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
        let cleaned = self.unsafe_chars.replace_all(&joined, "");
        let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Name a file is stored under: content hash prefix, then a per-upload token.
    ///
    /// The token keeps identical uploads from different submissions in separate
    /// files, so undoing one submission never touches a file another one uses.
    pub fn stored_name(&self, sanitized: &str, content: &[u8], token: u32) -> String {
        let digest = Sha256::digest(content);
        let prefix: String = digest
            .iter()
            .take(8)
            .map(|b| format!("{:02x}", b))
            .collect();
        format!("{}-{:08x}_{}", prefix, token, sanitized)
    }

    /// Writes a new file; never overwrites or reuses an existing one
    pub fn store(&self, sanitized: &str, content: &[u8]) -> AppResult<String> {
        let name = self.stored_name(sanitized, content, rand::random());
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.dir.join(&name))?;
        file.write_all(content)?;
        tracing::debug!("Stored upload {} ({} bytes)", name, content.len());
        Ok(name)
    }

    /// Best effort; used to undo writes of a rejected submission
    pub fn remove(&self, stored_name: &str) {
        if let Some(path) = self.path_for(stored_name) {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to remove upload {}: {}", path.display(), e);
            }
        }
    }

    /// Resolves a stored name to a path inside the upload directory
    pub fn path_for(&self, stored_name: &str) -> Option<PathBuf> {
        match self.sanitize_filename(stored_name) {
            Some(clean) if clean == stored_name => Some(self.dir.join(clean)),
            _ => None,
        }
    }

    pub fn read(&self, stored_name: &str) -> AppResult<Vec<u8>> {
        let path = self
            .path_for(stored_name)
            .ok_or_else(|| AppError::NotFound(format!("Upload {}", stored_name)))?;

        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Upload {}", stored_name)))
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
