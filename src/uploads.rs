//! Upload directory holding listing photos.
//!
//! Stored names are `<8-hex>_<sanitized stem><ext>`; the database keeps only
//! those names, so the directory is flat and never contains subdirectories.

use log::{info, warn};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use unicode_normalization::UnicodeNormalization;

use crate::constants::generate_upload_prefix;

/// Attempts at finding an unused stored name before giving up
const MAX_NAME_ATTEMPTS: usize = 4;

pub struct UploadStore {
    dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, allowed_extensions: &[String]) -> Self {
        Self {
            dir: dir.into(),
            allowed_extensions: allowed_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it is missing
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// True when the text after the last `.` is an allowed extension (case-insensitive)
    pub fn is_allowed(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }

    /// Write an upload under a fresh prefixed name and return that name
    ///
    /// Files are created with `create_new`, so an existing upload is never
    /// overwritten even if two prefixes collide.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> std::io::Result<String> {
        let base = stored_base_name(original_name);

        for _ in 0..MAX_NAME_ATTEMPTS {
            let stored_name = format!("{}_{}", generate_upload_prefix(), base);
            let path = self.dir.join(&stored_name);
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            let mut file = match file {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            };
            file.write_all(data).await?;
            file.flush().await?;
            return Ok(stored_name);
        }

        Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("No free stored name for '{}'", original_name),
        ))
    }

    /// Remove a stored upload; a missing file is logged and reported as `false`
    pub async fn remove(&self, stored_name: &str) -> std::io::Result<bool> {
        let Some(path) = self.resolve(stored_name) else {
            warn!("Refusing to delete suspicious upload name '{}'", stored_name);
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted file: {}", stored_name);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Upload already missing: {}", stored_name);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Map a stored name to its path, rejecting anything that is not a plain file name
    pub fn resolve(&self, stored_name: &str) -> Option<PathBuf> {
        let mut components = Path::new(stored_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if !stored_name.contains('\\') => {
                Some(self.dir.join(name))
            }
            _ => None,
        }
    }
}

/// Sanitize an uploaded file name
///
/// The name is NFKD-normalized first so accented letters keep their base
/// letter, then reduced to ASCII letters, digits, `_`, `.` and `-`. Path
/// separators count as whitespace and whitespace runs become a single `_`.
/// Leading and trailing `.`/`_` are stripped so the result can never be a
/// dotfile or `..`.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Split `name` into (stem, extension-with-dot); a leading dot does not start an extension
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && !name[..idx].chars().all(|c| c == '.') => {
            (&name[..idx], &name[idx..])
        }
        _ => (name, ""),
    }
}

/// Sanitized `<stem><ext>` for an upload; falls back to the original extension
/// when sanitizing stripped it (e.g. a name made only of non-ASCII characters)
fn stored_base_name(original_name: &str) -> String {
    let sanitized = secure_filename(original_name);
    let (stem, ext) = split_extension(&sanitized);
    if !ext.is_empty() {
        return format!("{}{}", stem, ext);
    }
    let original_ext = original_name
        .rsplit_once('.')
        .map(|(_, ext)| secure_filename(ext).to_ascii_lowercase())
        .unwrap_or_default();
    let stem = if stem.is_empty() { "upload" } else { stem };
    if original_ext.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, original_ext)
    }
}

/// Content type served for a stored upload
pub fn content_type_for(stored_name: &str) -> &'static str {
    let ext = stored_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ALLOWED_EXTENSIONS;

    fn store(dir: &Path) -> UploadStore {
        let allowed: Vec<String> = ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        UploadStore::new(dir, &allowed)
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(
            secure_filename("i contain cool \u{fc}ml\u{e4}uts.txt"),
            "i_contain_cool_umlauts.txt"
        );
        assert_eq!(secure_filename("Caf\u{e9}.png"), "Cafe.png");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("photo.final.JPG"), ("photo.final", ".JPG"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }

    #[test]
    fn test_stored_base_name_keeps_extension() {
        assert_eq!(stored_base_name("scrap pile.PNG"), "scrap_pile.PNG");
        assert_eq!(stored_base_name("\u{444}\u{43e}\u{442}\u{43e}.jpg"), "jpg.jpg");
        assert_eq!(stored_base_name("\u{444}\u{43e}\u{442}\u{43e}"), "upload");
    }

    #[test]
    fn test_is_allowed_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = store(dir.path());
        assert!(uploads.is_allowed("a.PNG"));
        assert!(uploads.is_allowed("a.tar.webp"));
        assert!(!uploads.is_allowed("a.exe"));
        assert!(!uploads.is_allowed("png"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = store(dir.path());
        assert!(uploads.resolve("abc12345_photo.png").is_some());
        assert!(uploads.resolve("../secret.png").is_none());
        assert!(uploads.resolve("nested/photo.png").is_none());
        assert!(uploads.resolve("..").is_none());
        assert!(uploads.resolve("").is_none());
    }

    #[tokio::test]
    async fn test_save_same_name_twice_gives_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = store(dir.path());

        let first = uploads.save("copper.jpg", b"one").await.unwrap();
        let second = uploads.save("copper.jpg", b"two").await.unwrap();

        assert_ne!(first, second);
        assert!(first.ends_with("_copper.jpg"));
        assert_eq!(first.split('_').next().unwrap().len(), 8);
        assert_eq!(std::fs::read(dir.path().join(&first)).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join(&second)).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = store(dir.path());

        let name = uploads.save("tire.png", b"data").await.unwrap();
        assert!(uploads.remove(&name).await.unwrap());
        assert!(!uploads.remove(&name).await.unwrap());
    }
}
