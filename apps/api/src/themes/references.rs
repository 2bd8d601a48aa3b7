//! Historical workflow documents, looked up by a slug of the theme title.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, error};

/// Lowercase, whitespace → `_`, path separators → `_`.
pub fn reference_slug(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            c if c.is_whitespace() => '_',
            '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// The reference document for a theme, if one exists. Absence is not an error.
    async fn lookup(&self, theme_title: &str) -> Option<String>;
}

/// Plain-text documents stored as `<dir>/<slug>.txt`.
#[derive(Debug, Clone)]
pub struct FsReferenceStore {
    dir: PathBuf,
}

impl FsReferenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, theme_title: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", reference_slug(theme_title)))
    }
}

#[async_trait]
impl ReferenceStore for FsReferenceStore {
    async fn lookup(&self, theme_title: &str) -> Option<String> {
        let path = self.path_for(theme_title);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) if !content.trim().is_empty() => Some(content),
            Ok(_) => None,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No reference document at {}", path.display());
                None
            }
            Err(e) => {
                error!("Error reading reference document {}: {e}", path.display());
                None
            }
        }
    }
}
