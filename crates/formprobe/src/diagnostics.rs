//! Diagnostic artifacts for failed fields.

use crate::driver::FormDriver;
use crate::result::FormResult;
use std::path::{Path, PathBuf};

/// Writes `debug-field-<id>.png` screenshots for post-run inspection
///
/// Capture problems are logged and swallowed: a snapshot is a side
/// channel and must never replace the failure that triggered it.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    dir: Option<PathBuf>,
}

impl ArtifactStore {
    /// Store writing into `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Store that never captures
    #[must_use]
    pub const fn disabled() -> Self {
        Self { dir: None }
    }

    /// Target directory, if enabled
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Path a field's snapshot is written to
    #[must_use]
    pub fn path_for(&self, field_id: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|d| d.join(format!("debug-field-{}.png", sanitize(field_id))))
    }

    /// Screenshot the page for a failed field
    pub async fn capture(&self, driver: &dyn FormDriver, field_id: &str) -> Option<PathBuf> {
        let path = self.path_for(field_id)?;
        match write_snapshot(driver, &path).await {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(field = field_id, error = %e, "snapshot capture failed");
                None
            }
        }
    }
}

async fn write_snapshot(driver: &dyn FormDriver, path: &Path) -> FormResult<()> {
    let shot = driver.screenshot().await?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &shot.data).await?;
    Ok(())
}

fn sanitize(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock_page::MockPage;

    mod path_tests {
        use super::*;

        #[test]
        fn test_path_is_keyed_by_field() {
            let store = ArtifactStore::new("/tmp/a");
            assert_eq!(
                store.path_for("q-1").unwrap(),
                PathBuf::from("/tmp/a/debug-field-q-1.png")
            );
        }

        #[test]
        fn test_unsafe_ids_are_sanitized() {
            assert_eq!(sanitize("../etc/passwd"), "___etc_passwd");
            assert_eq!(sanitize(""), "unnamed");
        }

        #[test]
        fn test_disabled_store_has_no_path() {
            assert!(ArtifactStore::disabled().path_for("q").is_none());
        }
    }

    mod capture_tests {
        use super::*;

        #[tokio::test]
        async fn test_capture_writes_png() {
            let tmp = tempfile::tempdir().unwrap();
            let store = ArtifactStore::new(tmp.path().join("nested"));
            let page = MockPage::new();
            page.set_screenshot(vec![0x89, 0x50, 0x4E, 0x47]);

            let path = store.capture(&page, "email").await.unwrap();
            assert_eq!(std::fs::read(&path).unwrap(), vec![0x89, 0x50, 0x4E, 0x47]);
            assert!(page.was_called("screenshot"));
        }

        #[tokio::test]
        async fn test_disabled_capture_skips_screenshot() {
            let page = MockPage::new();
            assert!(ArtifactStore::disabled().capture(&page, "q").await.is_none());
            assert!(!page.was_called("screenshot"));
        }

        #[tokio::test]
        async fn test_unwritable_dir_is_swallowed() {
            let tmp = tempfile::tempdir().unwrap();
            let blocker = tmp.path().join("file");
            std::fs::write(&blocker, b"x").unwrap();
            let store = ArtifactStore::new(blocker.join("sub"));
            let page = MockPage::new();
            assert!(store.capture(&page, "q").await.is_none());
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_capture_overwrites_previous_snapshot() {
            let tmp = tempfile::tempdir().unwrap();
            let store = ArtifactStore::new(tmp.path());
            let page = MockPage::new();
            page.set_screenshot(vec![1, 2, 3]);
            store.capture(&page, "q").await.unwrap();
            page.set_screenshot(vec![4]);

            let path = store.capture(&page, "q").await.unwrap();
            assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![4]);
        }
    }
}
