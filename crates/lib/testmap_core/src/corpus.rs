//! Snapshot listing of test source files under a test directory.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::indexing::IndexError;
use crate::store::TestKey;

/// File extension indexed when none is configured.
pub const DEFAULT_EXTENSION: &str = "cs";

/// One test source file and the identity derived from its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestArtifact {
    pub key: TestKey,
    /// Path relative to the test directory, `/`-separated.
    pub relative_path: String,
    /// Absolute (or caller-relative) path used to read the content.
    pub path: PathBuf,
}

/// Test files found by one scan, sorted by relative path.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    module: String,
    artifacts: Vec<TestArtifact>,
}

impl Corpus {
    /// Walk `test_dir` recursively for files ending in `.{extension}`.
    ///
    /// The module is the name of the test directory's parent. The app is the
    /// first path segment below `test_dir`; files directly under `test_dir`
    /// have no app and are left out. Entries below the root that cannot be
    /// read (loops, dangling links, denied directories) are logged and skipped.
    pub fn scan(test_dir: impl AsRef<Path>, extension: &str) -> Result<Self, IndexError> {
        let root = test_dir.as_ref();
        if root.as_os_str().is_empty() || !root.is_dir() {
            return Err(IndexError::InvalidTestDirectory(root.display().to_string()));
        }

        let module = root
            .canonicalize()
            .ok()
            .as_deref()
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = extension.trim_start_matches('.');

        let mut artifacts = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(IndexError::Io(e.into())),
                Err(e) => {
                    warn!(path = ?e.path(), error = %e, "skipping unreadable test corpus entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
            {
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if segments.len() < 2 {
                debug!(path = %path.display(), "skipping file without an app directory");
                continue;
            }
            let Some(test_name) = path.file_stem().map(|s| s.to_string_lossy().into_owned())
            else {
                continue;
            };

            artifacts.push(TestArtifact {
                key: TestKey::new(module.clone(), segments[0].clone(), test_name),
                relative_path: segments.join("/"),
                path: path.to_path_buf(),
            });
        }
        artifacts.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        debug!(
            root = %root.display(),
            module = %module,
            count = artifacts.len(),
            "scanned test corpus"
        );
        Ok(Self { module, artifacts })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn artifacts(&self) -> &[TestArtifact] {
        &self.artifacts
    }

    pub fn first(&self) -> Option<&TestArtifact> {
        self.artifacts.first()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
