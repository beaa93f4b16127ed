//! Shared temporary workspace.
//!
//! All jobs of a batch write their intermediates under one root directory.
//! Each job gets a subpath derived from its source path, so distinct sources
//! never share files and no locking is needed. The root is removed once,
//! after every job has finished.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::ConversionError;
use crate::template::FramePathTemplate;

/// Root directory for intermediate frames and containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Use `root` as the workspace directory. Nothing is created yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map `source` to a path inside the workspace.
    ///
    /// Root and drive prefixes are dropped and `..` becomes `__`, so the
    /// result always stays under [`root`](Workspace::root).
    pub fn map_source(&self, source: &Path) -> PathBuf {
        let mut mapped = self.root.clone();
        for component in source.components() {
            match component {
                Component::Normal(part) => mapped.push(part),
                Component::ParentDir => mapped.push("__"),
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            }
        }
        mapped
    }

    /// The frame template for a job converting `source`.
    ///
    /// The mapped source path itself becomes the job's directory. A source
    /// is a file, so no other source can map beneath it.
    pub fn job_template(&self, source: &Path) -> FramePathTemplate {
        let mapped = self.map_source(source);
        let stem = mapped
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = mapped
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        FramePathTemplate::new(mapped, stem, extension)
    }

    /// Check that removing the workspace cannot destroy anything else.
    ///
    /// Removal is refused when the root is the current directory or one of
    /// its ancestors, or when any path in `protected` lies inside the root.
    /// A root that does not exist is always removable.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::CleanupRefused`] naming the offending path.
    pub async fn ensure_removable(&self, protected: &[PathBuf]) -> Result<(), ConversionError> {
        let root = match tokio::fs::canonicalize(&self.root).await {
            Ok(root) => root,
            Err(_) => return Ok(()),
        };

        if let Ok(cwd) = std::env::current_dir() {
            let cwd = tokio::fs::canonicalize(&cwd).await.unwrap_or(cwd);
            if cwd.starts_with(&root) {
                return Err(ConversionError::CleanupRefused {
                    path: self.root.clone(),
                    reason: format!("it contains the working directory {}", cwd.display()),
                });
            }
        }

        for path in protected {
            let inside = resolve(path)
                .await
                .is_some_and(|resolved| resolved.starts_with(&root));
            if inside {
                return Err(ConversionError::CleanupRefused {
                    path: self.root.clone(),
                    reason: format!("it contains {}", path.display()),
                });
            }
        }
        Ok(())
    }

    /// Remove the workspace and everything in it.
    ///
    /// A missing directory counts as success.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Cleanup`] for any other failure. Callers
    /// are expected to log it and carry on.
    pub async fn remove(&self) -> Result<(), ConversionError> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ConversionError::Cleanup {
                path: self.root.clone(),
                source,
            }),
        }
    }
}

/// Absolute form of `path`, resolving through its parent when the file
/// itself does not exist yet.
async fn resolve(path: &Path) -> Option<PathBuf> {
    if let Ok(resolved) = tokio::fs::canonicalize(path).await {
        return Some(resolved);
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent = tokio::fs::canonicalize(parent).await.ok()?;
    Some(match path.file_name() {
        Some(name) => parent.join(name),
        None => parent,
    })
}

/// Create `directory` and any missing parents.
pub(crate) async fn ensure_directory(directory: &Path) -> Result<(), ConversionError> {
    if directory.as_os_str().is_empty() {
        return Ok(());
    }
    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|error| ConversionError::io(directory, error))
}
