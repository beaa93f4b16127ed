//! Intermediate file naming.
//!
//! A [`FramePathTemplate`] is the contract between frame extraction and
//! frame assembly: the splitter writes `<stem>_<index>.<ext>` files into one
//! directory, and the assembler reads them back by index. Keeping the pieces
//! typed avoids substituting placeholders into arbitrary path strings.

use std::path::{Path, PathBuf};

/// Placeholder the image backend expands to the frame index.
pub const INDEX_PLACEHOLDER: &str = "%d";

/// Extension of the assembled intermediate container.
pub const CONTAINER_EXTENSION: &str = "mpg";

/// Where one job's frames and container live inside the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramePathTemplate {
    directory: PathBuf,
    stem: String,
    extension: String,
}

impl FramePathTemplate {
    /// Create a template for frames named `<stem>_<index>.<extension>`
    /// inside `directory`.
    pub fn new(
        directory: impl Into<PathBuf>,
        stem: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            stem: stem.into(),
            extension: extension.into(),
        }
    }

    /// Directory holding the frames and the container.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File stem shared by every frame.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Extension of every frame file.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn file_name(&self, index: &str) -> String {
        if self.extension.is_empty() {
            format!("{}_{index}", self.stem)
        } else {
            format!("{}_{index}.{}", self.stem, self.extension)
        }
    }

    /// The pattern handed to the image backend, with an index placeholder.
    pub fn pattern(&self) -> PathBuf {
        self.directory.join(self.file_name(INDEX_PLACEHOLDER))
    }

    /// Path of the frame at `index`.
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.directory.join(self.file_name(&index.to_string()))
    }

    /// Path of the assembled intermediate container.
    pub fn container_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{CONTAINER_EXTENSION}", self.stem))
    }
}
