//! File operations tool
//!
//! Read, write, and list files inside the configured workspace directory.
//! Absolute paths and `..` components are refused; everything resolves
//! relative to the workspace root.

use super::ToolInput;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Characters of file content returned on read
const MAX_READ_CHARS: usize = 500;

/// Directory entries returned on list
const MAX_LIST_ENTRIES: usize = 10;

pub struct FileOpsTool {
    workspace: PathBuf,
}

impl FileOpsTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }

    pub async fn invoke(&self, input: &ToolInput) -> String {
        let ToolInput::FileOp {
            operation,
            filename,
            content,
        } = input
        else {
            return r#"File operation error: expected {"operation": "read"|"write"|"list"} arguments"#
                .to_string();
        };

        match operation.as_str() {
            "list" => self.list().await,
            "read" => match filename {
                Some(filename) => self.read(filename).await,
                None => "Error: filename required for read operation".to_string(),
            },
            "write" => match (filename, content) {
                (Some(filename), Some(content)) => self.write(filename, content).await,
                _ => "Error: filename and content required for write operation".to_string(),
            },
            other => format!("Unknown operation: {}", other),
        }
    }

    async fn read(&self, filename: &str) -> String {
        let path = match self.resolve(filename) {
            Ok(p) => p,
            Err(e) => return format!("File operation error: {}", e),
        };
        debug!("Reading file: {}", path.display());

        match fs::read_to_string(&path).await {
            Ok(content) => {
                let snippet: String = content.chars().take(MAX_READ_CHARS).collect();
                format!("File content of {}: {}...", filename, snippet)
            }
            Err(e) => format!("File operation error: {}", e),
        }
    }

    async fn write(&self, filename: &str, content: &str) -> String {
        let path = match self.resolve(filename) {
            Ok(p) => p,
            Err(e) => return format!("File operation error: {}", e),
        };

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent).await {
                    return format!("File operation error: {}", e);
                }
            }
        }

        info!("Writing {} bytes to {}", content.len(), path.display());
        match fs::write(&path, content).await {
            Ok(()) => format!("Successfully wrote content to {}", filename),
            Err(e) => format!("File operation error: {}", e),
        }
    }

    async fn list(&self) -> String {
        let mut entries = match fs::read_dir(&self.workspace).await {
            Ok(e) => e,
            Err(e) => return format!("File operation error: {}", e),
        };

        let mut names = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        names.truncate(MAX_LIST_ENTRIES);

        format!("Files in workspace: {}", names.join(", "))
    }

    /// Resolve a filename against the workspace, refusing escapes.
    fn resolve(&self, filename: &str) -> Result<PathBuf, String> {
        let path = Path::new(filename);
        if path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(format!("Path outside workspace: {}", filename));
        }
        Ok(self.workspace.join(path))
    }
}
