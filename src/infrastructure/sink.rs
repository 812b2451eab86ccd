//! Store sinks: where persisted preference bytes live

use std::cell::{Cell, RefCell};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::StoreSink;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// File-backed sink. Writes go to a sibling temp file first and are renamed into place.
pub struct FileSink {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    /// Sink on the real filesystem.
    pub fn real(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Arc::new(RealFileSystem))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StoreSink for FileSink {
    #[instrument(level = "trace", skip(self), fields(path = %self.path.display()))]
    fn read(&self) -> io::Result<Option<String>> {
        if !self.fs.exists(&self.path) {
            debug!("no store file yet");
            return Ok(None);
        }
        self.fs.read_to_string(&self.path).map(Some)
    }

    #[instrument(level = "trace", skip(self, content), fields(path = %self.path.display()))]
    fn write(&mut self, content: &str) -> io::Result<()> {
        self.fs.ensure_parent(&self.path)?;
        let temp = self.temp_path();
        self.fs.write(&temp, content)?;
        if let Err(e) = self.fs.rename(&temp, &self.path) {
            // best effort; the rename error is the one worth reporting
            let _ = self.fs.remove_file(&temp);
            return Err(e);
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process sink. Clones share one buffer, so a test can keep a handle and inspect writes.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    content: Rc<RefCell<Option<String>>>,
    writes: Rc<Cell<usize>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that already holds persisted content.
    pub fn with_content(content: impl Into<String>) -> Self {
        let sink = Self::default();
        sink.content.replace(Some(content.into()));
        sink
    }

    pub fn content(&self) -> Option<String> {
        self.content.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl StoreSink for MemorySink {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.content.borrow().clone())
    }

    fn write(&mut self, content: &str) -> io::Result<()> {
        self.content.replace(Some(content.to_string()));
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn given_missing_file_when_reading_then_none() {
        let temp = TempDir::new().unwrap();
        let sink = FileSink::real(temp.path().join("absent.properties"));
        assert_eq!(sink.read().unwrap(), None);
    }

    #[test]
    fn given_nested_path_when_writing_then_creates_parents_and_leaves_no_temp() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/prefs.properties");
        let mut sink = FileSink::real(&path);

        sink.write("a=1\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a=1\n");
        assert!(!temp.path().join("nested/dir/prefs.properties.tmp").exists());
        assert_eq!(sink.read().unwrap().as_deref(), Some("a=1\n"));
    }

    #[test]
    fn given_clone_when_writing_then_original_sees_content() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();

        handle.write("x").unwrap();

        assert_eq!(sink.content().as_deref(), Some("x"));
        assert_eq!(sink.write_count(), 1);
    }
}
