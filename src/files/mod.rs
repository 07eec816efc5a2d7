//! File access used for helper queries, shapes, model files and generated output.

use crate::error::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub trait FilePort {
    fn read_file(&self, path: &str) -> Result<String>;

    /// Names of the regular files directly inside `path`.
    fn read_directory(&self, path: &str) -> Result<Vec<String>>;

    /// Writes `content` to `path`. Appending only takes effect when `path` is the file
    /// written last, any other file is truncated first.
    fn write_file(&mut self, path: &str, content: &str, append: bool) -> Result<()>;
}

/// [`FilePort`] on the local file system.
#[derive(Debug, Default)]
pub struct LocalFileHandler {
    last_written: Option<String>,
}

impl LocalFileHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FilePort for LocalFileHandler {
    fn read_file(&self, path: &str) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn read_directory(&self, path: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn write_file(&mut self, path: &str, content: &str, append: bool) -> Result<()> {
        let append = append && self.last_written.as_deref() == Some(path);
        self.last_written = Some(path.to_string());

        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}
