//! FileBacking - append-only file on disk

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use contracts::{Backing, ConfigError};
use tracing::{debug, instrument};

/// File opened for appending, created when missing.
#[derive(Debug)]
pub struct FileBacking {
    path: PathBuf,
    name: String,
    file: Option<File>,
}

impl FileBacking {
    /// Open `location` for appending.
    ///
    /// # Errors
    /// [`ConfigError::Unavailable`] when the file cannot be created or is not
    /// writable.
    #[instrument(
        name = "file_backing_open",
        skip_all,
        fields(location = %location.as_ref().display())
    )]
    pub fn open(location: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = location.as_ref().to_path_buf();

        let mut options = OpenOptions::new();
        options.append(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }

        let file = options
            .open(&path)
            .map_err(|e| ConfigError::unavailable(&path, e))?;

        debug!("file opened");
        Ok(Self {
            name: path.display().to_string(),
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other(format!("file '{}' closed", self.name)))
    }
}

impl Write for FileBacking {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Backing for FileBacking {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(file) => file.sync_all(),
            None => Ok(()),
        }
    }
}
