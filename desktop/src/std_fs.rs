use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use embedded_io::ErrorType;
use log::{info, warn};

/// File sink for [`oledconv_core::listing::write_listing`].
///
/// Data goes to a hidden sibling file which only replaces the target on
/// [`StdFileWriter::commit`]. Dropping the writer without committing removes
/// the partial file and leaves the target untouched.
pub struct StdFileWriter {
    file: Option<std::io::BufWriter<fs::File>>,
    partial_path: PathBuf,
    path: PathBuf,
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "listing".into());
    path.with_file_name(format!(".{name}.partial"))
}

impl StdFileWriter {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let partial_path = partial_path(path);
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&partial_path)?;
        info!("Writing listing to {:?}", path);
        Ok(StdFileWriter {
            file: Some(std::io::BufWriter::new(file)),
            partial_path,
            path: path.to_path_buf(),
        })
    }

    fn file(&mut self) -> std::io::Result<&mut std::io::BufWriter<fs::File>> {
        self.file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("writer already committed"))
    }

    /// Flushes everything to disk and moves the file over the target.
    pub fn commit(mut self) -> std::io::Result<()> {
        let file = self.file()?;
        file.flush()?;
        file.get_ref().sync_all()?;
        // close before renaming
        self.file = None;
        fs::rename(&self.partial_path, &self.path)?;
        Ok(())
    }
}

impl Drop for StdFileWriter {
    fn drop(&mut self) {
        if !self.partial_path.exists() {
            return;
        }
        self.file = None;
        warn!("Discarding incomplete listing for {:?}", self.path);
        if let Err(err) = fs::remove_file(&self.partial_path) {
            warn!("Failed to remove {:?}: {}", self.partial_path, err);
        }
    }
}

impl ErrorType for StdFileWriter {
    type Error = std::io::Error;
}

impl embedded_io::Write for StdFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file()?.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file()?.flush()
    }
}
