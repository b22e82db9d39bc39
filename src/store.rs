// Copyright (c) 2023 Jean-Daniel Michaud
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! The directory the worklist files are written to.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local, NaiveDateTime};
use log::{debug, info, warn};

use crate::error::DicomError;

pub const WORKLIST_EXTENSION: &str = "wl";

// Keeps temporary names distinct between concurrent writers of one process.
static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
  pub filename: String,
  pub path: PathBuf,
  pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorklistFileInfo {
  pub filename: String,
  pub path: PathBuf,
  pub size: u64,
  pub created: DateTime<Local>,
  pub modified: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorklistStats {
  pub total_files: usize,
  pub total_size: u64,
  pub average_size: u64,
}

#[derive(Debug, Clone)]
pub struct WorklistStore {
  dir: PathBuf,
}

fn is_plain_filename(filename: &str) -> bool {
  !filename.is_empty()
    && filename != "."
    && filename != ".."
    && !filename.contains(|c: char| c == '/' || c == '\\')
}

fn with_suffix(filename: &str, index: usize) -> String {
  match filename.rsplit_once('.') {
    Some((stem, extension)) => format!("{}_{}.{}", stem, index, extension),
    None => format!("{}_{}", filename, index),
  }
}

impl WorklistStore {
  pub fn new<P: AsRef<Path>>(dir: P) -> Result<WorklistStore, DicomError> {
    let dir = dir.as_ref().to_path_buf();
    fs::create_dir_all(&dir)?;
    Ok(WorklistStore { dir })
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// `<accession>_<YYYYMMDD_HHMMSS>.wl`, `UNK` standing for a missing accession.
  pub fn filename_for(accession_number: Option<&str>, now: NaiveDateTime) -> String {
    let accession_number = match accession_number {
      Some(accession_number) if !accession_number.is_empty() => {
        let accession_number = accession_number.replace(|c: char| c == '/' || c == '\\', "_");
        // Dot files are not listed.
        match accession_number.strip_prefix('.') {
          Some(rest) => format!("_{}", rest),
          None => accession_number,
        }
      },
      _ => "UNK".to_string(),
    };
    format!("{}_{}.{}", accession_number, now.format("%Y%m%d_%H%M%S"), WORKLIST_EXTENSION)
  }

  /// The bytes land in a hidden temporary file first and are linked into place
  /// under `filename`, or `filename` with a `_N` suffix when it is taken.
  pub fn write(&self, filename: &str, bytes: &[u8]) -> Result<StoredFile, DicomError> {
    if !is_plain_filename(filename) {
      return Err(DicomError::Parse(format!("Invalid worklist filename: {}", filename)));
    }
    let temp_path = self.dir.join(format!(".{}.{}-{}.tmp", filename, std::process::id(),
      TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)));
    let result = self.write_temp(&temp_path, bytes).and_then(|_| self.link(&temp_path, filename));
    if let Err(e) = fs::remove_file(&temp_path) {
      debug!("Could not remove {}: {}", temp_path.display(), e);
    }
    let (filename, path) = result?;
    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(StoredFile { filename, path, size: bytes.len() })
  }

  fn write_temp(&self, temp_path: &Path, bytes: &[u8]) -> Result<(), DicomError> {
    let mut file = fs::File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
  }

  fn link(&self, temp_path: &Path, filename: &str) -> Result<(String, PathBuf), DicomError> {
    let mut candidate = filename.to_string();
    let mut index = 1;
    loop {
      let path = self.dir.join(&candidate);
      match fs::hard_link(temp_path, &path) {
        Ok(()) => return Ok((candidate, path)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
          candidate = with_suffix(filename, index);
          index += 1;
        },
        Err(e) => return Err(e.into()),
      }
    }
  }

  /// Worklist files of the directory, sorted by name.
  pub fn list(&self) -> Result<Vec<WorklistFileInfo>, DicomError> {
    let mut files = vec![];
    for entry in fs::read_dir(&self.dir)? {
      let entry = entry?;
      let path = entry.path();
      let is_worklist = path.extension().map_or(false, |extension| extension == WORKLIST_EXTENSION);
      let filename = entry.file_name().to_string_lossy().to_string();
      if !is_worklist || filename.starts_with('.') {
        continue;
      }
      let metadata = entry.metadata()?;
      if !metadata.is_file() {
        continue;
      }
      let modified = metadata.modified()?;
      // Not every filesystem records a creation time.
      let created = metadata.created().unwrap_or(modified);
      files.push(WorklistFileInfo {
        filename,
        path,
        size: metadata.len(),
        created: created.into(),
        modified: modified.into(),
      });
    }
    files.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(files)
  }

  pub fn stats(&self) -> Result<WorklistStats, DicomError> {
    let files = self.list()?;
    let total_size: u64 = files.iter().map(|file| file.size).sum();
    let average_size = if files.is_empty() { 0 } else { total_size / files.len() as u64 };
    Ok(WorklistStats { total_files: files.len(), total_size, average_size })
  }

  pub fn delete(&self, filename: &str) -> Result<(), DicomError> {
    if !is_plain_filename(filename) {
      return Err(DicomError::NotFound(filename.to_string()));
    }
    let path = self.dir.join(filename);
    match fs::remove_file(&path) {
      Ok(()) => {
        info!("Deleted {}", path.display());
        Ok(())
      },
      Err(e) if e.kind() == ErrorKind::NotFound => Err(DicomError::NotFound(filename.to_string())),
      Err(e) => Err(e.into()),
    }
  }

  /// Deletes the worklist files last modified more than `max_age` ago and
  /// returns their names.
  pub fn cleanup(&self, max_age: Duration) -> Result<Vec<String>, DicomError> {
    let now = SystemTime::now();
    let mut deleted = vec![];
    for file in self.list()? {
      let modified: SystemTime = file.modified.into();
      let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
      if age <= max_age {
        continue;
      }
      match fs::remove_file(&file.path) {
        Ok(()) => {
          info!("Deleted old worklist file {}", file.filename);
          deleted.push(file.filename);
        },
        Err(e) => warn!("Could not delete {}: {}", file.path.display(), e),
      }
    }
    Ok(deleted)
  }
}
