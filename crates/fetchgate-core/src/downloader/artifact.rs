//! Finished download handed to the caller.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::error::FetchError;

/// A completed download in temporary storage.
///
/// Owns its temp file: dropping the artifact deletes it. Use [`keep`] to take
/// over deletion yourself, or [`persist_to`] to move it into a directory.
///
/// [`keep`]: Artifact::keep
/// [`persist_to`]: Artifact::persist_to
#[derive(Debug)]
pub struct Artifact {
    path: TempPath,
    bytes: u64,
    filename: String,
}

impl Artifact {
    pub(crate) fn new(path: TempPath, bytes: u64, filename: String) -> Self {
        Self {
            path,
            bytes,
            filename,
        }
    }

    pub(crate) fn with_filename(mut self, filename: String) -> Self {
        self.filename = filename;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exact number of body bytes written.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Filename suggested by the request URL (`"file"` when it has none).
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Stops automatic deletion and returns the temp path.
    pub fn keep(self) -> Result<PathBuf, FetchError> {
        self.path
            .keep()
            .map_err(|e| FetchError::storage(e.error))
    }

    /// Moves the file into `dir` under its suggested filename and returns
    /// the final path. Never replaces an existing file: on a name clash it
    /// tries `name-1.ext`, `name-2.ext`, ... When `dir` is on another
    /// filesystem the file is copied instead; a failed copy leaves nothing
    /// behind.
    pub fn persist_to(self, dir: &Path) -> Result<PathBuf, FetchError> {
        let Artifact { path, filename, .. } = self;
        let mut source = path;
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let dest = dir.join(numbered_name(&filename, attempt));
            match source.persist_noclobber(&dest) {
                Ok(()) => return Ok(dest),
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => source = e.path,
                Err(e) if e.error.kind() == io::ErrorKind::CrossesDevices => {
                    // The TempPath comes back on failure and still deletes on drop.
                    match copy_new(&e.path, &dest) {
                        Ok(()) => return Ok(dest),
                        Err(ce) if ce.kind() == io::ErrorKind::AlreadyExists => source = e.path,
                        Err(ce) => return Err(FetchError::storage(ce)),
                    }
                }
                Err(e) => return Err(FetchError::storage(e.error)),
            }
        }
        Err(FetchError::Storage(format!(
            "no free name for {} in {}",
            filename,
            dir.display()
        )))
    }
}

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// `report.pdf`, `report-1.pdf`, `report-2.pdf`, ...
fn numbered_name(filename: &str, attempt: u32) -> String {
    if attempt == 0 {
        return filename.to_string();
    }
    let p = Path::new(filename);
    let stem = p
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    match p.extension() {
        Some(ext) => format!("{}-{}.{}", stem, attempt, ext.to_string_lossy()),
        None => format!("{}-{}", stem, attempt),
    }
}

/// Copies `src` to a destination that must not exist yet; removes the
/// partial destination if the copy fails.
fn copy_new(src: &Path, dest: &Path) -> io::Result<()> {
    let mut out = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)?;
    let copied = fs::File::open(src)
        .and_then(|mut input| io::copy(&mut input, &mut out))
        .and_then(|_| out.sync_all());
    if copied.is_err() {
        drop(out);
        let _ = fs::remove_file(dest);
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn artifact_in(dir: &Path, body: &[u8], name: &str) -> Artifact {
        let mut f = tempfile::Builder::new()
            .prefix("fetchgate-")
            .tempfile_in(dir)
            .unwrap();
        f.write_all(body).unwrap();
        Artifact::new(f.into_temp_path(), body.len() as u64, name.to_string())
    }

    #[test]
    fn drop_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = artifact_in(dir.path(), b"hello", "a.txt");
        let p = a.path().to_path_buf();
        assert!(p.exists());
        drop(a);
        assert!(!p.exists());
    }

    #[test]
    fn keep_survives_drop() {
        let dir = tempfile::tempdir().unwrap();
        let a = artifact_in(dir.path(), b"hello", "a.txt");
        let p = a.keep().unwrap();
        assert_eq!(std::fs::read(&p).unwrap(), b"hello");
    }

    #[test]
    fn persist_to_uses_suggested_filename() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let a = artifact_in(tmp.path(), b"payload", "report.pdf");
        assert_eq!(a.bytes(), 7);
        let dest = a.persist_to(out.path()).unwrap();
        assert_eq!(dest, out.path().join("report.pdf"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn persist_to_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let first = artifact_in(tmp.path(), b"first", "file")
            .persist_to(out.path())
            .unwrap();
        let second = artifact_in(tmp.path(), b"second", "file")
            .persist_to(out.path())
            .unwrap();
        let third = artifact_in(tmp.path(), b"third", "file")
            .persist_to(out.path())
            .unwrap();
        assert_eq!(first, out.path().join("file"));
        assert_eq!(second, out.path().join("file-1"));
        assert_eq!(third, out.path().join("file-2"));
        assert_eq!(std::fs::read(&first).unwrap(), b"first");
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
    }

    #[test]
    fn numbered_name_keeps_extension() {
        assert_eq!(numbered_name("report.pdf", 0), "report.pdf");
        assert_eq!(numbered_name("report.pdf", 2), "report-2.pdf");
        assert_eq!(numbered_name("file", 1), "file-1");
        assert_eq!(numbered_name(".bashrc", 1), ".bashrc-1");
    }

    #[test]
    fn copy_new_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        std::fs::write(&src, b"new").unwrap();
        std::fs::write(&dest, b"old").unwrap();
        let err = copy_new(&src, &dest).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&dest).unwrap(), b"old");

        std::fs::remove_file(&dest).unwrap();
        copy_new(&src, &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }
}
