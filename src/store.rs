//! Reading and writing protocol artifacts on disk.
//!
//! Outputs are written to a `.tmp` sibling and renamed into place once
//! complete, so a phase that fails leaves no partial file behind. Phases with
//! several outputs stage them all in a [`Staging`] set and commit together.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

pub const MASTER_SECRET_FILE: &str = "MSK.bin";
pub const PARAMS_FILE: &str = "localParams.bin";
pub const TAGS_FILE: &str = "sigma.bin";
pub const FILE_INFO_FILE: &str = "file_info.txt";
pub const CHALLENGE_FILE: &str = "chal_file.txt";
pub const PROOF_FILE: &str = "POP.bin";

pub const PARTIAL_KEY_SUFFIX: &str = "_partial_private_key.bin";
pub const FULL_KEY_SUFFIX: &str = "_full_private_key.bin";
pub const PUBLIC_KEY_SUFFIX: &str = "_public_key.bin";

pub fn open(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    File::open(path).map_err(|e| Error::io(path, e))
}

pub fn read_bytes(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| Error::io(path, e))
}

pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

pub fn file_size(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| Error::io(path, e))
}

// Reads a whole file and parses it with one of the `from_bytes` decoders.
pub fn load<T>(path: impl AsRef<Path>, parse: impl FnOnce(&[u8]) -> Result<T>) -> Result<T> {
    let path = path.as_ref();
    let bytes = read_bytes(path)?;
    parse(&bytes).map_err(|e| match e {
        Error::Malformed(msg) => Error::Malformed(format!("{}: {msg}", path.display())),
        other => other,
    })
}

pub fn write_bytes(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    write_atomic(path, |w| {
        w.write_all(bytes)?;
        Ok(())
    })
}

/// Runs `fill` against a buffered temporary file and moves the result to
/// `path` only if `fill` succeeds.
pub fn write_atomic<T>(
    path: impl AsRef<Path>,
    fill: impl FnOnce(&mut BufWriter<File>) -> Result<T>,
) -> Result<T> {
    let mut staging = Staging::new();
    let value = staging.stage(path, fill)?;
    staging.commit()?;
    Ok(value)
}

/// Output files of one phase, written to `.tmp` siblings and renamed into
/// place together by [`Staging::commit`].
///
/// Dropping an uncommitted set removes every staged temporary file.
#[derive(Debug, Default)]
pub struct Staging {
    staged: Vec<(PathBuf, PathBuf)>,
}

impl Staging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage<T>(
        &mut self,
        path: impl AsRef<Path>,
        fill: impl FnOnce(&mut BufWriter<File>) -> Result<T>,
    ) -> Result<T> {
        let path = path.as_ref();
        let tmp = temp_sibling(path);

        let result = File::create(&tmp)
            .map_err(|e| Error::io(&tmp, e))
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                let value = fill(&mut writer)?;
                let file = writer
                    .into_inner()
                    .map_err(|e| Error::io(&tmp, e.into_error()))?;
                file.sync_all().map_err(|e| Error::io(&tmp, e))?;
                Ok(value)
            });

        match result {
            Ok(value) => {
                self.staged.push((tmp, path.to_path_buf()));
                Ok(value)
            }
            Err(err) => {
                let _ = fs::remove_file(&tmp);
                Err(err)
            }
        }
    }

    pub fn stage_bytes(&mut self, path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
        self.stage(path, |w| {
            w.write_all(bytes)?;
            Ok(())
        })
    }

    /// Renames every staged file into place. If a rename fails, the files
    /// already moved are removed again so the set lands whole or not at all.
    pub fn commit(mut self) -> Result<()> {
        let staged = std::mem::take(&mut self.staged);
        let mut committed: Vec<PathBuf> = Vec::with_capacity(staged.len());
        let mut pending = staged.into_iter();

        while let Some((tmp, path)) = pending.next() {
            if let Err(e) = fs::rename(&tmp, &path) {
                let _ = fs::remove_file(&tmp);
                for (tmp, _) in pending {
                    let _ = fs::remove_file(tmp);
                }
                for path in committed {
                    let _ = fs::remove_file(path);
                }
                return Err(Error::io(path, e));
            }
            debug!(path = %path.display(), "wrote file");
            committed.push(path);
        }
        Ok(())
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        for (tmp, _) in self.staged.drain(..) {
            let _ = fs::remove_file(tmp);
        }
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(tag: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("idpdp_store_{tag}_{unique}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn atomic_write_commits_on_success() {
        let dir = scratch_dir("ok");
        let path = dir.join("out.bin");
        write_bytes(&path, b"hello").unwrap();
        assert_eq!(read_bytes(&path).unwrap(), b"hello");
        assert!(!temp_sibling(&path).exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn atomic_write_leaves_nothing_on_failure() {
        let dir = scratch_dir("fail");
        let path = dir.join("out.bin");
        let result: Result<()> = write_atomic(&path, |w| {
            w.write_all(b"partial")?;
            Err(Error::malformed("boom"))
        });
        assert!(result.is_err());
        assert!(!path.exists());
        assert!(!temp_sibling(&path).exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn staged_set_lands_together() {
        let dir = scratch_dir("set");
        let (a, b) = (dir.join("a.bin"), dir.join("b.txt"));
        let mut staging = Staging::new();
        staging.stage_bytes(&a, b"tags").unwrap();
        staging.stage_bytes(&b, b"info").unwrap();
        assert!(!a.exists() && !b.exists());

        staging.commit().unwrap();
        assert_eq!(read_bytes(&a).unwrap(), b"tags");
        assert_eq!(read_bytes(&b).unwrap(), b"info");
        assert!(!temp_sibling(&a).exists() && !temp_sibling(&b).exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_stage_discards_the_whole_set() {
        let dir = scratch_dir("abort");
        let (a, b) = (dir.join("a.bin"), dir.join("b.txt"));
        {
            let mut staging = Staging::new();
            staging.stage_bytes(&a, b"tags").unwrap();
            let second: Result<()> = staging.stage(&b, |w| {
                w.write_all(b"half")?;
                Err(Error::malformed("boom"))
            });
            assert!(second.is_err());
        }
        for path in [&a, &b] {
            assert!(!path.exists());
            assert!(!temp_sibling(path).exists());
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn commit_rolls_back_when_a_rename_fails() {
        let dir = scratch_dir("rollback");
        let a = dir.join("a.bin");
        let blocked = dir.join("missing_dir").join("b.bin");
        let mut staging = Staging::new();
        staging.stage_bytes(&a, b"tags").unwrap();
        // stage into a real directory, then point the target somewhere unreachable
        staging.stage_bytes(dir.join("b.bin"), b"info").unwrap();
        staging.staged[1].1 = blocked.clone();

        assert!(staging.commit().is_err());
        assert!(!a.exists());
        assert!(!blocked.exists());
        assert!(!temp_sibling(&dir.join("b.bin")).exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_names_its_path() {
        let dir = scratch_dir("missing");
        let path = dir.join("absent.bin");
        match read_bytes(&path) {
            Err(Error::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {other:?}"),
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_prefixes_malformed_errors() {
        let dir = scratch_dir("load");
        let path = dir.join("bad.bin");
        write_bytes(&path, b"xx").unwrap();
        let err = load(&path, |_| -> Result<()> { Err(Error::malformed("short")) }).unwrap_err();
        assert!(err.to_string().contains("bad.bin"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
