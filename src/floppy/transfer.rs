//! Moving files between the floppy image and the host
//!
//! Drag-out stages the entry as a real file under the temp directory, named
//! exactly like the entry so the drop target shows the original name, then
//! hands that path to a drag session. The staging directory is removed once
//! the session returns, whatever the outcome.

use std::path::{Path, PathBuf};

use super::tree::DiskDirectoryNode;
use super::FloppyImageService;
use crate::config::DragOutConfig;
use crate::drag_out::{DragHost, DragOutcome, DragPayload, DragSession};

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("External drag-out is not supported on this platform")]
    UnsupportedPlatform,
    #[error("Cannot read {0} from the disk image")]
    ReadFailed(String),
    #[error("Failed to write {0} to the disk image")]
    WriteFailed(String),
    #[error("Failed to delete {0} from the disk image")]
    DeleteFailed(String),
    #[error("{0} is a directory")]
    NotAFile(String),
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to stage {path}: {source}")]
    Staging {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    HostRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Temp directory holding one staged file. Removed on drop.
struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    fn create(root: &Path) -> Result<Self, TransferError> {
        let token: u64 = rand::random();
        let path = root.join(format!("{:016x}", token));
        std::fs::create_dir_all(&path).map_err(|source| TransferError::Staging {
            path: path.clone(),
            source,
        })?;
        let path = dunce::canonicalize(&path).unwrap_or(path);
        Ok(Self { path })
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        // The target may still hold the file open or have moved it; best effort.
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::debug!("could not remove staging dir {}: {}", self.path.display(), e);
        }
    }
}

/// File name to stage an image entry under
fn staged_file_name(entry: &str, fallback: &str) -> String {
    // Image entries may carry either separator
    entry
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

/// Drag one image entry out to the host shell, staging it under the system temp dir.
pub fn drag_out_entry<S, H>(
    service: &S,
    host: &H,
    config: &DragOutConfig,
    name: &str,
) -> Result<DragOutcome, TransferError>
where
    S: FloppyImageService + ?Sized,
    H: DragHost,
{
    let root = std::env::temp_dir().join(&config.staging_dir_name);
    drag_out_entry_in(service, host, config, name, &root)
}

/// Same as [`drag_out_entry`] with an explicit staging root.
pub fn drag_out_entry_in<S, H>(
    service: &S,
    host: &H,
    config: &DragOutConfig,
    name: &str,
    staging_root: &Path,
) -> Result<DragOutcome, TransferError>
where
    S: FloppyImageService + ?Sized,
    H: DragHost,
{
    if !host.is_supported() {
        return Err(TransferError::UnsupportedPlatform);
    }

    let data = service
        .read_file(name)
        .ok_or_else(|| TransferError::ReadFailed(name.to_string()))?;

    let staging = StagingDir::create(staging_root)?;
    let file_path = staging.path.join(staged_file_name(name, &config.fallback_file_name));
    std::fs::write(&file_path, &data).map_err(|source| TransferError::Staging {
        path: file_path.clone(),
        source,
    })?;
    tracing::info!("staged {} ({} bytes) at {}", name, data.len(), file_path.display());

    let outcome = DragSession::new(host).execute(&DragPayload::from_paths([file_path]));
    if !outcome.is_dropped() {
        tracing::info!("drag-out of {} did not complete with a drop: {:?}", name, outcome);
    }
    Ok(outcome)
}

/// Result of dropping host files onto the image
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Names written into the image, in input order
    pub written: Vec<String>,
    pub failures: Vec<TransferError>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Write host files into the image under their file names. A failing path
/// does not stop the rest.
pub fn import_host_files<S, P>(service: &S, paths: &[P]) -> ImportReport
where
    S: FloppyImageService + ?Sized,
    P: AsRef<Path>,
{
    let mut report = ImportReport::default();

    for path in paths.iter().map(AsRef::as_ref) {
        if path.as_os_str().is_empty() {
            continue;
        }
        match import_one(service, path) {
            Ok(name) => report.written.push(name),
            Err(e) => {
                tracing::warn!("import: {}", e);
                report.failures.push(e);
            }
        }
    }
    report
}

fn import_one<S: FloppyImageService + ?Sized>(service: &S, path: &Path) -> Result<String, TransferError> {
    if !path.is_file() {
        return Err(TransferError::NotFound(path.to_path_buf()));
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| TransferError::NotFound(path.to_path_buf()))?;
    let data = std::fs::read(path).map_err(|source| TransferError::HostRead {
        path: path.to_path_buf(),
        source,
    })?;

    if !service.write_file(&name, &data) {
        return Err(TransferError::WriteFailed(name));
    }
    Ok(name)
}

/// Delete a file entry. Directories are refused.
pub fn delete_entry<S: FloppyImageService + ?Sized>(service: &S, node: &DiskDirectoryNode) -> Result<(), TransferError> {
    if node.is_directory {
        return Err(TransferError::NotAFile(node.name.clone()));
    }
    if !service.delete_file(&node.name) {
        return Err(TransferError::DeleteFailed(node.name.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag_out::dropfiles::decode_block;
    use crate::drag_out::session::tests::{Call, MockHost, Script};
    use crate::floppy::tests::MemoryImage;
    use crate::floppy::tree::parse_root;

    #[test]
    fn test_staged_file_name() {
        assert_eq!(staged_file_name("GAME.BAS", "file.bin"), "GAME.BAS");
        assert_eq!(staged_file_name("GAMES\\TETRIS.BAS", "file.bin"), "TETRIS.BAS");
        assert_eq!(staged_file_name("a/b/c.txt", "file.bin"), "c.txt");
        assert_eq!(staged_file_name("", "file.bin"), "file.bin");
        assert_eq!(staged_file_name("DIR\\", "file.bin"), "file.bin");
        assert_eq!(staged_file_name("..", "file.bin"), "file.bin");
    }

    #[test]
    fn test_drag_out_stages_under_original_name_and_cleans_up() {
        let staging_root = tempfile::tempdir().unwrap();
        let image = MemoryImage::with_files(&[("GAMES\\TETRIS.BAS", b"10 GOTO 10")]);
        let host = MockHost::new(Script::Drop);

        let outcome = drag_out_entry_in(&image, &host, &DragOutConfig::default(), "GAMES\\TETRIS.BAS", staging_root.path()).unwrap();
        assert_eq!(outcome, DragOutcome::Dropped);

        let offered = decode_block(&host.blocks.borrow()[0]).unwrap();
        assert_eq!(offered.len(), 1);
        assert!(offered[0].ends_with("TETRIS.BAS"));

        // Staging directory is gone after the session
        assert_eq!(std::fs::read_dir(staging_root.path()).unwrap().count(), 0);
        assert_eq!(host.count(|c| matches!(c, Call::Free(_))), 1);
    }

    #[test]
    fn test_drag_out_cleans_up_on_cancel() {
        let staging_root = tempfile::tempdir().unwrap();
        let image = MemoryImage::with_files(&[("A.TXT", b"x")]);
        let host = MockHost::new(Script::Escape);

        let outcome = drag_out_entry_in(&image, &host, &DragOutConfig::default(), "A.TXT", staging_root.path()).unwrap();
        assert_eq!(outcome, DragOutcome::Cancelled);
        assert_eq!(std::fs::read_dir(staging_root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_drag_out_unreadable_entry() {
        let staging_root = tempfile::tempdir().unwrap();
        let image = MemoryImage::with_files(&[]);
        let host = MockHost::new(Script::Drop);

        let err = drag_out_entry_in(&image, &host, &DragOutConfig::default(), "MISSING", staging_root.path()).unwrap_err();
        assert!(matches!(err, TransferError::ReadFailed(name) if name == "MISSING"));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_drag_out_refused_on_unsupported_host() {
        let staging_root = tempfile::tempdir().unwrap();
        let image = MemoryImage::with_files(&[("A.TXT", b"x")]);
        let mut host = MockHost::new(Script::Drop);
        host.supported = false;

        let err = drag_out_entry_in(&image, &host, &DragOutConfig::default(), "A.TXT", staging_root.path()).unwrap_err();
        assert!(matches!(err, TransferError::UnsupportedPlatform));
        assert_eq!(std::fs::read_dir(staging_root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_import_reports_each_path() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("HELLO.BAS");
        std::fs::write(&good, b"10 PRINT \"HI\"").unwrap();
        let missing = dir.path().join("NOPE.BAS");

        let image = MemoryImage::with_files(&[]);
        let report = import_host_files(&image, &[good.clone(), missing, PathBuf::new()]);

        assert_eq!(report.written, vec!["HELLO.BAS".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], TransferError::NotFound(_)));
        assert_eq!(image.read_file("HELLO.BAS").unwrap(), b"10 PRINT \"HI\"");
    }

    #[test]
    fn test_import_write_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("A.TXT");
        std::fs::write(&file, b"a").unwrap();

        let image = MemoryImage { read_only: true, ..Default::default() };
        let report = import_host_files(&image, &[file]);
        assert!(!report.is_clean());
        assert!(matches!(&report.failures[0], TransferError::WriteFailed(name) if name == "A.TXT"));
    }

    #[test]
    fn test_delete_entry() {
        let image = MemoryImage::with_files(&[("A.TXT", b"a")]);
        let root = parse_root(&image.directory_tree().unwrap()).unwrap();

        assert!(matches!(delete_entry(&image, &root), Err(TransferError::NotAFile(_))));

        let file = root.find("A.TXT").unwrap().clone();
        delete_entry(&image, &file).unwrap();
        assert!(image.read_file("A.TXT").is_none());
        assert!(matches!(delete_entry(&image, &file), Err(TransferError::DeleteFailed(_))));
    }
}
