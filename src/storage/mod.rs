pub mod checkpoint;
pub mod persist;
pub mod table;

pub use checkpoint::Checkpoint;
pub use persist::Persister;
pub use table::ColumnTable;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Sibling of `path` with `.tmp` appended to the file name
pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with whatever `write` produces at the temporary sibling.
/// A crash mid-write leaves the previous file in place.
pub(crate) fn replace_atomically<E>(
    path: &Path,
    write: impl FnOnce(&Path) -> Result<(), E>,
) -> Result<(), E>
where
    E: From<io::Error>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write(&tmp)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
