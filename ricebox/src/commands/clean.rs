use std::path::{Path, PathBuf};

use ricebox_format::{coff::SYSO_EXTENSION, helper::HELPER_EXTENSION};

use crate::cli::CleanArgs;
use crate::error::{Error, Result};

fn is_generated(path: &Path) -> bool {
    path.file_name()
        .and_then(|x| x.to_str())
        .map(|name| {
            name.ends_with(&format!(".{}", HELPER_EXTENSION))
                || name.ends_with(&format!(".{}", SYSO_EXTENSION))
        })
        .unwrap_or(false)
}

/// Remove generated helpers and objects from `dir`, returning what was removed.
fn clean_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| Error::ReadPackageDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut removed = vec![];
    for entry in read_dir {
        let entry = entry.map_err(|source| Error::ReadPackageDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || !is_generated(&path) {
            continue;
        }

        std::fs::remove_file(&path).map_err(|source| Error::Remove {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "removed");
        removed.push(path);
    }

    removed.sort();
    Ok(removed)
}

pub fn run(args: CleanArgs) -> Result<()> {
    let removed = clean_dir(&args.package_dir)?;
    tracing::debug!(count = removed.len(), "cleaned package");
    Ok(())
}
