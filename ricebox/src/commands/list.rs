use std::io::Write;
use std::path::Path;

use ricebox_format::{coff, decode, ResourceBox, ResourceDir};

use crate::cli::ListArgs;
use crate::error::{Error, Result};
use crate::util::{format_size, format_time};

/// Read the box held by the object at `path`, linked and ready to walk.
fn read_box(path: &Path) -> Result<(coff::EmbeddedBlob, ResourceBox)> {
    let bytes = std::fs::read(path).map_err(|source| Error::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;
    let blob = coff::extract(&bytes).map_err(|source| Error::Extract {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rbox = decode(&blob.data).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    rbox.link().map_err(|source| Error::Link {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((blob, rbox))
}

fn write_dir<W: Write>(
    out: &mut W,
    rbox: &ResourceBox,
    dir: &ResourceDir,
) -> std::io::Result<()> {
    writeln!(
        out,
        "{:>12}  {}  {}/",
        "-",
        format_time(dir.mod_time),
        dir.path
    )?;
    for file in rbox.child_files(dir) {
        writeln!(
            out,
            "{:>12}  {}  {}",
            format_size(file.len()),
            format_time(file.mod_time),
            file.path
        )?;
    }
    for child in rbox.child_dirs(dir) {
        write_dir(out, rbox, child)?;
    }
    Ok(())
}

/// Write a listing: a summary, then the tree depth-first with each
/// directory's files before its subdirectories.
fn write_listing<W: Write>(
    out: &mut W,
    blob: &coff::EmbeddedBlob,
    rbox: &ResourceBox,
) -> std::io::Result<()> {
    let arch = blob
        .arch
        .map(|x| x.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    writeln!(out, "Box:      {}", rbox.name)?;
    writeln!(out, "Created:  {}", format_time(rbox.created_at))?;
    writeln!(out, "Symbol:   {}", blob.stem)?;
    writeln!(out, "Arch:     {} (machine {:#06x})", arch, blob.machine)?;
    writeln!(
        out,
        "Contents: {} in {} files, {} directories",
        format_size(rbox.content_len()),
        rbox.files.len(),
        rbox.dirs.len()
    )?;
    writeln!(out)?;
    writeln!(out, "{:>12}  {:<20}  Path", "Size", "Modified")?;
    writeln!(out, "{}", "-".repeat(60))?;

    if let Some(root) = rbox.root() {
        write_dir(out, rbox, root)?;
    }
    Ok(())
}

pub fn run(args: ListArgs) -> Result<()> {
    let (blob, rbox) = read_box(&args.syso)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_listing(&mut out, &blob, &rbox)
        .and_then(|_| out.flush())
        .map_err(|source| Error::WriteOutput { source })
}
