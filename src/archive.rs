//! Unpacking the retrieved archive and zipping the scratch directory back up.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, ErrorKind, Result};
use crate::workspace::ScratchWorkspace;

/// Decode a base64 zip payload and extract it into the workspace.
///
/// The payload is staged as `unpackaged.zip` and removed once extracted.
/// Whitespace in the base64 text (the API wraps long payloads) is ignored.
pub fn extract_archive(payload: &str, workspace: &ScratchWorkspace) -> Result<()> {
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = general_purpose::STANDARD.decode(compact.as_bytes())?;

    let staged = workspace.retrieved_archive_path();
    std::fs::write(&staged, &bytes)?;

    let mut archive = ZipArchive::new(File::open(&staged)?)?;
    debug!(entries = archive.len(), "extracting retrieved archive");
    archive.extract(workspace.root())?;
    drop(archive);

    std::fs::remove_file(&staged)?;
    Ok(())
}

/// Zip the whole workspace into `package.zip` and return the archive bytes.
///
/// Entries are relative to the workspace root (no enclosing folder), use `/`
/// separators and are deflated at level 9. The output file is not included
/// in itself.
pub fn build_package(workspace: &ScratchWorkspace) -> Result<Vec<u8>> {
    let root = workspace.root();
    let output = workspace.package_path();

    let mut zip = ZipWriter::new(File::create(&output)?);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if path == output {
            continue;
        }

        let name = entry_name(root, path)?;
        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let mut file = File::open(path)?;
            io::copy(&mut file, &mut zip)?;
        }
    }

    let mut file = zip.finish()?;
    file.flush()?;
    drop(file);

    let bytes = std::fs::read(&output)?;
    debug!(bytes = bytes.len(), path = %output.display(), "built deploy package");
    Ok(bytes)
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|e| {
        Error::with_source(
            ErrorKind::Archive(format!("{} is outside the workspace", path.display())),
            e,
        )
    })?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
