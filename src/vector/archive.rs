//! Zip packaging of shapefile components

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use log::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::errors::{TreeKitError, TreeKitResult};

/// Bundles files into a zip archive under their base names
///
/// The archive is assembled under a `.partial` name and renamed into place
/// once every entry is written, so a failed run never leaves a
/// complete-looking archive behind. Entries carry the 1980-01-01 DOS epoch
/// as their timestamp.
///
/// # Arguments
/// * `archive_path` - Destination `.zip`
/// * `files` - Files to include, in order; each must exist
pub fn package(archive_path: &Path, files: &[PathBuf]) -> TreeKitResult<PathBuf> {
    for file in files {
        if !file.is_file() {
            return Err(TreeKitError::Archive {
                path: archive_path.to_path_buf(),
                message: format!("component {} does not exist", file.display()),
            });
        }
    }

    let partial = archive_path.with_extension("zip.partial");
    if let Err(e) = write_archive(&partial, files) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, archive_path).map_err(|e| TreeKitError::export(archive_path, e))?;
    info!("Packaged {} files into {}", files.len(), archive_path.display());
    Ok(archive_path.to_path_buf())
}

fn write_archive(partial: &Path, files: &[PathBuf]) -> TreeKitResult<()> {
    let archive_error = |message: String| TreeKitError::Archive { path: partial.to_path_buf(), message };

    let out = File::create(partial).map_err(|e| TreeKitError::export(partial, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for file in files {
        let name = file.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| archive_error(format!("{} has no file name", file.display())))?;
        debug!("Adding {} to archive", name);

        zip.start_file(name, options).map_err(|e| archive_error(e.to_string()))?;
        let mut input = File::open(file).map_err(|e| TreeKitError::export(file, e))?;
        io::copy(&mut input, &mut zip).map_err(|e| TreeKitError::export(partial, e))?;
    }

    let writer = zip.finish().map_err(|e| archive_error(e.to_string()))?;
    writer.into_inner()
        .map_err(|e| TreeKitError::export(partial, e.into_error()))?
        .sync_all()
        .map_err(|e| TreeKitError::export(partial, e))?;
    Ok(())
}
