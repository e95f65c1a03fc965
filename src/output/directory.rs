use super::{error::SinkError, sink::ThumbnailSink};
use crate::structs::thumbnail::Thumbnail;
use crate::utils::strings::sanitize_filename;
use log::{error, warn};
use std::{
    fs::{create_dir_all, File, OpenOptions},
    io::Write,
    path::PathBuf,
};

/**Subdirectory holding original-name symlinks */
const THUMBS_SUBDIR: &str = ".thumbs";
/**Metadata sidecar, one JSON line per thumbnail */
const CATALOG_FILE: &str = "catalog.jsonl";

/// Writes recovered images as zero-padded numbered files plus a JSONL
/// metadata sidecar. With symlinks enabled, original names link to the
/// numbered files under `.thumbs/`
pub struct DirectorySink {
    directory: PathBuf,
    catalog: File,
    symlinks: bool,
    counter: u32,
}

impl DirectorySink {
    pub fn new(directory: &str, symlinks: bool) -> Result<DirectorySink, SinkError> {
        let root = PathBuf::from(directory);
        if let Err(err) = create_dir_all(&root) {
            error!("[output] Could not create output directory {directory}: {err:?}");
            return Err(SinkError::Create);
        }
        if symlinks {
            if let Err(err) = create_dir_all(root.join(THUMBS_SUBDIR)) {
                error!("[output] Could not create symlink directory: {err:?}");
                return Err(SinkError::Create);
            }
        }

        let catalog_result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(root.join(CATALOG_FILE));
        let catalog = match catalog_result {
            Ok(result) => result,
            Err(err) => {
                error!("[output] Could not open {CATALOG_FILE}: {err:?}");
                return Err(SinkError::Create);
            }
        };

        Ok(DirectorySink {
            directory: root,
            catalog,
            symlinks,
            counter: 0,
        })
    }

    fn extension(mime: &str) -> &'static str {
        match mime {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/bmp" => "bmp",
            _ => "img",
        }
    }
}

impl ThumbnailSink for DirectorySink {
    fn write(&mut self, thumbnail: &Thumbnail) -> Result<(), SinkError> {
        let index = self.counter;
        self.counter += 1;

        let line_result = serde_json::to_string(thumbnail);
        match line_result {
            Ok(line) => {
                if let Err(err) = writeln!(self.catalog, "{line}") {
                    error!("[output] Could not append to {CATALOG_FILE}: {err:?}");
                    return Err(SinkError::Write);
                }
            }
            Err(err) => {
                error!("[output] Could not serialize thumbnail metadata: {err:?}");
                return Err(SinkError::Write);
            }
        }

        // Dormant entries have metadata only
        if thumbnail.data.is_empty() {
            return Ok(());
        }

        let extension = match &thumbnail.mime {
            Some(mime) => DirectorySink::extension(mime),
            None => "img",
        };
        let numbered = format!("{index:010}.{extension}");
        let image_path = self.directory.join(&numbered);
        if let Err(err) = std::fs::write(&image_path, &thumbnail.data) {
            error!("[output] Could not write {}: {err:?}", image_path.display());
            return Err(SinkError::Write);
        }

        if self.symlinks {
            if let Some(name) = &thumbnail.original_name {
                self.link_original(name, &numbered);
            }
        }

        Ok(())
    }
}

impl DirectorySink {
    /// Link the original file name to the numbered image under `.thumbs/`
    #[cfg(target_family = "unix")]
    fn link_original(&self, name: &str, numbered: &str) {
        let link = self
            .directory
            .join(THUMBS_SUBDIR)
            .join(sanitize_filename(name));
        let target = PathBuf::from("..").join(numbered);
        if let Err(err) = std::os::unix::fs::symlink(&target, &link) {
            warn!("[output] Could not create symlink {}: {err:?}", link.display());
        }
    }

    #[cfg(not(target_family = "unix"))]
    fn link_original(&self, name: &str, _numbered: &str) {
        warn!(
            "[output] Symlinks unsupported on this platform, skipping {}",
            sanitize_filename(name)
        );
    }
}
