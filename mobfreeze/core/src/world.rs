//! World root validation and region file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use mobfreeze_common::WorldLayout;

use crate::error::{FreezeError, FreezeResult, WorldError};

/// A validated world save folder.
#[derive(Debug, Clone)]
pub struct World {
    root: PathBuf,
    layout: WorldLayout,
}

impl World {
    /// Opens a world root using the standard layout.
    pub fn open<P: AsRef<Path>>(path: P) -> FreezeResult<Self> {
        Self::open_with(path, WorldLayout::default())
    }

    /// Opens a world root, checking that the directory, its marker file and
    /// its region directory all exist.
    pub fn open_with<P: AsRef<Path>>(path: P, layout: WorldLayout) -> FreezeResult<Self> {
        let root = path.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(WorldError::NotADirectory(root).into());
        }
        if !layout.marker_path(&root).is_file() {
            return Err(WorldError::MissingMarker {
                root,
                marker: layout.marker_file.clone(),
            }
            .into());
        }
        if !layout.region_path(&root).is_dir() {
            return Err(WorldError::MissingRegionDir {
                root,
                dir: layout.region_dir.clone(),
            }
            .into());
        }

        Ok(Self { root, layout })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &WorldLayout {
        &self.layout
    }

    /// Directory holding the region files.
    pub fn region_dir(&self) -> PathBuf {
        self.layout.region_path(&self.root)
    }

    /// Lists the region files directly under the region directory, sorted by
    /// file name.
    pub fn region_files(&self) -> FreezeResult<Vec<PathBuf>> {
        let dir = self.region_dir();
        let io_err = |source| FreezeError::Io {
            path: dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && self.layout.is_region_file(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}
