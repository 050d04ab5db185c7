use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use mobfreeze_storage::RegionError;
use thiserror::Error;

/// Reasons a path cannot be used as a world root.
#[derive(Debug, Error, Diagnostic)]
pub enum WorldError {
    #[error("{} is not a directory", .0.display())]
    #[diagnostic(
        code(world::not_a_directory),
        help("pass the folder of a world save, the one that contains level.dat")
    )]
    NotADirectory(PathBuf),

    #[error("{} does not contain {marker}", .root.display())]
    #[diagnostic(
        code(world::missing_marker),
        help("this does not look like a Minecraft world folder")
    )]
    MissingMarker { root: PathBuf, marker: String },

    #[error("{} has no {dir} directory", .root.display())]
    #[diagnostic(
        code(world::missing_region_dir),
        help("entity region files are written by Minecraft 1.17 and later; open the world in a recent version first")
    )]
    MissingRegionDir { root: PathBuf, dir: String },
}

#[derive(Debug, Error, Diagnostic)]
pub enum FreezeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidWorldDirectory(#[from] WorldError),

    #[error("failed to process region file {}", .path.display())]
    #[diagnostic(code(freeze::region))]
    Region {
        path: PathBuf,
        #[source]
        source: RegionError,
    },

    #[error("failed to list {}", .path.display())]
    #[diagnostic(code(freeze::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type FreezeResult<T> = std::result::Result<T, FreezeError>;
