use std::fs;
use std::path::Path;
use std::process::Command;

use mobfreeze_nbt::{Compound, List, Nbt, Tag, TagId};
use mobfreeze_storage::{RegionFile, SlotPos};

pub fn run_cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mobfreeze"));
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Creates an empty world folder with `level.dat` and `entities/`.
pub fn new_world() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("level.dat"), b"").unwrap();
    fs::create_dir(dir.path().join("entities")).unwrap();
    dir
}

pub fn entity_chunk(ids: &[&str]) -> Nbt {
    let mut list = List::new(TagId::Compound);
    for id in ids {
        list.push(Tag::Compound(Compound::new().with("id", Tag::from(*id))))
            .unwrap();
    }
    Nbt::new("", Compound::new().with("Entities", Tag::List(list)))
}

pub fn write_region(path: &Path, chunks: &[(SlotPos, Nbt)]) {
    let mut region = RegionFile::create(path).unwrap();
    for (slot, nbt) in chunks {
        region.write(*slot, nbt).unwrap();
    }
    region.close().unwrap();
}
