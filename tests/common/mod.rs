#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use labelprep::label::{ClassTable, GeometryPolicy};
use labelprep::prepare::PrepareOptions;
use walkdir::WalkDir;

/// A few bytes with a JPEG signature; nothing decodes images.
pub fn jpeg_bytes(seed: u8) -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, seed, seed.wrapping_add(1), 0xFF, 0xD9]
}

pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}

pub fn veg_classes() -> ClassTable {
    ClassTable::new(["carrot", "bean", "radish"]).expect("valid table")
}

pub fn prepare_options(root: &Path) -> PrepareOptions {
    PrepareOptions {
        raw_images_dir: root.join("raw_images"),
        export_root: root.join("exports"),
        output_root: root.join("data"),
        classes: veg_classes(),
        geometry: GeometryPolicy::Lenient,
    }
}

/// One training image with a carrot and a bean.
pub fn create_carrot_fixture(root: &Path) {
    write_file(&root.join("raw_images/carrot_train_001.jpg"), jpeg_bytes(1));
    write_file(
        &root.join("exports/labels/train/carrot_train_001.txt"),
        "0 0.5 0.5 0.2 0.2\n1 0.3 0.3 0.1 0.1\n",
    );
}

/// Relative path -> bytes for every file under `root`.
pub fn snapshot_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.expect("walk output tree"))
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry
                .path()
                .strip_prefix(root)
                .expect("path under root")
                .to_string_lossy()
                .replace('\\', "/");
            (rel, fs::read(entry.path()).expect("read file"))
        })
        .collect()
}
