//! Collaborator tool tests: CID rewrite and image batches.

use image::{GenericImageView, Rgba, RgbaImage};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

use mintforge_core::rewrite::RewriteError;
use mintforge_core::{convert_to_webp, normalize_cid_base, resize_half, rewrite_metadata};

fn write_png(dir: &std::path::Path, name: &str, width: u32, height: u32) {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 128]));
    img.save_with_format(dir.join(name), image::ImageFormat::Png).unwrap();
}

#[test]
fn rewrite_writes_copies_and_leaves_originals() {
    let root = TempDir::new().unwrap();
    let meta = root.path().join("metadata");
    let out = root.path().join("new_metadata");
    fs::create_dir(&meta).unwrap();

    let original = json!({
        "name": "Yacht Bot #1",
        "image": "1.png",
        "asset_paths": {"image": "art/1.png"},
        "attributes": [{"trait_type": "Hull", "value": "Teak"}],
        "properties": {"files": [{"uri": "1.png", "type": "image/png"}]}
    });
    let original_text = serde_json::to_string_pretty(&original).unwrap();
    fs::write(meta.join("1.json"), &original_text).unwrap();
    fs::write(meta.join("02.json"), r#"{"name": "Yacht Bot #2"}"#).unwrap();
    fs::write(meta.join("readme.json"), "not metadata").unwrap();

    let base = normalize_cid_base("ipfs://ipfs/bafyexample/").unwrap();
    let summary = rewrite_metadata(&meta, &out, &base).unwrap();

    assert_eq!(summary.updated, 2);
    assert_eq!(fs::read_to_string(meta.join("1.json")).unwrap(), original_text);
    assert!(!out.join("readme.json").exists());

    let first: Value = serde_json::from_str(&fs::read_to_string(out.join("1.json")).unwrap()).unwrap();
    assert_eq!(first["image"], "ipfs://bafyexample/1.png");
    assert!(first.get("asset_paths").is_none());
    assert_eq!(first["attributes"], original["attributes"]);

    let second: Value = serde_json::from_str(&fs::read_to_string(out.join("02.json")).unwrap()).unwrap();
    assert_eq!(second["image"], "ipfs://bafyexample/02.png");
    assert_eq!(second["properties"]["files"], json!([{"uri": "02.png", "type": "image/png"}]));
}

#[test]
fn rewrite_keeps_non_ascii_text() {
    let root = TempDir::new().unwrap();
    let meta = root.path().join("metadata");
    let out = root.path().join("out");
    fs::create_dir(&meta).unwrap();
    fs::write(meta.join("1.json"), r#"{"name": "Méduse ☂"}"#).unwrap();

    rewrite_metadata(&meta, &out, &normalize_cid_base("cid").unwrap()).unwrap();

    let text = fs::read_to_string(out.join("1.json")).unwrap();
    assert!(text.contains("Méduse ☂"));
}

#[test]
fn rewrite_requires_metadata_dir() {
    let root = TempDir::new().unwrap();
    let err = rewrite_metadata(
        &root.path().join("metadata"),
        &root.path().join("out"),
        &normalize_cid_base("cid").unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, RewriteError::MetadataDirMissing(_)));
}

#[test]
fn rewrite_refuses_to_write_into_metadata_dir() {
    let root = TempDir::new().unwrap();
    let meta = root.path().join("metadata");
    fs::create_dir(&meta).unwrap();
    let original = r#"{"image": "old.png", "asset_paths": ["art/1.png"]}"#;
    fs::write(meta.join("1.json"), original).unwrap();
    let base = normalize_cid_base("bafyexample").unwrap();

    let err = rewrite_metadata(&meta, &meta, &base).unwrap_err();
    assert!(matches!(err, RewriteError::OutputIsSource(_)));

    let aliased = root.path().join("metadata").join("..").join("metadata");
    let err = rewrite_metadata(&meta, &aliased, &base).unwrap_err();
    assert!(matches!(err, RewriteError::OutputIsSource(_)));

    assert_eq!(fs::read_to_string(meta.join("1.json")).unwrap(), original);
}

#[test]
fn rewrite_stops_on_invalid_json() {
    let root = TempDir::new().unwrap();
    let meta = root.path().join("metadata");
    fs::create_dir(&meta).unwrap();
    fs::write(meta.join("1.json"), "{broken").unwrap();

    let err = rewrite_metadata(&meta, &root.path().join("out"), &normalize_cid_base("cid").unwrap())
        .unwrap_err();
    assert!(matches!(err, RewriteError::Json { .. }));
    assert!(err.to_string().contains("1.json"));
}

#[test]
fn convert_writes_lossless_webp() {
    let src = TempDir::new().unwrap();
    let out = src.path().join("webp");
    write_png(src.path(), "1.png", 8, 6);
    write_png(src.path(), "cover.PNG", 4, 4);
    fs::write(src.path().join("notes.txt"), "skip me").unwrap();

    let batch = convert_to_webp(src.path(), &out).unwrap();

    assert!(batch.is_clean());
    assert_eq!(batch.processed.len(), 2);
    let webp = image::open(out.join("1.webp")).unwrap();
    assert_eq!(webp.dimensions(), (8, 6));
    assert_eq!(webp.to_rgba8().get_pixel(0, 0), &Rgba([200, 10, 10, 128]));
    assert!(out.join("cover.webp").exists());
}

#[test]
fn resize_halves_and_records_failures() {
    let src = TempDir::new().unwrap();
    let out = src.path().join("resized_png");
    write_png(src.path(), "1.png", 10, 7);
    write_png(src.path(), "2.png", 1, 1);
    fs::write(src.path().join("3.png"), b"not a png").unwrap();

    let batch = resize_half(src.path(), &out).unwrap();

    assert_eq!(batch.processed.len(), 2);
    assert_eq!(batch.failed.len(), 1);
    assert!(batch.failed[0].source.ends_with("3.png"));
    assert_eq!(image::open(out.join("1.png")).unwrap().dimensions(), (5, 3));
    assert_eq!(image::open(out.join("2.png")).unwrap().dimensions(), (1, 1));
    assert!(!out.join("3.png").exists());
}
