use burrow_core::{
    format_size, sort_entries, BrowseConfig, Category, CategoryTotals, Entry, SortOrder,
    StorageBucket, StorageInfo,
};
use std::fs;
use std::time::UNIX_EPOCH;
use strum::IntoEnumIterator;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::Builder::new().prefix("burrow-core").tempdir().unwrap()
}

#[test]
fn test_classify_regular_file() {
    let temp = temp_dir();
    let path = temp.path().join("clip.MP4");
    fs::write(&path, vec![0u8; 1500]).unwrap();

    let entry = Entry::classify(&path);

    assert!(!entry.is_dir);
    assert_eq!(entry.size, 1500);
    assert_eq!(entry.extension.as_str(), "mp4");
    assert_eq!(entry.category, Category::Video);
    assert!(entry.modified > UNIX_EPOCH);
    assert!(entry.readable);
    assert!(entry.writable);
    assert_eq!(entry.formatted_size(), "1.46 KB");
}

#[test]
fn test_classify_directory() {
    let temp = temp_dir();
    let dir = temp.path().join("photos.jpg");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("inner.txt"), "data").unwrap();

    let entry = Entry::classify(&dir);

    assert!(entry.is_dir);
    assert_eq!(entry.size, 0);
    assert_eq!(entry.category, Category::Directory);
    assert_eq!(entry.formatted_size(), "--");
}

#[test]
fn test_classify_is_a_snapshot() {
    let temp = temp_dir();
    let path = temp.path().join("grow.log");
    fs::write(&path, "abc").unwrap();

    let entry = Entry::classify(&path);
    fs::write(&path, "abcdefgh").unwrap();

    assert_eq!(entry.size, 3);
}

#[test]
fn test_category_table_and_buckets_agree() {
    let samples = [
        ("jpg", StorageBucket::Images),
        ("webp", StorageBucket::Images),
        ("mkv", StorageBucket::Videos),
        ("flac", StorageBucket::Audio),
        ("pdf", StorageBucket::Documents),
        ("xlsx", StorageBucket::Documents),
        ("log", StorageBucket::Documents),
        ("7z", StorageBucket::Archives),
        ("apk", StorageBucket::Packages),
        ("py", StorageBucket::Others),
        ("weird", StorageBucket::Others),
    ];

    for (ext, bucket) in samples {
        let entry = Entry::new(format!("/x/file.{ext}"), false, 1, UNIX_EPOCH);
        assert_eq!(entry.category.bucket(), Some(bucket), "{ext}");
        assert_eq!(StorageBucket::for_extension(ext), bucket, "{ext}");
    }
}

#[test]
fn test_all_buckets_reachable_from_categories() {
    for bucket in StorageBucket::iter() {
        assert!(
            Category::iter().any(|c| c.bucket() == Some(bucket)),
            "{bucket} has no category"
        );
    }
}

#[test]
fn test_listing_example_order() {
    let mut entries = vec![
        Entry::new("/d/b.txt", false, 1, UNIX_EPOCH),
        Entry::new("/d/A", true, 0, UNIX_EPOCH),
        Entry::new("/d/a.txt", false, 1, UNIX_EPOCH),
    ];
    sort_entries(&mut entries, SortOrder::default());
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["A", "a.txt", "b.txt"]);
}

#[test]
fn test_category_totals_serialize_in_display_order() {
    let mut totals = CategoryTotals::new();
    totals.add(StorageBucket::Videos, 200);
    totals.add(StorageBucket::Images, 100);

    let json = serde_json::to_string(&totals).unwrap();
    let images = json.find("Images").unwrap();
    let videos = json.find("Videos").unwrap();
    let others = json.find("Others").unwrap();
    assert!(images < videos && videos < others);
}

#[test]
fn test_storage_info_percentage_bounds() {
    for (total, free) in [(0, 0), (1, 0), (1, 1), (1000, 1), (u64::MAX, 0), (u64::MAX, 7)] {
        let info = StorageInfo::from_space(total, free);
        assert!(info.used_percentage <= 100);
    }
    assert_eq!(StorageInfo::from_space(u64::MAX, 0).used_percentage, 100);
}

#[test]
fn test_browse_config_roundtrip() {
    let config = BrowseConfig::new("/srv/share");
    let json = serde_json::to_string(&config).unwrap();
    let back: BrowseConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.start_directory, config.start_directory);
    assert!(!back.include_hidden);
}

#[test]
fn test_format_size_examples() {
    assert_eq!(format_size(512), "512 B");
    assert_eq!(format_size(1024 * 1024), "1.00 MB");
}
