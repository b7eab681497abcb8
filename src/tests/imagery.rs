//! Image cache tests: idempotence, fallback order, and the no-partial-write
//! guarantee.

use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::imagery::{ImageSource, ImageStore};
use crate::tests::util::png_bytes;

struct CountingSource {
    bytes: Option<Vec<u8>>,
    fail: bool,
    calls: AtomicU32,
}

impl CountingSource {
    fn serving(bytes: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            bytes: Some(bytes),
            fail: false,
            calls: AtomicU32::new(0),
        })
    }

    fn empty() -> Arc<Self> {
        Arc::new(Self {
            bytes: None,
            fail: false,
            calls: AtomicU32::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            bytes: None,
            fail: true,
            calls: AtomicU32::new(0),
        })
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageSource for Arc<CountingSource> {
    fn fetch(&self, _name: &str, _wikidata_id: Option<&str>) -> anyhow::Result<Option<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("download failed");
        }
        Ok(self.bytes.clone())
    }

    fn name(&self) -> &'static str {
        "counting-source"
    }
}

fn cache_entries(dir: &tempfile::TempDir) -> usize {
    fs::read_dir(dir.path()).unwrap().count()
}

#[test]
fn test_second_acquire_hits_cache_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let source = CountingSource::serving(png_bytes(100, 100));
    let store = ImageStore::with_sources(
        dir.path().to_path_buf(),
        vec![Box::new(source.clone())],
        false,
    );

    let first = store.acquire("Pont Valentré", None).unwrap();
    let second = store.acquire("Pont Valentré", None).unwrap();

    assert_eq!(first, second);
    assert_eq!(source.call_count(), 1);
    assert!(first.exists());
    assert_eq!(cache_entries(&dir), 1);
}

#[test]
fn test_failed_download_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = CountingSource::failing();
    let store = ImageStore::with_sources(
        dir.path().to_path_buf(),
        vec![Box::new(source.clone())],
        false,
    );

    assert!(store.acquire("Pont Valentré", None).is_none());
    assert_eq!(cache_entries(&dir), 0);

    // no negative caching either: the next attempt tries the source again
    assert!(store.acquire("Pont Valentré", None).is_none());
    assert_eq!(source.call_count(), 2);
}

#[test]
fn test_undecodable_bytes_are_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let source = CountingSource::serving(vec![0xAB; 4096]);
    let store = ImageStore::with_sources(
        dir.path().to_path_buf(),
        vec![Box::new(source)],
        false,
    );

    assert!(store.acquire("Pont Valentré", None).is_none());
    assert_eq!(cache_entries(&dir), 0);
}

#[test]
fn test_fallback_chain_tries_sources_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = CountingSource::empty();
    let second = CountingSource::serving(png_bytes(100, 100));
    let store = ImageStore::with_sources(
        dir.path().to_path_buf(),
        vec![Box::new(first.clone()), Box::new(second.clone())],
        false,
    );

    let path = store.acquire("Pont Valentré", None).unwrap();

    assert!(path.exists());
    assert_eq!(first.call_count(), 1);
    assert_eq!(second.call_count(), 1);
}

#[test]
fn test_first_valid_source_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let first = CountingSource::serving(png_bytes(100, 100));
    let second = CountingSource::serving(png_bytes(64, 64));
    let store = ImageStore::with_sources(
        dir.path().to_path_buf(),
        vec![Box::new(first.clone()), Box::new(second.clone())],
        false,
    );

    store.acquire("Pont Valentré", None).unwrap();

    assert_eq!(first.call_count(), 1);
    assert_eq!(second.call_count(), 0);
}

#[test]
fn test_knowledge_base_id_keys_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let source = CountingSource::serving(png_bytes(100, 100));
    let store = ImageStore::with_sources(
        dir.path().to_path_buf(),
        vec![Box::new(source)],
        false,
    );

    let path = store.acquire("Pont Valentré", Some("Q1473792")).unwrap();

    assert!(path.ends_with("Q1473792.jpg"));
}

#[test]
fn test_placeholder_generated_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::with_sources(dir.path().to_path_buf(), Vec::new(), true);

    let path = store.acquire("Pont Valentré", None).unwrap();

    let img = image::open(&path).unwrap();
    assert_eq!((img.width(), img.height()), (640, 360));
}

#[test]
fn test_strict_mode_yields_absence() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::with_sources(dir.path().to_path_buf(), Vec::new(), false);

    assert!(store.acquire("Pont Valentré", None).is_none());
    assert_eq!(cache_entries(&dir), 0);
}
