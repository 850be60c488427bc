use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::dataset::Dataset;
use crate::errors::{MetricsError, Result};

// Owned, explicit replacement for the dashboard's process-global memoized
// load: entries are keyed by source path and invalidated when the file's
// modification time moves.
#[derive(Debug, Default)]
pub(crate) struct DatasetCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    modified: SystemTime,
    dataset: Arc<Dataset>,
}

impl DatasetCache {
    pub(crate) fn new() -> DatasetCache {
        DatasetCache::default()
    }

    // Returns the cached snapshot if the file has not changed since it was
    // loaded, otherwise reloads and replaces the entry.
    pub(crate) fn get_or_load(&mut self, path: &Path) -> Result<Arc<Dataset>> {
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| MetricsError::Data(format!("cannot stat {}: {}", path.display(), e)))?;

        if let Some(entry) = self.entries.get(path) {
            if entry.modified == modified {
                return Ok(Arc::clone(&entry.dataset));
            }
        }

        let dataset = Arc::new(Dataset::load(path)?);
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                modified,
                dataset: Arc::clone(&dataset),
            },
        );
        Ok(dataset)
    }

    pub(crate) fn invalidate(&mut self, path: &Path) {
        self.entries.remove(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{sample_file, write_csv, HEADER};
    use std::io::Write;

    #[test]
    fn second_lookup_reuses_the_snapshot() {
        let file = sample_file();
        let mut cache = DatasetCache::new();
        let first = cache.get_or_load(file.path()).unwrap();
        let second = cache.get_or_load(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn changed_mtime_reloads() {
        let file = write_csv(&["Andorra,7.2,3.6,3154.0,81.8,99.0,0.0,0.0,3.7,1000,164.0,50,2,40,8"]);
        let mut cache = DatasetCache::new();
        let first = cache.get_or_load(file.path()).unwrap();
        assert_eq!(first.len(), 1);

        // Rewrite with one more row and a mtime clearly past the original.
        std::thread::sleep(std::time::Duration::from_millis(20));
        let mut handle = std::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(file.path())
            .unwrap();
        writeln!(handle, "{}", HEADER).unwrap();
        writeln!(handle, "Andorra,7.2,3.6,3154.0,81.8,99.0,0.0,0.0,3.7,1000,164.0,50,2,40,8").unwrap();
        writeln!(handle, "Belize,5.7,4.8,1763.0,74.5,82.7,1.2,13.9,6.4,200,17.0,10,1,8,1").unwrap();
        handle.flush().unwrap();
        drop(handle);
        filetime_touch(file.path());

        let second = cache.get_or_load(file.path()).unwrap();
        assert_eq!(second.len(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidate_drops_the_entry() {
        let file = sample_file();
        let mut cache = DatasetCache::new();
        let first = cache.get_or_load(file.path()).unwrap();
        cache.invalidate(file.path());
        let second = cache.get_or_load(file.path()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_file_is_a_data_error() {
        let mut cache = DatasetCache::new();
        let err = cache.get_or_load(Path::new("/no/such/table.csv")).unwrap_err();
        assert!(matches!(err, MetricsError::Data(_)), "{:?}", err);
    }

    // Some filesystems have coarse mtime resolution; force the timestamp
    // forward so the reload path is deterministic.
    fn filetime_touch(path: &Path) {
        let file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        let now = SystemTime::now() + std::time::Duration::from_secs(2);
        file.set_modified(now).unwrap();
    }
}
