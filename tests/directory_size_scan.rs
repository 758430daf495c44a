use mirage_fs::{Config, DirectorySizeCallback, DirectorySizeProgress, OpFlags};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use test_log::test;

#[derive(Default)]
struct Observer {
    ticks: AtomicU64,
    saw_final: AtomicBool,
    cancel: AtomicBool,
}

impl DirectorySizeCallback for Observer {
    fn progress(&self, progress: &DirectorySizeProgress<'_>) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        if progress.current_path.is_none() {
            self.saw_final.store(true, Ordering::Relaxed);
        }
    }

    fn should_cancel(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

/// Reference walk over the same subtree through `read_directory`.
fn walk(
    fs: &mirage_fs::FileSystem,
    path: &str,
    files: &mut u64,
    dirs: &mut u64,
    bytes: &mut u64,
) -> mirage_fs::Result<()> {
    for entry in fs.read_directory(path)?.entries() {
        if entry.is_directory() {
            *dirs += 1;
            walk(fs, &format!("{path}\\{}", entry.name), files, dirs, bytes)?;
        } else {
            *files += 1;
            *bytes += entry.size_bytes;
        }
    }
    Ok(())
}

#[test]
fn recursive_scan_matches_enumeration() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(5)
        .max_depth(2)
        .seed(7)
        .open();

    let mut files = 0;
    let mut dirs = 0;
    let mut bytes = 0;
    walk(&fs, "C:\\", &mut files, &mut dirs, &mut bytes)?;

    let observer = Observer::default();
    let result = fs.get_directory_size("C:\\", true, Some(&observer));

    assert!(result.status.is_ok());
    assert_eq!(files, result.file_count);
    assert_eq!(dirs, result.directory_count);
    assert_eq!(bytes, result.total_bytes);
    assert_eq!(files + dirs, result.scanned_entries);

    assert!(observer.saw_final.load(Ordering::Relaxed));
    assert!(observer.ticks.load(Ordering::Relaxed) >= 1);

    Ok(())
}

#[test]
fn non_recursive_scan_counts_one_level() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(5)
        .max_depth(2)
        .seed(7)
        .open();

    let listing = fs.read_directory("C:\\")?;
    let files = listing.entries().filter(|e| !e.is_directory()).count() as u64;
    let dirs = listing.entries().filter(mirage_fs::DirectoryEntry::is_directory).count() as u64;

    let result = fs.get_directory_size("C:\\", false, None);

    assert!(result.status.is_ok());
    assert_eq!(files, result.file_count);
    assert_eq!(dirs, result.directory_count);

    Ok(())
}

#[test]
fn scanning_a_file_counts_itself() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open();

    let mut writer = fs.create_writer("C:\\solo.bin", OpFlags::NONE)?;
    writer.write(&[0u8; 1234])?;
    writer.commit()?;

    let result = fs.get_directory_size("C:\\solo.bin", true, None);

    assert!(result.status.is_ok());
    assert_eq!(1, result.scanned_entries);
    assert_eq!(1, result.file_count);
    assert_eq!(0, result.directory_count);
    assert_eq!(1234, result.total_bytes);

    Ok(())
}

#[test]
fn missing_root_reports_not_found() {
    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open();

    let result = fs.get_directory_size("C:\\absent", true, None);
    assert_eq!(Err(mirage_fs::Error::NotFound), result.status);
    assert_eq!(0, result.scanned_entries);
}

#[test]
fn cancellation_keeps_partial_counters() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(50)
        .max_depth(2)
        .seed(11)
        .open();

    let observer = Observer::default();
    observer.cancel.store(true, Ordering::Relaxed);

    let result = fs.get_directory_size("C:\\", true, Some(&observer));
    assert_eq!(Err(mirage_fs::Error::Cancelled), result.status);

    Ok(())
}
