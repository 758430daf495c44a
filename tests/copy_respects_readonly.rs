use mirage_fs::{
    Attributes, ChangeAction, ChangeNotification, Config, OpFlags, RandomAccess,
};
use std::sync::{Arc, Mutex};
use test_log::test;

fn write_file(fs: &mirage_fs::FileSystem, path: &str, bytes: &[u8]) -> mirage_fs::Result<()> {
    let mut writer = fs.create_writer(path, OpFlags::NONE)?;
    writer.write(bytes)?;
    writer.commit()
}

fn mark_readonly(fs: &mirage_fs::FileSystem, path: &str) -> mirage_fs::Result<()> {
    let mut info = fs.get_basic_info(path)?;
    info.attributes = info.attributes | Attributes::READONLY;
    fs.set_basic_info(path, &info)
}

#[test]
fn overwrite_yields_to_readonly() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open();

    fs.create_directory("C:\\src")?;
    fs.create_directory("C:\\dst")?;

    write_file(&fs, "C:\\src\\ro", &[7u8; 10])?;
    mark_readonly(&fs, "C:\\src\\ro")?;

    write_file(&fs, "C:\\dst\\ro", &[1u8; 3])?;
    mark_readonly(&fs, "C:\\dst\\ro")?;

    let events: Arc<Mutex<Vec<(ChangeAction, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    fs.watch_directory(
        "C:\\dst",
        Arc::new(move |notification: &ChangeNotification| {
            let mut events = sink.lock().expect("lock is poisoned");
            for change in &notification.changes {
                events.push((change.action, change.name.clone()));
            }
        }),
    )?;

    // A readonly destination resists a plain overwrite...
    assert_eq!(
        Err(mirage_fs::Error::AccessDenied),
        fs.copy_item(
            "C:\\src\\ro",
            "C:\\dst\\ro",
            OpFlags::ALLOW_OVERWRITE,
            None,
            None,
        )
    );

    // ...and both sides are untouched.
    assert_eq!(3, fs.create_reader("C:\\dst\\ro")?.size());
    assert_eq!(10, fs.create_reader("C:\\src\\ro")?.size());
    assert!(events.lock().expect("lock is poisoned").is_empty());

    // Replace-readonly makes it go through.
    fs.copy_item(
        "C:\\src\\ro",
        "C:\\dst\\ro",
        OpFlags::ALLOW_OVERWRITE | OpFlags::ALLOW_REPLACE_READONLY,
        None,
        None,
    )?;

    assert_eq!(10, fs.create_reader("C:\\dst\\ro")?.size());
    assert_eq!(
        vec![(ChangeAction::Added, "ro".to_owned())],
        *events.lock().expect("lock is poisoned")
    );

    Ok(())
}

#[test]
fn copy_without_overwrite_fails_on_existing() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open();

    write_file(&fs, "C:\\a.txt", b"source")?;
    write_file(&fs, "C:\\b.txt", b"existing")?;

    assert_eq!(
        Err(mirage_fs::Error::AlreadyExists),
        fs.copy_item("C:\\a.txt", "C:\\b.txt", OpFlags::NONE, None, None)
    );

    // Both sides unchanged.
    assert_eq!(
        b"source".to_vec(),
        fs.create_reader("C:\\a.txt")?.read_to_end()?
    );
    assert_eq!(
        b"existing".to_vec(),
        fs.create_reader("C:\\b.txt")?.read_to_end()?
    );

    Ok(())
}

#[test]
fn directory_copy_requires_recursive() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open();

    fs.create_directory("C:\\tree")?;
    write_file(&fs, "C:\\tree\\leaf.txt", b"leaf")?;

    assert_eq!(
        Err(mirage_fs::Error::DirectoryNotEmpty),
        fs.copy_item("C:\\tree", "C:\\tree2", OpFlags::NONE, None, None)
    );

    fs.copy_item("C:\\tree", "C:\\tree2", OpFlags::RECURSIVE, None, None)?;
    assert_eq!(
        b"leaf".to_vec(),
        fs.create_reader("C:\\tree2\\leaf.txt")?.read_to_end()?
    );

    // The copy is independent of the source.
    fs.delete_item("C:\\tree", OpFlags::RECURSIVE, None, None)?;
    assert_eq!(
        b"leaf".to_vec(),
        fs.create_reader("C:\\tree2\\leaf.txt")?.read_to_end()?
    );

    Ok(())
}

#[test]
fn readonly_delete_needs_consent() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open();

    write_file(&fs, "C:\\locked.txt", b"keep me")?;
    mark_readonly(&fs, "C:\\locked.txt")?;

    assert_eq!(
        Err(mirage_fs::Error::AccessDenied),
        fs.delete_item("C:\\locked.txt", OpFlags::NONE, None, None)
    );

    fs.delete_item(
        "C:\\locked.txt",
        OpFlags::ALLOW_REPLACE_READONLY,
        None,
        None,
    )?;
    assert_eq!(
        Err(mirage_fs::Error::NotFound),
        fs.get_attributes("C:\\locked.txt")
    );

    Ok(())
}
