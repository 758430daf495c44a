use mirage_fs::{ChangeAction, ChangeNotification, Config, OpFlags, RandomAccess};
use std::sync::{Arc, Mutex};
use test_log::test;

fn empty_fs() -> mirage_fs::FileSystem {
    Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open()
}

#[test]
fn commit_installs_the_bytes() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    let mut writer = fs.create_writer("C:\\out.bin", OpFlags::ALLOW_OVERWRITE)?;
    writer.write(&[1, 2])?;
    writer.write(&[3, 4])?;
    writer.commit()?;

    let mut reader = fs.create_reader("C:\\out.bin")?;
    assert_eq!(4, reader.size());
    assert_eq!(vec![1, 2, 3, 4], reader.read_to_end()?);

    // Second commit is a no-op and succeeds.
    writer.commit()?;
    assert_eq!(
        vec![1, 2, 3, 4],
        fs.create_reader("C:\\out.bin")?.read_to_end()?
    );

    Ok(())
}

#[test]
fn second_writer_needs_overwrite() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    let mut writer = fs.create_writer("C:\\out.bin", OpFlags::NONE)?;
    writer.write(&[1])?;
    writer.commit()?;

    assert_eq!(
        Err(mirage_fs::Error::AlreadyExists),
        fs.create_writer("C:\\out.bin", OpFlags::NONE).map(|_| ())
    );

    let mut replacement = fs.create_writer("C:\\out.bin", OpFlags::ALLOW_OVERWRITE)?;
    replacement.write(&[42])?;
    replacement.commit()?;

    assert_eq!(vec![42], fs.create_reader("C:\\out.bin")?.read_to_end()?);
    Ok(())
}

#[test]
fn dropped_writer_is_a_silent_cancel() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    {
        let mut writer = fs.create_writer("C:\\ghost.txt", OpFlags::NONE)?;
        writer.write(b"never committed")?;
    }

    assert_eq!(
        Err(mirage_fs::Error::NotFound),
        fs.get_attributes("C:\\ghost.txt")
    );

    Ok(())
}

#[test]
fn commit_races_lose_to_the_tree() -> mirage_fs::Result<()> {
    // Validation happens again at commit time: an entry appearing between
    // create_writer and commit wins unless overwrite was requested.
    let fs = empty_fs();

    let mut slow = fs.create_writer("C:\\contested.txt", OpFlags::NONE)?;
    slow.write(b"late")?;

    let mut fast = fs.create_writer("C:\\contested.txt", OpFlags::NONE)?;
    fast.write(b"early")?;
    fast.commit()?;

    assert_eq!(Err(mirage_fs::Error::AlreadyExists), slow.commit());
    assert_eq!(
        b"early".to_vec(),
        fs.create_reader("C:\\contested.txt")?.read_to_end()?
    );

    Ok(())
}

#[test]
fn commit_notifies_the_parent_watcher() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    let events: Arc<Mutex<Vec<(ChangeAction, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    fs.watch_directory(
        "C:\\",
        Arc::new(move |notification: &ChangeNotification| {
            let mut events = sink.lock().expect("lock is poisoned");
            for change in &notification.changes {
                events.push((change.action, change.name.clone()));
            }
        }),
    )?;

    let mut writer = fs.create_writer("C:\\fresh.txt", OpFlags::NONE)?;
    writer.write(b"payload")?;
    writer.commit()?;

    let events = events.lock().expect("lock is poisoned");
    assert_eq!(
        vec![(ChangeAction::Added, "fresh.txt".to_owned())],
        *events
    );

    Ok(())
}
