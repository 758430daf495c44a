use mirage_fs::{
    Config, ItemCompletion, OpFlags, OperationCallback, ProgressReport, RandomAccess,
};
use std::sync::Mutex;
use test_log::test;

fn empty_fs() -> mirage_fs::FileSystem {
    Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open()
}

fn write_file(fs: &mirage_fs::FileSystem, path: &str, bytes: &[u8]) -> mirage_fs::Result<()> {
    let mut writer = fs.create_writer(path, OpFlags::NONE)?;
    writer.write(bytes)?;
    writer.commit()
}

#[derive(Default)]
struct Recorder {
    completions: Mutex<Vec<(u32, mirage_fs::Result<()>)>>,
    progress_ticks: Mutex<u32>,
}

impl OperationCallback for Recorder {
    fn progress(&self, _report: &ProgressReport<'_>) -> mirage_fs::Result<()> {
        *self.progress_ticks.lock().expect("lock is poisoned") += 1;
        Ok(())
    }

    fn item_completed(&self, completion: &ItemCompletion<'_>) -> mirage_fs::Result<()> {
        self.completions
            .lock()
            .expect("lock is poisoned")
            .push((completion.item_index, completion.status.clone()));
        Ok(())
    }
}

#[test]
fn bulk_copy_recurses_into_directories() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    fs.create_directory("C:\\src")?;
    fs.create_directory("C:\\src\\inner")?;
    write_file(&fs, "C:\\src\\a.txt", b"alpha")?;
    write_file(&fs, "C:\\src\\inner\\b.txt", b"bravo")?;
    fs.create_directory("C:\\dst")?;

    let recorder = Recorder::default();
    fs.copy_items(
        &["C:\\src"],
        "C:\\dst",
        OpFlags::RECURSIVE,
        None,
        Some(&recorder),
    )?;

    assert_eq!(
        b"alpha".to_vec(),
        fs.create_reader("C:\\dst\\src\\a.txt")?.read_to_end()?
    );
    assert_eq!(
        b"bravo".to_vec(),
        fs.create_reader("C:\\dst\\src\\inner\\b.txt")?.read_to_end()?
    );

    // Source remains.
    assert!(fs.get_attributes("C:\\src\\a.txt").is_ok());

    // Directory frame + child + inner frame + inner child.
    let completions = recorder.completions.lock().expect("lock is poisoned");
    assert_eq!(4, completions.len());
    assert!(completions.iter().all(|(_, status)| status.is_ok()));

    // Item indices are sequential.
    let indices: Vec<u32> = completions.iter().map(|(index, _)| *index).collect();
    assert_eq!((0..4).collect::<Vec<u32>>(), indices);

    Ok(())
}

#[test]
fn bulk_move_cleans_up_the_source_directory() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    fs.create_directory("C:\\src")?;
    write_file(&fs, "C:\\src\\a.txt", b"alpha")?;
    write_file(&fs, "C:\\src\\b.txt", b"bravo")?;
    fs.create_directory("C:\\dst")?;

    fs.move_items(&["C:\\src"], "C:\\dst", OpFlags::RECURSIVE, None, None)?;

    assert_eq!(
        b"alpha".to_vec(),
        fs.create_reader("C:\\dst\\src\\a.txt")?.read_to_end()?
    );
    assert_eq!(
        b"bravo".to_vec(),
        fs.create_reader("C:\\dst\\src\\b.txt")?.read_to_end()?
    );

    // The emptied source directory is gone.
    assert_eq!(Err(mirage_fs::Error::NotFound), fs.get_attributes("C:\\src"));

    Ok(())
}

#[test]
fn continue_on_error_reports_partial_copy() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    write_file(&fs, "C:\\one.txt", b"1")?;
    write_file(&fs, "C:\\two.txt", b"2")?;

    let recorder = Recorder::default();
    let result = fs.delete_items(
        &["C:\\one.txt", "C:\\missing.txt", "C:\\two.txt"],
        OpFlags::CONTINUE_ON_ERROR,
        None,
        Some(&recorder),
    );

    assert_eq!(Err(mirage_fs::Error::PartialCopy), result);

    // Both real files are gone despite the failure in the middle.
    assert_eq!(
        Err(mirage_fs::Error::NotFound),
        fs.get_attributes("C:\\one.txt")
    );
    assert_eq!(
        Err(mirage_fs::Error::NotFound),
        fs.get_attributes("C:\\two.txt")
    );

    let completions = recorder.completions.lock().expect("lock is poisoned");
    assert_eq!(3, completions.len());
    assert_eq!(Err(mirage_fs::Error::NotFound), completions[1].1);

    Ok(())
}

#[test]
fn first_failure_stops_without_continue_on_error() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    write_file(&fs, "C:\\keep.txt", b"kept")?;

    let result = fs.delete_items(
        &["C:\\missing.txt", "C:\\keep.txt"],
        OpFlags::NONE,
        None,
        None,
    );

    assert_eq!(Err(mirage_fs::Error::NotFound), result);
    assert!(fs.get_attributes("C:\\keep.txt").is_ok());

    Ok(())
}

#[test]
fn bulk_rename_keeps_parents() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    fs.create_directory("C:\\d")?;
    write_file(&fs, "C:\\d\\a.txt", b"a")?;
    write_file(&fs, "C:\\d\\b.txt", b"b")?;

    fs.rename_items(
        &[("C:\\d\\a.txt", "one.txt"), ("C:\\d\\b.txt", "two.txt")],
        OpFlags::NONE,
        None,
        None,
    )?;

    assert_eq!(b"a".to_vec(), fs.create_reader("C:\\d\\one.txt")?.read_to_end()?);
    assert_eq!(b"b".to_vec(), fs.create_reader("C:\\d\\two.txt")?.read_to_end()?);
    assert_eq!(
        Err(mirage_fs::Error::NotFound),
        fs.get_attributes("C:\\d\\a.txt")
    );

    Ok(())
}

#[test]
fn moving_into_the_own_subtree_is_refused() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    fs.create_directory("C:\\outer")?;
    fs.create_directory("C:\\outer\\inner")?;

    assert_eq!(
        Err(mirage_fs::Error::InvalidName),
        fs.move_item(
            "C:\\outer",
            "C:\\outer\\inner\\outer",
            OpFlags::RECURSIVE,
            None,
            None,
        )
    );

    Ok(())
}
