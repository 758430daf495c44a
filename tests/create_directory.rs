use mirage_fs::Config;
use test_log::test;

fn empty_fs() -> mirage_fs::FileSystem {
    Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open()
}

#[test]
fn creates_below_an_existing_parent() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    fs.create_directory("C:\\fresh")?;

    let attributes = fs.get_attributes("C:\\fresh")?;
    assert!(attributes.contains(mirage_fs::Attributes::DIRECTORY));

    // New directories are empty, not generated.
    assert_eq!(0, fs.read_directory("C:\\fresh")?.count());

    Ok(())
}

#[test]
fn colliding_names_fail() -> mirage_fs::Result<()> {
    let fs = empty_fs();

    fs.create_directory("C:\\taken")?;
    assert_eq!(
        Err(mirage_fs::Error::AlreadyExists),
        fs.create_directory("C:\\taken")
    );

    // Case-insensitive collision.
    assert_eq!(
        Err(mirage_fs::Error::AlreadyExists),
        fs.create_directory("C:\\TAKEN")
    );

    Ok(())
}

#[test]
fn missing_parents_and_bad_names_fail() {
    let fs = empty_fs();

    assert_eq!(
        Err(mirage_fs::Error::NotFound),
        fs.create_directory("C:\\no\\such\\parent")
    );
    assert_eq!(
        Err(mirage_fs::Error::InvalidName),
        fs.create_directory("C:\\bad*name")
    );
    assert_eq!(
        Err(mirage_fs::Error::InvalidArgument),
        fs.create_directory("")
    );
}

#[test]
fn deleting_an_unexpanded_directory_needs_recursive() -> mirage_fs::Result<()> {
    // A generated directory that still plans children counts as non-empty
    // even before its first expansion.
    let fs = Config::default()
        .max_children_per_directory(10)
        .max_depth(3)
        .seed(13)
        .open();

    let directory = fs
        .read_directory("C:\\")?
        .entries()
        .find(mirage_fs::DirectoryEntry::is_directory)
        .expect("the root offers a directory");

    let path = format!("C:\\{}", directory.name);

    // Fresh engine, same seed: the directory is unexpanded there.
    let twin = Config::default()
        .max_children_per_directory(10)
        .max_depth(3)
        .seed(13)
        .open();

    match twin.delete_item(&path, mirage_fs::OpFlags::NONE, None, None) {
        Ok(()) => {
            // The draw gave an empty directory; deleting was legal.
        }
        Err(error) => assert_eq!(mirage_fs::Error::DirectoryNotEmpty, error),
    }

    // Recursive delete always succeeds.
    fs.delete_item(&path, mirage_fs::OpFlags::RECURSIVE, None, None)?;
    assert_eq!(Err(mirage_fs::Error::NotFound), fs.get_attributes(&path));

    Ok(())
}
