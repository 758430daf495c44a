use mirage_fs::{Config, OpFlags, OperationCallback, ProgressReport, RandomAccess};
use std::sync::atomic::{AtomicU32, Ordering};
use test_log::test;

struct CancelAfterTicks {
    ticks: AtomicU32,
    cancel_after: u32,
}

impl OperationCallback for CancelAfterTicks {
    fn progress(&self, _report: &ProgressReport<'_>) -> mirage_fs::Result<()> {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn should_cancel(&self) -> bool {
        self.ticks.load(Ordering::Relaxed) > self.cancel_after
    }
}

#[test]
fn throttled_copy_cancels_after_two_ticks() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .virtual_speed_limit("1 KiB/s")
        .open();

    let payload = vec![0xA5u8; 4 * 1024];
    let mut writer = fs.create_writer("C:\\big.bin", OpFlags::NONE)?;
    writer.write(&payload)?;
    writer.commit()?;

    let callback = CancelAfterTicks {
        ticks: AtomicU32::new(0),
        cancel_after: 2,
    };

    let result = fs.copy_item(
        "C:\\big.bin",
        "C:\\copy.bin",
        OpFlags::NONE,
        None,
        Some(&callback),
    );
    assert_eq!(Err(mirage_fs::Error::Cancelled), result);

    // The source is unchanged; the destination may or may not exist.
    assert_eq!(payload, fs.create_reader("C:\\big.bin")?.read_to_end()?);

    Ok(())
}

#[test]
fn unlimited_copy_finishes_in_one_tick() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open();

    let mut writer = fs.create_writer("C:\\fast.bin", OpFlags::NONE)?;
    writer.write(&[1u8; 1024 * 1024])?;
    writer.commit()?;

    let callback = CancelAfterTicks {
        ticks: AtomicU32::new(0),
        cancel_after: u32::MAX,
    };

    fs.copy_item(
        "C:\\fast.bin",
        "C:\\fast2.bin",
        OpFlags::NONE,
        None,
        Some(&callback),
    )?;

    // Initial and final tick only.
    assert_eq!(2, callback.ticks.load(Ordering::Relaxed));
    assert_eq!(1024 * 1024, fs.create_reader("C:\\fast2.bin")?.size());

    Ok(())
}

#[test]
fn cancellation_before_start_mutates_nothing() {
    struct AlwaysCancelled;

    impl OperationCallback for AlwaysCancelled {
        fn should_cancel(&self) -> bool {
            true
        }
    }

    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open();

    let mut writer = fs
        .create_writer("C:\\victim.bin", OpFlags::NONE)
        .expect("writer opens");
    writer.write(&[1, 2, 3]).expect("write succeeds");
    writer.commit().expect("commit succeeds");

    let callback = AlwaysCancelled;
    assert_eq!(
        Err(mirage_fs::Error::Cancelled),
        fs.delete_item("C:\\victim.bin", OpFlags::NONE, None, Some(&callback))
    );

    assert!(fs.get_attributes("C:\\victim.bin").is_ok());
}
