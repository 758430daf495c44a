use mirage_fs::Config;
use test_log::test;

#[test]
fn config_json_round_trips() {
    let fs = Config::default().open();

    let json = fs.config_json();
    assert!(json.contains("\"maxChildrenPerDirectory\":42"));
    assert!(json.contains("\"seed\":42"));
    assert!(json.contains("\"virtualSpeedLimit\":\"0\""));

    assert!(!fs.something_to_save());

    fs.set_config_json(r#"{"latencyMs":5}"#);
    assert!(fs.something_to_save());
    assert!(fs.config_json().contains("\"latencyMs\":5"));
}

#[test]
fn latency_change_keeps_the_forest() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open();

    fs.create_directory("C:\\marker")?;

    // Latency and speed limit are not structural.
    fs.set_config_json(
        r#"{"maxChildrenPerDirectory":0,"maxDepth":10,"seed":1,"latencyMs":1,"virtualSpeedLimit":"4 MiB"}"#,
    );
    assert!(fs.get_attributes("C:\\marker").is_ok());

    Ok(())
}

#[test]
fn structural_change_drops_the_forest() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open();

    fs.create_directory("C:\\marker")?;

    fs.set_config_json(r#"{"maxChildrenPerDirectory":0,"maxDepth":10,"seed":2}"#);
    assert_eq!(
        Err(mirage_fs::Error::NotFound),
        fs.get_attributes("C:\\marker")
    );

    Ok(())
}

#[test]
fn invalid_speed_text_is_ignored() {
    let fs = Config::default().open();

    fs.set_config_json(r#"{"virtualSpeedLimit":"3 MiB"}"#);
    assert!(fs.config_json().contains("\"virtualSpeedLimit\":\"3 MiB\""));

    fs.set_config_json(r#"{"virtualSpeedLimit":"ludicrous speed"}"#);
    assert!(fs.config_json().contains("\"virtualSpeedLimit\":\"3 MiB\""));
}

#[test]
fn schema_capabilities_and_metadata_are_wellformed() {
    let fs = Config::default().open();

    let schema: serde_json::Value =
        serde_json::from_str(fs.config_schema()).expect("schema is valid JSON");
    assert_eq!(5, schema["fields"].as_array().expect("fields").len());

    let caps: serde_json::Value =
        serde_json::from_str(fs.capabilities()).expect("capabilities are valid JSON");
    assert_eq!(1, caps["version"]);
    assert_eq!(true, caps["operations"]["copy"]);
    assert_eq!(4, caps["concurrency"]["copyMoveMax"]);

    let metadata = fs.metadata();
    assert_eq!("fk", metadata.short_id);
    assert!(!metadata.name.is_empty());
}

#[test]
fn properties_document_shape() -> mirage_fs::Result<()> {
    let fs = Config::default()
        .max_children_per_directory(0)
        .seed(1)
        .open();

    let mut writer = fs.create_writer("C:\\file.bin", mirage_fs::OpFlags::NONE)?;
    writer.write(&[0u8; 77])?;
    writer.commit()?;

    let properties: serde_json::Value =
        serde_json::from_str(&fs.get_item_properties("C:\\file.bin")?)
            .expect("properties are valid JSON");

    assert_eq!(1, properties["version"]);
    assert_eq!("properties", properties["title"]);

    let fields = properties["sections"][0]["fields"]
        .as_array()
        .expect("fields array");
    let size_field = fields
        .iter()
        .find(|field| field["key"] == "sizeBytes")
        .expect("size field present");
    assert_eq!("77", size_field["value"]);

    // Directories omit the size field.
    let dir_properties: serde_json::Value =
        serde_json::from_str(&fs.get_item_properties("C:\\")?).expect("valid JSON");
    let dir_fields = dir_properties["sections"][0]["fields"]
        .as_array()
        .expect("fields array");
    assert!(dir_fields.iter().all(|field| field["key"] != "sizeBytes"));
    assert!(dir_fields
        .iter()
        .any(|field| field["key"] == "type" && field["value"] == "directory"));

    Ok(())
}

#[test]
fn drive_info_and_menu() {
    use mirage_fs::{DriveMetadata, MenuItemFlags, NavigationMenuSource};

    let fs = Config::default().open();

    let info = DriveMetadata::get_drive_info(&fs, "C:\\");
    assert_eq!(Some("MirageFS".to_owned()), info.file_system);
    let total = info.total_bytes.expect("total");
    assert_eq!(Some(total / 2), info.free_bytes);

    let menu = NavigationMenuSource::get_menu(&fs);
    assert_eq!(3, menu.len());
    assert!(menu[0].flags.contains(MenuItemFlags::HEADER));
    assert!(menu[1].flags.contains(MenuItemFlags::SEPARATOR));
    assert_eq!("/", menu[2].path);

    assert!(fs.get_drive_menu("C:\\").is_empty());
    assert_eq!(Err(mirage_fs::Error::Unsupported), fs.execute_menu(1));
}
