//! Synchronizing a document against file-backed stores.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use taskline_core::{
    Authority, FileConnector, FileStore, LineBuffer, StoreConfig, StoreRegistry, SyncConfig,
    SyncEngine, TaskStore,
};

fn write_config(dir: &Path) -> SyncConfig {
    let json = format!(
        r#"{{
            "default": {{
                "data_location": "{main}",
                "taskrc_location": "{rc}"
            }},
            "extra_stores": {{
                "work": {{ "data_location": "{work}" }}
            }}
        }}"#,
        main = dir.join("main").display(),
        rc = dir.join("taskrc").display(),
        work = dir.join("work").display(),
    );
    SyncConfig::from_json(&json).unwrap()
}

#[test]
fn sync_creates_tasks_in_each_store() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("taskrc"), "context=nothing-matches\n").unwrap();
    let config = write_config(dir.path());
    let registry = StoreRegistry::from_config(&config, &FileConnector).unwrap();

    let document = LineBuffer::from_text(
        "# Plan\n\
         - [ ] release\n\
         \x20   - [ ] write notes\n\
         - [ ] standup @work\n",
    );
    let mut engine = SyncEngine::new(document, registry);
    engine.batch_load_identities().unwrap();
    engine.load_wrappers(Authority::Buffer).unwrap();
    assert_eq!(engine.save_in_dependency_order().unwrap(), vec![2, 3, 1]);

    let text = engine.into_document().to_text();
    assert!(text.ends_with('\n'));
    assert_eq!(text.matches("#uuid:").count(), 3);

    let main = FileStore::open("default", &config.default_store()).unwrap();
    let work = FileStore::open("work", &config.extra_store_configs()["work"]).unwrap();
    assert_eq!(main.query(&Default::default()).unwrap().len(), 2);
    assert_eq!(work.query(&Default::default()).unwrap().len(), 1);
}

#[test]
fn store_wins_reload_rewrites_lines() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    let store = FileStore::open("default", &config.default_store()).unwrap();
    let saved = store
        .save(taskline_core::Task::new("renamed in store"))
        .unwrap();
    drop(store);

    let registry = StoreRegistry::from_config(&config, &FileConnector).unwrap();
    let document = LineBuffer::from_lines([format!("- [ ] old name #uuid:{}", saved.uuid)]);
    let mut engine = SyncEngine::new(document, registry);
    engine.batch_load_identities().unwrap();
    engine.load_wrappers(Authority::Store).unwrap();

    assert_eq!(engine.render_wrappers(), 1);
    assert_eq!(
        engine.document().lines()[0],
        format!("- [ ] renamed in store #uuid:{}", saved.uuid)
    );
}

#[test]
fn store_config_paths_expand() {
    let config = StoreConfig::new("/tmp/data", "/tmp/rc");
    assert_eq!(config.data_path(), Path::new("/tmp/data"));
    assert_eq!(config.taskrc_path(), Path::new("/tmp/rc"));
}
