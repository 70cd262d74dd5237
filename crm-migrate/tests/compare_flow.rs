mod common;

use std::fs;
use std::path::Path;

use crm_migrate::{MigrateConfig, MigrateError};
use crm_migrate::host::Instance;
use crm_migrate::output::MemoryReporter;
use crm_migrate::transfer::Bundle;
use crm_migrate::transfer::compare::get_diff_data;
use crm_migrate::transfer::runner::{CompareRun, Comparer, Exporter};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{instance, row};

fn write_bundle(root: &Path, entity_type: &str, content: &str) {
    fs::create_dir_all(root.join("Entities")).unwrap();
    fs::write(root.join("Entities").join(format!("{}.json", entity_type)), content).unwrap();
}

fn compare(live: &mut Instance, config: &MigrateConfig, bundle: &Path, result: &Path, from_date: Option<&str>) -> CompareRun {
    let reporter = MemoryReporter::new();
    let ctx = live.context();
    Comparer::new(config, &reporter)
        .run(&ctx, bundle, result, &[], from_date)
        .unwrap()
}

#[test]
fn test_both_modified_goes_to_skipped_only() {
    let bundle = tempfile::tempdir().unwrap();
    let result = tempfile::tempdir().unwrap();
    write_bundle(
        bundle.path(),
        "Account",
        "[\n{\"id\":\"9\",\"modifiedAt\":\"2023-12-01 00:00:00\",\"name\":\"Old\"}\n]\n",
    );
    let mut live = instance(&[(
        "Account",
        json!({"id": "9", "modifiedAt": "2024-02-01 00:00:00", "name": "New", "deleted": false}),
    )]);

    let mut config = MigrateConfig::default();
    config.compare.verbose = true;
    let run = compare(&mut live, &config, bundle.path(), result.path(), Some("2024-01-01"));

    let account = &run.results["Account"];
    assert_eq!(account.both_modified(), 1);
    assert_eq!(account.modified(), 0);
    assert!(!result.path().join("changed").exists());

    let skipped = fs::read_to_string(result.path().join("skipped/prev/Entities/Account.json")).unwrap();
    assert_eq!(
        skipped,
        "[\n{\"id\":\"9\",\"modifiedAt\":\"2023-12-01 00:00:00\",\"name\":\"Old\"}\n]\n"
    );
    assert!(result.path().join("skipped/actual/Entities/Account.json").exists());
}

#[test]
fn test_both_modified_without_verbose_writes_nothing() {
    let bundle = tempfile::tempdir().unwrap();
    let result = tempfile::tempdir().unwrap();
    write_bundle(
        bundle.path(),
        "Account",
        "[\n{\"id\":\"9\",\"modifiedAt\":\"2023-12-01 00:00:00\",\"name\":\"Old\"}\n]\n",
    );
    let mut live = instance(&[(
        "Account",
        json!({"id": "9", "modifiedAt": "2024-02-01 00:00:00", "name": "New", "deleted": false}),
    )]);

    let run = compare(&mut live, &MigrateConfig::default(), bundle.path(), result.path(), Some("2024-01-01"));
    assert_eq!(run.results["Account"].both_modified(), 1);
    assert!(!result.path().join("changed").exists());
    assert!(!result.path().join("skipped").exists());
}

#[test]
fn test_compare_after_export_detects_each_kind_of_change() {
    let mut live = common::source_instance();
    let bundle = tempfile::tempdir().unwrap();
    let result = tempfile::tempdir().unwrap();
    let config = MigrateConfig::default();
    {
        let reporter = MemoryReporter::new();
        let ctx = live.context();
        Exporter::new(&config, &reporter)
            .run(&ctx, &Bundle::new(bundle.path()), &[])
            .unwrap();
    }

    // a1 renamed without touching modifiedAt, a2 soft-deleted, a3 created later
    let mut edited = instance(&[]);
    for entity_type in ["User", "Note"] {
        for r in live.store.rows(entity_type) {
            edited.store.insert(entity_type, r.clone());
        }
    }
    let mut a1 = live.store.rows("Account")[0].clone();
    a1.insert("name".into(), json!("Acme Renamed"));
    let mut a2 = live.store.rows("Account")[1].clone();
    a2.insert("deleted".into(), json!(true));
    edited.store.insert("Account", a1);
    edited.store.insert("Account", a2);
    edited.store.insert(
        "Account",
        row(json!({"id": "a3", "name": "Gamma", "deleted": false,
                   "createdAt": "2024-06-01 00:00:00", "modifiedAt": "2024-06-01 00:00:00"})),
    );

    let run = compare(&mut edited, &config, bundle.path(), result.path(), None);
    let account = &run.results["Account"];

    assert_eq!(account.total(), 2);
    assert_eq!(account.deleted(), 1);
    assert_eq!(account.modified(), 1);
    assert_eq!(account.created(), 1);
    assert_eq!(account.both_modified(), 0);
    // Newest bundle modifiedAt of the Account rows
    assert_eq!(account.from_date(), Some("2023-03-02 00:00:00"));

    let prev = fs::read_to_string(result.path().join("changed/prev/Entities/Account.json")).unwrap();
    assert!(prev.contains("{\"id\":\"a1\",\"name\":\"Acme\"}"));
    assert!(prev.contains("{\"id\":\"a2\",\"deleted\":false}"));

    let actual = fs::read_to_string(result.path().join("changed/actual/Entities/Account.json")).unwrap();
    assert!(actual.contains("\"id\":\"a3\""));
    assert!(actual.contains("{\"id\":\"a1\",\"name\":\"Acme Renamed\"}"));
    assert!(actual.contains("{\"id\":\"a2\",\"deleted\":true"));

    // Untouched entity types produce no output
    assert_eq!(run.results["User"].modified(), 0);
    assert!(!result.path().join("changed/prev/Entities/User.json").exists());
}

#[test]
fn test_diff_is_strict_over_shared_keys() {
    let master = row(json!({"a": 1, "b": "1", "c": [1], "d": null, "only": 1}));
    let slave = row(json!({"a": 1, "b": 1, "c": [1], "d": false}));

    let diff = get_diff_data(&master, &slave);
    assert_eq!(diff, row(json!({"b": "1", "d": null})));
    for (key, value) in &diff {
        assert_ne!(slave.get(key), Some(value));
    }
}

#[test]
fn test_invalid_from_date_is_rejected_before_reading_the_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let result = tempfile::tempdir().unwrap();
    let mut live = instance(&[]);
    let reporter = MemoryReporter::new();
    let ctx = live.context();

    // The bundle path does not exist; the date is checked first
    let err = Comparer::new(&MigrateConfig::default(), &reporter)
        .run(&ctx, &dir.path().join("missing"), result.path(), &[], Some("yesterday"))
        .unwrap_err();
    assert!(matches!(err, MigrateError::Config(_)));
    assert!(reporter.events().is_empty());
}
