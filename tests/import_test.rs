//! Historical CSV import: file order, all-or-nothing commit.

use resistance_daq::import::{load_csv, ImportError};
use resistance_daq::series::{PlotPoint, SeriesStore};
use std::path::PathBuf;
use tempfile::TempDir;

fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn import_round_trip_preserves_file_order() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "sample_a.csv",
        "abs_time_s,voltage_V,current_A,resistance_Ohm\n\
         0,1.0,0.2,5.0\n\
         1,1.0,0.13,7.5\n",
    );
    let store = SeriesStore::new();

    let name = load_csv(&path, &store).unwrap();
    assert_eq!(name, "sample_a.csv");

    let series = store.get("sample_a.csv").unwrap();
    assert_eq!(
        series.points(),
        &[PlotPoint::new(0.0, 5.0), PlotPoint::new(1.0, 7.5)]
    );
}

#[test]
fn extra_fields_are_tolerated() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "wide.csv",
        "t,v,i,r,stage\n\
         0,1.0,0.2,5.0,warmup\n",
    );
    let store = SeriesStore::new();

    load_csv(&path, &store).unwrap();
    assert_eq!(
        store.get("wide.csv").unwrap().points(),
        &[PlotPoint::new(0.0, 5.0)]
    );
}

#[test]
fn bad_number_aborts_and_commits_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "broken.csv",
        "t,v,i,r\n\
         0,1.0,0.2,5.0\n\
         1,1.0,0.13,oops\n",
    );
    let store = SeriesStore::new();

    let err = load_csv(&path, &store).unwrap_err();
    assert!(
        matches!(err, ImportError::BadNumber { row: 3, field: 3, .. }),
        "unexpected error: {err}"
    );
    assert!(store.is_empty(), "partial results must not be applied");
}

#[test]
fn short_row_aborts_and_commits_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "short.csv",
        "t,v,i,r\n\
         0,1.0\n",
    );
    let store = SeriesStore::new();

    let err = load_csv(&path, &store).unwrap_err();
    assert!(
        matches!(err, ImportError::ShortRow { row: 2, found: 2 }),
        "unexpected error: {err}"
    );
    assert!(store.is_empty());
}

#[test]
fn missing_file_is_a_read_error() {
    let store = SeriesStore::new();
    let err = load_csv(std::path::Path::new("/no/such/file.csv"), &store).unwrap_err();
    assert!(matches!(err, ImportError::Read { .. }));
}

#[test]
fn re_importing_the_same_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "twice.csv", "t,v,i,r\n0,1.0,0.2,5.0\n");
    let store = SeriesStore::new();

    load_csv(&path, &store).unwrap();
    let err = load_csv(&path, &store).unwrap_err();
    assert!(matches!(err, ImportError::Duplicate(_)));
    assert_eq!(store.len(), 1);
}

#[test]
fn header_only_file_yields_an_empty_series() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "empty.csv", "t,v,i,r\n");
    let store = SeriesStore::new();

    load_csv(&path, &store).unwrap();
    assert!(store.get("empty.csv").unwrap().is_empty());
}
