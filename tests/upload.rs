// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use bibliolight::catalog::{AUTHORS, BIBLIOGRAPHY_FIELDS, ID_COLUMN, SOURCE_TITLE, TITLE, YEAR};
use bibliolight::types::DataValue;
use bibliolight::{Chart, ChartKind, Database, EngineKind, ErrorKind, StoreConfig};
use tempfile::{tempdir, TempDir};
use test_case::test_case;
use tokio::runtime::Runtime;

fn init_logger() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init()
    });
}

fn config(engine: EngineKind, dir: &TempDir) -> StoreConfig {
    match engine {
        EngineKind::Memory => StoreConfig::in_memory(),
        EngineKind::Disk => StoreConfig::default_for_test(dir.path().to_path_buf()),
    }
}

/// Run `f` against a fresh database on `engine`.
fn with_db<Fut: Future<Output = ()>>(engine: EngineKind, f: impl FnOnce(Database) -> Fut) {
    init_logger();
    let dir = tempdir().unwrap();
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = Database::open(&config(engine, &dir)).await.unwrap();
        f(db).await
    });
}

/// Build a CSV buffer with a header row.
fn csv(header: &[&str], rows: &[Vec<&str>]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(header).unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.into_inner().unwrap()
}

fn years(values: &[&str]) -> Vec<u8> {
    let rows: Vec<_> = values.iter().map(|y| vec![*y]).collect();
    csv(&[YEAR], &rows)
}

fn entries(chart: &Chart) -> Vec<(&str, u64)> {
    chart.categories().zip(chart.counts()).collect()
}

#[test_case(EngineKind::Memory ; "memory")]
#[test_case(EngineKind::Disk ; "disk")]
fn schema_creation_is_idempotent(engine: EngineKind) {
    with_db(engine, |db| async move {
        let id = db.table().id();
        for _ in 0..5 {
            assert_eq!(db.ensure_table().await.unwrap(), id);
        }
        assert_eq!(db.catalog().table_count(), 1);

        let columns = db.table().all_columns();
        assert_eq!(columns[0].name(), ID_COLUMN);
        let names: Vec<_> = columns[1..].iter().map(|c| c.name()).collect();
        assert_eq!(names, BIBLIOGRAPHY_FIELDS.to_vec());
        assert!(columns[1..].iter().all(|c| c.is_nullable()));
    });
}

#[test_case(EngineKind::Memory ; "memory")]
#[test_case(EngineKind::Disk ; "disk")]
fn load_replaces_never_appends(engine: EngineKind) {
    with_db(engine, |db| async move {
        assert_eq!(
            db.load_csv(&years(&["2020", "2020", "2021"])).await.unwrap(),
            3
        );
        assert_eq!(db.load_csv(&years(&["1999"])).await.unwrap(), 1);

        let chart = db.chart(ChartKind::PublicationsByYear).await.unwrap();
        assert_eq!(entries(&chart), vec![("1999", 1)]);
        assert_eq!(db.records().await.unwrap().cardinality(), 1);
    });
}

#[test_case(EngineKind::Memory ; "memory")]
#[test_case(EngineKind::Disk ; "disk")]
fn group_by_year(engine: EngineKind) {
    with_db(engine, |db| async move {
        db.load_csv(&years(&["2019", "2020", "2019", "2021", "2020"]))
            .await
            .unwrap();
        let chart = db.chart(ChartKind::PublicationsByYear).await.unwrap();
        assert_eq!(entries(&chart), vec![("2019", 2), ("2020", 2), ("2021", 1)]);
    });
}

#[test_case(EngineKind::Memory ; "memory")]
#[test_case(EngineKind::Disk ; "disk")]
fn split_authors(engine: EngineKind) {
    with_db(engine, |db| async move {
        db.load_csv(&csv(&[AUTHORS], &[vec!["Smith J., Doe A., Lee K."]]))
            .await
            .unwrap();
        let chart = db.chart(ChartKind::TopAuthors).await.unwrap();
        assert_eq!(
            entries(&chart),
            vec![("Smith J.", 1), ("Doe A.", 1), ("Lee K.", 1)]
        );
    });
}

#[test_case(EngineKind::Memory ; "memory")]
#[test_case(EngineKind::Disk ; "disk")]
fn keep_top_ten_authors(engine: EngineKind) {
    with_db(engine, |db| async move {
        let names: Vec<String> = (1..=15).map(|i| format!("Author {i:02}")).collect();
        let mut rows = vec![];
        for (i, name) in names.iter().enumerate() {
            rows.extend(std::iter::repeat_n(vec![name.as_str()], i + 1));
        }
        db.load_csv(&csv(&[AUTHORS], &rows)).await.unwrap();

        let chart = db.chart(ChartKind::TopAuthors).await.unwrap();
        let expected: Vec<(&str, u64)> = (6..=15)
            .rev()
            .map(|i| (names[i - 1].as_str(), i as u64))
            .collect();
        assert_eq!(entries(&chart), expected);
    });
}

#[test_case(EngineKind::Memory ; "memory")]
#[test_case(EngineKind::Disk ; "disk")]
fn empty_table_draws_empty_charts(engine: EngineKind) {
    with_db(engine, |db| async move {
        assert_eq!(db.records().await.unwrap().cardinality(), 0);
        for kind in ChartKind::ALL {
            let chart = db.chart(kind).await.unwrap();
            assert!(chart.is_empty(), "{kind} is not empty");
        }
    });
}

#[test_case(EngineKind::Memory ; "memory")]
#[test_case(EngineKind::Disk ; "disk")]
fn subset_columns_on_load(engine: EngineKind) {
    with_db(engine, |db| async move {
        // no Source title, one unknown column
        let buf = csv(
            &[AUTHORS, TITLE, YEAR, "Reviewer"],
            &[vec!["Smith J.", "On graphs", "2020", "anonymous"]],
        );
        let summary = db.upload(&buf).await.unwrap();
        assert_eq!(summary.rows_written, 1);
        assert_eq!(summary.ignored_columns, vec!["Reviewer".to_string()]);
        assert!(summary.missing_columns.contains(&SOURCE_TITLE.to_string()));
        assert!(db.table().get_column_by_name("Reviewer").is_none());

        let set = db
            .fetch_projection(&[AUTHORS, SOURCE_TITLE, "DOI"])
            .await
            .unwrap();
        let rows: Vec<_> = set.chunks().iter().flat_map(|c| c.rows()).collect();
        assert_eq!(
            rows,
            vec![vec![DataValue::from("Smith J."), DataValue::Null, DataValue::Null]]
        );
    });
}

#[test_case(EngineKind::Memory ; "memory")]
#[test_case(EngineKind::Disk ; "disk")]
fn short_rows_load_missing_fields_as_null(engine: EngineKind) {
    with_db(engine, |db| async move {
        let summary = db
            .upload(b"Authors,Year\nSmith J.\nDoe A.,2020\n")
            .await
            .unwrap();
        assert_eq!(summary.rows_written, 2);

        let set = db.fetch_projection(&[AUTHORS, YEAR]).await.unwrap();
        let rows: Vec<_> = set.chunks().iter().flat_map(|c| c.rows()).collect();
        assert_eq!(
            rows,
            vec![
                vec![DataValue::from("Smith J."), DataValue::Null],
                vec![DataValue::from("Doe A."), DataValue::from("2020")],
            ]
        );
        let chart = db.chart(ChartKind::PublicationsByYear).await.unwrap();
        assert_eq!(entries(&chart), vec![("", 1), ("2020", 1)]);
    });
}

#[test_case(EngineKind::Memory ; "memory")]
#[test_case(EngineKind::Disk ; "disk")]
fn failed_uploads_leave_table_unmodified(engine: EngineKind) {
    with_db(engine, |db| async move {
        db.load_csv(&years(&["2020", "2021"])).await.unwrap();

        let too_long = b"Year,Title\n2022,x,y\n".as_slice();
        let header_only = b"Year,Title\n".as_slice();
        let invalid_utf8 = b"Year\n\xff\n".as_slice();
        for buf in [b"".as_slice(), too_long, header_only, invalid_utf8] {
            let err = db.upload(buf).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ParseFailed);
        }
        let err = db.replace_all(vec![]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoadFailed);

        let chart = db.chart(ChartKind::PublicationsByYear).await.unwrap();
        assert_eq!(entries(&chart), vec![("2020", 1), ("2021", 1)]);
    });
}

#[test_case(EngineKind::Memory ; "memory")]
#[test_case(EngineKind::Disk ; "disk")]
fn upload_scopus_export(engine: EngineKind) {
    with_db(engine, |db| async move {
        let buf = std::fs::read(Path::new("tests/csv/scopus_sample.csv")).unwrap();
        let summary = db.upload(&buf).await.unwrap();
        assert_eq!(summary.rows_written, 6);
        assert_eq!(summary.total_records(), 6);
        assert_eq!(summary.ignored_columns, vec!["Notes".to_string()]);
        assert_eq!(
            summary.available_columns(),
            vec![AUTHORS, TITLE, "DOI", YEAR, SOURCE_TITLE]
        );

        let years = db.chart(ChartKind::PublicationsByYear).await.unwrap();
        assert_eq!(
            entries(&years),
            vec![("", 1), ("2019", 2), ("2020", 2), ("2021", 1)]
        );
        let authors = db.chart(ChartKind::TopAuthors).await.unwrap();
        assert_eq!(
            entries(&authors),
            vec![
                ("Doe A.", 3),
                ("Smith J.", 2),
                ("Lee K.", 2),
                ("Garcia M.", 2),
                ("", 1)
            ]
        );
        let venues = db.chart(ChartKind::TopVenues).await.unwrap();
        assert_eq!(
            entries(&venues),
            vec![
                ("Scientometrics", 2),
                ("Journal of Informetrics", 2),
                ("Quantitative Science Studies", 1),
                ("Proceedings of ISSI", 1)
            ]
        );
    });
}

#[test_case(EngineKind::Memory ; "memory")]
#[test_case(EngineKind::Disk ; "disk")]
fn readers_never_see_partial_replace(engine: EngineKind) {
    init_logger();
    let dir = tempdir().unwrap();
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = Arc::new(Database::open(&config(engine, &dir)).await.unwrap());
        let small = years(&["2000"; 50]);
        let large = years(&["2001"; 2000]);
        db.load_csv(&small).await.unwrap();

        let writer = {
            let db = db.clone();
            tokio::spawn(async move {
                for i in 0..10 {
                    let buf = if i % 2 == 0 { &large } else { &small };
                    db.load_csv(buf).await.unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move {
                    for _ in 0..20 {
                        let chart = db.chart(ChartKind::PublicationsByYear).await.unwrap();
                        let entries = entries(&chart);
                        assert!(
                            entries == vec![("2000", 50)] || entries == vec![("2001", 2000)],
                            "unexpected contents: {entries:?}"
                        );
                    }
                })
            })
            .collect();
        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    });
}

#[test]
fn disk_contents_survive_reopen() {
    init_logger();
    let dir = tempdir().unwrap();
    let rt = Runtime::new().unwrap();
    let config = StoreConfig::default_for_test(dir.path().to_path_buf());
    rt.block_on(async {
        let db = Database::open(&config).await.unwrap();
        db.load_csv(&years(&["2019", "2020"])).await.unwrap();
        db.shutdown();

        let db = Database::open(&config).await.unwrap();
        assert_eq!(db.catalog().table_count(), 1);
        let chart = db.chart(ChartKind::PublicationsByYear).await.unwrap();
        assert_eq!(entries(&chart), vec![("2019", 1), ("2020", 1)]);

        // identifiers are never reused
        db.load_csv(&years(&["2021"])).await.unwrap();
        let set = db.fetch_projection(&[ID_COLUMN]).await.unwrap();
        assert_eq!(set.chunks()[0].row(0), vec![DataValue::Int64(3)]);
        db.shutdown();
    });
    let manifest = dir.path().join("bibliometrics").join("manifest.json");
    assert!(manifest.exists());
}

#[test]
fn databases_are_isolated_by_name() {
    init_logger();
    let dir = tempdir().unwrap();
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let mut first = StoreConfig::default_for_test(dir.path().to_path_buf());
        first.database = "first".into();
        let mut second = first.clone();
        second.database = "second".into();

        let a = Database::open(&first).await.unwrap();
        let b = Database::open(&second).await.unwrap();
        a.load_csv(&years(&["2019"])).await.unwrap();
        assert_eq!(a.records().await.unwrap().cardinality(), 1);
        assert_eq!(b.records().await.unwrap().cardinality(), 0);
    });
}
