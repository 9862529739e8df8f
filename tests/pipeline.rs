use std::fs;
use std::path::{Path, PathBuf};

use anyhow::bail;
use tempfile::TempDir;

use basic_cleaning::artifact::local::LocalArtifactStore;
use basic_cleaning::artifact::run::{RunRecord, RunStatus};
use basic_cleaning::artifact::{ArtifactRef, ArtifactSink, ArtifactSource, NewArtifact};
use basic_cleaning::config::CleaningConfig;
use basic_cleaning::error::{PipelineError, Stage};
use basic_cleaning::pipeline;

const RAW_LISTINGS: &str = "\
id,name,neighbourhood_group,price,last_review,reviews_per_month
2539,Clean & quiet apt home by the park,Brooklyn,80,2019-05-21,0.21
2595,Skylit Midtown Castle,Manhattan,5000,2019-06-01,0.38
3647,THE VILLAGE OF HARLEM....NEW YORK !,Manhattan,120,,
3831,Cozy Entire Floor of Brownstone,Brooklyn,10,not a date,4.64
5022,Entire Apt: Spacious Studio/Loft,Manhattan,1000,2018-11-19 14:05:00,0.10
5099,Large Cozy 1 BR Apartment,Manhattan,9,2019-06-22,0.59
";

struct Fixture {
    dir: TempDir,
    store: LocalArtifactStore,
}

impl Fixture {
    fn new(raw: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("store"));
        let raw_path = dir.path().join("sample.csv");
        fs::write(&raw_path, raw).unwrap();
        let raw_data = NewArtifact {
            name: "sample.csv".into(),
            artifact_type: "raw_data".into(),
            description: "Raw listings".into(),
        };
        store.publish(&raw_data, &raw_path).unwrap();
        Fixture { dir, store }
    }

    fn config(&self, min_price: f64, max_price: f64) -> CleaningConfig {
        CleaningConfig {
            input_artifact: "sample.csv:latest".into(),
            output_artifact: "clean_sample.csv".into(),
            output_type: "clean_sample".into(),
            output_description: "Data with outliers and null values removed".into(),
            min_price,
            max_price,
            output_file: self.dir.path().join("clean_sample.csv"),
        }
    }
}

#[test]
fn cleans_and_publishes_new_artifact() {
    let fx = Fixture::new(RAW_LISTINGS);
    let config = fx.config(10.0, 1000.0);

    let report = pipeline::run(&config, &fx.store, &fx.store).unwrap();

    assert_eq!(
        report.output,
        ArtifactRef { name: "clean_sample.csv".into(), version: 0 }
    );
    assert_eq!(report.stats.rows_in, 6);
    assert_eq!(report.stats.rows_kept, 4);
    assert_eq!(report.stats.unparsed_dates, 1);

    let published = fx.store.resolve("clean_sample.csv:v0").unwrap();
    let text = fs::read_to_string(published).unwrap();
    assert_eq!(
        text,
        "\
id,name,neighbourhood_group,price,last_review,reviews_per_month
2539,Clean & quiet apt home by the park,Brooklyn,80,2019-05-21 00:00:00,0.21
3647,THE VILLAGE OF HARLEM....NEW YORK !,Manhattan,120,,
3831,Cozy Entire Floor of Brownstone,Brooklyn,10,,4.64
5022,Entire Apt: Spacious Studio/Loft,Manhattan,1000,2018-11-19 14:05:00,0.1
"
    );

    let manifest = fx.store.manifest("clean_sample.csv", 0).unwrap();
    assert_eq!(manifest.artifact_type, "clean_sample");
    assert_eq!(manifest.description, "Data with outliers and null values removed");
}

#[test]
fn no_row_in_range_still_publishes_header() {
    let fx = Fixture::new("price,last_review\n50,2019-01-01\n150,2019-01-02\n");
    let report = pipeline::run(&fx.config(200.0, 300.0), &fx.store, &fx.store).unwrap();

    assert_eq!(report.stats.rows_kept, 0);
    let text = fs::read_to_string(fx.store.resolve("clean_sample.csv").unwrap()).unwrap();
    assert_eq!(text, "price,last_review\n");
}

#[test]
fn inverted_bounds_publish_an_empty_table() {
    let fx = Fixture::new(RAW_LISTINGS);
    let report = pipeline::run(&fx.config(1000.0, 10.0), &fx.store, &fx.store).unwrap();
    assert_eq!(report.stats.rows_kept, 0);
}

#[test]
fn rerun_publishes_next_version() {
    let fx = Fixture::new(RAW_LISTINGS);
    pipeline::run(&fx.config(10.0, 1000.0), &fx.store, &fx.store).unwrap();
    let second = pipeline::run(&fx.config(10.0, 100.0), &fx.store, &fx.store).unwrap();

    assert_eq!(second.output.version, 1);
    assert_eq!(fx.store.versions("clean_sample.csv").unwrap(), vec![0, 1]);
}

#[test]
fn missing_price_column_is_a_schema_error() {
    let fx = Fixture::new("id,last_review\n1,2019-05-21\n");
    let err = pipeline::run(&fx.config(10.0, 1000.0), &fx.store, &fx.store).unwrap_err();

    assert!(matches!(err, PipelineError::Schema(_)), "{err:?}");
    assert!(fx.store.versions("clean_sample.csv").unwrap().is_empty());
    assert!(!fx.dir.path().join("clean_sample.csv").exists());
}

#[test]
fn missing_input_artifact_fails_before_cleaning() {
    let fx = Fixture::new(RAW_LISTINGS);
    let mut config = fx.config(10.0, 1000.0);
    config.input_artifact = "does-not-exist.csv:latest".into();

    let err = pipeline::run(&config, &fx.store, &fx.store).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Resolve));
    assert!(!config.output_file.exists());
}

#[test]
fn write_failure_stops_before_publish() {
    let fx = Fixture::new(RAW_LISTINGS);
    let mut config = fx.config(10.0, 1000.0);
    config.output_file = fx.dir.path().join("missing-dir").join("clean_sample.csv");

    let err = pipeline::run(&config, &fx.store, &fx.store).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Write));
    assert!(fx.store.versions("clean_sample.csv").unwrap().is_empty());
    assert!(!fx.dir.path().join("missing-dir").exists());
}

#[test]
fn date_only_input_keeps_date_only_output() {
    let fx = Fixture::new("price,last_review\n80,2019-05-21\n90,\n");
    pipeline::run(&fx.config(10.0, 1000.0), &fx.store, &fx.store).unwrap();

    let text = fs::read_to_string(fx.store.resolve("clean_sample.csv").unwrap()).unwrap();
    assert_eq!(text, "price,last_review\n80,2019-05-21\n90,\n");
}

#[test]
fn bad_configuration_aborts_before_any_io() {
    struct Untouchable;
    impl ArtifactSource for Untouchable {
        fn resolve(&self, _identifier: &str) -> anyhow::Result<PathBuf> {
            panic!("resolve must not be called");
        }
    }
    impl ArtifactSink for Untouchable {
        fn publish(&self, _artifact: &NewArtifact, _file: &Path) -> anyhow::Result<ArtifactRef> {
            panic!("publish must not be called");
        }
    }

    let fx = Fixture::new(RAW_LISTINGS);
    let config = fx.config(f64::NAN, 1000.0);
    let err = pipeline::run(&config, &Untouchable, &Untouchable).unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)), "{err:?}");
}

#[test]
fn publish_failure_is_propagated_and_registers_nothing() {
    struct FailingSink;
    impl ArtifactSink for FailingSink {
        fn publish(&self, artifact: &NewArtifact, _file: &Path) -> anyhow::Result<ArtifactRef> {
            bail!("storage quota exceeded while publishing {}", artifact.name)
        }
    }

    let fx = Fixture::new(RAW_LISTINGS);
    let err = pipeline::run(&fx.config(10.0, 1000.0), &fx.store, &FailingSink).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Publish));
    let cause = std::error::Error::source(&err).unwrap().to_string();
    assert!(cause.contains("storage quota exceeded"), "{cause}");
    assert!(fx.store.versions("clean_sample.csv").unwrap().is_empty());
}

#[test]
fn run_records_round_trip_through_the_store() {
    let fx = Fixture::new(RAW_LISTINGS);
    let config = fx.config(10.0, 1000.0);

    let mut run = RunRecord::start(&config);
    let report = pipeline::run(&config, &fx.store, &fx.store).unwrap();
    run.succeed(&report);
    fx.store.record_run(&run).unwrap();

    let stored = fx.store.run(&run.id).unwrap();
    assert_eq!(stored, run);
    assert_eq!(stored.status, RunStatus::Succeeded);
    assert_eq!(stored.rows_kept, Some(4));
    assert_eq!(stored.config.max_price, 1000.0);
}
