//! Loads open-data CSV exports dropped under `CSVFiles/` into the review tables.

use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::Error;
use tracing::{info, warn};

use crate::clients::{KeyValueTable, ObjectStore};
use crate::config::IngestConfig;
use crate::error::AppResult;
use crate::ingest::Dataset;
use crate::model::ObjectRef;

pub async fn function_handler(
    store: &dyn ObjectStore,
    table: &dyn KeyValueTable,
    event: S3Event,
) -> Result<(), Error> {
    let config = IngestConfig::from_env();
    for object in ObjectRef::from_s3(&event) {
        ingest_object(&config, store, table, &object).await?;
    }
    Ok(())
}

/// Returns how many institution records were written; unrecognised files write none.
pub async fn ingest_object(
    config: &IngestConfig,
    store: &dyn ObjectStore,
    table: &dyn KeyValueTable,
    object: &ObjectRef,
) -> AppResult<usize> {
    let Some(dataset) = Dataset::from_key(&object.key) else {
        warn!(key = %object.key, "no dataset matches this file, ignoring");
        return Ok(0);
    };

    let table_name = dataset.table(config)?;
    let body = store.get_object(&object.bucket, &object.key).await?;
    let records = dataset.records(&body)?;
    let written = records.len();

    table.batch_put(table_name, records).await?;
    info!(key = %object.key, dataset = ?dataset, table = %table_name, written, "ingested review export");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamo::string_attr;
    use crate::testing::{FakeStore, FakeTable};

    const VOCATIONAL_CSV: &str = "\
Institution Code,Institution Name A,Institution Name E,Cycle,Batch,Batch Release Date,Review Type,Grade
V1,مركز أغورا,Agora Training Centre,Cycle 1,Batch 1,Jun-09,Review,(2) Good
V1,مركز أغورا,Agora Training Centre,Cycle 2,Batch 3,Oct-13,Repeat review,(3) Satisfactory
V2,مركز الخليج,Gulf Training Centre,Cycle 1,Batch 1,Jun-09,Review,(1) Outstanding
";

    const KEY: &str = "CSVFiles/Results of Vocational Reviews.csv";

    fn config() -> IngestConfig {
        IngestConfig {
            school_table: None,
            university_table: None,
            vocational_table: Some("vocational".into()),
        }
    }

    fn object(key: &str) -> ObjectRef {
        ObjectRef {
            bucket: "reports".into(),
            key: key.into(),
        }
    }

    #[tokio::test]
    async fn a_known_export_is_grouped_and_written() {
        let store = FakeStore::default().with_object("reports", KEY, VOCATIONAL_CSV.as_bytes());
        let table = FakeTable::default();

        let written = ingest_object(&config(), &store, &table, &object(KEY))
            .await
            .unwrap();

        assert_eq!(written, 2);
        let items = table.items("vocational");
        assert_eq!(string_attr(&items[0], "EnglishInstituteName"), "Agora Training Centre");
        assert_eq!(*table.batch_sizes.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn unrecognised_files_are_ignored() {
        let store = FakeStore::default();
        let table = FakeTable::default();

        let written = ingest_object(&config(), &store, &table, &object("CSVFiles/notes.csv"))
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert!(table.batch_sizes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn a_dataset_without_a_table_fails_before_reading() {
        let store = FakeStore::default();
        let err = ingest_object(
            &config(),
            &store,
            &FakeTable::default(),
            &object("CSVFiles/Results of Private Schools Reviews.csv"),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "SCHOOL_REVIEWS_TABLE_NAME is not defined in environment variables"
        );
    }
}
