#![cfg(feature = "test-utils")]

use std::time::Duration;

use futures::{StreamExt, stream};
use ingest::client::memory::MemoryLoadClient;
use ingest::error::ErrorKind;
use ingest::pipeline::{IngestOutcome, Pipeline};
use ingest::test_utils::clients::{FailingLoadClient, TruncatingLoadClient};
use ingest::test_utils::rows::{expected_rows, map_test_record, record_stream};
use ingest::test_utils::tracing::init_test_tracing;
use ingest::types::MappedRow;
use ingest_config::shared::{BatchConfig, PipeConfig, PipelineConfig};
use rand::random;
use tokio::time::sleep;

const EXPECTED_ROW_COUNT: u64 = 1000;

fn test_config(table: &str, max_size: usize) -> PipelineConfig {
    PipelineConfig {
        id: random(),
        table: table.to_string(),
        batch: BatchConfig { max_size },
        pipe: PipeConfig::default(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_loads_all_rows_across_batches() {
    init_test_tracing();

    let client = MemoryLoadClient::new();
    let batch_size = (EXPECTED_ROW_COUNT / 3 + 1) as usize;
    let pipeline =
        Pipeline::new(test_config("t", batch_size), map_test_record, client.clone()).unwrap();

    let outcome = pipeline.run(record_stream(EXPECTED_ROW_COUNT)).await.unwrap();

    match outcome {
        IngestOutcome::Completed {
            total_rows,
            batch_counts,
        } => {
            assert_eq!(total_rows, EXPECTED_ROW_COUNT);
            assert_eq!(batch_counts, vec![334, 334, 332]);
        }
        IngestOutcome::Shutdown => panic!("expected completed outcome"),
    }

    // Row order on the store side equals input order, with no duplicates or omissions.
    assert_eq!(client.rows().await, expected_rows(EXPECTED_ROW_COUNT));
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_with_batch_size_one_runs_one_load_per_row() {
    init_test_tracing();

    let client = MemoryLoadClient::new();
    let pipeline = Pipeline::new(test_config("t", 1), map_test_record, client.clone()).unwrap();

    let outcome = pipeline.run(record_stream(EXPECTED_ROW_COUNT)).await.unwrap();

    match outcome {
        IngestOutcome::Completed {
            total_rows,
            batch_counts,
        } => {
            assert_eq!(total_rows, EXPECTED_ROW_COUNT);
            assert_eq!(batch_counts.len(), EXPECTED_ROW_COUNT as usize);
            assert!(batch_counts.iter().all(|&count| count == 1));
        }
        IngestOutcome::Shutdown => panic!("expected completed outcome"),
    }

    assert_eq!(client.load_count().await, EXPECTED_ROW_COUNT as usize);
    assert_eq!(client.rows().await, expected_rows(EXPECTED_ROW_COUNT));
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_with_batch_size_equal_to_input_runs_a_single_load() {
    init_test_tracing();

    let client = MemoryLoadClient::new();
    let pipeline = Pipeline::new(
        test_config("t", EXPECTED_ROW_COUNT as usize),
        map_test_record,
        client.clone(),
    )
    .unwrap();

    pipeline.run(record_stream(EXPECTED_ROW_COUNT)).await.unwrap();

    assert_eq!(client.load_count().await, 1);
    assert_eq!(client.rows().await, expected_rows(EXPECTED_ROW_COUNT));
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_with_empty_input_runs_no_loads() {
    init_test_tracing();

    let client = MemoryLoadClient::new();
    let pipeline = Pipeline::new(test_config("t", 100), map_test_record, client.clone()).unwrap();

    let outcome = pipeline.run(record_stream(0)).await.unwrap();

    match outcome {
        IngestOutcome::Completed {
            total_rows,
            batch_counts,
        } => {
            assert_eq!(total_rows, 0);
            assert!(batch_counts.is_empty());
        }
        IngestOutcome::Shutdown => panic!("expected completed outcome"),
    }

    assert_eq!(client.load_count().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn load_command_text_uses_the_quoted_table_name() {
    init_test_tracing();

    let client = MemoryLoadClient::new();
    let pipeline = Pipeline::new(test_config("t", 100), map_test_record, client.clone()).unwrap();

    pipeline.run(record_stream(5)).await.unwrap();

    assert_eq!(
        client.commands().await,
        vec!["LOAD DATA LOCAL INFILE '###.tsv' INTO TABLE `t`".to_string()]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn load_command_doubles_backticks_in_the_table_name() {
    init_test_tracing();

    let client = MemoryLoadClient::new();
    let pipeline =
        Pipeline::new(test_config("we`ird", 100), map_test_record, client.clone()).unwrap();

    pipeline.run(record_stream(5)).await.unwrap();

    assert_eq!(
        client.commands().await,
        vec!["LOAD DATA LOCAL INFILE '###.tsv' INTO TABLE `we``ird`".to_string()]
    );
}

fn map_tricky_record(id: u64) -> ingest::error::IngestResult<MappedRow> {
    Ok(MappedRow::new(vec![
        format!("back\\slash{id}"),
        "line1\nline2".to_string(),
        "tab\there".to_string(),
    ]))
}

#[tokio::test(flavor = "multi_thread")]
async fn delimiter_heavy_values_survive_the_wire_format() {
    init_test_tracing();

    let client = MemoryLoadClient::new();
    let pipeline = Pipeline::new(test_config("t", 10), map_tricky_record, client.clone()).unwrap();

    pipeline.run(record_stream(25)).await.unwrap();

    let rows = client.rows().await;
    assert_eq!(rows.len(), 25);
    for (id, row) in rows.into_iter().enumerate() {
        assert_eq!(
            row,
            vec![
                format!("back\\slash{id}"),
                "line1\nline2".to_string(),
                "tab\there".to_string(),
            ]
        );
    }
}

#[test]
fn pipeline_rejects_zero_batch_size() {
    let Err(err) = Pipeline::new(test_config("t", 0), map_test_record, MemoryLoadClient::new())
    else {
        panic!("expected a configuration error");
    };

    assert_eq!(err.kind(), ErrorKind::ConfigError);
}

#[test]
fn pipeline_rejects_empty_table_name() {
    let Err(err) = Pipeline::new(test_config("", 100), map_test_record, MemoryLoadClient::new())
    else {
        panic!("expected a configuration error");
    };

    assert_eq!(err.kind(), ErrorKind::ConfigError);
}

#[tokio::test(flavor = "multi_thread")]
async fn truncated_transmission_fails_the_batch_despite_a_reported_count() {
    init_test_tracing();

    let client = TruncatingLoadClient::new(64);
    let mut config = test_config("t", EXPECTED_ROW_COUNT as usize);
    // Keep the pipe small so the writer is still blocked when the store stops reading.
    config.pipe.buffer_bytes = 64;
    let pipeline = Pipeline::new(config, map_test_record, client.clone()).unwrap();

    let err = pipeline
        .run(record_stream(EXPECTED_ROW_COUNT))
        .await
        .err()
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::DestinationIoError);
    assert_eq!(client.load_count().await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_load_command_aborts_the_run() {
    init_test_tracing();

    let pipeline = Pipeline::new(test_config("t", 100), map_test_record, FailingLoadClient).unwrap();

    let err = pipeline
        .run(record_stream(EXPECTED_ROW_COUNT))
        .await
        .err()
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::DestinationQueryFailed);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_writer_and_load_failures_are_both_reported() {
    init_test_tracing();

    let mut config = test_config("t", EXPECTED_ROW_COUNT as usize);
    // A pipe far smaller than the batch guarantees the writer is still producing when
    // the store rejects the command and drops the stream.
    config.pipe.buffer_bytes = 16;
    let pipeline = Pipeline::new(config, map_test_record, FailingLoadClient).unwrap();

    let err = pipeline
        .run(record_stream(EXPECTED_ROW_COUNT))
        .await
        .err()
        .unwrap();

    let kinds = err.kinds();
    assert!(kinds.contains(&ErrorKind::DestinationQueryFailed));
    assert!(kinds.contains(&ErrorKind::DestinationIoError));
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_stops_the_run_without_loading_buffered_rows() {
    init_test_tracing();

    let client = MemoryLoadClient::new();
    let pipeline = Pipeline::new(test_config("t", 100), map_test_record, client.clone()).unwrap();
    let shutdown_tx = pipeline.shutdown_tx();

    // Two records and then the stream stays pending: not enough for a full batch, so
    // the run sits waiting for more input until shutdown is requested.
    let records = stream::iter(0..2u64).chain(stream::pending());
    let run = tokio::spawn(async move { pipeline.run(records).await });

    // Let the run buffer the two rows before signalling shutdown.
    sleep(Duration::from_millis(50)).await;
    shutdown_tx.shutdown().unwrap();

    let outcome = run.await.unwrap().unwrap();
    assert!(matches!(outcome, IngestOutcome::Shutdown));
    assert_eq!(client.load_count().await, 0);
}
