//! Sample row storage
//!
//! Rows live in the `data` table keyed by `dataset_id`. Insertion order is
//! spreadsheet order and reads return rows by `rowid`, so the series keeps
//! the order it was uploaded in.

use myotrack_common::types::Sample;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

/// Rows per INSERT statement (7 bound parameters each)
pub const INSERT_CHUNK_ROWS: usize = 128;

/// Stored row after numeric re-coercion
#[derive(Debug, sqlx::FromRow)]
struct SampleRecord {
    timestamp: i64,
    emg1: i64,
    emg2: i64,
    emg3: i64,
    emg4: i64,
    angle: i64,
}

impl From<SampleRecord> for Sample {
    fn from(record: SampleRecord) -> Self {
        Sample::new(
            record.timestamp,
            record.emg1,
            record.emg2,
            record.emg3,
            record.emg4,
            record.angle,
        )
    }
}

/// Bulk-insert `samples` for `dataset_id` in order. Returns rows written.
pub async fn insert_samples(
    conn: &mut SqliteConnection,
    dataset_id: i64,
    samples: &[Sample],
) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;

    for chunk in samples.chunks(INSERT_CHUNK_ROWS) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO data (dataset_id, timestamp, emg1, emg2, emg3, emg4, angle) ",
        );
        builder.push_values(chunk, |mut row, sample| {
            row.push_bind(dataset_id)
                .push_bind(sample.timestamp)
                .push_bind(sample.emg1)
                .push_bind(sample.emg2)
                .push_bind(sample.emg3)
                .push_bind(sample.emg4)
                .push_bind(sample.angle);
        });

        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }

    Ok(inserted)
}

pub async fn delete_samples(conn: &mut SqliteConnection, dataset_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM data WHERE dataset_id = ?")
        .bind(dataset_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Numeric rows for `dataset_id` in insertion order.
///
/// Rows where any field is not stored as a number are skipped.
pub async fn fetch_samples(
    conn: &mut SqliteConnection,
    dataset_id: i64,
) -> Result<Vec<Sample>, sqlx::Error> {
    let records = sqlx::query_as::<_, SampleRecord>(
        r#"
        SELECT CAST(timestamp AS INTEGER) AS timestamp,
               CAST(emg1 AS INTEGER) AS emg1,
               CAST(emg2 AS INTEGER) AS emg2,
               CAST(emg3 AS INTEGER) AS emg3,
               CAST(emg4 AS INTEGER) AS emg4,
               CAST(angle AS INTEGER) AS angle
        FROM data
        WHERE dataset_id = ?
          AND typeof(timestamp) IN ('integer', 'real')
          AND typeof(emg1) IN ('integer', 'real')
          AND typeof(emg2) IN ('integer', 'real')
          AND typeof(emg3) IN ('integer', 'real')
          AND typeof(emg4) IN ('integer', 'real')
          AND typeof(angle) IN ('integer', 'real')
        ORDER BY rowid
        "#,
    )
    .bind(dataset_id)
    .fetch_all(conn)
    .await?;

    Ok(records.into_iter().map(Sample::from).collect())
}

/// All stored rows for `dataset_id`, numeric or not
pub async fn count_samples(conn: &mut SqliteConnection, dataset_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM data WHERE dataset_id = ?")
        .bind(dataset_id)
        .fetch_one(conn)
        .await
}
