use std::sync::Arc;

use sqlx::Error;
use time::{OffsetDateTime, UtcOffset};

use crate::configs::Storage;
use crate::models::Reading;

pub struct ReadingRepository {
    storage: Arc<Storage>,
}

impl ReadingRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Store one reading. The timestamp defaults to the current time when the
    /// caller does not supply one. Timestamps are normalized to UTC before
    /// binding so the text-encoded values in SQLite compare consistently.
    pub async fn create(
        &self,
        sensor_id: i32,
        value: f64,
        timestamp: Option<OffsetDateTime>,
    ) -> Result<Reading, Error> {
        let timestamp = timestamp
            .unwrap_or_else(OffsetDateTime::now_utc)
            .to_offset(UtcOffset::UTC);

        let reading: Reading = sqlx::query_as(
            r#"
            INSERT INTO readings (sensor_id, value, timestamp)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(sensor_id)
        .bind(value)
        .bind(timestamp)
        .fetch_one(self.storage.get_pool())
        .await?;

        Ok(reading)
    }

    /// Every stored reading in insertion order (ascending id).
    pub async fn find_all(&self) -> Result<Vec<Reading>, Error> {
        let readings: Vec<Reading> = sqlx::query_as("SELECT * FROM readings ORDER BY id")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(readings)
    }

    /// Readings whose timestamp falls within the inclusive [start, end] range.
    pub async fn find_in_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Reading>, Error> {
        let readings: Vec<Reading> =
            sqlx::query_as("SELECT * FROM readings WHERE timestamp BETWEEN $1 AND $2 ORDER BY id")
                .bind(start.to_offset(UtcOffset::UTC))
                .bind(end.to_offset(UtcOffset::UTC))
                .fetch_all(self.storage.get_pool())
                .await?;

        Ok(readings)
    }

    /// Delete every stored reading. Irreversible.
    pub async fn delete_all(&self) -> Result<(), Error> {
        sqlx::query("DELETE FROM readings")
            .execute(self.storage.get_pool())
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::configs::{Database, SchemaManager};

    use super::*;

    async fn setup_test_db() -> Arc<Storage> {
        Arc::new(
            Storage::new(
                Database {
                    clean_start: true,
                    url: String::from("sqlite::memory:"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_assigns_current_time_when_omitted() {
        let storage = setup_test_db().await;
        let repo = ReadingRepository::new(storage);

        let before = OffsetDateTime::now_utc();
        let reading = repo.create(7, 21.5, None).await.unwrap();
        let after = OffsetDateTime::now_utc();

        assert!(reading.id > 0);
        assert_eq!(reading.sensor_id, 7);
        assert_eq!(reading.value, 21.5);
        assert!(reading.timestamp >= before - time::Duration::seconds(2));
        assert!(reading.timestamp <= after + time::Duration::seconds(2));
    }

    #[tokio::test]
    async fn test_find_all_preserves_insertion_order() {
        let storage = setup_test_db().await;
        let repo = ReadingRepository::new(storage);

        let first = repo.create(1, 10.0, None).await.unwrap();
        let second = repo.create(2, 20.0, None).await.unwrap();
        let third = repo.create(3, 30.0, None).await.unwrap();

        assert!(first.id < second.id && second.id < third.id);

        let all = repo.find_all().await.unwrap();
        let ids: Vec<i32> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[tokio::test]
    async fn test_find_in_range_is_inclusive() {
        let storage = setup_test_db().await;
        let repo = ReadingRepository::new(storage);

        let early = datetime!(2024-05-01 10:00:00 UTC);
        let middle = datetime!(2024-05-01 11:00:00 UTC);
        let late = datetime!(2024-05-01 12:00:00 UTC);

        repo.create(1, 1.0, Some(early)).await.unwrap();
        repo.create(1, 2.0, Some(middle)).await.unwrap();
        repo.create(1, 3.0, Some(late)).await.unwrap();

        // Bounds equal to stored timestamps are included.
        let full = repo.find_in_range(early, late).await.unwrap();
        assert_eq!(full.len(), 3);

        let narrow = repo
            .find_in_range(
                datetime!(2024-05-01 10:30:00 UTC),
                datetime!(2024-05-01 11:30:00 UTC),
            )
            .await
            .unwrap();
        assert_eq!(narrow.len(), 1);
        assert_eq!(narrow[0].value, 2.0);

        let empty = repo
            .find_in_range(
                datetime!(2024-05-02 00:00:00 UTC),
                datetime!(2024-05-03 00:00:00 UTC),
            )
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_leaves_store_empty() {
        let storage = setup_test_db().await;
        let repo = ReadingRepository::new(storage);

        repo.create(1, 1.0, None).await.unwrap();
        repo.create(2, 2.0, None).await.unwrap();

        repo.delete_all().await.unwrap();

        assert!(repo.find_all().await.unwrap().is_empty());
    }
}
