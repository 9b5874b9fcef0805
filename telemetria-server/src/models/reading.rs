use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reading {
    pub id: i32,
    pub sensor_id: i32,
    pub value: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Clone)]
pub struct ReadingTable;

impl Table for ReadingTable {
    fn name(&self) -> &'static str {
        "readings"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sensor_id INTEGER NOT NULL,
                value REAL NOT NULL,
                timestamp DATETIME NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS readings;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
