use std::sync::Arc;

use sqlx::Error;

use crate::configs::Storage;
use crate::models::User;

pub struct UserRepository {
    storage: Arc<Storage>,
}

impl UserRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Insert a new user. Username uniqueness is enforced by the UNIQUE
    /// constraint on the table, so a duplicate surfaces as a unique-violation
    /// database error from this single statement instead of racing a separate
    /// existence check.
    pub async fn create(&self, item: &User) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO users (username, password)
            VALUES ($1, $2)
            "#,
        )
        .bind(&item.username)
        .bind(&item.password)
        .execute(self.storage.get_pool())
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, Error> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
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
    async fn test_create_and_find_user() {
        let storage = setup_test_db().await;
        let repo = UserRepository::new(storage);

        let user = User {
            id: 0,
            username: "amanda".to_string(),
            password: "hashed_password".to_string(),
        };

        let id = repo.create(&user).await.unwrap();

        let found = repo.find_by_id(id).await.unwrap();
        assert!(found.is_some());
        let found_user = found.unwrap();
        assert_eq!(found_user.username, "amanda");
        assert_eq!(found_user.password, "hashed_password");

        let by_name = repo.find_by_username("amanda").await.unwrap();
        assert_eq!(by_name.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_find_missing_user_returns_none() {
        let storage = setup_test_db().await;
        let repo = UserRepository::new(storage);

        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
        assert!(repo.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_hits_unique_constraint() {
        let storage = setup_test_db().await;
        let repo = UserRepository::new(storage);

        let user = User {
            id: 0,
            username: "amanda".to_string(),
            password: "first_hash".to_string(),
        };
        repo.create(&user).await.unwrap();

        let twin = User {
            id: 0,
            username: "amanda".to_string(),
            password: "second_hash".to_string(),
        };

        match repo.create(&twin).await {
            Err(Error::Database(e)) => assert!(e.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }

        // The rejected insert must not have touched the stored credentials.
        let stored = repo.find_by_username("amanda").await.unwrap().unwrap();
        assert_eq!(stored.password, "first_hash");
    }
}
