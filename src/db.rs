use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: String,
}

impl NewArticle {
    fn is_complete(&self) -> bool {
        [&self.title, &self.content, &self.author, &self.category]
            .iter()
            .all(|field| !field.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                author TEXT NOT NULL,
                category TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_articles_created
            ON articles(created_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Newest first. Rows sharing a timestamp fall back to insertion order.
    pub async fn list_articles(&self) -> Result<Vec<Article>, StoreError> {
        let articles = sqlx::query_as::<_, Article>(
            "SELECT * FROM articles ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(articles)
    }

    pub async fn get_article(&self, id: i64) -> Result<Option<Article>, StoreError> {
        let article = sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    pub async fn create_article(&self, new: &NewArticle) -> Result<Article, StoreError> {
        if !new.is_complete() {
            return Err(StoreError::Validation("Missing required fields"));
        }

        // Fixed width keeps lexical order equal to chronological order.
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = sqlx::query(
            r#"
            INSERT INTO articles (title, content, author, category, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.title)
        .bind(&new.content)
        .bind(&new.author)
        .bind(&new.category)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        let article = sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await?;
        Ok(article)
    }

    /// Returns the number of rows removed; an unknown id removes nothing.
    pub async fn delete_article(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
