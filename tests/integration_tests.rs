//! Integration tests for the vms-site backend
//!
//! These tests verify the full workflow from configuration loading
//! through the article store and the HTTP API.

mod common {
    use std::sync::Arc;
    use std::time::Duration;

    use tempfile::TempDir;
    use vms_site::auth::SharedSecret;
    use vms_site::db::Database;
    use vms_site::fetcher::Fetcher;
    use vms_site::routes::{router, AppState};
    use vms_site::upload::ImageStore;

    pub const SECRET: &str = "integration-secret";

    /// Create a temporary directory for test databases and uploads
    pub fn create_temp_dir() -> TempDir {
        tempfile::tempdir().expect("Failed to create temp directory")
    }

    /// Create a test database path
    pub fn create_db_path(temp_dir: &TempDir) -> String {
        let db_path = temp_dir.path().join("test.db");
        format!("sqlite:{}?mode=rwc", db_path.display())
    }

    pub async fn create_server(temp_dir: &TempDir) -> axum_test::TestServer {
        let db = Database::new(&create_db_path(temp_dir)).await.unwrap();
        db.initialize().await.unwrap();

        let uploads = temp_dir.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();

        let state = Arc::new(AppState {
            db: Arc::new(db),
            fetcher: Fetcher::new(Duration::from_secs(5), 10).unwrap(),
            images: ImageStore::new(uploads, 5 * 1024 * 1024),
            authorizer: Arc::new(SharedSecret::new(Some(SECRET.to_string()))),
            feeds: Vec::new(),
        });

        axum_test::TestServer::new(router(state)).unwrap()
    }
}

#[cfg(test)]
mod config_integration_tests {
    use vms_site::config::Config;

    #[test]
    fn test_load_actual_site_config() {
        let config = Config::load("site.toml");
        assert!(config.is_ok(), "Failed to load site.toml: {:?}", config.err());

        let config = config.unwrap();
        assert!(!config.feeds.is_empty(), "site.toml should list at least one feed");
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert!(config.admin_secret.is_none());
    }
}

#[cfg(test)]
mod database_integration_tests {
    use super::common::*;
    use vms_site::db::{Database, NewArticle};

    fn article(title: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            content: format!("{} content", title),
            author: "QA Team".to_string(),
            category: "CSV".to_string(),
        }
    }

    #[tokio::test]
    async fn test_database_persistence() {
        let temp_dir = create_temp_dir();
        let db_url = create_db_path(&temp_dir);

        let created = {
            let db = Database::new(&db_url).await.unwrap();
            db.initialize().await.unwrap();
            db.create_article(&article("Persistent")).await.unwrap()
        };

        // Reopen database and verify data persists
        let db = Database::new(&db_url).await.unwrap();
        let articles = db.list_articles().await.unwrap();
        assert_eq!(articles, vec![created]);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let temp_dir = create_temp_dir();
        let db = Database::new(&create_db_path(&temp_dir)).await.unwrap();
        db.initialize().await.unwrap();

        let first = db.create_article(&article("First")).await.unwrap();
        db.delete_article(first.id).await.unwrap();
        let second = db.create_article(&article("Second")).await.unwrap();

        assert!(second.id > first.id);
    }
}

#[cfg(test)]
mod end_to_end_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{json, Value};

    fn article(title: &str, password: &str) -> Value {
        json!({
            "title": title,
            "content": format!("All about {}", title),
            "author": "VMS",
            "category": "Qualification",
            "password": password,
        })
    }

    #[tokio::test]
    async fn test_article_lifecycle() {
        let temp_dir = create_temp_dir();
        let server = create_server(&temp_dir).await;

        for title in ["IQ", "OQ", "PQ"] {
            let response = server.post("/api/articles").json(&article(title, SECRET)).await;
            response.assert_status(StatusCode::CREATED);
        }

        let listed: Vec<Value> = server.get("/api/articles").await.json();
        let titles: Vec<&str> = listed.iter().map(|a| a["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["PQ", "OQ", "IQ"]);

        let oq_id = listed[1]["id"].as_i64().unwrap();
        server
            .delete(&format!("/api/articles/{}", oq_id))
            .json(&json!({ "password": SECRET }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let listed: Vec<Value> = server.get("/api/articles").await.json();
        let titles: Vec<&str> = listed.iter().map(|a| a["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["PQ", "IQ"]);
    }

    #[tokio::test]
    async fn test_unauthorized_changes_leave_store_untouched() {
        let temp_dir = create_temp_dir();
        let server = create_server(&temp_dir).await;

        server
            .post("/api/articles")
            .json(&article("Kept", SECRET))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post("/api/articles")
            .json(&article("Intruder", "guess"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let listed: Vec<Value> = server.get("/api/articles").await.json();
        let id = listed[0]["id"].as_i64().unwrap();

        let response = server
            .delete(&format!("/api/articles/{}", id))
            .json(&json!({ "password": "" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["error"], "Unauthorized: Invalid password");

        let listed: Vec<Value> = server.get("/api/articles").await.json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["title"], "Kept");
    }

    #[tokio::test]
    async fn test_uploaded_image_embedded_in_article() {
        let temp_dir = create_temp_dir();
        let server = create_server(&temp_dir).await;

        let form = MultipartForm::new().add_part(
            "image",
            Part::bytes(b"GIF89a-fake".to_vec())
                .file_name("flow.gif")
                .mime_type("image/gif"),
        );
        let response = server.post("/api/upload").multipart(form).await;
        response.assert_status_ok();
        let url = response.json::<Value>()["url"].as_str().unwrap().to_string();
        assert!(url.starts_with("/uploads/"));

        let content = format!("Process flow:\n\n![flow]({})", url);
        let mut body = article("Flow", SECRET);
        body["content"] = json!(content);
        server
            .post("/api/articles")
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let listed: Vec<Value> = server.get("/api/articles").await.json();
        assert_eq!(listed[0]["content"], content);

        let image = server.get(&url).await;
        image.assert_status_ok();
        assert_eq!(image.as_bytes().as_ref(), b"GIF89a-fake");
    }

    #[tokio::test]
    async fn test_news_with_no_feeds() {
        let temp_dir = create_temp_dir();
        let server = create_server(&temp_dir).await;

        let items: Vec<Value> = server.get("/api/news").await.json();
        assert!(items.is_empty());
    }
}
