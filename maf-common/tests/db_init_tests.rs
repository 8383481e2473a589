//! Tests for database initialization
//!
//! Covers first-run creation, reopening an existing file, and the schema
//! constraints the cache relies on (unique external ids, cascade deletes).

use maf_common::db::init::init_database;
use tempfile::TempDir;

async fn table_names(pool: &sqlx::SqlitePool) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("maf.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("maf.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO anime_series (mal_id, title) VALUES (1, 'Cowboy Bebop')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.as_ref().err());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM anime_series")
        .fetch_one(&pool2.unwrap())
        .await
        .unwrap();
    assert_eq!(count, 1, "Existing rows must survive reopening");
}

#[tokio::test]
async fn test_all_tables_created() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("maf.db")).await.unwrap();

    let tables = table_names(&pool).await;
    for expected in ["anime_series", "anime_series_figures", "figures"] {
        assert!(tables.iter().any(|t| t == expected), "Missing table: {}", expected);
    }
}

#[tokio::test]
async fn test_mal_id_is_unique() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("maf.db")).await.unwrap();

    sqlx::query("INSERT INTO anime_series (mal_id) VALUES (30)")
        .execute(&pool)
        .await
        .unwrap();
    let duplicate = sqlx::query("INSERT INTO anime_series (mal_id) VALUES (30)")
        .execute(&pool)
        .await;

    assert!(duplicate.is_err(), "Duplicate mal_id should be rejected");
}

#[tokio::test]
async fn test_deleting_series_cascades_to_links() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("maf.db")).await.unwrap();

    sqlx::query("INSERT INTO anime_series (id, mal_id) VALUES (1, 30)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO figures (id, mfc_id, name) VALUES (1, 1000, 'Asuka')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO anime_series_figures (series_id, figure_id) VALUES (1, 1)")
        .execute(&pool)
        .await
        .unwrap();

    // foreign_keys is a per-connection pragma; pin one connection
    let mut conn = pool.acquire().await.unwrap();
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await
        .unwrap();
    sqlx::query("DELETE FROM anime_series WHERE id = 1")
        .execute(&mut *conn)
        .await
        .unwrap();

    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM anime_series_figures")
        .fetch_one(&mut *conn)
        .await
        .unwrap();
    assert_eq!(links, 0);

    let figures: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM figures")
        .fetch_one(&mut *conn)
        .await
        .unwrap();
    assert_eq!(figures, 1, "Figures are shared and must outlive a series");
}

#[tokio::test]
async fn test_memory_database_has_schema() {
    let pool = maf_common::db::init_memory_database().await.unwrap();

    let tables = table_names(&pool).await;
    assert_eq!(tables, vec!["anime_series", "anime_series_figures", "figures"]);
}
