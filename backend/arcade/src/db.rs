//! Database layer: migrations, score writes and leaderboard reads.

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

use crate::errors::Result;
use crate::models::{LeaderboardEntry, ScoreFields};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    // Create the database file on first start.
    let url = if url.contains('?') || url.contains(":memory:") {
        url
    } else {
        format!("{url}?mode=rwc")
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

/// Cheap round-trip used by the health endpoint.
pub async fn ping(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Score writes
// ─────────────────────────────────────────────────────────

/// Insert a validated score. Scores are append-only.
pub async fn insert_score(pool: &SqlitePool, fields: &ScoreFields) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO scores (slug, score, run_ms, seed, issued_at, ip_hash)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&fields.slug)
    .bind(fields.score)
    .bind(fields.run_ms)
    .bind(&fields.seed)
    .bind(&fields.issued_at)
    .bind(&fields.ip_hash)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

// ─────────────────────────────────────────────────────────
// Leaderboard reads
// ─────────────────────────────────────────────────────────

/// Best scores for a slug, highest first. Ties go to the earlier submission.
pub async fn top_scores(
    pool: &SqlitePool,
    slug: &str,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>> {
    let rows = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT score, run_ms, created_at
        FROM   scores
        WHERE  slug = ?1
        ORDER  BY score DESC, id ASC
        LIMIT  ?2
        "#,
    )
    .bind(slug)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Migrated in-memory database for tests. A single connection, so every
/// query sees the same database.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(slug: &str, score: i64) -> ScoreFields {
        ScoreFields {
            slug: slug.to_string(),
            score,
            run_ms: 60_000,
            seed: "0011223344556677".to_string(),
            issued_at: "2024-01-01T00:00:00.000Z".to_string(),
            ip_hash: "ab".repeat(16),
        }
    }

    #[tokio::test]
    async fn leaderboard_orders_by_score_and_filters_slug() {
        let pool = memory_pool().await;
        insert_score(&pool, &fields("a", 10)).await.unwrap();
        insert_score(&pool, &fields("a", 30)).await.unwrap();
        insert_score(&pool, &fields("b", 99)).await.unwrap();
        insert_score(&pool, &fields("a", 20)).await.unwrap();

        let top = top_scores(&pool, "a", 25).await.unwrap();
        let scores: Vec<i64> = top.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![30, 20, 10]);
        assert!(top.iter().all(|e| e.run_ms == 60_000 && e.created_at > 0));
    }

    #[tokio::test]
    async fn leaderboard_respects_limit() {
        let pool = memory_pool().await;
        for s in 0..5 {
            insert_score(&pool, &fields("a", s)).await.unwrap();
        }
        assert_eq!(top_scores(&pool, "a", 2).await.unwrap().len(), 2);
        assert!(top_scores(&pool, "missing", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ping_succeeds_on_live_pool() {
        let pool = memory_pool().await;
        ping(&pool).await.unwrap();
    }
}
