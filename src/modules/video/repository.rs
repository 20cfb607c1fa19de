use anyhow::Result;
use sqlx::PgPool;

use super::model::Video;

// Terminal updates only fire while the row is still in flight, so a duplicate
// completion callback is a no-op instead of a state regression.
const MARK_READY_SQL: &str = r#"
UPDATE videos
SET status = 'READY', renditions = $1, updated_at = NOW()
WHERE slug = $2 AND status = 'PROCESSING'
"#;

const MARK_FAILED_SQL: &str = r#"
UPDATE videos
SET status = 'ERROR', updated_at = NOW()
WHERE slug = $1 AND status = 'PROCESSING'
"#;

pub struct VideoRepository;

impl VideoRepository {
    pub async fn create(
        pool: &PgPool,
        owner_id: &str,
        title: &str,
        slug: &str,
        folder_path: &str,
    ) -> Result<Video> {
        let video = sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (owner_id, title, slug, status, folder_path)
            VALUES ($1, $2, $3, 'PROCESSING', $4)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(title)
        .bind(slug)
        .bind(folder_path)
        .fetch_one(pool)
        .await?;

        Ok(video)
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await?;
        Ok(video)
    }

    pub async fn mark_ready(pool: &PgPool, slug: &str, renditions: &[String]) -> Result<()> {
        sqlx::query(MARK_READY_SQL)
            .bind(renditions)
            .bind(slug)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn mark_failed(pool: &PgPool, slug: &str) -> Result<()> {
        sqlx::query(MARK_FAILED_SQL)
            .bind(slug)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_updates_are_guarded_against_reentry() {
        assert!(MARK_READY_SQL.contains("status = 'PROCESSING'"));
        assert!(MARK_FAILED_SQL.contains("status = 'PROCESSING'"));
    }
}
