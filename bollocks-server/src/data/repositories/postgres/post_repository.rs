use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::data::post_repository::{AuthorFilter, NewPost, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::identity::UserId;
use crate::domain::post::Post;

const LIST_AUTHORED_BY: &str = r#"
    SELECT id, content, tags, author, created_at, likers, version
    FROM posts
    WHERE author = $1
    ORDER BY created_at DESC, id DESC
"#;

const LIST_NOT_AUTHORED_BY: &str = r#"
    SELECT id, content, tags, author, created_at, likers, version
    FROM posts
    WHERE author <> $1
    ORDER BY created_at DESC, id DESC
"#;

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn post_exists(&self, id: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM posts WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)
    }

    /// Tells a version mismatch apart from a missing row after a conditional write hit nothing.
    async fn missed_write_error(&self, id: &str) -> DomainError {
        match self.post_exists(id).await {
            Ok(true) => DomainError::Conflict(format!("post id: {id}")),
            Ok(false) => DomainError::NotFound(format!("post id: {id}")),
            Err(err) => err,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: String,
    content: String,
    tags: Vec<String>,
    author: String,
    created_at: DateTime<Utc>,
    likers: Vec<String>,
    version: i64,
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn insert_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let likers = vec![input.author.as_str().to_string()];
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (content, tags, author, likers)
            VALUES ($1, $2, $3, $4)
            RETURNING id, content, tags, author, created_at, likers, version
            "#,
        )
        .bind(&input.content)
        .bind(&input.tags)
        .bind(input.author.as_str())
        .bind(&likers)
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        map_row_to_post(row)
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, content, tags, author, created_at, likers, version
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn list_posts(&self, filter: AuthorFilter) -> Result<Vec<Post>, DomainError> {
        let (sql, author) = match &filter {
            AuthorFilter::AuthoredBy(author) => (LIST_AUTHORED_BY, author),
            AuthorFilter::NotAuthoredBy(author) => (LIST_NOT_AUTHORED_BY, author),
        };

        let rows = sqlx::query_as::<_, PostRow>(sql)
        .bind(author.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }

    async fn update_post_if_version(
        &self,
        id: &str,
        expected_version: i64,
        patch: PostPatch,
    ) -> Result<Post, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET content = $3,
                tags = $4,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING id, content, tags, author, created_at, likers, version
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(&patch.content)
        .bind(&patch.tags)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        match row {
            Some(row) => map_row_to_post(row),
            None => Err(self.missed_write_error(id).await),
        }
    }

    async fn delete_post_if_version(
        &self,
        id: &str,
        expected_version: i64,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        if result.rows_affected() == 0 {
            return Err(self.missed_write_error(id).await);
        }
        Ok(())
    }

    async fn replace_likers_if_version(
        &self,
        id: &str,
        expected_version: i64,
        likers: Vec<UserId>,
    ) -> Result<Post, DomainError> {
        let likers: Vec<String> = likers
            .iter()
            .map(|liker| liker.as_str().to_string())
            .collect();

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET likers = $3,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING id, content, tags, author, created_at, likers, version
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(&likers)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        match row {
            Some(row) => map_row_to_post(row),
            None => Err(self.missed_write_error(id).await),
        }
    }
}

fn map_row_to_post(row: PostRow) -> Result<Post, DomainError> {
    let author = UserId::new(row.author).map_err(|err| DomainError::Upstream(err.to_string()))?;
    let likers = row
        .likers
        .into_iter()
        .map(UserId::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| DomainError::Upstream(err.to_string()))?;

    Post::new(
        row.id,
        row.content,
        row.tags,
        author,
        row.created_at,
        likers,
        row.version,
    )
    .map_err(|err| DomainError::Upstream(err.to_string()))
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    DomainError::Upstream(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::PostgresPostRepository;
    use crate::data::post_repository::{AuthorFilter, NewPost, PostPatch, PostRepository};
    use crate::domain::error::DomainError;
    use crate::domain::identity::UserId;
    use crate::infrastructure::database::{create_pool, run_migrations};

    async fn repository() -> PostgresPostRepository {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = create_pool(&url, 2).await.expect("database must be reachable");
        run_migrations(&pool).await.expect("migrations must apply");
        PostgresPostRepository::new(pool)
    }

    #[tokio::test]
    #[ignore = "requires running Postgres database"]
    async fn conditional_writes_detect_stale_versions() {
        let repo = repository().await;
        let author = UserId::new("pg-author").expect("valid user id");

        let created = repo
            .insert_post(NewPost {
                content: "postgres body".to_string(),
                tags: vec!["pg".to_string()],
                author: author.clone(),
            })
            .await
            .expect("insert must succeed");
        assert_eq!(created.version, 1);
        assert_eq!(created.likers, vec![author.clone()]);

        let updated = repo
            .update_post_if_version(
                &created.id,
                created.version,
                PostPatch {
                    content: "changed".to_string(),
                    tags: vec![],
                },
            )
            .await
            .expect("update must succeed");
        assert_eq!(updated.version, 2);

        let err = repo
            .delete_post_if_version(&created.id, created.version)
            .await
            .expect_err("stale version must conflict");
        assert!(matches!(err, DomainError::Conflict(_)));

        let mine = repo
            .list_posts(AuthorFilter::AuthoredBy(author.clone()))
            .await
            .expect("list must succeed");
        assert!(mine.iter().any(|post| post.id == created.id));

        repo.delete_post_if_version(&created.id, updated.version)
            .await
            .expect("delete must succeed");
        let err = repo
            .delete_post_if_version(&created.id, updated.version)
            .await
            .expect_err("post is gone");
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
