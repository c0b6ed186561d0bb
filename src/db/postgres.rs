use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{ItemId, Movie, Rating, RelationEdge, UserId},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the bundled schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

const RATING_COLUMNS: &str = "id, movie_id, user_id, value, created_at, updated_at";

/// Catalog store backed by PostgreSQL
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn keys(ids: &[ItemId]) -> Vec<String> {
    ids.iter().map(|id| id.as_str().to_string()).collect()
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_edges_by_primary_ids(&self, ids: &[ItemId]) -> AppResult<Vec<RelationEdge>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let edges = sqlx::query_as::<_, RelationEdge>(
            r#"
            SELECT id, primary_movie_id, secondary_movie_id
            FROM movie_relations
            WHERE primary_movie_id = ANY($1)
            "#,
        )
        .bind(keys(ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(edges)
    }

    async fn find_movie_by_id(&self, id: &ItemId) -> AppResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, description, video_url, thumbnail_url, genre, duration
            FROM movies
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(movie)
    }

    async fn find_movies_by_ids(&self, ids: &[ItemId]) -> AppResult<Vec<Movie>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let movies = sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, description, video_url, thumbnail_url, genre, duration
            FROM movies
            WHERE id = ANY($1)
            "#,
        )
        .bind(keys(ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn find_ratings_by_movie_id(&self, id: &ItemId) -> AppResult<Vec<Rating>> {
        let query = format!(
            "SELECT {} FROM ratings WHERE movie_id = $1 ORDER BY created_at, id",
            RATING_COLUMNS
        );
        let ratings = sqlx::query_as::<_, Rating>(&query)
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(ratings)
    }

    async fn create_rating(
        &self,
        movie_id: &ItemId,
        user_id: &UserId,
        value: f64,
    ) -> AppResult<Rating> {
        // The unique (movie_id, user_id) constraint turns a lost find-then-create
        // race into an update of the winner's row.
        let query = format!(
            r#"
            INSERT INTO ratings (id, movie_id, user_id, value)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (movie_id, user_id)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            RETURNING {}
            "#,
            RATING_COLUMNS
        );
        let rating = sqlx::query_as::<_, Rating>(&query)
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(movie_id.as_str())
            .bind(user_id.as_str())
            .bind(value)
            .fetch_one(&self.pool)
            .await?;

        Ok(rating)
    }

    async fn update_rating_value(&self, rating_id: &str, value: f64) -> AppResult<Rating> {
        let query = format!(
            "UPDATE ratings SET value = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            RATING_COLUMNS
        );
        sqlx::query_as::<_, Rating>(&query)
            .bind(rating_id)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rating {}", rating_id)))
    }
}
