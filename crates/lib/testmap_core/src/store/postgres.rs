//! PostgreSQL + pgvector implementation of [`VectorStore`].
//!
//! Query vectors are always bound as typed `vector` parameters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    SimilarityMatch, StoreError, TestKey, TestVector, TestVectorInput, UpsertOutcome,
    VectorStore, check_dimensions, sort_matches,
};
use crate::uuid::uuidv7;

/// Width of the `embedding vector(N)` column created by the migrations.
pub const COLUMN_DIMENSIONS: usize = 1536;

/// Row returned by test vector queries.
#[derive(Debug, sqlx::FromRow)]
struct TestVectorRow {
    id: Uuid,
    module: String,
    app: String,
    test_name: String,
    relative_path: String,
    description: String,
    embedding: Vector,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TestVectorRow> for TestVector {
    fn from(row: TestVectorRow) -> Self {
        TestVector {
            id: row.id,
            key: TestKey {
                module: row.module,
                app: row.app,
                test_name: row.test_name,
            },
            relative_path: row.relative_path,
            description: row.description,
            embedding: row.embedding.to_vec(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Vector store backed by the `test_vectors` table.
#[derive(Debug, Clone)]
pub struct PgVectorStore {
    pool: PgPool,
    dimensions: usize,
}

impl PgVectorStore {
    /// `dimensions` must match the `vector(N)` column of the migration.
    pub fn new(pool: PgPool, dimensions: usize) -> Self {
        Self { pool, dimensions }
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn exists(&self, key: &TestKey) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM test_vectors
                WHERE module = $1 AND app = $2 AND test_name = $3
            )
            "#,
        )
        .bind(&key.module)
        .bind(&key.app)
        .bind(&key.test_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn get(&self, key: &TestKey) -> Result<Option<TestVector>, StoreError> {
        let row = sqlx::query_as::<_, TestVectorRow>(
            r#"
            SELECT id, module, app, test_name, relative_path, description,
                   embedding, created_at, updated_at
            FROM test_vectors
            WHERE module = $1 AND app = $2 AND test_name = $3
            "#,
        )
        .bind(&key.module)
        .bind(&key.app)
        .bind(&key.test_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TestVector::from))
    }

    async fn upsert(&self, input: &TestVectorInput) -> Result<UpsertOutcome, StoreError> {
        check_dimensions(self.dimensions, input.embedding.len())?;

        // One statement: the unique constraint arbitrates concurrent inserts
        // and the loser becomes the update branch.
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO test_vectors
                (id, module, app, test_name, relative_path, description, embedding)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ON CONSTRAINT test_vectors_identity DO UPDATE SET
                relative_path = EXCLUDED.relative_path,
                description   = EXCLUDED.description,
                embedding     = EXCLUDED.embedding,
                updated_at    = GREATEST(now(), test_vectors.updated_at)
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(uuidv7())
        .bind(&input.key.module)
        .bind(&input.key.app)
        .bind(&input.key.test_name)
        .bind(&input.relative_path)
        .bind(&input.description)
        .bind(Vector::from(input.embedding.clone()))
        .fetch_one(&self.pool)
        .await?;

        Ok(if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<SimilarityMatch>, StoreError> {
        check_dimensions(self.dimensions, query.len())?;
        if k == 0 {
            return Err(StoreError::InvalidTopK);
        }

        let rows = sqlx::query_as::<_, (String, String, String, f64)>(
            r#"
            SELECT module, app, test_name,
                   1 - (embedding <=> $1) AS similarity
            FROM test_vectors
            ORDER BY embedding <=> $1
            LIMIT $2
            "#,
        )
        .bind(Vector::from(query.to_vec()))
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await?;

        // Ordering by distance alone lets the planner use the HNSW index;
        // key tie-breaks are applied here.
        let mut matches: Vec<SimilarityMatch> = rows
            .into_iter()
            .map(|(module, app, test_name, similarity)| SimilarityMatch {
                module,
                app,
                test_name,
                similarity,
            })
            .collect();
        sort_matches(&mut matches);
        Ok(matches)
    }
}
