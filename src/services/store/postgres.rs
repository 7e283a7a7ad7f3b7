use async_trait::async_trait;
use pgvector::Vector;
use serde_json::Value;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use std::time::Duration;

use super::{DocumentRegistry, FragmentStore, LookupStrategy, validate_identifier};
use crate::error::{RegistryError, RetrievalError};
use crate::models::{
    DatabaseConfig, DocumentFilter, DocumentRecord, DocumentSort, Fragment, StorageConfig,
};

/// Status the ingestion workflow sets once a document is fully processed.
pub const COMPLETED_STATUS: &str = "Completado";

/// Argument name the chunks function is called with, in named notation.
const CHUNKS_FUNCTION_ARG: &str = "document_id";

const DOCUMENT_COLUMNS: &str = "id::text AS id, file_name, storage_path, user_id::text AS user_id, \
     status, uploaded_at::timestamptz AS uploaded_at";

/// Fragment store and document registry over a Supabase-style Postgres
/// database with the pgvector extension.
pub struct PostgresBackend {
    pool: PgPool,
    documents_table: String,
    match_function: String,
    chunks_arg_type: String,
    public_base_url: Option<String>,
    bucket: String,
}

impl PostgresBackend {
    pub async fn connect(
        database: &DatabaseConfig,
        storage: &StorageConfig,
    ) -> Result<Self, RetrievalError> {
        let documents_table = validate_identifier(&database.documents_table)?.to_string();
        let match_function = validate_identifier(&database.match_function)?.to_string();
        let chunks_arg_type = validate_identifier(&database.chunks_function_arg_type)?.to_string();
        let statement_timeout_ms = database.statement_timeout_secs.saturating_mul(1000);

        let pool = PgPoolOptions::new()
            .max_connections(database.pool_max)
            .acquire_timeout(Duration::from_secs(database.acquire_timeout_secs))
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    let sql = format!("SET statement_timeout = {statement_timeout_ms}");
                    sqlx::query(&sql).execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .connect(&database.url)
            .await
            .map_err(|e| RetrievalError::ConnectionError(e.to_string()))?;

        tracing::debug!(url = %database.redacted_url(), "connected to PostgreSQL");

        Ok(Self {
            pool,
            documents_table,
            match_function,
            chunks_arg_type,
            public_base_url: storage.public_base_url.clone(),
            bucket: storage.bucket.clone(),
        })
    }

    /// `{base}/storage/v1/object/public/{bucket}/{path}`
    pub fn public_object_url(base: Option<&str>, bucket: &str, storage_path: &str) -> Option<String> {
        let base = base?.trim_end_matches('/');
        let path = storage_path.trim_start_matches('/');
        if base.is_empty() || path.is_empty() {
            return None;
        }
        Some(format!("{base}/storage/v1/object/public/{bucket}/{path}"))
    }

    /// The document id is always bound as `$1` (text). Function calls use
    /// named notation and cast it to the function's argument type.
    fn lookup_sql(strategy: &LookupStrategy, arg_type: &str) -> Result<String, RetrievalError> {
        let sql = match strategy {
            LookupStrategy::MetadataKey { table, .. } => format!(
                "SELECT to_jsonb(t) - 'embedding' AS row FROM {} AS t WHERE t.metadata->>$2 = $1",
                validate_identifier(table)?
            ),
            LookupStrategy::Function { name } => format!(
                "SELECT to_jsonb(f) - 'embedding' AS row FROM {}({CHUNKS_FUNCTION_ARG} => $1::{}) AS f",
                validate_identifier(name)?,
                validate_identifier(arg_type)?
            ),
            LookupStrategy::Column { table, column } => format!(
                "SELECT to_jsonb(t) - 'embedding' AS row FROM {} AS t WHERE t.{}::text = $1",
                validate_identifier(table)?,
                validate_identifier(column)?
            ),
        };
        Ok(sql)
    }

    fn fragments_from_rows(rows: Vec<PgRow>) -> Result<Vec<Fragment>, RetrievalError> {
        let mut fragments = Vec::with_capacity(rows.len());
        for row in rows {
            let value: Value = row
                .try_get("row")
                .map_err(|e| RetrievalError::InvalidRow(e.to_string()))?;
            match Fragment::from_row(value) {
                Some(fragment) => fragments.push(fragment),
                None => tracing::warn!("skipping fragment row that is not a JSON object"),
            }
        }
        Ok(fragments)
    }

    fn record_from_row(row: &PgRow) -> Result<DocumentRecord, sqlx::Error> {
        Ok(DocumentRecord {
            id: row.try_get("id")?,
            file_name: row
                .try_get::<Option<String>, _>("file_name")?
                .unwrap_or_default(),
            storage_path: row.try_get("storage_path")?,
            user_id: row.try_get("user_id")?,
            status: row.try_get("status")?,
            uploaded_at: row.try_get("uploaded_at")?,
            key_dates: row.try_get::<Option<Value>, _>("key_dates").unwrap_or(None),
        })
    }

    fn escape_like(pattern: &str) -> String {
        let mut escaped = String::with_capacity(pattern.len());
        for c in pattern.chars() {
            if matches!(c, '\\' | '%' | '_') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }
}

#[async_trait]
impl FragmentStore for PostgresBackend {
    async fn health_check(&self) -> Result<bool, RetrievalError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| RetrievalError::ConnectionError(e.to_string()))
    }

    async fn retrieve_similar(
        &self,
        query_vector: Vec<f32>,
        threshold: f32,
        limit: u32,
    ) -> Result<Vec<Fragment>, RetrievalError> {
        let embedding = Vector::from(query_vector);
        let query = format!(
            "SELECT to_jsonb(m) - 'embedding' AS row FROM {}($1, $2, $3) AS m",
            self.match_function
        );

        let rows = sqlx::query(&query)
            .bind(&embedding)
            .bind(f64::from(threshold))
            .bind(i32::try_from(limit).unwrap_or(i32::MAX))
            .fetch_all(&self.pool)
            .await?;

        Self::fragments_from_rows(rows)
    }

    async fn fragments_by(
        &self,
        strategy: &LookupStrategy,
        document_id: &str,
    ) -> Result<Vec<Fragment>, RetrievalError> {
        let sql = Self::lookup_sql(strategy, &self.chunks_arg_type)?;
        let mut query = sqlx::query(&sql).bind(document_id);
        if let LookupStrategy::MetadataKey { key, .. } = strategy {
            query = query.bind(key);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Self::fragments_from_rows(rows)
    }
}

#[async_trait]
impl DocumentRegistry for PostgresBackend {
    async fn get_by_id(&self, id: &str) -> Result<Option<DocumentRecord>, RegistryError> {
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS}, NULL::jsonb AS key_dates FROM {} WHERE id::text = $1",
            self.documents_table
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::record_from_row).transpose()?)
    }

    async fn find_by_exact_name(
        &self,
        name: &str,
    ) -> Result<Option<DocumentRecord>, RegistryError> {
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS}, NULL::jsonb AS key_dates FROM {} WHERE file_name = $1 LIMIT 1",
            self.documents_table
        );

        let row = sqlx::query(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::record_from_row).transpose()?)
    }

    async fn public_url(&self, storage_path: &str) -> Result<Option<String>, RegistryError> {
        Ok(Self::public_object_url(
            self.public_base_url.as_deref(),
            &self.bucket,
            storage_path,
        ))
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>, RegistryError> {
        let mut where_parts = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref owner) = filter.owner {
            params.push(owner.clone());
            where_parts.push(format!("user_id::text = ${}", params.len()));
        }
        if let Some(ref status) = filter.status {
            params.push(status.clone());
            where_parts.push(format!("status = ${}", params.len()));
        }
        if let Some(ref needle) = filter.name_contains {
            params.push(format!("%{}%", Self::escape_like(needle)));
            where_parts.push(format!("file_name ILIKE ${}", params.len()));
        }

        let where_clause = if where_parts.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_parts.join(" AND "))
        };

        let order = match filter.sort {
            DocumentSort::UploadedDesc => "uploaded_at DESC",
            DocumentSort::UploadedAsc => "uploaded_at ASC",
            DocumentSort::NameAsc => "file_name ASC",
            DocumentSort::NameDesc => "file_name DESC",
        };

        let query = format!(
            "SELECT {DOCUMENT_COLUMNS}, NULL::jsonb AS key_dates FROM {} {} ORDER BY {}",
            self.documents_table, where_clause, order
        );

        let mut query_builder = sqlx::query(&query);
        for param in &params {
            query_builder = query_builder.bind(param);
        }

        let rows = query_builder.fetch_all(&self.pool).await?;
        rows.iter()
            .map(Self::record_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RegistryError::from)
    }

    async fn with_key_dates(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<DocumentRecord>, RegistryError> {
        let owner_clause = if owner.is_some() {
            "AND user_id::text = $2"
        } else {
            ""
        };
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS}, to_jsonb(key_dates) AS key_dates FROM {} \
             WHERE key_dates IS NOT NULL AND status = $1 {}",
            self.documents_table, owner_clause
        );

        let mut query_builder = sqlx::query(&query).bind(COMPLETED_STATUS);
        if let Some(owner) = owner {
            query_builder = query_builder.bind(owner);
        }

        let rows = query_builder.fetch_all(&self.pool).await?;
        rows.iter()
            .map(Self::record_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RegistryError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_object_url() {
        assert_eq!(
            PostgresBackend::public_object_url(
                Some("https://abc.supabase.co/"),
                "documents",
                "public/1700000000000-acta.pdf"
            )
            .as_deref(),
            Some("https://abc.supabase.co/storage/v1/object/public/documents/public/1700000000000-acta.pdf")
        );
        assert!(PostgresBackend::public_object_url(None, "documents", "a.pdf").is_none());
        assert!(
            PostgresBackend::public_object_url(Some("https://abc.supabase.co"), "documents", "")
                .is_none()
        );
    }

    #[test]
    fn test_lookup_sql() {
        let sql = PostgresBackend::lookup_sql(
            &LookupStrategy::MetadataKey {
                table: "document_chunks".to_string(),
                key: "documentId".to_string(),
            },
            "uuid",
        )
        .unwrap();
        assert!(sql.contains("FROM document_chunks AS t WHERE t.metadata->>$2 = $1"));

        let sql = PostgresBackend::lookup_sql(
            &LookupStrategy::Column {
                table: "chunks".to_string(),
                column: "document_id".to_string(),
            },
            "uuid",
        )
        .unwrap();
        assert!(sql.contains("WHERE t.document_id::text = $1"));

        let err = PostgresBackend::lookup_sql(
            &LookupStrategy::Function {
                name: "x(); DROP TABLE documents; --".to_string(),
            },
            "uuid",
        )
        .unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_chunks_function_called_by_name_with_cast() {
        let chunks = LookupStrategy::Function {
            name: "get_document_chunks".to_string(),
        };

        let sql = PostgresBackend::lookup_sql(&chunks, "uuid").unwrap();
        assert!(sql.ends_with("FROM get_document_chunks(document_id => $1::uuid) AS f"));

        let sql = PostgresBackend::lookup_sql(&chunks, "bigint").unwrap();
        assert!(sql.contains("get_document_chunks(document_id => $1::bigint)"));

        let err = PostgresBackend::lookup_sql(&chunks, "uuid); DROP TABLE documents; --").unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(PostgresBackend::escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(PostgresBackend::escape_like("acta"), "acta");
    }
}
