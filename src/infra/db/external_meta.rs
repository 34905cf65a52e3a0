use async_trait::async_trait;

use crate::{
    application::repos::{ExternalMetaRepo, RepoError},
    domain::entities::ExternalMetaRecord,
};

use super::{MySqlRepositories, util::map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ExternalMetaRow {
    id: u64,
    post_id: u64,
    name: String,
    value: Option<String>,
}

impl From<ExternalMetaRow> for ExternalMetaRecord {
    fn from(row: ExternalMetaRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            name: row.name,
            value: row.value.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl ExternalMetaRepo for MySqlRepositories {
    async fn list_for_post(&self, post_id: u64) -> Result<Vec<ExternalMetaRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ExternalMetaRow>(
            "SELECT CAST(id AS UNSIGNED) AS id, CAST(post_id AS UNSIGNED) AS post_id, name, value \
             FROM post_external_metas WHERE post_id = ? ORDER BY id",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ExternalMetaRecord::from).collect())
    }

    async fn upsert(&self, post_id: u64, name: &str, value: &str) -> Result<(), RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let updated = sqlx::query(
            "UPDATE post_external_metas SET value = ? WHERE post_id = ? AND name = ?",
        )
        .bind(value)
        .bind(post_id)
        .bind(name)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        if updated == 0 {
            let existing: Option<(u64,)> = sqlx::query_as(
                "SELECT CAST(id AS UNSIGNED) FROM post_external_metas \
                 WHERE post_id = ? AND name = ? LIMIT 1",
            )
            .bind(post_id)
            .bind(name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            // MySQL reports zero affected rows when the stored value is unchanged.
            if existing.is_none() {
                sqlx::query(
                    "INSERT INTO post_external_metas (post_id, name, value) VALUES (?, ?, ?)",
                )
                .bind(post_id)
                .bind(name)
                .bind(value)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            }
        }

        tx.commit().await.map_err(map_sqlx_error)
    }
}
