use async_trait::async_trait;
use sqlx::{MySql, QueryBuilder};

use crate::{
    application::repos::{PostMetaRepo, RepoError},
    domain::entities::PostMetaRecord,
};

use super::{MySqlRepositories, util::map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PostMetaRow {
    meta_key: Option<String>,
    meta_value: Option<String>,
}

#[async_trait]
impl PostMetaRepo for MySqlRepositories {
    async fn list_for_post(
        &self,
        post_id: u64,
        keys: &[&str],
    ) -> Result<Vec<PostMetaRecord>, RepoError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<MySql>::new(format!(
            "SELECT m.meta_key, m.meta_value FROM {} m WHERE m.post_id = ",
            self.table("postmeta")
        ));
        qb.push_bind(post_id);
        qb.push(" AND m.meta_key IN (");
        let mut separated = qb.separated(", ");
        for key in keys {
            separated.push_bind(key.to_string());
        }
        separated.push_unseparated(") ORDER BY m.meta_id");

        let rows = qb
            .build_query_as::<PostMetaRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                Some(PostMetaRecord {
                    key: row.meta_key?,
                    value: row.meta_value.unwrap_or_default(),
                })
            })
            .collect())
    }
}
