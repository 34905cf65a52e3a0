use async_trait::async_trait;

use crate::{
    application::repos::{RepoError, SitePreferencesRepo},
    domain::entities::SitePreferenceRecord,
};

use super::{MySqlRepositories, util::map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SitePreferenceRow {
    id: u64,
    name: String,
    value: Option<String>,
}

#[async_trait]
impl SitePreferencesRepo for MySqlRepositories {
    async fn find_by_name(&self, name: &str) -> Result<Option<SitePreferenceRecord>, RepoError> {
        let row = sqlx::query_as::<_, SitePreferenceRow>(
            "SELECT CAST(id AS UNSIGNED) AS id, name, value FROM site_prefs \
             WHERE name = ? ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| SitePreferenceRecord {
            id: row.id,
            name: row.name,
            value: row.value.unwrap_or_default(),
        }))
    }
}
