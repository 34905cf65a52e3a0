use async_trait::async_trait;

use crate::{
    application::repos::{AuthorsRepo, RepoError},
    domain::entities::AuthorRecord,
};

use super::{MySqlRepositories, util::map_sqlx_error};

const AUTHOR_COLUMNS: &str = "u.ID AS id, u.user_login AS user_login, \
    u.display_name AS display_name, u.user_url AS user_url, u.user_email AS email";

#[derive(sqlx::FromRow)]
struct AuthorRow {
    id: u64,
    user_login: String,
    display_name: String,
    user_url: String,
    email: String,
}

impl From<AuthorRow> for AuthorRecord {
    fn from(row: AuthorRow) -> Self {
        Self {
            id: row.id,
            user_login: row.user_login,
            display_name: row.display_name,
            user_url: row.user_url,
            email: row.email,
        }
    }
}

#[async_trait]
impl AuthorsRepo for MySqlRepositories {
    async fn find_by_id(&self, id: u64) -> Result<Option<AuthorRecord>, RepoError> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM {} u WHERE u.ID = ?",
            self.table("users")
        );

        let row = sqlx::query_as::<_, AuthorRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(AuthorRecord::from))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<AuthorRecord>, RepoError> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM {} u WHERE u.user_login = ? ORDER BY u.ID LIMIT 1",
            self.table("users")
        );

        let row = sqlx::query_as::<_, AuthorRow>(&sql)
            .bind(login)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(AuthorRecord::from))
    }

    async fn list_with_min_posts(&self, min_posts: u64) -> Result<Vec<AuthorRecord>, RepoError> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM {} u \
             INNER JOIN ( \
                 SELECT p.post_author AS author_id FROM {} p \
                 WHERE p.post_status = 'publish' AND p.post_type = 'post' \
                 GROUP BY p.post_author \
                 HAVING COUNT(*) >= ? \
             ) counts ON counts.author_id = u.ID \
             ORDER BY u.ID",
            self.table("users"),
            self.table("posts"),
        );

        let rows = sqlx::query_as::<_, AuthorRow>(&sql)
            .bind(min_posts)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AuthorRecord::from).collect())
    }
}
