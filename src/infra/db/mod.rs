//! MySQL-backed repository implementations over the WordPress schema.

mod authors;
mod external_meta;
mod meta;
mod posts;
mod preferences;
mod terms;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{
    MySql, QueryBuilder,
    mysql::{MySqlPool, MySqlPoolOptions},
    query,
};

use crate::application::repos::{RepoError, StoreHealth};
use crate::config::DatabaseSettings;

/// Filter shared by every post query: only published blog posts are served.
const PUBLISHED_POST_CONDITION: &str = "p.post_status = 'publish' AND p.post_type = 'post'";

#[derive(Clone)]
pub struct MySqlRepositories {
    pool: Arc<MySqlPool>,
    prefix: Arc<str>,
}

impl MySqlRepositories {
    /// `prefix` is interpolated into table names and must already be validated.
    pub fn new(pool: MySqlPool, prefix: &str) -> Self {
        Self {
            pool: Arc::new(pool),
            prefix: Arc::from(prefix),
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub async fn connect(url: &str, settings: &DatabaseSettings) -> Result<MySqlPool, sqlx::Error> {
        MySqlPoolOptions::new()
            .max_connections(settings.max_connections.get())
            .min_connections(0)
            .max_lifetime(settings.connection_lifetime)
            .connect(url)
            .await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn table(&self, name: &str) -> String {
        table_name(&self.prefix, name)
    }
}

fn table_name(prefix: &str, name: &str) -> String {
    format!("`{prefix}{name}`")
}

fn push_published_scope(qb: &mut QueryBuilder<'_, MySql>) {
    qb.push(" WHERE ");
    qb.push(PUBLISHED_POST_CONDITION);
}

#[async_trait]
impl StoreHealth for MySqlRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}
