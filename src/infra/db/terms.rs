use async_trait::async_trait;
use sqlx::{MySql, QueryBuilder};

use crate::{
    application::repos::{RepoError, TermsRepo},
    domain::{
        entities::{TermCountRecord, TermRecord},
        types::Taxonomy,
    },
};

use super::{
    MySqlRepositories, table_name,
    util::{convert_count, map_sqlx_error},
};

const POST_TAG_TAXONOMY: &str = "post_tag";

#[derive(sqlx::FromRow)]
struct TermRow {
    id: u64,
    taxonomy: String,
    name: String,
    slug: String,
}

impl From<TermRow> for TermRecord {
    fn from(row: TermRow) -> Self {
        Self {
            id: row.id,
            taxonomy: Taxonomy::from(row.taxonomy),
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TermCountRow {
    id: u64,
    name: String,
    slug: String,
    post_count: i64,
}

#[async_trait]
impl TermsRepo for MySqlRepositories {
    async fn list_for_post(&self, post_id: u64) -> Result<Vec<TermRecord>, RepoError> {
        let sql = format!(
            "SELECT t.term_id AS id, tt.taxonomy AS taxonomy, t.name AS name, t.slug AS slug \
             FROM {} t \
             INNER JOIN {} tt ON tt.term_id = t.term_id \
             INNER JOIN {} tr ON tr.term_taxonomy_id = tt.term_taxonomy_id \
             WHERE tr.object_id = ? \
             ORDER BY tr.term_order, t.term_id",
            self.table("terms"),
            self.table("term_taxonomy"),
            self.table("term_relationships"),
        );

        let rows = sqlx::query_as::<_, TermRow>(&sql)
            .bind(post_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TermRecord::from).collect())
    }

    async fn find_by_slug(
        &self,
        slug: &str,
        taxonomy: &Taxonomy,
    ) -> Result<Option<TermRecord>, RepoError> {
        let sql = format!(
            "SELECT t.term_id AS id, tt.taxonomy AS taxonomy, t.name AS name, t.slug AS slug \
             FROM {} t \
             INNER JOIN {} tt ON tt.term_id = t.term_id AND tt.taxonomy = ? \
             WHERE t.slug = ? \
             ORDER BY t.term_id \
             LIMIT 1",
            self.table("terms"),
            self.table("term_taxonomy"),
        );

        let row = sqlx::query_as::<_, TermRow>(&sql)
            .bind(taxonomy.as_str())
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(TermRecord::from))
    }

    async fn list_popular_tags(
        &self,
        min_posts: u64,
        limit: u32,
    ) -> Result<Vec<TermCountRecord>, RepoError> {
        let mut qb = build_popular_tags_query(&self.prefix, min_posts, limit);
        let rows = qb
            .build_query_as::<TermCountRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(TermCountRecord {
                    post_count: convert_count(row.post_count)?,
                    term: TermRecord {
                        id: row.id,
                        taxonomy: Taxonomy::PostTag,
                        name: row.name,
                        slug: row.slug,
                    },
                })
            })
            .collect()
    }
}

fn build_popular_tags_query<'q>(
    prefix: &str,
    min_posts: u64,
    limit: u32,
) -> QueryBuilder<'q, MySql> {
    let mut qb = QueryBuilder::<MySql>::new(format!(
        "SELECT t.term_id AS id, t.name AS name, t.slug AS slug, \
         COUNT(DISTINCT tr.object_id) AS post_count \
         FROM {} tr \
         INNER JOIN {} tt ON tt.term_taxonomy_id = tr.term_taxonomy_id \
         INNER JOIN {} t ON t.term_id = tt.term_id \
         INNER JOIN {} p ON p.ID = tr.object_id \
         AND p.post_status = 'publish' AND p.post_type = 'post' \
         WHERE tt.taxonomy = ",
        table_name(prefix, "term_relationships"),
        table_name(prefix, "term_taxonomy"),
        table_name(prefix, "terms"),
        table_name(prefix, "posts"),
    ));
    qb.push_bind(POST_TAG_TAXONOMY);
    qb.push(" GROUP BY t.term_id, t.name, t.slug HAVING COUNT(DISTINCT tr.object_id) >= ");
    qb.push_bind(min_posts);
    qb.push(" ORDER BY post_count DESC, t.term_id LIMIT ");
    qb.push_bind(limit);
    qb
}
