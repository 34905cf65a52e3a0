use async_trait::async_trait;
use sqlx::{MySql, QueryBuilder};
use time::PrimitiveDateTime;

use crate::{
    application::pagination::PageRequest,
    application::repos::{PostOrder, PostQueryFilter, PostsRepo, RepoError},
    domain::entities::PostRecord,
};

use super::{
    MySqlRepositories, push_published_scope, table_name,
    util::{contains_pattern, map_sqlx_error},
};

const POST_COLUMNS: &str = "p.ID AS id, p.post_author AS author_id, p.post_content AS content, \
    p.post_title AS title, p.post_date AS post_date, p.post_name AS post_name";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: u64,
    author_id: u64,
    content: String,
    title: String,
    post_date: PrimitiveDateTime,
    post_name: String,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            content: row.content,
            title: row.title,
            // `post_date` carries no offset and is served as UTC.
            post_date: row.post_date.assume_utc(),
            post_name: row.post_name,
        }
    }
}

#[async_trait]
impl PostsRepo for MySqlRepositories {
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        order: PostOrder,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = build_list_posts_query(&self.prefix, filter, order, page);
        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_name(&self, post_name: &str) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::<MySql>::new(format!(
            "SELECT {POST_COLUMNS} FROM {} p",
            self.table("posts")
        ));
        push_published_scope(&mut qb);
        qb.push(" AND p.post_name = ");
        qb.push_bind(post_name.to_string());
        qb.push(" ORDER BY p.ID LIMIT 1");

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

fn build_list_posts_query<'q>(
    prefix: &str,
    filter: &PostQueryFilter,
    order: PostOrder,
    page: PageRequest,
) -> QueryBuilder<'q, MySql> {
    let mut qb = QueryBuilder::<MySql>::new(format!(
        "SELECT {POST_COLUMNS} FROM {} p",
        table_name(prefix, "posts")
    ));
    push_published_scope(&mut qb);

    if let Some(term_id) = filter.term_id {
        qb.push(format!(
            " AND EXISTS (SELECT 1 FROM {} tr INNER JOIN {} tt \
             ON tt.term_taxonomy_id = tr.term_taxonomy_id \
             WHERE tr.object_id = p.ID AND tt.term_id = ",
            table_name(prefix, "term_relationships"),
            table_name(prefix, "term_taxonomy"),
        ));
        qb.push_bind(term_id);
        qb.push(")");
    }

    if let Some(author_id) = filter.author_id {
        qb.push(" AND p.post_author = ");
        qb.push_bind(author_id);
    }

    if let Some(search) = filter.search.as_ref() {
        let pattern = contains_pattern(search);
        qb.push(" AND (p.post_title LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.post_content LIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if !filter.excludes.is_empty() {
        qb.push(" AND p.ID NOT IN (");
        let mut separated = qb.separated(", ");
        for id in &filter.excludes {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
    }

    match order {
        PostOrder::Newest => qb.push(" ORDER BY p.post_date DESC, p.ID DESC"),
        PostOrder::Random => qb.push(" ORDER BY RAND()"),
    };

    qb.push(" LIMIT ");
    qb.push_bind(u64::from(page.size()));
    qb.push(" OFFSET ");
    qb.push_bind(page.offset());

    qb
}
