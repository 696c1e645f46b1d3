use diesel::prelude::*;
use uuid::Uuid;

use gather_shared::clients::db::DbConnections;
use gather_shared::errors::AppResult;

use crate::models::{ForumCategory, NewForumCategory};
use crate::schema::forum_categories::{self, dsl};
use crate::stores::{read_conn, write_conn};

/// Join rows between forums and category tags. Written together with
/// their forum during creation and never updated independently; reads
/// support the category-tag scope of forum search.
#[derive(Clone)]
pub struct ForumCategoriesStore {
    db: DbConnections,
}

impl ForumCategoriesStore {
    pub fn new(db: DbConnections) -> Self {
        Self { db }
    }

    pub fn create_forum_categories(
        &self,
        forum_id: Uuid,
        category_tags: &[String],
    ) -> AppResult<Vec<ForumCategory>> {
        if category_tags.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = write_conn(&self.db)?;
        let rows: Vec<NewForumCategory> = category_tags
            .iter()
            .map(|tag| NewForumCategory {
                forum_id,
                category_tag: tag.clone(),
            })
            .collect();

        let created = diesel::insert_into(forum_categories::table)
            .values(&rows)
            .get_results::<ForumCategory>(&mut conn)?;

        tracing::info!(
            forum_id = %forum_id,
            categories = created.len(),
            "forum categories created"
        );
        Ok(created)
    }

    pub fn find_forum_ids_by_tags(&self, category_tags: &[String]) -> AppResult<Vec<Uuid>> {
        let mut conn = read_conn(&self.db)?;
        Ok(forum_categories::table
            .filter(dsl::category_tag.eq_any(category_tags.to_vec()))
            .select(dsl::forum_id)
            .distinct()
            .load::<Uuid>(&mut conn)?)
    }

    pub fn tags_for_forum(&self, forum_id: Uuid) -> AppResult<Vec<String>> {
        let mut conn = read_conn(&self.db)?;
        Ok(forum_categories::table
            .filter(dsl::forum_id.eq(forum_id))
            .select(dsl::category_tag)
            .load::<String>(&mut conn)?)
    }
}
