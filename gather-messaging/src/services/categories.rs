use gather_shared::errors::AppResult;
use gather_shared::types::SearchResults;

use crate::models::Category;
use crate::query::SearchDescriptor;
use crate::stores::CategoriesStore;

pub struct CategoriesService {
    store: CategoriesStore,
}

impl CategoriesService {
    pub fn new(store: CategoriesStore) -> Self {
        Self { store }
    }

    pub fn search_categories(
        &self,
        descriptor: &SearchDescriptor,
    ) -> AppResult<SearchResults<Category>> {
        let rows = self.store.search_categories(descriptor)?;
        let total = self.store.count_categories(descriptor)?;
        Ok(SearchResults::new(rows, &descriptor.pagination, total))
    }
}
