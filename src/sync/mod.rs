use indexmap::IndexSet;
use tracing::debug;

use crate::catalog::{Catalog, Product};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterControl {
    Category,
    SubCategory,
}

/// The dropdowns whose option lists follow the active region.
pub trait FilterControls {
    fn replace_options(&mut self, control: FilterControl, options: &[String]);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub sub_categories: Vec<String>,
}

/// Distinct non-empty categories and sub-categories of `products`, each in
/// first-seen order.
pub fn populate_filters(products: &[Product]) -> FilterOptions {
    let mut categories: IndexSet<&str> = IndexSet::new();
    let mut sub_categories: IndexSet<&str> = IndexSet::new();
    for p in products.iter() {
        if let Some(c) = p.main_category.as_deref().filter(|c| !c.is_empty()) {
            categories.insert(c);
        }
        if let Some(s) = p.sub_category.as_deref().filter(|s| !s.is_empty()) {
            sub_categories.insert(s);
        }
    }
    FilterOptions {
        categories: categories.into_iter().map(str::to_string).collect(),
        sub_categories: sub_categories.into_iter().map(str::to_string).collect(),
    }
}

pub fn populate_region(catalog: &Catalog, region: &str) -> FilterOptions {
    populate_filters(catalog.products(region))
}

pub fn sync_controls<C: FilterControls + ?Sized>(options: &FilterOptions, controls: &mut C) {
    controls.replace_options(FilterControl::Category, &options.categories);
    controls.replace_options(FilterControl::SubCategory, &options.sub_categories);
    debug!(
        categories = options.categories.len(),
        sub_categories = options.sub_categories.len(),
        "filter options replaced"
    );
}
