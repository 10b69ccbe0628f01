use regex::Regex;
use tracing::{debug, trace};

use crate::catalog::{Catalog, Product};
use crate::highlight::query_pattern;
use crate::sync::FilterOptions;

/// What the user currently has selected. Blank category and sub-category
/// selections are stored as `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    pub region: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub query: String,
}

fn selection(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl FilterState {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = selection(category);
    }

    pub fn set_sub_category(&mut self, sub_category: Option<String>) {
        self.sub_category = selection(sub_category);
    }

    /// Switches region. Both category selections are cleared because the
    /// new region brings its own option lists. Returns whether the region
    /// actually changed.
    pub fn set_region(&mut self, region: impl Into<String>) -> bool {
        let region = region.into();
        if region == self.region {
            return false;
        }
        self.region = region;
        self.category = None;
        self.sub_category = None;
        true
    }

    pub fn is_unfiltered(&self) -> bool {
        self.category.is_none() && self.sub_category.is_none() && self.query.is_empty()
    }

    /// Drops a category or sub-category selection that `options` does not
    /// offer, so the selection never filters by a value the dropdown cannot
    /// show. Returns whether anything was cleared.
    pub fn retain_offered(&mut self, options: &FilterOptions) -> bool {
        let mut cleared = false;
        if let Some(category) = self.category.take() {
            if options.categories.contains(&category) {
                self.category = Some(category);
            } else {
                debug!(%category, region = %self.region, "category not offered, cleared");
                cleared = true;
            }
        }
        if let Some(sub_category) = self.sub_category.take() {
            if options.sub_categories.contains(&sub_category) {
                self.sub_category = Some(sub_category);
            } else {
                debug!(%sub_category, region = %self.region, "sub-category not offered, cleared");
                cleared = true;
            }
        }
        cleared
    }

    pub fn apply<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Product> {
        filter(
            catalog.products(&self.region),
            self.category.as_deref(),
            self.sub_category.as_deref(),
            &self.query,
        )
    }
}

/// The combined category, sub-category and text predicate. The query is
/// compiled once into the same pattern the highlighter marks with.
#[derive(Clone, Debug, Default)]
pub struct ProductFilter<'s> {
    category: Option<&'s str>,
    sub_category: Option<&'s str>,
    needle: Option<Regex>,
}

impl<'s> ProductFilter<'s> {
    pub fn new(category: Option<&'s str>, sub_category: Option<&'s str>, query: &str) -> Self {
        Self {
            category: category.filter(|c| !c.is_empty()),
            sub_category: sub_category.filter(|s| !s.is_empty()),
            needle: query_pattern(query),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.sub_category.is_none() && self.needle.is_none()
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category {
            if product.main_category.as_deref() != Some(category) {
                return false;
            }
        }
        if let Some(sub_category) = self.sub_category {
            if product.sub_category.as_deref() != Some(sub_category) {
                return false;
            }
        }
        match self.needle.as_ref() {
            Some(needle) => needle.is_match(product.search_text()),
            None => true,
        }
    }
}

/// Keeps the products that pass every active filter, in their original
/// order. Runs in a single pass over `products`.
pub fn filter<'a>(
    products: &'a [Product],
    category: Option<&str>,
    sub_category: Option<&str>,
    query: &str,
) -> Vec<&'a Product> {
    let f = ProductFilter::new(category, sub_category, query);
    if f.is_empty() {
        return products.iter().collect();
    }
    let out: Vec<&Product> = products.iter().filter(|p| f.matches(p)).collect();
    trace!(
        total = products.len(),
        matched = out.len(),
        "filter pass complete"
    );
    out
}
