mod document;

pub use document::Document;

use tracing::{info, warn};

use crate::catalog::{Catalog, Product};
use crate::coordinator::FilterCycle;
use crate::filter::FilterState;
use crate::highlight::Highlighter;
use crate::render::{self, RenderStats, TableView};
use crate::sync::{self, FilterControls, FilterOptions};

/// Ties the catalog to a view. Each applied cycle re-syncs the dropdowns
/// when the region moved, then filters and redraws the table once.
pub struct Session<'a, V> {
    catalog: &'a Catalog,
    view: V,
    state: FilterState,
    options: FilterOptions,
    matches: Vec<&'a Product>,
    cycles: usize,
}

impl<'a, V: TableView + FilterControls> Session<'a, V> {
    /// Populates the dropdowns for `state.region` and draws the first table.
    pub fn new(catalog: &'a Catalog, state: FilterState, view: V) -> Self {
        let mut session = Self {
            catalog,
            view,
            state: state.clone(),
            options: FilterOptions::default(),
            matches: Vec::new(),
            cycles: 0,
        };
        session.apply(FilterCycle {
            state,
            region_changed: true,
        });
        session
    }

    pub fn apply(&mut self, cycle: FilterCycle) -> RenderStats {
        let region_changed = cycle.region_changed || cycle.state.region != self.state.region;
        self.state = cycle.state;
        if region_changed {
            if !self.catalog.contains_region(&self.state.region) {
                warn!(region = %self.state.region, "unknown region selected, showing no products");
            }
            self.options = sync::populate_region(self.catalog, &self.state.region);
            sync::sync_controls(&self.options, &mut self.view);
        }
        self.state.retain_offered(&self.options);

        self.matches = self.state.apply(self.catalog);
        let highlighter = Highlighter::new(&self.state.query);
        let currency = self.catalog.currency(&self.state.region);
        let stats = render::render(&self.matches, &highlighter, currency, &mut self.view);
        self.cycles += 1;

        info!(
            cycle = self.cycles,
            region = %self.state.region,
            category = self.state.category.as_deref().unwrap_or(""),
            sub_category = self.state.sub_category.as_deref().unwrap_or(""),
            query = %self.state.query,
            matched = stats.products,
            "catalog redrawn"
        );
        stats
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn filter_options(&self) -> &FilterOptions {
        &self.options
    }

    /// Products shown by the last redraw.
    pub fn matches(&self) -> &[&'a Product] {
        &self.matches
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }

    pub fn view(&self) -> &V {
        &self.view
    }
}
