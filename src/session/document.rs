use crate::render::TableView;
use crate::sync::{FilterControl, FilterControls};

/// In-memory page state: the table body and both dropdown option lists,
/// plus how often each was replaced.
#[derive(Clone, Debug, Default)]
pub struct Document {
    body: String,
    categories: Vec<String>,
    sub_categories: Vec<String>,
    body_writes: usize,
    option_writes: usize,
}

impl Document {
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn sub_categories(&self) -> &[String] {
        &self.sub_categories
    }

    pub fn body_writes(&self) -> usize {
        self.body_writes
    }

    pub fn option_writes(&self) -> usize {
        self.option_writes
    }
}

impl TableView for Document {
    fn replace_body(&mut self, markup: String) {
        self.body = markup;
        self.body_writes += 1;
    }
}

impl FilterControls for Document {
    fn replace_options(&mut self, control: FilterControl, options: &[String]) {
        let target = match control {
            FilterControl::Category => &mut self.categories,
            FilterControl::SubCategory => &mut self.sub_categories,
        };
        target.clear();
        target.extend_from_slice(options);
        self.option_writes += 1;
    }
}
