use tracing::debug;

use crate::catalog::Product;
use crate::highlight::{escape_html, Highlighter};

pub const COLUMNS: [&str; 4] = ["SKU", "Pole Height", "Wall Thickness", "Price"];

const EMPTY_MESSAGE: &str = "No products match the current filters.";

/// Something that owns a table body and can swap its whole content.
pub trait TableView {
    fn replace_body(&mut self, markup: String);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub products: usize,
    pub category_headers: usize,
    pub sub_category_headers: usize,
}

impl RenderStats {
    pub fn rows(&self) -> usize {
        self.products + self.category_headers + self.sub_category_headers
    }
}

pub fn format_price(price: Option<f64>, currency: Option<&str>) -> String {
    match (price, currency) {
        (Some(p), Some(c)) => format!("{p:.2} {c}"),
        (Some(p), None) => format!("{p:.2}"),
        (None, _) => "-".to_string(),
    }
}

fn header_row(class: &str, label: &str, highlighter: &Highlighter) -> String {
    format!(
        r#"<tr class="{class}"><th colspan="{}" scope="colgroup">{}</th></tr>"#,
        COLUMNS.len(),
        highlighter.highlight(label)
    )
}

fn product_row(p: &Product, highlighter: &Highlighter, currency: Option<&str>) -> String {
    format!(
        r#"<tr class="product-row" data-sku="{}"><td class="sku">{}</td><td>{}</td><td>{}</td><td class="price">{}</td></tr>"#,
        escape_html(&p.sku),
        highlighter.highlight(&p.sku),
        highlighter.highlight(p.pole_height.as_deref().unwrap_or_default()),
        highlighter.highlight(p.wall_thickness.as_deref().unwrap_or_default()),
        escape_html(&format_price(p.price, currency)),
    )
}

/// Builds the grouped row markup for `products`.
///
/// A category header opens every run of products sharing a
/// `main_category`; inside it a sub-category header opens every run sharing
/// a `sub_category`. Products without a value at a level get no header at
/// that level.
pub fn render_rows(
    products: &[&Product],
    highlighter: &Highlighter,
    currency: Option<&str>,
) -> (String, RenderStats) {
    let mut stats = RenderStats::default();
    if products.is_empty() {
        let row = format!(
            r#"<tr class="empty-row"><td colspan="{}">{EMPTY_MESSAGE}</td></tr>"#,
            COLUMNS.len()
        );
        return (row, stats);
    }

    let mut fragments: Vec<String> = Vec::with_capacity(products.len() + 8);
    let mut open_category: Option<Option<&str>> = None;
    let mut open_sub_category: Option<Option<&str>> = None;

    for p in products.iter() {
        let category = p.main_category.as_deref();
        let sub_category = p.sub_category.as_deref();

        if open_category != Some(category) {
            open_category = Some(category);
            open_sub_category = None;
            if let Some(label) = category {
                fragments.push(header_row("category-row", label, highlighter));
                stats.category_headers += 1;
            }
        }
        if open_sub_category != Some(sub_category) {
            open_sub_category = Some(sub_category);
            if let Some(label) = sub_category {
                fragments.push(header_row("sub-category-row", label, highlighter));
                stats.sub_category_headers += 1;
            }
        }

        fragments.push(product_row(p, highlighter, currency));
        stats.products += 1;
    }

    (fragments.join(""), stats)
}

/// Renders `products` and replaces the view's table body in one call.
pub fn render<V: TableView + ?Sized>(
    products: &[&Product],
    highlighter: &Highlighter,
    currency: Option<&str>,
    view: &mut V,
) -> RenderStats {
    let (markup, stats) = render_rows(products, highlighter, currency);
    view.replace_body(markup);
    debug!(
        products = stats.products,
        rows = stats.rows(),
        highlighted = highlighter.is_active(),
        "table body replaced"
    );
    stats
}

/// A complete `<table>` element, header included, around the rendered rows.
pub fn render_table(products: &[&Product], highlighter: &Highlighter, currency: Option<&str>) -> String {
    let (rows, _) = render_rows(products, highlighter, currency);
    let head = COLUMNS
        .iter()
        .map(|c| format!("<th scope=\"col\">{c}</th>"))
        .collect::<String>();
    format!(
        "<table class=\"catalog\">\n<thead><tr>{head}</tr></thead>\n<tbody id=\"catalog-body\">{rows}</tbody>\n</table>\n"
    )
}
