pub mod page;

use itertools::Itertools;
use serde::Serialize;

use crate::catalog::{Catalog, Product};
use crate::filter::FilterState;
use crate::highlight::Highlighter;
use crate::render::{self, format_price};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
    Page,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "table" => Some(Self::Html),
            "page" => Some(Self::Page),
            _ => None,
        }
    }
}

/// `.html` files get the full page, since a bare table fragment is rarely
/// what a file on disk is for.
pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Page);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputRecord {
    pub region: String,
    pub sku: String,
    pub pole_height: String,
    pub wall_thickness: String,
    pub main_category: String,
    pub sub_category: String,
    pub price: Option<f64>,
    pub currency: String,
}

pub fn build_records(region: &str, currency: Option<&str>, products: &[&Product]) -> Vec<OutputRecord> {
    products
        .iter()
        .map(|p| OutputRecord {
            region: region.to_string(),
            sku: p.sku.clone(),
            pole_height: p.pole_height.clone().unwrap_or_default(),
            wall_thickness: p.wall_thickness.clone().unwrap_or_default(),
            main_category: p.main_category.clone().unwrap_or_default(),
            sub_category: p.sub_category.clone().unwrap_or_default(),
            price: p.price,
            currency: currency.unwrap_or_default().to_string(),
        })
        .collect()
}

/// Plain, column-aligned listing with the same grouping as the HTML table.
pub fn render_text(records: &[OutputRecord]) -> Vec<u8> {
    let sku_w = records.iter().map(|r| r.sku.len()).max().unwrap_or(0).max(3);
    let pole_w = records.iter().map(|r| r.pole_height.len()).max().unwrap_or(0).max(4);
    let wall_w = records.iter().map(|r| r.wall_thickness.len()).max().unwrap_or(0).max(4);

    let mut out = String::new();
    if records.is_empty() {
        out.push_str("no matching products\n");
        return out.into_bytes();
    }

    for (category, group) in &records.iter().group_by(|&r| r.main_category.as_str()) {
        if !category.is_empty() {
            out.push_str(&format!("== {category} ==\n"));
        }
        for (sub_category, rows) in &group.group_by(|&r| r.sub_category.as_str()) {
            if !sub_category.is_empty() {
                out.push_str(&format!("  -- {sub_category} --\n"));
            }
            for r in rows {
                let currency = (!r.currency.is_empty()).then_some(r.currency.as_str());
                let line = [
                    format!("{:<sku_w$}", r.sku),
                    format!("{:<pole_w$}", r.pole_height),
                    format!("{:<wall_w$}", r.wall_thickness),
                    format_price(r.price, currency),
                ]
                .iter()
                .join("  ");
                out.push_str("    ");
                out.push_str(line.trim_end());
                out.push('\n');
            }
        }
    }
    out.into_bytes()
}

pub fn render_json(records: &[OutputRecord]) -> Vec<u8> {
    serde_json::to_vec_pretty(records).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub fn render_html(products: &[&Product], state: &FilterState, currency: Option<&str>) -> Vec<u8> {
    let highlighter = Highlighter::new(&state.query);
    render::render_table(products, &highlighter, currency).into_bytes()
}

/// Renders one filter pass over `catalog` in `format`.
pub fn render(format: OutputFormat, catalog: &Catalog, state: &FilterState, debounce_ms: u64) -> Vec<u8> {
    let products = state.apply(catalog);
    let currency = catalog.currency(&state.region);
    match format {
        OutputFormat::Text => render_text(&build_records(&state.region, currency, &products)),
        OutputFormat::Json => render_json(&build_records(&state.region, currency, &products)),
        OutputFormat::Html => render_html(&products, state, currency),
        OutputFormat::Page => page::render_page(catalog, state, debounce_ms),
    }
}
