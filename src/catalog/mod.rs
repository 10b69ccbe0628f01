use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported catalog format: {path} (expected .json, .yml or .yaml)")]
    UnsupportedFormat { path: String },

    #[error("catalog has no regions")]
    NoRegions,

    #[error("region '{region}' has a product without a sku at position {index}")]
    EmptySku { region: String, index: usize },

    #[error("region '{region}' lists sku '{sku}' more than once")]
    DuplicateSku { region: String, sku: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// One priced SKU. Optional text fields that are missing or blank in the
/// dataset are stored as `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProductRecord")]
pub struct Product {
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pole_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_thickness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    search_text: String,
}

#[derive(Deserialize)]
struct ProductRecord {
    #[serde(default)]
    sku: String,
    #[serde(default)]
    pole_height: Option<String>,
    #[serde(default)]
    wall_thickness: Option<String>,
    #[serde(default)]
    main_category: Option<String>,
    #[serde(default)]
    sub_category: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    description: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<ProductRecord> for Product {
    fn from(r: ProductRecord) -> Self {
        let mut product = Self {
            sku: r.sku.trim().to_string(),
            pole_height: non_blank(r.pole_height),
            wall_thickness: non_blank(r.wall_thickness),
            main_category: non_blank(r.main_category),
            sub_category: non_blank(r.sub_category),
            price: r.price,
            description: non_blank(r.description),
            search_text: String::new(),
        };
        product.reindex();
        product
    }
}

/// Lower-cases char by char, keeping any char whose lower case is more than
/// one char. Every folded char stays in the case class of the original, so a
/// case-insensitive pattern matches the folded text wherever it matches the
/// original. `str::to_lowercase` does not hold to that (final sigma).
fn fold_case_into(part: &str, out: &mut String) {
    for c in part.chars() {
        let mut lower = c.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) => out.push(l),
            _ => out.push(c),
        }
    }
}

impl Product {
    pub fn new(sku: impl Into<String>) -> Self {
        let mut product = Self {
            sku: sku.into(),
            pole_height: None,
            wall_thickness: None,
            main_category: None,
            sub_category: None,
            price: None,
            description: None,
            search_text: String::new(),
        };
        product.reindex();
        product
    }

    pub fn with_pole_height(mut self, value: impl Into<String>) -> Self {
        self.pole_height = non_blank(Some(value.into()));
        self.reindex();
        self
    }

    pub fn with_wall_thickness(mut self, value: impl Into<String>) -> Self {
        self.wall_thickness = non_blank(Some(value.into()));
        self.reindex();
        self
    }

    pub fn with_category(mut self, main: impl Into<String>, sub: impl Into<String>) -> Self {
        self.main_category = non_blank(Some(main.into()));
        self.sub_category = non_blank(Some(sub.into()));
        self.reindex();
        self
    }

    pub fn with_main_category(mut self, main: impl Into<String>) -> Self {
        self.main_category = non_blank(Some(main.into()));
        self.reindex();
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Case-folded sku, pole height, wall thickness, category and
    /// sub-category, space separated. Built once when the product is created.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    fn reindex(&mut self) {
        let parts = [
            Some(self.sku.as_str()),
            self.pole_height.as_deref(),
            self.wall_thickness.as_deref(),
            self.main_category.as_deref(),
            self.sub_category.as_deref(),
        ];
        let mut text = String::new();
        for part in parts.into_iter().flatten().filter(|p| !p.is_empty()) {
            if !text.is_empty() {
                text.push(' ');
            }
            fold_case_into(part, &mut text);
        }
        self.search_text = text;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Region {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            label: None,
            currency: None,
            products,
        }
    }
}

#[derive(Deserialize)]
struct Dataset {
    regions: IndexMap<String, Region>,
}

/// Region id to product list, in dataset order. Read-only once built.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Catalog {
    regions: IndexMap<String, Region>,
}

impl Catalog {
    pub fn from_regions(regions: IndexMap<String, Region>) -> Result<Self, CatalogError> {
        if regions.is_empty() {
            return Err(CatalogError::NoRegions);
        }
        for (id, region) in regions.iter() {
            let mut seen: HashSet<&str> = HashSet::with_capacity(region.products.len());
            for (index, product) in region.products.iter().enumerate() {
                if product.sku.is_empty() {
                    return Err(CatalogError::EmptySku {
                        region: id.clone(),
                        index,
                    });
                }
                if !seen.insert(product.sku.as_str()) {
                    return Err(CatalogError::DuplicateSku {
                        region: id.clone(),
                        sku: product.sku.clone(),
                    });
                }
            }
            debug!(region = %id, products = region.products.len(), "region indexed");
        }
        Ok(Self { regions })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let dataset: Dataset = serde_json::from_str(raw)?;
        Self::from_regions(dataset.regions)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, CatalogError> {
        let dataset: Dataset = serde_yaml::from_str(raw)?;
        Self::from_regions(dataset.regions)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let format = DataFormat::from_path(path).ok_or_else(|| CatalogError::UnsupportedFormat {
            path: path.display().to_string(),
        })?;
        let raw = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let catalog = match format {
            DataFormat::Json => Self::from_json_str(&raw)?,
            DataFormat::Yaml => Self::from_yaml_str(&raw)?,
        };
        info!(
            path = %path.display(),
            regions = catalog.regions.len(),
            products = catalog.product_count(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Products of `region`; an id that is not in the catalog yields an
    /// empty slice.
    pub fn products(&self, region: &str) -> &[Product] {
        match self.regions.get(region) {
            Some(r) => &r.products,
            None => &[],
        }
    }

    pub fn contains_region(&self, id: &str) -> bool {
        self.regions.contains_key(id)
    }

    pub fn region_ids(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(|k| k.as_str())
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &Region)> {
        self.regions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn default_region(&self) -> Option<&str> {
        self.regions.keys().next().map(|k| k.as_str())
    }

    pub fn currency(&self, region: &str) -> Option<&str> {
        self.regions.get(region)?.currency.as_deref()
    }

    pub fn product_count(&self) -> usize {
        self.regions.values().map(|r| r.products.len()).sum()
    }
}
