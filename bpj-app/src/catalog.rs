//! Static product catalog, embedded at build time.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub unit: String,
    pub price_idr: u64,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    product: Vec<Product>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn load_embedded() -> Result<Self> {
        Self::from_toml(include_str!("../data/catalog.toml"))
    }

    fn from_toml(raw: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(raw)?;
        if file.product.is_empty() {
            return Err(anyhow::anyhow!("catalog has no products"));
        }

        let mut seen = HashSet::new();
        for product in &file.product {
            if product.id.trim().is_empty() {
                return Err(anyhow::anyhow!("catalog product with empty id"));
            }
            if !seen.insert(product.id.as_str()) {
                return Err(anyhow::anyhow!("duplicate catalog product id: {}", product.id));
            }
        }

        Ok(Self {
            products: file.product,
        })
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}
