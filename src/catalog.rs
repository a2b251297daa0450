use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_COLOR: &str = "#ccc";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file could not be read")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog file")]
    Parse(#[from] toml::de::Error),
    #[error("catalog has no items")]
    Empty,
    #[error("item {0:?} is listed more than once")]
    DuplicateItem(String),
    #[error("item {name:?} has {points} points; points must be positive")]
    NonPositivePoints { name: String, points: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub points: i64,
    #[serde(default)]
    pub color: Option<String>,
}

/// Item point values and display colors, kept in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCatalog {
    items: Vec<CatalogItem>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "item")]
    items: Vec<CatalogItem>,
}

impl ItemCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.name.as_str()) {
                return Err(CatalogError::DuplicateItem(item.name.clone()));
            }
            if item.points <= 0 {
                return Err(CatalogError::NonPositivePoints {
                    name: item.name.clone(),
                    points: item.points,
                });
            }
        }

        Ok(Self { items })
    }

    pub fn builtin() -> Self {
        let items = [
            ("Cesta Básica (Roupas/Alimentos)", 100, "#ff6384"),
            ("Livro (Didático/Ficção)", 20, "#36a2eb"),
            ("Brinquedo (Novo ou Usado)", 30, "#ffcd56"),
            ("Material de Limpeza (1 Unidade)", 10, "#4bc0c0"),
            ("Móvel (Ex: Cadeira, Mesa)", 250, "#9966ff"),
        ]
        .into_iter()
        .map(|(name, points, color)| CatalogItem {
            name: name.to_string(),
            points,
            color: Some(color.to_string()),
        })
        .collect();

        Self { items }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.items)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), items = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, name: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Points per unit, 0 for items the catalog does not know.
    pub fn points_for(&self, name: &str) -> i64 {
        self.get(name).map_or(0, |item| item.points)
    }

    pub fn color_for(&self, name: &str) -> &str {
        self.get(name)
            .and_then(|item| item.color.as_deref())
            .unwrap_or(DEFAULT_COLOR)
    }
}
