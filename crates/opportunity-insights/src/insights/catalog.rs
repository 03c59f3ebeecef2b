use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum CatalogError {
    Io { path: PathBuf, source: std::io::Error },
    Csv(csv::Error),
    UnknownMarket(String),
    UnknownProduct { category: String, product: String },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io { path, source } => {
                write!(f, "failed to read catalog {}: {}", path.display(), source)
            }
            CatalogError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogError::UnknownMarket(market) => write!(f, "unknown market '{}'", market),
            CatalogError::UnknownProduct { category, product } => {
                write!(f, "'{}' is not listed under '{}'", product, category)
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io { source, .. } => Some(source),
            CatalogError::Csv(err) => Some(err),
            CatalogError::UnknownMarket(_) | CatalogError::UnknownProduct { .. } => None,
        }
    }
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl CatalogError {
    /// True when the market or product is simply not in the catalog.
    pub fn is_not_found(&self) -> bool {
        match self {
            CatalogError::UnknownMarket(_) | CatalogError::UnknownProduct { .. } => true,
            CatalogError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            CatalogError::Csv(_) => false,
        }
    }
}

/// One opportunity listed in a market catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OpportunityRow {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub product: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub demand_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub growth_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub competition_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub unit_economics_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub differentiation_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub compliance_risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub search_volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub revenue_potential: Option<f64>,
}

/// Products grouped under a single category, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryListing {
    pub category: String,
    pub products: Vec<String>,
}

/// The opportunity rows of one market, as loaded from `<market>.csv`.
#[derive(Debug, Clone, Default)]
pub struct OpportunityCatalog {
    rows: Vec<OpportunityRow>,
}

impl OpportunityCatalog {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.deserialize::<OpportunityRow>() {
            let row = record?;
            if row.category.is_empty() || row.product.is_empty() {
                continue;
            }
            rows.push(row);
        }

        Ok(Self { rows })
    }

    /// Load the catalog for `market` from `dir`.
    pub fn load_market<P: AsRef<Path>>(dir: P, market: &str) -> Result<Self, CatalogError> {
        if !is_market_slug(market) {
            return Err(CatalogError::UnknownMarket(market.to_string()));
        }
        Self::from_path(dir.as_ref().join(format!("{market}.csv")))
    }

    pub fn rows(&self) -> &[OpportunityRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Unique categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.category.as_str()) {
                seen.push(&row.category);
            }
        }
        seen
    }

    pub fn products(&self, category: &str) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|row| row.category == category)
            .map(|row| row.product.as_str())
            .collect()
    }

    pub fn find(&self, category: &str, product: &str) -> Option<&OpportunityRow> {
        self.rows
            .iter()
            .find(|row| row.category == category && row.product == product)
    }

    pub fn listings(&self) -> Vec<CategoryListing> {
        self.categories()
            .into_iter()
            .map(|category| CategoryListing {
                category: category.to_string(),
                products: self
                    .products(category)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
            .collect()
    }
}

fn is_market_slug(market: &str) -> bool {
    !market.is_empty()
        && market
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        let trimmed = value.trim().replace(',', "");
        if trimmed.is_empty() {
            None
        } else {
            trimmed.parse::<f64>().ok()
        }
    }))
}
