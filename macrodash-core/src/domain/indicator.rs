//! Indicator registry: which series the dashboard tracks and where each comes from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream provider type for an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Government statistics API, keyed by series id.
    Fred,
    /// Market quotes API, keyed by ticker symbol.
    Yahoo,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Fred => "fred",
            SourceKind::Yahoo => "yahoo",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    /// Stable key; also the store file stem.
    pub key: String,
    pub name: String,
    pub source: SourceKind,
    /// FRED series id or Yahoo ticker.
    pub source_id: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "other".into()
}

impl Indicator {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        source: SourceKind,
        source_id: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            source,
            source_id: source_id.into(),
            category: category.into(),
        }
    }

    /// Keys become file names, so only `[A-Za-z0-9_-]` is accepted.
    pub fn is_valid_key(key: &str) -> bool {
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

/// Built-in indicator set covering equities, bonds, commodities and FX.
pub fn default_indicators() -> Vec<Indicator> {
    use SourceKind::{Fred, Yahoo};
    vec![
        Indicator::new("sp500", "S&P 500", Yahoo, "^GSPC", "equities"),
        Indicator::new("nasdaq", "NASDAQ Composite", Yahoo, "^IXIC", "equities"),
        Indicator::new("msci_world", "MSCI World (URTH)", Yahoo, "URTH", "equities"),
        Indicator::new("treasury_10y", "10-Year Treasury Yield", Fred, "DGS10", "bonds"),
        Indicator::new("treasury_2y", "2-Year Treasury Yield", Fred, "DGS2", "bonds"),
        Indicator::new("gold", "Gold Futures", Yahoo, "GC=F", "commodities"),
        Indicator::new("crude_oil", "WTI Crude Oil", Yahoo, "CL=F", "commodities"),
        Indicator::new("copper", "Copper Futures", Yahoo, "HG=F", "commodities"),
        Indicator::new("eurusd", "EUR/USD", Yahoo, "EURUSD=X", "fx"),
        Indicator::new("usdjpy", "USD/JPY", Yahoo, "JPY=X", "fx"),
        Indicator::new("dollar_index", "Broad Dollar Index", Fred, "DTWEXBGS", "fx"),
        Indicator::new("cpi", "Consumer Price Index", Fred, "CPIAUCSL", "macro"),
        Indicator::new("industrial_production", "Industrial Production", Fred, "INDPRO", "macro"),
    ]
}
