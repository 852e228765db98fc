use crate::error::{MarketInsightsError, Result};
use crate::utils::resolve_path;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    #[schemars(description = "Metrics describing the agency being analyzed")]
    Agency,

    #[schemars(description = "Market-wide averages the agency is compared against")]
    Market,
}

impl DocumentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentRole::Agency => "agency",
            DocumentRole::Market => "market",
        }
    }

    /// Series label used in comparison charts.
    pub fn series_name(&self) -> &'static str {
        match self {
            DocumentRole::Agency => "Agency",
            DocumentRole::Market => "Market Average",
        }
    }
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed metrics upload. No schema is enforced; charts and prompts read
/// whatever paths they need and report the ones that are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsDocument {
    role: DocumentRole,
    value: serde_json::Value,
}

impl MetricsDocument {
    pub fn new(role: DocumentRole, value: serde_json::Value) -> Self {
        Self { role, value }
    }

    pub fn role(&self) -> DocumentRole {
        self.role
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }

    pub fn resolve(&self, path: &FieldPath) -> Result<&serde_json::Value> {
        resolve_path(&self.value, path)
    }

    /// Compact JSON text handed to the narrative service.
    pub fn to_prompt_text(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.value)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsPair {
    pub agency: MetricsDocument,
    pub market: MetricsDocument,
}

impl MetricsPair {
    pub fn document(&self, role: DocumentRole) -> &MetricsDocument {
        match role {
            DocumentRole::Agency => &self.agency,
            DocumentRole::Market => &self.market,
        }
    }
}

/// Dot-separated location inside a metrics document, e.g. `kpis.sales.total_revenue`.
///
/// Segments address object keys. A segment made only of digits may also index
/// into an array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String", into = "String")]
#[schemars(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.split('.').any(|segment| segment.is_empty()) {
            return Err(MarketInsightsError::InvalidFieldPath(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Paths compiled into the crate; they are known to be well formed.
    pub(crate) fn builtin(raw: &'static str) -> Self {
        Self(raw.to_string())
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FieldPath {
    type Error = MarketInsightsError;

    fn try_from(value: String) -> Result<Self> {
        FieldPath::parse(&value)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = MarketInsightsError;

    fn try_from(value: &str) -> Result<Self> {
        FieldPath::parse(value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three-part payload sent to the narrative service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    prompt: String,
    agency_text: String,
    market_text: String,
}

impl AnalysisRequest {
    pub fn new(prompt: impl Into<String>, pair: &MetricsPair) -> Result<Self> {
        Ok(Self {
            prompt: prompt.into(),
            agency_text: pair.agency.to_prompt_text()?,
            market_text: pair.market.to_prompt_text()?,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn agency_text(&self) -> &str {
        &self.agency_text
    }

    pub fn market_text(&self) -> &str {
        &self.market_text
    }

    /// Parts in submission order: prompt, agency, market.
    pub fn parts(&self) -> [&str; 3] {
        [&self.prompt, &self.agency_text, &self.market_text]
    }

    /// Single-string form for services that accept only one text input.
    pub fn joined(&self) -> String {
        self.parts().join("\n\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub text: String,
    /// Name of the service that produced the text
    pub service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TrendKpi {
    #[schemars(description = "Label shown on the x axis, e.g. 'bookings'")]
    pub name: String,

    #[schemars(description = "Numeric field read from the agency document")]
    pub agency_path: FieldPath,

    #[schemars(description = "Numeric field read from the market document")]
    pub market_path: FieldPath,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    #[schemars(
        description = "Pie chart of one document's category breakdown. The path must point to an object of numbers."
    )]
    CategoryShare {
        title: String,
        role: DocumentRole,
        path: FieldPath,
    },

    #[schemars(
        description = "A single KPI rendered as adjacent bars, one bar for the agency and one for the market."
    )]
    GroupedComparison {
        title: String,
        kpi: String,
        agency_path: FieldPath,
        market_path: FieldPath,
    },

    #[schemars(
        description = "Two or more KPIs drawn as one line per document across those KPIs."
    )]
    MultiSeriesTrend { title: String, kpis: Vec<TrendKpi> },
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        match self {
            ChartSpec::CategoryShare { title, .. }
            | ChartSpec::GroupedComparison { title, .. }
            | ChartSpec::MultiSeriesTrend { title, .. } => title,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let ChartSpec::MultiSeriesTrend { title, kpis } = self {
            if kpis.len() < 2 {
                return Err(MarketInsightsError::ConfigError(format!(
                    "Trend chart '{}' needs at least two KPIs, got {}",
                    title,
                    kpis.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_path_rejects_empty_segments() {
        assert!(FieldPath::parse("kpis.sales.total_revenue").is_ok());
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("kpis..sales").is_err());
        assert!(FieldPath::parse(".kpis").is_err());
    }

    #[test]
    fn test_chart_spec_deserializes_from_tagged_json() {
        let spec: ChartSpec = serde_json::from_value(json!({
            "kind": "grouped_comparison",
            "title": "Sales",
            "kpi": "sales",
            "agency_path": "kpis.sales.total_revenue",
            "market_path": "market_overview.metrics.sales.avg_total_revenue"
        }))
        .unwrap();

        assert_eq!(spec.title(), "Sales");
        match spec {
            ChartSpec::GroupedComparison { agency_path, .. } => {
                assert_eq!(agency_path.segments().count(), 3);
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_chart_spec_with_bad_path_fails_to_deserialize() {
        let result: std::result::Result<ChartSpec, _> = serde_json::from_value(json!({
            "kind": "category_share",
            "title": "Broken",
            "role": "agency",
            "path": "kpis..products"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_trend_needs_two_kpis() {
        let spec = ChartSpec::MultiSeriesTrend {
            title: "Lonely".to_string(),
            kpis: vec![TrendKpi {
                name: "bookings".to_string(),
                agency_path: FieldPath::parse("kpis.bookings.total").unwrap(),
                market_path: FieldPath::parse("market.bookings").unwrap(),
            }],
        };
        assert!(matches!(
            spec.validate(),
            Err(MarketInsightsError::ConfigError(_))
        ));
    }

    #[test]
    fn test_request_parts_are_ordered() {
        let pair = MetricsPair {
            agency: MetricsDocument::new(DocumentRole::Agency, json!({"a": 1})),
            market: MetricsDocument::new(DocumentRole::Market, json!({"m": 2})),
        };
        let request = AnalysisRequest::new("Analyze this", &pair).unwrap();
        assert_eq!(request.parts(), ["Analyze this", r#"{"a":1}"#, r#"{"m":2}"#]);
        assert_eq!(request.joined(), "Analyze this\n\n{\"a\":1}\n\n{\"m\":2}");
    }
}
