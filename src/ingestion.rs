use crate::error::{MarketInsightsError, Result};
use crate::schema::{DocumentRole, MetricsDocument, MetricsPair};
use log::{debug, info};
use std::io::ErrorKind;
use std::path::Path;

/// Parses both uploads. Presence is checked for both sources before either is
/// parsed, so nothing is produced unless both documents are usable.
pub fn ingest_pair(agency: Option<&[u8]>, market: Option<&[u8]>) -> Result<MetricsPair> {
    let (agency, market) = match (agency, market) {
        (Some(agency), Some(market)) => (agency, market),
        (None, None) => {
            return Err(MarketInsightsError::InputIncomplete(
                "agency and market".to_string(),
            ))
        }
        (None, Some(_)) => {
            return Err(MarketInsightsError::InputIncomplete(
                DocumentRole::Agency.to_string(),
            ))
        }
        (Some(_), None) => {
            return Err(MarketInsightsError::InputIncomplete(
                DocumentRole::Market.to_string(),
            ))
        }
    };

    let pair = MetricsPair {
        agency: parse_document(DocumentRole::Agency, agency)?,
        market: parse_document(DocumentRole::Market, market)?,
    };

    info!("Ingested agency and market metrics documents");
    Ok(pair)
}

pub fn parse_document(role: DocumentRole, bytes: &[u8]) -> Result<MetricsDocument> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| MarketInsightsError::ParseFailure {
            role,
            message: e.to_string(),
            line: e.line(),
            column: e.column(),
        })?;

    debug!("Parsed {} metrics document ({} bytes)", role, bytes.len());
    Ok(MetricsDocument::new(role, value))
}

/// Reads an upload from disk. A file that does not exist counts as "not
/// uploaded" so the caller gets the same incomplete-input report.
pub fn load_source(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Metrics file {:?} not found", path);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
