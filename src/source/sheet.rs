//! Public spreadsheet feed
//!
//! The sheet is read through its CSV export; no credentials are involved.

use reqwest::blocking::Client;
use reqwest::Url;
use tracing::info;

use super::{parse::parse_records, ClueRecord, SourceError};

const SHEET_EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d";

/// Default tab holding the questions
pub const DEFAULT_SHEET_NAME: &str = "Preguntas";

/// CSV export URL for one tab of a sheet
pub fn sheet_csv_url(sheet_id: &str, sheet_name: &str) -> Result<Url, SourceError> {
    let sheet_id = sheet_id.trim();
    if sheet_id.is_empty() {
        return Err(SourceError::NotConfigured);
    }
    let base = format!("{}/{}/gviz/tq", SHEET_EXPORT_BASE, sheet_id);
    Url::parse_with_params(&base, &[("tqx", "out:csv"), ("sheet", sheet_name)])
        .map_err(|_| SourceError::NotConfigured)
}

/// Download and parse the question tab
pub fn fetch_sheet(client: &Client, url: Url) -> Result<Vec<ClueRecord>, SourceError> {
    let response = client.get(url.clone()).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    let text = response.text()?;
    let records = parse_records(&text)?;
    info!(url = %url, records = records.len(), "question sheet loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_url_encodes_name() {
        let url = sheet_csv_url("abc123", "Preguntas Ñ").unwrap();
        assert_eq!(url.host_str(), Some("docs.google.com"));
        assert_eq!(url.path(), "/spreadsheets/d/abc123/gviz/tq");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("tqx".to_string(), "out:csv".to_string()),
                ("sheet".to_string(), "Preguntas Ñ".to_string()),
            ]
        );
    }

    #[test]
    fn test_sheet_url_requires_id() {
        assert!(matches!(
            sheet_csv_url("  ", DEFAULT_SHEET_NAME),
            Err(SourceError::NotConfigured)
        ));
    }
}
