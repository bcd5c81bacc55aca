//! Client for the spreadsheet-backed personnel service
//!
//! The backend is a single web app endpoint that takes the sheet name as a
//! query parameter. A GET returns every row of the sheet as a JSON array of
//! objects keyed by the header row; a form-encoded POST appends one row and
//! answers `{ "success": bool, "message"?: string }`.

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;

use crate::record::{AppendOutcome, PersonnelRecord};

/// Content type the backend expects for appended rows
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Error types for the sheet client
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    #[error("Malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// HTTP client for one spreadsheet endpoint
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Client,
    endpoint: String,
}

impl SheetsClient {
    /// Create a client for `endpoint`
    ///
    /// With no timeout a request that never completes never resolves.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, SheetsError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(SheetsClient {
            client: builder.build()?,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch every row of `sheet`
    ///
    /// Transport failures, non-success statuses and bodies that are not a
    /// JSON array of objects are logged and returned as errors, so callers can
    /// tell an empty sheet from a failed read.
    pub async fn fetch_rows(&self, sheet: &str) -> Result<Vec<PersonnelRecord>, SheetsError> {
        let result = self.try_fetch_rows(sheet).await;
        if let Err(e) = &result {
            log::error!("Error fetching data from {}: {}", sheet, e);
        }
        result
    }

    /// Fetch every row of `sheet`, treating any failure as an empty sheet
    pub async fn fetch_rows_or_empty(&self, sheet: &str) -> Vec<PersonnelRecord> {
        self.fetch_rows(sheet).await.unwrap_or_default()
    }

    async fn try_fetch_rows(&self, sheet: &str) -> Result<Vec<PersonnelRecord>, SheetsError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("sheet", sheet)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetsError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let rows: Vec<PersonnelRecord> = serde_json::from_slice(&body)?;
        log::debug!("Fetched {} rows from {}", rows.len(), sheet);
        Ok(rows)
    }

    /// Append one row to `sheet`
    ///
    /// # Arguments
    /// * `sheet` - Name of the sheet to append to
    /// * `fields` - Form fields in the order they should be encoded
    ///
    /// # Returns
    /// * `Result<AppendOutcome, SheetsError>` - What the backend reported, or a transport/status/body error
    pub async fn append_row(
        &self,
        sheet: &str,
        fields: &[(&str, &str)],
    ) -> Result<AppendOutcome, SheetsError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("sheet", sheet)])
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(encode_form(fields))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetsError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let result: Value = serde_json::from_slice(&body)?;
        Ok(AppendOutcome::from_response(&result))
    }
}

/// Encode form fields as `application/x-www-form-urlencoded`
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn form_fields_keep_order_and_escape() {
        let body = encode_form(&[
            ("name", "Ana Reyes"),
            ("discord", "reyes#0001"),
            ("robloxUsername", "a&b=c"),
        ]);

        assert_eq!(
            body,
            "name=Ana%20Reyes&discord=reyes%230001&robloxUsername=a%26b%3Dc"
        );
    }

    #[test]
    fn empty_form_encodes_to_nothing() {
        assert_eq!(encode_form(&[]), "");
    }

    #[test]
    fn status_error_reads_like_the_dashboard_log() {
        let err = SheetsError::Status { status: 500 };
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }
}
