//! # Sheet Store Module
//!
//! Client for the spreadsheet gateway holding leads and company expenses
//!
//! ## Key Components
//! - [`SheetsClient`] - Thin HTTP client over the gateway
//! - [`SheetsClient::fetch_leads`] - Load the full lead sheet
//! - [`SheetsClient::fetch_expenses`] - Load company expense lines
//! - [`SheetsClient::update_lead`] - Push a status change or note append back

use anyhow::{Context, Result};
use log::{debug, warn};
use serde_json::json;

use crate::models::{CompanyExpense, Lead};

pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
}

impl SheetsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Leads are the system of record; a failed fetch is an error the
    /// caller has to surface, not something to paper over with zeros.
    pub async fn fetch_leads(&self) -> Result<Vec<Lead>> {
        let response = self
            .http
            .post(&self.base_url)
            .json(&json!({ "type": "leads" }))
            .send()
            .await
            .context("Failed to reach the lead sheet gateway")?;

        if !response.status().is_success() {
            anyhow::bail!("Lead sheet gateway answered {}", response.status());
        }

        let leads: Vec<Lead> = response
            .json()
            .await
            .context("Failed to decode the lead sheet payload")?;

        debug!("Fetched {} leads from the sheet", leads.len());
        Ok(leads)
    }

    /// Expenses are auxiliary: on failure the dashboard still renders,
    /// with company spend at zero.
    pub async fn fetch_expenses(&self) -> Vec<CompanyExpense> {
        let result: Result<Vec<CompanyExpense>> = async {
            let response = self
                .http
                .post(&self.base_url)
                .json(&json!({ "type": "expenses" }))
                .send()
                .await
                .context("Failed to reach the expense sheet gateway")?;

            if !response.status().is_success() {
                anyhow::bail!("Expense sheet gateway answered {}", response.status());
            }

            response
                .json()
                .await
                .context("Failed to decode the expense sheet payload")
        }
        .await;

        match result {
            Ok(expenses) => {
                debug!("Fetched {} expense lines", expenses.len());
                expenses
            }
            Err(e) => {
                warn!("Expense fetch failed, continuing with none: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Writes go through the same gateway. The store offers no
    /// transactionality; the sheet row is addressed by `row_index`.
    pub async fn update_lead(&self, lead: &Lead) -> Result<()> {
        let payload = json!({
            "type": "leads",
            "method": "POST",
            "payload": lead,
        });

        let response = self
            .http
            .post(&self.base_url)
            .json(&payload)
            .send()
            .await
            .context("Failed to push the lead update")?;

        if !response.status().is_success() {
            anyhow::bail!("Lead update rejected with {}", response.status());
        }

        debug!("Updated lead {} (row {:?})", lead.id, lead.row_index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AmountValue;

    #[test]
    fn test_update_payload_shape() {
        let lead = Lead {
            id: "7".to_string(),
            row_index: Some(12),
            status: "RDV Fixé".to_string(),
            notes: vec!["Appelé".to_string(), "RDV pris".to_string()],
            amount: AmountValue::Text("1 000,00".to_string()),
            ..Default::default()
        };

        let payload = json!({
            "type": "leads",
            "method": "POST",
            "payload": lead,
        });

        assert_eq!(payload["type"], "leads");
        assert_eq!(payload["payload"]["rowIndex"], 12);
        // Notes travel back as the single delimited cell the sheet expects.
        assert_eq!(payload["payload"]["notes"], "Appelé | RDV pris");
    }
}
