//! # Data Model Module
//!
//! Record types exchanged with the spreadsheet backend and the ad platforms
//!
//! ## Key Components
//! - [`Lead`] - A prospect record from the lead sheet
//! - [`CompanyExpense`] - A non-advertising cost line
//! - [`AdPerformance`] - Period-scoped spend/impressions/clicks snapshot
//! - [`CreativeRecord`] - A named ad variant with its performance figures
//! - [`AmountValue`] - Number-or-string amount as the sheet delivers it

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Amounts arrive either as numbers or as locale-formatted strings
/// ("1 234,56"). Kept raw until [`crate::normalize::normalize_amount`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountValue {
    Number(f64),
    Text(String),
}

impl Default for AmountValue {
    fn default() -> Self {
        AmountValue::Number(0.0)
    }
}

/// The sheet stores call notes as a single " | "-delimited cell.
fn split_notes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw
        .as_str()
        .unwrap_or_default()
        .split(" | ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

fn join_notes<S>(notes: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&notes.join(" | "))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(default)]
    pub id: String,
    /// Backing-store row, only used to route updates back to the sheet.
    #[serde(default)]
    pub row_index: Option<u32>,
    #[serde(default)]
    pub date_entry: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub roof_area: Option<f64>,
    #[serde(default)]
    pub monthly_bill: Option<f64>,
    #[serde(default)]
    pub date_contact: String,
    #[serde(default)]
    pub sms: String,
    #[serde(default)]
    pub mail: String,
    #[serde(default)]
    pub date_appointment: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub info_loss: String,
    #[serde(default)]
    pub salesperson: String,
    #[serde(
        default,
        deserialize_with = "split_notes",
        serialize_with = "join_notes"
    )]
    pub notes: Vec<String>,
    #[serde(default)]
    pub sales_status: String,
    #[serde(default)]
    pub amount: AmountValue,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub canal: String,
    #[serde(default)]
    pub campagne: String,
    #[serde(default)]
    pub creative: String,
    #[serde(default)]
    pub next_follow_up_date: String,
    #[serde(default)]
    pub last_contact_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyExpense {
    #[serde(default)]
    pub row_index: Option<u32>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub expense_type: String,
    #[serde(default)]
    pub date: String,
    /// Recurring costs carry an end date; the engine treats the line as a
    /// point-in-time cost and leaves span expansion to callers.
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub amount: AmountValue,
}

/// One platform's figures for exactly one (since, until) range. Snapshots
/// are never merged across periods; a new range means a new fetch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdPerformance {
    #[serde(default)]
    pub spend: f64,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub clicks: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub spend: f64,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created_time: String,
    #[serde(default)]
    pub permalink_url: String,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub comments_count: u64,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub is_video: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_deserializes_sheet_row() {
        let json = r#"{
            "id": "42",
            "rowIndex": 7,
            "dateEntry": "05/03/2024 14:30",
            "status": "Opportunité Commerce",
            "salesStatus": "Vendu",
            "amount": "1 500,00",
            "source": "Facebook Ads",
            "notes": "Rappel prévu | Devis envoyé"
        }"#;

        let lead: Lead = serde_json::from_str(json).unwrap();
        assert_eq!(lead.id, "42");
        assert_eq!(lead.row_index, Some(7));
        assert_eq!(lead.notes, vec!["Rappel prévu", "Devis envoyé"]);
        assert!(matches!(lead.amount, AmountValue::Text(_)));
    }

    #[test]
    fn test_lead_notes_roundtrip() {
        let lead = Lead {
            notes: vec!["Premier appel".to_string(), "Relance".to_string()],
            ..Default::default()
        };

        let json = serde_json::to_string(&lead).unwrap();
        assert!(json.contains("Premier appel | Relance"));

        let back: Lead = serde_json::from_str(&json).unwrap();
        assert_eq!(back.notes, lead.notes);
    }

    #[test]
    fn test_amount_accepts_number_and_text() {
        let n: AmountValue = serde_json::from_str("1500.5").unwrap();
        assert!(matches!(n, AmountValue::Number(v) if v == 1500.5));

        let t: AmountValue = serde_json::from_str("\"1 500,50\"").unwrap();
        assert!(matches!(t, AmountValue::Text(_)));
    }

    #[test]
    fn test_missing_fields_default() {
        let lead: Lead = serde_json::from_str("{}").unwrap();
        assert!(lead.notes.is_empty());
        assert_eq!(lead.status, "");
        assert!(matches!(lead.amount, AmountValue::Number(v) if v == 0.0));
    }
}
