//! # Status Taxonomy Module
//!
//! Maps the sheet's free-text status labels onto the funnel stages
//!
//! ## Key Components
//! - [`QUALIFIED_STATUSES`] - The canonical funnel-progress label set
//! - [`FunnelStage`] - prospect / qualified / sold classification
//! - [`stage`] - Classify a lead's position in the funnel
//! - [`category`] - Commerce vs technical-service split

use crate::cli::CategoryFilter;
use crate::models::Lead;

/// Labels that count as a qualified lead. Declared once; every view shares
/// this set.
pub const QUALIFIED_STATUSES: &[&str] = &[
    "Parrainage",
    "Opportunité Commerce",
    "Opportunité Service Technique",
    "Opportunité Tertiaire",
    "RDV Fixé",
];

/// Sales outcomes that count as a closed sale.
pub const SOLD_STATUSES: &[&str] = &["Vendu", "Installé"];

/// The one status that routes a lead to the technical-service pipeline.
pub const TECHNICAL_STATUS: &str = "Opportunité Service Technique";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelStage {
    Prospect,
    Qualified,
    Sold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadCategory {
    Commerce,
    Technique,
}

/// `status` is the funnel axis. The commercial outcome lives on
/// `sales_status` and is deliberately not consulted here.
pub fn is_qualified(lead: &Lead) -> bool {
    QUALIFIED_STATUSES.contains(&lead.status.as_str())
}

/// `sales_status` is the commercial axis, independent of `status`: a lead
/// can be sold while its funnel label still reads "RDV Fixé".
pub fn is_sold(lead: &Lead) -> bool {
    SOLD_STATUSES.contains(&lead.sales_status.as_str())
}

pub fn stage(lead: &Lead) -> FunnelStage {
    if is_sold(lead) {
        FunnelStage::Sold
    } else if is_qualified(lead) {
        FunnelStage::Qualified
    } else {
        FunnelStage::Prospect
    }
}

pub fn category(lead: &Lead) -> LeadCategory {
    if lead.status == TECHNICAL_STATUS {
        LeadCategory::Technique
    } else {
        LeadCategory::Commerce
    }
}

/// Category filtering is a pre-filter: it runs before any stage counting.
pub fn matches_category(filter: CategoryFilter, lead: &Lead) -> bool {
    match filter {
        CategoryFilter::All => true,
        CategoryFilter::Commerce => category(lead) == LeadCategory::Commerce,
        CategoryFilter::Technique => category(lead) == LeadCategory::Technique,
    }
}
