//! # Attribution Join Module
//!
//! Matches ad-platform records to leads by normalized name equality
//!
//! ## Key Components
//! - [`join_by_name`] - Per-creative lead counts and cost-per-lead
//! - [`JoinTotals`] - Summary figures over a joined set
//! - [`source_breakdown`] - Funnel rollup per acquisition source

use serde::Serialize;

use crate::models::{CreativeRecord, Lead};
use crate::status::{is_qualified, is_sold};

/// A platform record with its attributed lead count. The join key is
/// case-folded, trimmed string equality only: there is no stable foreign
/// key upstream, so attribution is exactly as good as the naming
/// discipline in the ad account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedCreative {
    #[serde(flatten)]
    pub record: CreativeRecord,
    pub lead_count: u64,
    pub cost_per_lead: f64,
    pub ctr: f64,
}

fn join_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Join platform records against (already period-filtered) leads.
/// `name_of` selects the lead field carrying the attribution name
/// (creative or source).
///
/// When no lead matched, `cost_per_lead` is the record's FULL spend, not 0:
/// money went out with nothing attributable coming back, and averaging it
/// away would hide exactly the rows that need attention. This is the one
/// place that deviates from the aggregator's zero-denominator rule.
pub fn join_by_name<F>(records: &[CreativeRecord], leads: &[&Lead], name_of: F) -> Vec<JoinedCreative>
where
    F: Fn(&Lead) -> &str,
{
    records
        .iter()
        .map(|record| {
            let key = join_key(&record.name);
            let lead_count = leads
                .iter()
                .filter(|l| !key.is_empty() && join_key(name_of(l)) == key)
                .count() as u64;

            let cost_per_lead = if lead_count > 0 {
                record.spend / lead_count as f64
            } else {
                record.spend
            };
            let ctr = if record.impressions > 0 {
                record.clicks as f64 / record.impressions as f64 * 100.0
            } else {
                0.0
            };

            JoinedCreative {
                record: record.clone(),
                lead_count,
                cost_per_lead,
                ctr,
            }
        })
        .collect()
}

/// Summary strip over a joined set. Unmatched records stay in the spend
/// total: untraceable spend is still spend.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTotals {
    pub spend: f64,
    pub lead_count: u64,
}

impl JoinTotals {
    pub fn over(joined: &[JoinedCreative]) -> Self {
        Self {
            spend: joined.iter().map(|j| j.record.spend).sum(),
            lead_count: joined.iter().map(|j| j.lead_count).sum(),
        }
    }

    /// Average CPL follows the aggregator's rule here: no leads at all
    /// reports 0.
    pub fn average_cpl(&self) -> f64 {
        if self.lead_count > 0 {
            self.spend / self.lead_count as f64
        } else {
            0.0
        }
    }
}

/// Per-source funnel rollup over (already period-filtered) leads, sorted by
/// lead volume. Leads without a source land under "Inconnue".
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStats {
    pub name: String,
    pub leads: u64,
    pub qualified: u64,
    pub sold: u64,
}

impl SourceStats {
    pub fn rate_qualified(&self) -> f64 {
        if self.leads > 0 {
            self.qualified as f64 / self.leads as f64 * 100.0
        } else {
            0.0
        }
    }

    pub fn rate_conversion(&self) -> f64 {
        if self.leads > 0 {
            self.sold as f64 / self.leads as f64 * 100.0
        } else {
            0.0
        }
    }
}

pub fn source_breakdown(leads: &[&Lead]) -> Vec<SourceStats> {
    let mut stats: Vec<SourceStats> = Vec::new();

    for lead in leads {
        let name = if lead.source.trim().is_empty() {
            "Inconnue"
        } else {
            lead.source.trim()
        };
        let slot = match stats.iter().position(|s| s.name == name) {
            Some(slot) => slot,
            None => {
                stats.push(SourceStats {
                    name: name.to_string(),
                    ..Default::default()
                });
                stats.len() - 1
            }
        };
        let entry = &mut stats[slot];
        entry.leads += 1;
        if is_qualified(lead) {
            entry.qualified += 1;
        }
        if is_sold(lead) {
            entry.sold += 1;
        }
    }

    stats.sort_by(|a, b| b.leads.cmp(&a.leads));
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creative(name: &str, spend: f64) -> CreativeRecord {
        CreativeRecord {
            id: format!("ad_{}", name),
            name: name.to_string(),
            spend,
            impressions: 1000,
            clicks: 25,
            ..Default::default()
        }
    }

    fn lead_from(creative: &str, source: &str, status: &str) -> Lead {
        Lead {
            creative: creative.to_string(),
            source: source.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_join_is_case_folded_and_trimmed() {
        let records = vec![creative("Visuel Toiture A", 100.0)];
        let leads = vec![
            lead_from("  visuel toiture a ", "", "Nouveau"),
            lead_from("VISUEL TOITURE A", "", "Nouveau"),
            lead_from("visuel toiture b", "", "Nouveau"),
        ];
        let refs: Vec<&Lead> = leads.iter().collect();

        let joined = join_by_name(&records, &refs, |l| l.creative.as_str());
        assert_eq!(joined[0].lead_count, 2);
        assert_eq!(joined[0].cost_per_lead, 50.0);
    }

    #[test]
    fn test_unmatched_record_keeps_full_spend_as_cpl() {
        let records = vec![creative("Jamais diffusée", 100.0)];
        let joined = join_by_name(&records, &[], |l| l.creative.as_str());
        assert_eq!(joined[0].lead_count, 0);
        // Unamortized spend, deliberately not 0.
        assert_eq!(joined[0].cost_per_lead, 100.0);
    }

    #[test]
    fn test_empty_creative_name_matches_nothing() {
        let records = vec![creative("", 50.0)];
        let leads = vec![lead_from("", "", "Nouveau")];
        let refs: Vec<&Lead> = leads.iter().collect();
        let joined = join_by_name(&records, &refs, |l| l.creative.as_str());
        assert_eq!(joined[0].lead_count, 0);
    }

    #[test]
    fn test_totals_include_unmatched_and_average_rule() {
        let records = vec![creative("a", 60.0), creative("orpheline", 40.0)];
        let leads = vec![lead_from("a", "", "Nouveau"), lead_from("a", "", "Nouveau")];
        let refs: Vec<&Lead> = leads.iter().collect();

        let joined = join_by_name(&records, &refs, |l| l.creative.as_str());
        let totals = JoinTotals::over(&joined);
        assert_eq!(totals.spend, 100.0);
        assert_eq!(totals.lead_count, 2);
        assert_eq!(totals.average_cpl(), 50.0);

        // The summary average follows the zero rule, unlike per-record CPL.
        let empty = JoinTotals::over(&join_by_name(&records, &[], |l| l.creative.as_str()));
        assert_eq!(empty.average_cpl(), 0.0);
    }

    #[test]
    fn test_ctr() {
        let joined = join_by_name(&[creative("a", 10.0)], &[], |l| l.creative.as_str());
        assert_eq!(joined[0].ctr, 2.5);
    }

    #[test]
    fn test_source_breakdown_counts_and_order() {
        let leads = vec![
            lead_from("", "Facebook Ads", "Nouveau"),
            lead_from("", "Facebook Ads", "RDV Fixé"),
            lead_from("", "", "Nouveau"),
            lead_from("", "Parrainage", "Opportunité Commerce"),
            lead_from("", "Facebook Ads", "Nouveau"),
        ];
        let refs: Vec<&Lead> = leads.iter().collect();

        let stats = source_breakdown(&refs);
        assert_eq!(stats[0].name, "Facebook Ads");
        assert_eq!(stats[0].leads, 3);
        assert_eq!(stats[0].qualified, 1);
        assert!(stats.iter().any(|s| s.name == "Inconnue" && s.leads == 1));
    }

    #[test]
    fn test_source_rates() {
        let stats = SourceStats {
            name: "x".to_string(),
            leads: 4,
            qualified: 2,
            sold: 1,
        };
        assert_eq!(stats.rate_qualified(), 50.0);
        assert_eq!(stats.rate_conversion(), 25.0);
        assert_eq!(SourceStats::default().rate_qualified(), 0.0);
    }
}
