//! # Ad Platform Module
//!
//! Read-only clients for Meta Graph insights, the Google Ads relay, and the
//! social feed
//!
//! ## Key Components
//! - [`fetch_facebook_performance`] - Account-level spend for a period
//! - [`fetch_creative_performance`] - Per-ad spend with creative imagery
//! - [`fetch_google_performance`] - Google figures relayed by the sheet gateway
//! - [`fetch_social_feed`] - Facebook page + Instagram posts, newest first
//!
//! Every fetch degrades to an empty/zero result on failure: the dashboard
//! renders from whatever arrived, it never crashes on a platform outage.

use std::collections::HashMap;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::models::{AdPerformance, CreativeRecord, SocialPost};
use crate::period::Period;

const GRAPH_BASE: &str = "https://graph.facebook.com/v18.0";

/// Graph insight rows carry numbers as strings.
#[derive(Debug, Default, Deserialize)]
struct InsightRow {
    #[serde(default)]
    spend: String,
    #[serde(default)]
    impressions: String,
    #[serde(default)]
    clicks: String,
    #[serde(default)]
    ad_name: String,
    #[serde(default)]
    ad_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct InsightsResponse {
    #[serde(default)]
    data: Vec<InsightRow>,
    #[serde(default)]
    error: Option<Value>,
}

fn parse_f64(raw: &str) -> f64 {
    raw.parse().unwrap_or(0.0)
}

fn parse_u64(raw: &str) -> u64 {
    raw.parse().unwrap_or(0)
}

fn time_range_param(period: &Period) -> String {
    // The Graph API takes the range as a JSON object in the query string.
    serde_json::json!({ "since": period.since(), "until": period.until() }).to_string()
}

/// Account-level spend/impressions/clicks for exactly this period.
pub async fn fetch_facebook_performance(config: &Config, period: &Period) -> AdPerformance {
    if !config.has_facebook() {
        debug!("Meta Ads not configured, reporting zero spend");
        return AdPerformance::default();
    }

    let result: Result<AdPerformance> = async {
        let url = format!("{}/act_{}/insights", GRAPH_BASE, config.fb_ad_account);
        let range = time_range_param(period);
        let response: InsightsResponse = reqwest::Client::new()
            .get(&url)
            .query(&[
                ("fields", "spend,impressions,clicks"),
                ("time_range", range.as_str()),
                ("access_token", config.fb_access_token.as_str()),
            ])
            .send()
            .await
            .context("Meta insights request failed")?
            .json()
            .await
            .context("Meta insights payload was not JSON")?;

        if let Some(error) = response.error {
            anyhow::bail!("Meta insights error: {}", error);
        }

        Ok(response
            .data
            .first()
            .map(|row| AdPerformance {
                spend: parse_f64(&row.spend),
                impressions: parse_u64(&row.impressions),
                clicks: parse_u64(&row.clicks),
            })
            .unwrap_or_default())
    }
    .await;

    match result {
        Ok(perf) => perf,
        Err(e) => {
            warn!("Meta performance fetch failed, using zeros: {:#}", e);
            AdPerformance::default()
        }
    }
}

/// Per-ad insight rows joined with the ad's creative image by ad id.
pub async fn fetch_creative_performance(config: &Config, period: &Period) -> Vec<CreativeRecord> {
    if !config.has_facebook() {
        return Vec::new();
    }

    let result: Result<Vec<CreativeRecord>> = async {
        let client = reqwest::Client::new();

        let insights_url = format!("{}/act_{}/insights", GRAPH_BASE, config.fb_ad_account);
        let range = time_range_param(period);
        let insights: InsightsResponse = client
            .get(&insights_url)
            .query(&[
                ("level", "ad"),
                ("fields", "ad_name,spend,impressions,clicks,ad_id"),
                ("time_range", range.as_str()),
                ("access_token", config.fb_access_token.as_str()),
            ])
            .send()
            .await
            .context("Meta ad-level insights request failed")?
            .json()
            .await
            .context("Meta ad-level insights payload was not JSON")?;

        if let Some(error) = insights.error {
            anyhow::bail!("Meta ad-level insights error: {}", error);
        }

        // Second call for the visuals; a failure here only costs images.
        let images = fetch_creative_images(&client, config).await.unwrap_or_else(|e| {
            warn!("Creative image lookup failed: {:#}", e);
            HashMap::new()
        });

        Ok(insights
            .data
            .into_iter()
            .map(|row| CreativeRecord {
                image_url: images.get(&row.ad_id).cloned().unwrap_or_default(),
                id: row.ad_id,
                name: row.ad_name,
                spend: parse_f64(&row.spend),
                impressions: parse_u64(&row.impressions),
                clicks: parse_u64(&row.clicks),
            })
            .collect())
    }
    .await;

    match result {
        Ok(records) => {
            debug!("Fetched {} creative rows", records.len());
            records
        }
        Err(e) => {
            warn!("Creative performance fetch failed, using none: {:#}", e);
            Vec::new()
        }
    }
}

async fn fetch_creative_images(
    client: &reqwest::Client,
    config: &Config,
) -> Result<HashMap<String, String>> {
    let url = format!("{}/act_{}/ads", GRAPH_BASE, config.fb_ad_account);
    let body: Value = client
        .get(&url)
        .query(&[
            ("fields", "id,creative{image_url,thumbnail_url}"),
            ("limit", "200"),
            ("access_token", config.fb_access_token.as_str()),
        ])
        .send()
        .await
        .context("Meta ads listing request failed")?
        .json()
        .await
        .context("Meta ads listing payload was not JSON")?;

    let mut images = HashMap::new();
    if let Some(rows) = body.get("data").and_then(Value::as_array) {
        for ad in rows {
            let id = ad.get("id").and_then(Value::as_str).unwrap_or_default();
            let creative = ad.get("creative");
            let image = creative
                .and_then(|c| c.get("image_url"))
                .and_then(Value::as_str)
                .or_else(|| {
                    creative
                        .and_then(|c| c.get("thumbnail_url"))
                        .and_then(Value::as_str)
                })
                .unwrap_or_default();
            if !id.is_empty() {
                images.insert(id.to_string(), image.to_string());
            }
        }
    }
    Ok(images)
}

/// Google Ads figures come back through the sheet gateway, which holds the
/// account link. Numbers may arrive as strings or numbers.
pub async fn fetch_google_performance(config: &Config, period: &Period) -> AdPerformance {
    if config.sheets_url.is_empty() {
        return AdPerformance::default();
    }

    let result: Result<AdPerformance> = async {
        let since = period.since();
        let until = period.until();
        let body: Value = reqwest::Client::new()
            .get(&config.sheets_url)
            .query(&[
                ("type", "performance"),
                ("startDate", since.as_str()),
                ("endDate", until.as_str()),
            ])
            .send()
            .await
            .context("Google Ads relay request failed")?
            .json()
            .await
            .context("Google Ads relay payload was not JSON")?;

        let google = body.get("googleAds").cloned().unwrap_or(Value::Null);
        Ok(AdPerformance {
            spend: loose_f64(google.get("spend")),
            impressions: loose_f64(google.get("impressions")) as u64,
            clicks: loose_f64(google.get("clicks")) as u64,
        })
    }
    .await;

    match result {
        Ok(perf) => perf,
        Err(e) => {
            warn!("Google performance fetch failed, using zeros: {:#}", e);
            AdPerformance::default()
        }
    }
}

fn loose_f64(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Facebook page posts plus Instagram media of the linked business
/// account, merged and sorted newest first.
pub async fn fetch_social_feed(config: &Config) -> Vec<SocialPost> {
    if config.fb_access_token.is_empty() || config.fb_page.is_empty() {
        return Vec::new();
    }

    let client = reqwest::Client::new();
    let mut posts = Vec::new();

    match fetch_page_posts(&client, config).await {
        Ok(mut fb) => posts.append(&mut fb),
        Err(e) => warn!("Facebook feed fetch failed: {:#}", e),
    }
    match fetch_instagram_posts(&client, config).await {
        Ok(mut ig) => posts.append(&mut ig),
        Err(e) => warn!("Instagram feed fetch failed: {:#}", e),
    }

    posts.sort_by(|a, b| b.created_time.cmp(&a.created_time));
    posts
}

async fn fetch_page_posts(client: &reqwest::Client, config: &Config) -> Result<Vec<SocialPost>> {
    let url = format!("{}/{}/posts", GRAPH_BASE, config.fb_page);
    let body: Value = client
        .get(&url)
        .query(&[
            (
                "fields",
                "message,created_time,id,permalink_url,likes.summary(true),comments.summary(true)",
            ),
            ("limit", "50"),
            ("access_token", config.fb_access_token.as_str()),
        ])
        .send()
        .await
        .context("Facebook posts request failed")?
        .json()
        .await
        .context("Facebook posts payload was not JSON")?;

    if body.get("error").is_some() {
        anyhow::bail!("Facebook posts error: {}", body["error"]);
    }

    let rows = body.get("data").and_then(Value::as_array).cloned().unwrap_or_default();
    Ok(rows
        .iter()
        .map(|post| SocialPost {
            id: str_field(post, "id"),
            message: str_field(post, "message"),
            created_time: str_field(post, "created_time"),
            permalink_url: str_field(post, "permalink_url"),
            likes_count: summary_count(post, "likes"),
            comments_count: summary_count(post, "comments"),
            platform: "facebook".to_string(),
            is_video: false,
        })
        .collect())
}

async fn fetch_instagram_posts(
    client: &reqwest::Client,
    config: &Config,
) -> Result<Vec<SocialPost>> {
    let page_url = format!("{}/{}", GRAPH_BASE, config.fb_page);
    let page: Value = client
        .get(&page_url)
        .query(&[
            ("fields", "instagram_business_account"),
            ("access_token", config.fb_access_token.as_str()),
        ])
        .send()
        .await
        .context("Instagram account lookup failed")?
        .json()
        .await
        .context("Instagram account payload was not JSON")?;

    let Some(ig_id) = page
        .get("instagram_business_account")
        .and_then(|a| a.get("id"))
        .and_then(Value::as_str)
    else {
        return Ok(Vec::new());
    };

    let media_url = format!("{}/{}/media", GRAPH_BASE, ig_id);
    let body: Value = client
        .get(&media_url)
        .query(&[
            (
                "fields",
                "caption,media_type,permalink,timestamp,like_count,comments_count",
            ),
            ("limit", "50"),
            ("access_token", config.fb_access_token.as_str()),
        ])
        .send()
        .await
        .context("Instagram media request failed")?
        .json()
        .await
        .context("Instagram media payload was not JSON")?;

    let rows = body.get("data").and_then(Value::as_array).cloned().unwrap_or_default();
    Ok(rows
        .iter()
        .map(|post| SocialPost {
            id: str_field(post, "id"),
            message: str_field(post, "caption"),
            created_time: str_field(post, "timestamp"),
            permalink_url: str_field(post, "permalink"),
            likes_count: post.get("like_count").and_then(Value::as_u64).unwrap_or(0),
            comments_count: post
                .get("comments_count")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            platform: "instagram".to_string(),
            is_video: str_field(post, "media_type") == "VIDEO",
        })
        .collect())
}

fn str_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn summary_count(value: &Value, field: &str) -> u64 {
    value
        .get(field)
        .and_then(|f| f.get("summary"))
        .and_then(|s| s.get("total_count"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_insight_rows_parse_string_numbers() {
        let json = r#"{"data":[{"spend":"123.45","impressions":"1000","clicks":"50"}]}"#;
        let response: InsightsResponse = serde_json::from_str(json).unwrap();
        let row = &response.data[0];
        assert_eq!(parse_f64(&row.spend), 123.45);
        assert_eq!(parse_u64(&row.impressions), 1000);
        assert_eq!(parse_u64(&row.clicks), 50);
    }

    #[test]
    fn test_bad_numbers_fall_back_to_zero() {
        assert_eq!(parse_f64("abc"), 0.0);
        assert_eq!(parse_u64(""), 0);
    }

    #[test]
    fn test_loose_f64_takes_both_shapes() {
        assert_eq!(loose_f64(Some(&serde_json::json!(12.5))), 12.5);
        assert_eq!(loose_f64(Some(&serde_json::json!("12.5"))), 12.5);
        assert_eq!(loose_f64(Some(&Value::Null)), 0.0);
        assert_eq!(loose_f64(None), 0.0);
    }

    #[test]
    fn test_time_range_param_uses_iso_dates() {
        let period = Period::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        )
        .unwrap();
        let param = time_range_param(&period);
        assert!(param.contains("\"since\":\"2024-03-01\""));
        assert!(param.contains("\"until\":\"2024-03-05\""));
    }

    #[test]
    fn test_summary_count_digs_into_graph_shape() {
        let post = serde_json::json!({
            "likes": { "summary": { "total_count": 12 } }
        });
        assert_eq!(summary_count(&post, "likes"), 12);
        assert_eq!(summary_count(&post, "comments"), 0);
    }
}
