//! Validation and numeric clean-up of provider replies.
//!
//! The share arithmetic is split into small pure steps so each can be
//! checked on its own: map, ensure the home carrier, normalize to 100,
//! round to one decimal, sort.

use crate::error::InsightError;
use crate::types::{CarrierInfo, CountryInsights};
use crate::util::round_to;
use serde::Deserialize;
use serde_json::Value;

pub const HOME_CARRIER: &str = "FedEx";
/// Share given to the home carrier when a reply leaves it out.
pub const DEFAULT_HOME_SHARE: f64 = 10.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderPayload {
    carriers: Vec<RawCarrier>,
    #[serde(alias = "sentimentText")]
    fedex_sentiment: String,
    sales_tips: Vec<String>,
    email_template: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCarrier {
    name: String,
    #[serde(default, alias = "share")]
    market_share: Value,
}

pub fn is_home_carrier(name: &str) -> bool {
    name.to_lowercase().contains(&HOME_CARRIER.to_lowercase())
}

/// Remove a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string (`json`, `JSON`...) on the opening line.
        text = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// First balanced `{...}` span, ignoring braces inside JSON strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Numeric share from a JSON number or a string such as `"23.5%"`.
fn share_value(value: &Value) -> f64 {
    let share = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if share.is_finite() && share > 0.0 {
        share
    } else {
        0.0
    }
}

/// Map raw entries to carriers. Only the first home-brand match is flagged.
fn map_carriers(raw: Vec<RawCarrier>) -> Vec<CarrierInfo> {
    let mut home_seen = false;
    raw.into_iter()
        .filter(|c| !c.name.trim().is_empty())
        .map(|c| {
            let is_fedex = !home_seen && is_home_carrier(&c.name);
            home_seen |= is_fedex;
            CarrierInfo {
                market_share: round_to(share_value(&c.market_share), 1),
                name: c.name.trim().to_string(),
                is_fedex,
            }
        })
        .collect()
}

/// Append the home carrier at [`DEFAULT_HOME_SHARE`] when missing.
/// Returns whether an entry was added.
pub fn ensure_home_carrier(carriers: &mut Vec<CarrierInfo>) -> bool {
    if carriers.iter().any(|c| c.is_fedex) {
        return false;
    }
    carriers.push(CarrierInfo {
        name: HOME_CARRIER.to_string(),
        market_share: DEFAULT_HOME_SHARE,
        is_fedex: true,
    });
    true
}

/// Scale shares proportionally so they sum to 100. All-zero shares are
/// split evenly.
pub fn normalize_to_100(carriers: &mut [CarrierInfo]) {
    if carriers.is_empty() {
        return;
    }
    // Scaling by the largest share first keeps the sum finite for huge inputs.
    let largest = carriers.iter().map(|c| c.market_share).fold(0.0, f64::max);
    if largest <= 0.0 {
        let even = 100.0 / carriers.len() as f64;
        for c in carriers.iter_mut() {
            c.market_share = even;
        }
        return;
    }
    let total: f64 = carriers.iter().map(|c| c.market_share / largest).sum();
    for c in carriers.iter_mut() {
        c.market_share = c.market_share / largest / total * 100.0;
    }
}

/// Round every share to one decimal.
///
/// Largest-remainder rounding in tenths: each share is floored, then the
/// leftover tenths go one at a time to the largest fractional parts (first
/// carrier wins ties). A set that sums to 100 totals exactly 100.0 and every
/// share stays within 0.1 of its exact value.
pub fn round_shares(carriers: &mut [CarrierInfo]) {
    if carriers.is_empty() {
        return;
    }
    let exact: Vec<f64> = carriers.iter().map(|c| c.market_share * 10.0).collect();
    let target = exact.iter().sum::<f64>().round() as i64;
    let mut tenths: Vec<i64> = exact.iter().map(|t| t.floor() as i64).collect();
    let leftover = (target - tenths.iter().sum::<i64>()).max(0) as usize;

    let mut order: Vec<usize> = (0..exact.len()).collect();
    order.sort_by(|&a, &b| (exact[b] - exact[b].floor()).total_cmp(&(exact[a] - exact[a].floor())));
    for &i in order.iter().take(leftover) {
        tenths[i] += 1;
    }
    for (c, t) in carriers.iter_mut().zip(tenths) {
        c.market_share = t as f64 / 10.0;
    }
}

pub fn sort_by_share(carriers: &mut [CarrierInfo]) {
    carriers.sort_by(|a, b| b.market_share.total_cmp(&a.market_share));
}

/// Full clean-up of a carrier list: home carrier present, normalized,
/// rounded, largest first.
pub fn finalize_carriers(mut carriers: Vec<CarrierInfo>) -> Vec<CarrierInfo> {
    ensure_home_carrier(&mut carriers);
    normalize_to_100(&mut carriers);
    round_shares(&mut carriers);
    sort_by_share(&mut carriers);
    carriers
}

/// Turn a raw provider reply into validated insights.
pub fn parse_insights(
    raw: &str,
    country: &str,
    generated_at: i64,
) -> Result<CountryInsights, InsightError> {
    let body = strip_code_fences(raw);
    let json = extract_json_object(body)
        .ok_or_else(|| InsightError::ParseFailure("no JSON object in reply".to_string()))?;
    let payload: ProviderPayload = serde_json::from_str(json)?;

    Ok(CountryInsights {
        country: country.to_string(),
        carriers: finalize_carriers(map_carriers(payload.carriers)),
        fedex_sentiment: payload.fedex_sentiment,
        sales_tips: payload.sales_tips,
        email_template: payload.email_template,
        generated_at,
    })
}
