//! News items and their price impact.
//!
//! Synthetic items carry a signed numeric fraction; items sourced from the
//! outside world only carry a direction. Both are represented by [`Impact`]
//! and every consumer matches on it explicitly.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of an externally sourced news item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Qualitative {
    Positive,
    Negative,
    Neutral,
}

impl Qualitative {
    /// Unit direction: +1, -1 or 0.
    pub fn direction(self) -> f64 {
        match self {
            Qualitative::Positive => 1.0,
            Qualitative::Negative => -1.0,
            Qualitative::Neutral => 0.0,
        }
    }
}

/// Impact of a news item.
///
/// Serialized untagged so the persisted form is either a JSON number or one of
/// `"positive" | "negative" | "neutral"`. Loaded numbers are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged, from = "RawImpact")]
pub enum Impact {
    /// Signed fraction in [-1, 1].
    Numeric(f64),
    Qualitative(Qualitative),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawImpact {
    Numeric(f64),
    Qualitative(Qualitative),
}

impl From<RawImpact> for Impact {
    fn from(raw: RawImpact) -> Self {
        match raw {
            RawImpact::Numeric(v) => Impact::numeric(v),
            RawImpact::Qualitative(q) => Impact::Qualitative(q),
        }
    }
}

impl Impact {
    /// Numeric impacts are clamped to [-1, 1] at construction.
    pub fn numeric(value: f64) -> Self {
        Impact::Numeric(value.clamp(-1.0, 1.0))
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impact::Numeric(v) => {
                let sign = if *v >= 0.0 { "+" } else { "" };
                write!(f, "{sign}{:.1}%", v * 100.0)
            }
            Impact::Qualitative(Qualitative::Positive) => f.write_str("BULLISH"),
            Impact::Qualitative(Qualitative::Negative) => f.write_str("BEARISH"),
            Impact::Qualitative(Qualitative::Neutral) => f.write_str("NEUTRAL"),
        }
    }
}

/// A single news item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub title: String,
    pub content: String,
    pub impact: Impact,
    #[serde(default)]
    pub affected_stocks: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub is_real: bool,
}

impl News {
    /// A synthetic (generated) item stamped now.
    pub fn synthetic(
        title: impl Into<String>,
        content: impl Into<String>,
        impact: f64,
        affected_stocks: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            impact: Impact::numeric(impact),
            affected_stocks,
            timestamp: Utc::now(),
            is_read: false,
            source: None,
            url: None,
            is_real: false,
        }
    }

    pub fn mark_read(&mut self) {
        self.is_read = true;
    }

    pub fn affects(&self, symbol: &str) -> bool {
        self.affected_stocks.iter().any(|s| s == symbol)
    }
}

impl From<ExternalNews> for News {
    fn from(ext: ExternalNews) -> Self {
        Self {
            title: ext.title,
            content: ext.content,
            impact: match ext.impact {
                Impact::Numeric(v) => Impact::numeric(v),
                q @ Impact::Qualitative(_) => q,
            },
            affected_stocks: ext.affected_stocks,
            timestamp: ext.timestamp,
            is_read: false,
            source: Some(ext.source),
            url: Some(ext.url),
            is_real: true,
        }
    }
}

/// Record handed to the feed by an external news adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalNews {
    pub title: String,
    pub content: String,
    pub impact: Impact,
    pub affected_stocks: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Impact::Numeric(0.05)).unwrap(), "0.05");
        assert_eq!(
            serde_json::to_string(&Impact::Qualitative(Qualitative::Negative)).unwrap(),
            "\"negative\""
        );
        let parsed: Impact = serde_json::from_str("\"positive\"").unwrap();
        assert_eq!(parsed, Impact::Qualitative(Qualitative::Positive));
        let parsed: Impact = serde_json::from_str("-0.02").unwrap();
        assert_eq!(parsed, Impact::Numeric(-0.02));
    }

    #[test]
    fn impact_display_handles_both_tags() {
        assert_eq!(Impact::Numeric(0.034).to_string(), "+3.4%");
        assert_eq!(Impact::Numeric(-0.02).to_string(), "-2.0%");
        assert_eq!(Impact::Qualitative(Qualitative::Positive).to_string(), "BULLISH");
        assert_eq!(Impact::Qualitative(Qualitative::Neutral).to_string(), "NEUTRAL");
    }

    #[test]
    fn numeric_impact_is_clamped() {
        assert_eq!(Impact::numeric(3.0), Impact::Numeric(1.0));
        assert_eq!(Impact::numeric(-3.0), Impact::Numeric(-1.0));
    }

    #[test]
    fn external_news_is_marked_real() {
        let ext = ExternalNews {
            title: "Chipmakers rally".into(),
            content: "NVDA and AMD surge".into(),
            impact: Impact::Qualitative(Qualitative::Positive),
            affected_stocks: vec!["NVDA".into(), "AMD".into()],
            timestamp: Utc::now(),
            source: "Wire".into(),
            url: "https://example.com/a".into(),
        };
        let news = News::from(ext);
        assert!(news.is_real);
        assert!(!news.is_read);
        assert!(news.affects("AMD"));
        assert_eq!(news.source.as_deref(), Some("Wire"));
    }

    #[test]
    fn persisted_news_without_provenance_loads() {
        let json = r#"{
            "title": "Market News: Rates",
            "content": "Policy change",
            "impact": 0.02,
            "affectedStocks": [],
            "timestamp": "2024-03-01T12:00:00Z",
            "isRead": true
        }"#;
        let news: News = serde_json::from_str(json).unwrap();
        assert!(news.is_read);
        assert!(!news.is_real);
        assert_eq!(news.impact, Impact::Numeric(0.02));
    }

    #[test]
    fn loaded_numeric_impact_is_clamped() {
        let parsed: Impact = serde_json::from_str("5.0").unwrap();
        assert_eq!(parsed, Impact::Numeric(1.0));
        let json = r#"{
            "title": "Market News: Crash",
            "content": "Hand edited",
            "impact": -7.5,
            "affectedStocks": ["AAPL"],
            "timestamp": "2024-03-01T12:00:00Z"
        }"#;
        let news: News = serde_json::from_str(json).unwrap();
        assert_eq!(news.impact, Impact::Numeric(-1.0));
    }

    #[test]
    fn external_numeric_impact_is_clamped() {
        let ext = ExternalNews {
            title: "Squeeze".into(),
            content: "GME up".into(),
            impact: Impact::Numeric(5.0),
            affected_stocks: vec!["GME".into()],
            timestamp: Utc::now(),
            source: "Wire".into(),
            url: "https://example.com/b".into(),
        };
        assert_eq!(News::from(ext).impact, Impact::Numeric(1.0));
    }
}
