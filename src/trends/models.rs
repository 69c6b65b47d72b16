//! Trend analytics data types

use serde::{Deserialize, Serialize};

/// Worldwide region name accepted from callers
pub const GLOBAL_REGION: &str = "global";

/// One keyword over one timeframe in one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendQuery {
    pub keyword: String,
    /// Trend-service timeframe, e.g. `today 5-y` or `now 7-d`
    pub timeframe: String,
    /// Region as given by the caller (`ES`, `global`, ...)
    pub region: String,
}

impl TrendQuery {
    pub fn new(
        keyword: impl Into<String>,
        timeframe: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            timeframe: timeframe.into(),
            region: region.into(),
        }
    }

    /// Geo code sent to the trend service; worldwide is the empty string
    pub fn geo(&self) -> String {
        let region = self.region.trim();
        if region.is_empty() || region.eq_ignore_ascii_case(GLOBAL_REGION) {
            String::new()
        } else {
            region.to_uppercase()
        }
    }
}

/// Relative interest over time, as parallel date and value lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub dates: Vec<String>,
    pub values: Vec<i64>,
}

impl TimeSeries {
    pub fn push(&mut self, date: impl Into<String>, value: i64) {
        self.dates.push(date.into());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Date and value of the highest point, first one wins on ties
    pub fn peak(&self) -> Option<(&str, i64)> {
        self.values
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, i64)>, (i, &v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((i, v)),
            })
            .map(|(i, v)| (self.dates[i].as_str(), v))
    }
}

/// Interest in one region, 0..=100
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInterest {
    pub geo_code: String,
    pub geo_name: String,
    pub value: i64,
}

/// A related topic or query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntry {
    pub title: String,
    /// Topic category (`Topic`, `Country`, ...); absent for queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub value: i64,
    /// Display value, e.g. `100`, `+250%` or `Breakout`
    pub formatted_value: String,
}

/// Most popular and fastest rising related entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedLists {
    pub top: Vec<RelatedEntry>,
    pub rising: Vec<RelatedEntry>,
}

impl RelatedLists {
    /// Titles of the top entries, in rank order
    pub fn top_titles(&self) -> Vec<String> {
        self.top.iter().map(|e| e.title.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.rising.is_empty()
    }
}
