//! Activity statistics over a set of matches.
//!
//! Per-day message/view/forward/reaction counts and the most active senders, the
//! numbers a dashboard would chart.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::MatchRecord;

/// Totals for one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub messages: usize,
    pub views: u64,
    pub forwards: u64,
    pub reactions: u64,
}

/// Message count for one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderActivity {
    pub sender: String,
    pub messages: usize,
}

/// Aggregated activity of a match set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityStats {
    /// Days in ascending order, only days with at least one message
    pub days: Vec<DailyActivity>,
    /// Most active senders, busiest first, ties by name
    pub top_senders: Vec<SenderActivity>,
    pub total_messages: usize,
    pub total_views: u64,
}

impl ActivityStats {
    /// Computes statistics, keeping the `top_n` busiest senders.
    pub fn from_matches(matches: &[MatchRecord], top_n: usize) -> Self {
        let mut days: BTreeMap<NaiveDate, DailyActivity> = BTreeMap::new();
        let mut senders: HashMap<&str, usize> = HashMap::new();

        for m in matches {
            let date = m.timestamp.date_naive();
            let day = days.entry(date).or_insert(DailyActivity {
                date,
                messages: 0,
                views: 0,
                forwards: 0,
                reactions: 0,
            });
            day.messages += 1;
            day.views += m.views;
            day.forwards += m.forwards;
            day.reactions += m.reactions;

            *senders.entry(m.sender.as_str()).or_default() += 1;
        }

        let mut top_senders: Vec<SenderActivity> = senders
            .into_iter()
            .map(|(sender, messages)| SenderActivity {
                sender: sender.to_string(),
                messages,
            })
            .collect();
        top_senders.sort_by(|a, b| b.messages.cmp(&a.messages).then_with(|| a.sender.cmp(&b.sender)));
        top_senders.truncate(top_n);

        Self {
            days: days.into_values().collect(),
            top_senders,
            total_messages: matches.len(),
            total_views: matches.iter().map(|m| m.views).sum(),
        }
    }

    /// Average views per message, 0 for an empty set.
    pub fn average_views(&self) -> f64 {
        if self.total_messages == 0 {
            return 0.0;
        }
        self.total_views as f64 / self.total_messages as f64
    }
}
