use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationRecord {
    pub donor_name: String,
    pub item_name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonatedItem {
    pub item_name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub donor_name: String,
    pub total_points: i64,
    pub items: Vec<DonatedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemStatEntry {
    pub item_name: String,
    pub points_per_unit: i64,
    pub total_quantity: i64,
    pub total_points: i64,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    MissingFields { found: usize },
    InvalidQuantity,
    NonPositiveQuantity,
    UnknownItem,
    PointsOverflow,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingFields { found } => {
                write!(f, "expected 3 fields, found {found}")
            }
            RejectReason::InvalidQuantity => f.write_str("quantity is not an integer"),
            RejectReason::NonPositiveQuantity => f.write_str("quantity must be positive"),
            RejectReason::UnknownItem => f.write_str("item is not in the catalog"),
            RejectReason::PointsOverflow => f.write_str("points total overflows"),
        }
    }
}

/// A record that was left out of the totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub line_number: usize,
    pub line: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    pub ranking: Vec<RankingEntry>,
    pub item_stats: Vec<ItemStatEntry>,
    pub rejected: Vec<Rejection>,
}

impl Aggregation {
    pub fn ranking_points(&self) -> i64 {
        self.ranking.iter().map(|entry| entry.total_points).sum()
    }

    pub fn item_points(&self) -> i64 {
        self.item_stats.iter().map(|stat| stat.total_points).sum()
    }

    /// Largest item quantity, never below 1 so it can scale bar widths.
    pub fn max_quantity(&self) -> i64 {
        self.item_stats
            .iter()
            .map(|stat| stat.total_quantity)
            .max()
            .unwrap_or(0)
            .max(1)
    }
}
