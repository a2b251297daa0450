use std::collections::HashMap;

use crate::catalog::ItemCatalog;
use crate::ingest::parse_record;
use crate::models::{
    Aggregation, DonatedItem, ItemStatEntry, RankingEntry, RejectReason, Rejection,
};

struct DonorTotals {
    donor_name: String,
    total_points: i64,
    items: Vec<DonatedItem>,
}

#[derive(Default, Clone, Copy)]
struct ItemTotals {
    quantity: i64,
    points: i64,
}

/// Aggregates raw lines, numbering them from 1 in input order.
pub fn aggregate<I, S>(records: I, catalog: &ItemCatalog) -> Aggregation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    aggregate_numbered(
        records
            .into_iter()
            .enumerate()
            .map(|(index, line)| (index + 1, line)),
        catalog,
    )
}

/// Aggregates `(line_number, line)` pairs against the catalog.
pub fn aggregate_numbered<I, S>(records: I, catalog: &ItemCatalog) -> Aggregation
where
    I: IntoIterator<Item = (usize, S)>,
    S: AsRef<str>,
{
    let mut donors: Vec<DonorTotals> = Vec::new();
    let mut donor_index: HashMap<String, usize> = HashMap::new();
    let mut items: HashMap<String, ItemTotals> = HashMap::new();
    let mut rejected = Vec::new();
    let mut accepted = 0usize;
    let mut grand_total = 0i64;

    for (line_number, line) in records {
        let line = line.as_ref();
        let mut reject = |reason: RejectReason| {
            tracing::debug!(line_number, line, %reason, "record skipped");
            rejected.push(Rejection {
                line_number,
                line: line.to_string(),
                reason,
            });
        };

        let record = match parse_record(line) {
            Ok(record) => record,
            Err(reason) => {
                reject(reason);
                continue;
            }
        };

        let points_per_unit = catalog.points_for(&record.item_name);
        if record.quantity <= 0 {
            reject(RejectReason::NonPositiveQuantity);
            continue;
        }
        if points_per_unit <= 0 {
            reject(RejectReason::UnknownItem);
            continue;
        }

        let slot = donor_index.get(&record.donor_name).copied();
        let donor_points = slot.map_or(0, |i| donors[i].total_points);
        let item_totals = items.get(&record.item_name).copied().unwrap_or_default();

        // Every sum is checked before anything is committed.
        let totals = record.quantity.checked_mul(points_per_unit).and_then(|points| {
            Some((
                donor_points.checked_add(points)?,
                item_totals.quantity.checked_add(record.quantity)?,
                item_totals.points.checked_add(points)?,
                grand_total.checked_add(points)?,
            ))
        });
        let Some((donor_total, item_quantity, item_points, new_grand_total)) = totals else {
            reject(RejectReason::PointsOverflow);
            continue;
        };

        let slot = match slot {
            Some(i) => i,
            None => {
                donor_index.insert(record.donor_name.clone(), donors.len());
                donors.push(DonorTotals {
                    donor_name: record.donor_name.clone(),
                    total_points: 0,
                    items: Vec::new(),
                });
                donors.len() - 1
            }
        };
        let donor = &mut donors[slot];
        donor.total_points = donor_total;
        match donor
            .items
            .iter_mut()
            .find(|item| item.item_name == record.item_name)
        {
            Some(item) => item.quantity += record.quantity,
            None => donor.items.push(DonatedItem {
                item_name: record.item_name.clone(),
                quantity: record.quantity,
            }),
        }

        items.insert(
            record.item_name,
            ItemTotals {
                quantity: item_quantity,
                points: item_points,
            },
        );
        grand_total = new_grand_total;
        accepted += 1;
    }

    let mut ranking: Vec<RankingEntry> = donors
        .into_iter()
        .map(|donor| RankingEntry {
            donor_name: donor.donor_name,
            total_points: donor.total_points,
            items: donor.items,
        })
        .collect();
    // Stable sort keeps first-seen order for ties.
    ranking.sort_by(|a, b| b.total_points.cmp(&a.total_points));

    let mut item_stats: Vec<ItemStatEntry> = catalog
        .items()
        .iter()
        .map(|item| {
            let totals = items.get(&item.name).copied().unwrap_or_default();
            ItemStatEntry {
                item_name: item.name.clone(),
                points_per_unit: item.points,
                total_quantity: totals.quantity,
                total_points: totals.points,
                color: catalog.color_for(&item.name).to_string(),
            }
        })
        .collect();
    item_stats.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));

    tracing::info!(
        accepted,
        rejected = rejected.len(),
        donors = ranking.len(),
        "donations aggregated"
    );

    Aggregation {
        ranking,
        item_stats,
        rejected,
    }
}
