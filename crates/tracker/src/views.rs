use std::cmp::Ordering;

use shared::{
    domain::{NcStatus, NonConformity},
    protocol::{BoardColumn, NcQuery, SortKey, SortOrder, StatusCounts},
};

/// Filters and sorts records for the list view. Ties keep collection order.
pub fn query<'a>(records: &'a [NonConformity], query: &NcQuery) -> Vec<&'a NonConformity> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut result: Vec<&NonConformity> = records
        .iter()
        .filter(|nc| needle.as_deref().map_or(true, |needle| matches_search(nc, needle)))
        .filter(|nc| query.gravity.map_or(true, |g| nc.gravity == g))
        .filter(|nc| query.status.map_or(true, |s| nc.status == s))
        .filter(|nc| query.kind.map_or(true, |k| nc.kind == k))
        .collect();

    result.sort_by(|a, b| {
        let ordering = compare(a, b, query.sort_by);
        match query.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    result
}

fn matches_search(nc: &NonConformity, needle: &str) -> bool {
    [&nc.reference, &nc.title, &nc.description, &nc.reporter_name]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn compare(a: &NonConformity, b: &NonConformity, key: SortKey) -> Ordering {
    match key {
        SortKey::Date => a.declaration_date.cmp(&b.declaration_date),
        SortKey::Gravity => a.gravity.rank().cmp(&b.gravity.rank()),
        SortKey::Status => a.status.rank().cmp(&b.status.rank()),
    }
}

/// One column per workflow status, in sequence order.
pub fn board(records: &[NonConformity]) -> Vec<BoardColumn<'_>> {
    NcStatus::ALL
        .iter()
        .map(|&status| BoardColumn {
            status,
            label: status.label(),
            records: records.iter().filter(|nc| nc.status == status).collect(),
        })
        .collect()
}

pub fn status_counts(records: &[NonConformity]) -> StatusCounts {
    records.iter().fold(
        StatusCounts {
            total: records.len(),
            ..StatusCounts::default()
        },
        |mut counts, nc| {
            match nc.status {
                NcStatus::Open => counts.open += 1,
                NcStatus::UnderAnalysis => counts.under_analysis += 1,
                NcStatus::ActionLaunched => counts.action_launched += 1,
                NcStatus::Closed => counts.closed += 1,
            }
            counts
        },
    )
}
