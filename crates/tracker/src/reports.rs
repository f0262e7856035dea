use chrono::{Datelike, Months, NaiveDate};
use shared::{
    domain::{ActionStatus, Gravity, NcStatus, NcType, NonConformity},
    protocol::{CategoryCount, KpiReport, MonthlyCount, ReportFilter, ReportStats},
};
use tracing::debug;

/// Longest trailing window `kpi_report` will produce for `by_month`.
pub const MAX_KPI_MONTHS: u32 = 120;

/// Computes the dashboard indicators from the live collection.
///
/// `months` is the length of the trailing window used for `by_month`,
/// ending with the month containing `today`. It is capped at
/// [`MAX_KPI_MONTHS`] and stops early where the calendar runs out.
pub fn kpi_report(records: &[NonConformity], today: NaiveDate, months: u32) -> KpiReport {
    let total = records.len();
    let closed: Vec<&NonConformity> = records.iter().filter(|nc| nc.status.is_closed()).collect();
    let resolution_days: Vec<i64> = closed.iter().filter_map(|nc| nc.resolution_days()).collect();

    let report = KpiReport {
        total,
        open: count(records, |nc| nc.status == NcStatus::Open),
        critical: count(records, |nc| nc.gravity == Gravity::Critical),
        major: count(records, |nc| nc.gravity == Gravity::Major),
        minor: count(records, |nc| nc.gravity == Gravity::Minor),
        overdue_actions: records
            .iter()
            .flat_map(|nc| nc.actions.iter())
            .filter(|action| action.is_late(today))
            .count(),
        mean_resolution_days: mean(&resolution_days),
        resolution_rate: percentage(closed.len(), total),
        by_month: monthly_counts(records, today, months),
        by_type: categories(NcType::ALL, |kind| count(records, |nc| nc.kind == kind), NcType::label),
        by_gravity: categories(
            Gravity::ALL,
            |gravity| count(records, |nc| nc.gravity == gravity),
            Gravity::label,
        ),
        by_status: categories(
            NcStatus::ALL,
            |status| count(records, |nc| nc.status == status),
            NcStatus::label,
        ),
    };
    debug!(total, closed = closed.len(), "kpi report computed");
    report
}

/// Records declared within `filter`'s inclusive date range that match its
/// gravity and type constraints.
pub fn filter_records<'a>(
    records: &'a [NonConformity],
    filter: &ReportFilter,
) -> Vec<&'a NonConformity> {
    records
        .iter()
        .filter(|nc| nc.declaration_date >= filter.from && nc.declaration_date <= filter.to)
        .filter(|nc| filter.gravity.map_or(true, |g| nc.gravity == g))
        .filter(|nc| filter.kind.map_or(true, |k| nc.kind == k))
        .collect()
}

pub fn report_stats(records: &[NonConformity], filter: &ReportFilter) -> ReportStats {
    let selected = filter_records(records, filter);
    let actions = || selected.iter().flat_map(|nc| nc.actions.iter());
    ReportStats {
        total: selected.len(),
        open: selected.iter().filter(|nc| nc.status == NcStatus::Open).count(),
        closed: selected.iter().filter(|nc| nc.status.is_closed()).count(),
        critical: selected.iter().filter(|nc| nc.gravity == Gravity::Critical).count(),
        major: selected.iter().filter(|nc| nc.gravity == Gravity::Major).count(),
        minor: selected.iter().filter(|nc| nc.gravity == Gravity::Minor).count(),
        actions_total: actions().count(),
        actions_done: actions().filter(|a| a.status == ActionStatus::Done).count(),
    }
}

/// January 1st of `today`'s year through `today`, no other constraint.
pub fn year_to_date(today: NaiveDate) -> ReportFilter {
    ReportFilter {
        from: NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        to: today,
        gravity: None,
        kind: None,
    }
}

fn monthly_counts(records: &[NonConformity], today: NaiveDate, months: u32) -> Vec<MonthlyCount> {
    let Some(current) = today.with_day(1) else {
        return Vec::new();
    };
    let mut starts: Vec<NaiveDate> = (0..months.min(MAX_KPI_MONTHS))
        .map_while(|back| current.checked_sub_months(Months::new(back)))
        .collect();
    starts.reverse();
    starts
        .into_iter()
        .map(|start| MonthlyCount {
            month: start.format("%Y-%m").to_string(),
            count: count(records, |nc| {
                nc.declaration_date.year() == start.year()
                    && nc.declaration_date.month() == start.month()
            }),
        })
        .collect()
}

fn categories<K: Copy>(
    keys: &[K],
    count_for: impl Fn(K) -> usize,
    label: fn(K) -> &'static str,
) -> Vec<CategoryCount<K>> {
    keys.iter()
        .map(|&key| CategoryCount {
            key,
            label: label(key).to_string(),
            count: count_for(key),
        })
        .collect()
}

fn count(records: &[NonConformity], predicate: impl Fn(&NonConformity) -> bool) -> usize {
    records.iter().filter(|nc| predicate(nc)).count()
}

fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: i64 = values.iter().sum();
    round_one(sum as f64 / values.len() as f64)
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_one(part as f64 * 100.0 / whole as f64)
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
