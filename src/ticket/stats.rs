//! Ticket statistics.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::ticket::{Department, Platform, Status, Ticket};

/// Length of the monthly activity series.
pub const ACTIVITY_MONTHS: usize = 6;
/// Length of the recent tickets list.
pub const RECENT_TICKETS: usize = 5;

const MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlatformCount {
    pub platform: Platform,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DepartmentCount {
    pub department: Department,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyCount {
    /// e.g. `out/2026`.
    pub month: String,
    pub tickets: usize,
}

/// Aggregated counters over a ticket list.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub in_implementation: usize,
    /// Percentage of resolved tickets, one decimal.
    pub completion_rate: f64,
    pub by_platform: Vec<PlatformCount>,
    /// Departments with at least one ticket, in enumeration order.
    pub by_department: Vec<DepartmentCount>,
    /// Last six calendar months, oldest first.
    pub monthly_activity: Vec<MonthlyCount>,
    pub recent: Vec<Ticket>,
    pub today: usize,
    pub this_week: usize,
    pub this_month: usize,
}

/// Counters polled by the dashboard.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub intercom: usize,
    pub gronerzap: usize,
    pub completion_rate: f64,
    pub in_implementation: usize,
    /// Every department in enumeration order, zero counts included.
    pub by_department: Vec<DepartmentCount>,
}

impl From<&Stats> for Metrics {
    fn from(stats: &Stats) -> Self {
        let platform = |p: Platform| {
            stats
                .by_platform
                .iter()
                .find(|c| c.platform == p)
                .map(|c| c.count)
                .unwrap_or_default()
        };

        let by_department = Department::ALL
            .into_iter()
            .map(|department| DepartmentCount {
                department,
                count: stats
                    .by_department
                    .iter()
                    .find(|c| c.department == department)
                    .map(|c| c.count)
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            total: stats.total,
            resolved: stats.resolved,
            unresolved: stats.unresolved,
            intercom: platform(Platform::Intercom),
            gronerzap: platform(Platform::Gronerzap),
            completion_rate: stats.completion_rate,
            in_implementation: stats.in_implementation,
            by_department,
        }
    }
}

/// `round(part / total * 100, 1)`, or 0 for an empty total.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Label of a calendar month, e.g. `out/2026`.
pub fn month_label(year: i32, month: u32) -> String {
    format!("{}/{year}", MONTHS[(month as usize - 1) % 12])
}

/// `(year, month)` of the `ACTIVITY_MONTHS` months ending with `today`'s.
fn activity_window(today: NaiveDate) -> Vec<(i32, u32)> {
    let current = today.year() * 12 + today.month0() as i32;
    (0..ACTIVITY_MONTHS as i32)
        .rev()
        .map(|back| {
            let index = current - back;
            (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
        })
        .collect()
}

/// Compute [`Stats`] over `tickets` relative to the `today` calendar day.
pub fn compute_stats(tickets: &[Ticket], today: NaiveDate) -> Stats {
    let count = |pred: &dyn Fn(&Ticket) -> bool| tickets.iter().filter(|t| pred(t)).count();

    let total = tickets.len();
    let resolved = count(&|t| t.status == Status::Resolved);

    let by_platform = Platform::ALL
        .into_iter()
        .map(|platform| PlatformCount {
            platform,
            count: count(&|t| t.platform == platform),
        })
        .collect();

    let by_department = Department::ALL
        .into_iter()
        .map(|department| DepartmentCount {
            department,
            count: count(&|t| t.department == department),
        })
        .filter(|c| c.count > 0)
        .collect();

    let monthly_activity = activity_window(today)
        .into_iter()
        .map(|(year, month)| MonthlyCount {
            month: month_label(year, month),
            tickets: count(&|t| {
                let day = t.created_at.date_naive();
                day.year() == year && day.month() == month
            }),
        })
        .collect();

    let mut recent = tickets.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(RECENT_TICKETS);

    let week_start = today - Duration::days(6);

    Stats {
        total,
        resolved,
        unresolved: total - resolved,
        in_progress: count(&|t| t.status == Status::InProgress),
        pending: count(&|t| t.status == Status::Pending),
        in_implementation: count(&|t| t.in_implementation),
        completion_rate: percentage(resolved, total),
        by_platform,
        by_department,
        monthly_activity,
        recent,
        today: count(&|t| t.created_at.date_naive() == today),
        this_week: count(&|t| {
            let day = t.created_at.date_naive();
            day >= week_start && day <= today
        }),
        this_month: count(&|t| {
            let day = t.created_at.date_naive();
            day.year() == today.year() && day.month() == today.month()
        }),
    }
}
