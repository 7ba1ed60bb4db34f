//! Lay out the report's sheets from one run's snapshot.
//!
//! Sheet order is fixed: Monthly Report, Executive Summary, the eight raw
//! listings (this month, then all time), Package Distribution, User Growth,
//! Revenue Trend.

use tracing::warn;

use crate::aggregate::{
    RevenueSummary, compute_agent_breakdown, compute_monthly_revenue, compute_package_breakdown, growth_percent,
    revenue_per_active_user, safe_average,
};
use crate::constants;
use crate::error::AssemblyError;
use crate::resolve::{JoinIndex, tier_label};
use crate::sheet::{Cell, Row, Sheet, Workbook};
use crate::types::{Agent, Member, Role, Snapshot, TimeSeriesInputs, parse_timestamp};
use crate::window::{
    MonthWindow, RunClock, agent_created, agent_joined, filter_to_current_month, member_timestamp, members_in,
};

// Column width hints, one per column.
const MONTHLY_WIDTHS: &[u16] = &[8, 28, 32, 18, 14, 26, 18, 16];
const EXECUTIVE_WIDTHS: &[u16] = &[30, 16, 16, 16, 18, 18];
const PERSON_LISTING_WIDTHS: &[u16] = &[6, 26, 26, 32, 12, 18, 14, 26, 14, 14, 10];
const AGENT_LISTING_WIDTHS: &[u16] = &[6, 26, 26, 32, 16, 18, 14, 10];
const DISTRIBUTION_WIDTHS: &[u16] = &[20, 14, 16, 18, 18, 18, 26];
const USER_GROWTH_WIDTHS: &[u16] = &[14, 12, 14];
const REVENUE_TREND_WIDTHS: &[u16] = &[14, 14, 16];

/// Everything the assembler reads, passed by reference.
pub struct ReportData<'a> {
    pub snapshot: &'a Snapshot,
    pub series: &'a TimeSeriesInputs,
    pub clock: &'a RunClock,
}

/// Role partitions of the snapshot, all-time and windowed.
struct Population {
    customers: Vec<Member>,
    mentors: Vec<Member>,
    admins: Vec<Member>,
    customers_month: Vec<Member>,
    mentors_month: Vec<Member>,
    admins_month: Vec<Member>,
    customers_last_month: Vec<Member>,
    agents_month: Vec<Agent>,
}

impl Population {
    fn split(snapshot: &Snapshot, clock: &RunClock) -> Self {
        let by_role = |keep: fn(&Role) -> bool| -> Vec<Member> {
            snapshot.members.iter().filter(|m| keep(&m.role)).cloned().collect()
        };
        let customers = by_role(|r| *r == Role::Member);
        let mentors = by_role(|r| *r == Role::Mentor);
        let admins = by_role(Role::is_admin);

        let this_month = |people: &[Member]| filter_to_current_month(people, clock, member_timestamp, |_| None);

        Self {
            customers_month: this_month(&customers),
            mentors_month: this_month(&mentors),
            admins_month: this_month(&admins),
            customers_last_month: members_in(&customers, &clock.current_month().previous()),
            agents_month: filter_to_current_month(&snapshot.agents, clock, agent_joined, agent_created),
            customers,
            mentors,
            admins,
        }
    }
}

/// Build every sheet of the report in its fixed order.
pub fn assemble_report(data: &ReportData) -> Workbook {
    let window = data.clock.current_month();
    let snapshot = data.snapshot;
    let pop = Population::split(snapshot, data.clock);
    let index = JoinIndex::new(&snapshot.agents, &snapshot.tier_prices);
    let mut issues = Vec::new();

    let mut sheets = vec![
        monthly_report_sheet(&pop.customers_month, snapshot, &window, &index),
        executive_summary_sheet(&pop, snapshot, data.clock),
    ];

    sheets.push(person_listing_sheet("This Month Members", &pop.customers_month, &index, &mut issues));
    sheets.push(agent_listing_sheet("This Month Agents", &pop.agents_month, snapshot, &mut issues));
    sheets.push(person_listing_sheet("This Month Mentors", &pop.mentors_month, &index, &mut issues));
    sheets.push(person_listing_sheet("This Month Admins", &pop.admins_month, &index, &mut issues));

    sheets.push(person_listing_sheet("All Members", &pop.customers, &index, &mut issues));
    sheets.push(agent_listing_sheet("All Agents", &snapshot.agents, snapshot, &mut issues));
    sheets.push(person_listing_sheet("All Mentors", &pop.mentors, &index, &mut issues));
    sheets.push(person_listing_sheet("All Admins", &pop.admins, &index, &mut issues));

    sheets.push(package_distribution_sheet(snapshot));
    sheets.push(user_growth_sheet(data.series));
    sheets.push(revenue_trend_sheet(data.series));

    for issue in &issues {
        warn!(%issue, "Substituted placeholder cell");
    }

    Workbook { sheets, issues }
}

// ══════════════════════════════════════════════════════════════════════════════
// MONTHLY REPORT
// ══════════════════════════════════════════════════════════════════════════════

pub fn monthly_report_sheet(
    new_members: &[Member],
    snapshot: &Snapshot,
    window: &MonthWindow,
    index: &JoinIndex,
) -> Sheet {
    let mut sheet = Sheet::new(constants::SHEET_MONTHLY_REPORT, MONTHLY_WIDTHS);
    let prices = &snapshot.tier_prices;

    let count = new_members.len() as i64;
    let revenue = compute_monthly_revenue(new_members, prices);

    // ── Title & summary ─────────────────────────────────────────────────
    sheet.push(vec![Cell::heading(format!("Monthly Report - {}", window.label()))]);
    sheet.blank();
    sheet.push(vec![Cell::heading("Summary")]);
    sheet.push(vec![Cell::text("New Members"), Cell::from(count)]);
    sheet.push(vec![Cell::text("Total Revenue (coins)"), Cell::from(revenue)]);
    sheet.push(vec![
        Cell::text("Average Revenue per Member"),
        Cell::from(safe_average(revenue, count)),
    ]);
    sheet.blank();

    // ── Member details ──────────────────────────────────────────────────
    sheet.push(vec![Cell::heading("Member Details")]);
    sheet.header(&[
        "#",
        "Name",
        "Email",
        "Package",
        "Package Price",
        "Referred By",
        "Registration Date",
        "Registration Time",
    ]);
    for (i, m) in new_members.iter().enumerate() {
        let (date, time) = match m.created_at {
            Some(ts) => (Cell::Date(ts.date_naive()), Cell::text(ts.format("%H:%M:%S").to_string())),
            None => (Cell::text(constants::NOT_AVAILABLE), Cell::text(constants::NOT_AVAILABLE)),
        };
        sheet.push(vec![
            Cell::from(i + 1),
            Cell::text(m.name.as_str()),
            Cell::text(m.email.as_str()),
            Cell::text(tier_label(m.tier_name.as_deref())),
            Cell::from(index.tier_price(m.tier_name.as_deref())),
            Cell::text(index.agent_name(m.referral_code.as_deref())),
            date,
            time,
        ]);
    }
    sheet.blank();

    // ── Package breakdown ───────────────────────────────────────────────
    sheet.push(vec![Cell::heading("Package Breakdown")]);
    sheet.header(&["Package", "Members", "Unit Price", "Total Revenue"]);
    for row in compute_package_breakdown(new_members, prices) {
        sheet.push(vec![
            Cell::Text(row.tier_name),
            Cell::from(row.count),
            Cell::from(row.unit_price),
            Cell::from(row.total_revenue),
        ]);
    }
    sheet.blank();

    // ── Agent breakdown ─────────────────────────────────────────────────
    sheet.push(vec![Cell::heading("Agent Breakdown")]);
    sheet.header(&["Agent", "Referred Members", "Total Revenue", "Avg Revenue per Member"]);
    for row in compute_agent_breakdown(new_members, &snapshot.agents, prices) {
        sheet.push(vec![
            Cell::Text(row.agent_name),
            Cell::from(row.referred_count),
            Cell::from(row.total_revenue),
            Cell::from(row.average_revenue_per_user),
        ]);
    }

    sheet
}

// ══════════════════════════════════════════════════════════════════════════════
// EXECUTIVE SUMMARY
// ══════════════════════════════════════════════════════════════════════════════

fn metric_row(label: &str, this_month: usize, all_time: usize) -> Row {
    let (this_month, all_time) = (this_month as i64, all_time as i64);
    vec![
        Cell::text(label),
        Cell::from(this_month),
        Cell::from(all_time),
        Cell::from(growth_percent(this_month, all_time)),
    ]
}

fn executive_summary_sheet(pop: &Population, snapshot: &Snapshot, clock: &RunClock) -> Sheet {
    let mut sheet = Sheet::new(constants::SHEET_EXECUTIVE_SUMMARY, EXECUTIVE_WIDTHS);
    let window = clock.current_month();

    sheet.push(vec![Cell::heading("Executive Summary")]);
    sheet.push(vec![Cell::text("Generated At"), Cell::DateTime(clock.now())]);
    sheet.push(vec![
        Cell::text("Report Period"),
        Cell::Date(window.first_day()),
        Cell::text("to"),
        Cell::Date(window.last_day()),
    ]);
    sheet.blank();

    // ── Growth metrics ──────────────────────────────────────────────────
    sheet.push(vec![Cell::heading("Platform Metrics")]);
    sheet.header(&["Metric", "This Month", "All Time", "Growth %"]);
    sheet.push(metric_row("Members", pop.customers_month.len(), pop.customers.len()));
    sheet.push(metric_row("Agents", pop.agents_month.len(), snapshot.agents.len()));
    sheet.push(metric_row("Mentors", pop.mentors_month.len(), pop.mentors.len()));
    sheet.push(metric_row("Admins", pop.admins_month.len(), pop.admins.len()));
    sheet.blank();

    // ── Revenue ─────────────────────────────────────────────────────────
    let revenue = RevenueSummary::compute(&snapshot.tier_prices, &pop.customers_month, &pop.customers_last_month);
    sheet.push(vec![Cell::heading("Revenue Summary")]);
    sheet.header(&["Measure", "Coins"]);
    sheet.push(vec![Cell::text("All-Time Revenue"), Cell::from(revenue.all_time)]);
    sheet.push(vec![Cell::text("Current Active Revenue"), Cell::from(revenue.current_active)]);
    sheet.push(vec![Cell::text("This Month Revenue"), Cell::from(revenue.this_month)]);
    sheet.push(vec![Cell::text("Last Month Revenue"), Cell::from(revenue.last_month)]);
    sheet.push(vec![Cell::text("Month-over-Month Change"), Cell::from(revenue.delta())]);
    sheet.blank();

    // ── Per-tier performance ────────────────────────────────────────────
    sheet.push(vec![Cell::heading("Package Performance")]);
    sheet.header(&[
        "Package",
        "Price",
        "Active Users",
        "Total Purchases",
        "Current Revenue",
        "Total Revenue",
    ]);
    for tier in &snapshot.tier_prices {
        sheet.push(vec![
            Cell::text(tier.tier_name.as_str()),
            Cell::from(tier.price_in_coins),
            Cell::from(tier.current_active_users),
            Cell::from(tier.total_purchases),
            Cell::from(tier.current_revenue),
            Cell::from(tier.total_revenue),
        ]);
    }

    sheet
}

// ══════════════════════════════════════════════════════════════════════════════
// RAW LISTINGS
// ══════════════════════════════════════════════════════════════════════════════

fn status(is_banned: bool) -> Cell {
    Cell::text(if is_banned { "Banned" } else { "Active" })
}

/// Date cell for a record, or "N/A" plus a recorded issue.
fn joined_cell(
    ts: Option<chrono::DateTime<chrono::Utc>>,
    sheet: &str,
    record_id: &str,
    issues: &mut Vec<AssemblyError>,
) -> Cell {
    match ts {
        Some(ts) => Cell::Date(ts.date_naive()),
        None => {
            issues.push(AssemblyError::MissingTimestamp {
                sheet: sheet.to_string(),
                record_id: record_id.to_string(),
            });
            Cell::text(constants::NOT_AVAILABLE)
        }
    }
}

fn person_listing_sheet(name: &str, people: &[Member], index: &JoinIndex, issues: &mut Vec<AssemblyError>) -> Sheet {
    let mut sheet = Sheet::new(name, PERSON_LISTING_WIDTHS);
    sheet.header(&[
        "#",
        "ID",
        "Name",
        "Email",
        "Role",
        "Package",
        "Package Price",
        "Referred By",
        "Coin Balance",
        "Joined",
        "Status",
    ]);

    for (i, m) in people.iter().enumerate() {
        sheet.push(vec![
            Cell::from(i + 1),
            Cell::text(m.id.as_str()),
            Cell::text(m.name.as_str()),
            Cell::text(m.email.as_str()),
            Cell::text(m.role.to_string()),
            Cell::text(tier_label(m.tier_name.as_deref())),
            Cell::from(index.tier_price(m.tier_name.as_deref())),
            Cell::text(index.agent_name(m.referral_code.as_deref())),
            Cell::from(m.coin_balance),
            joined_cell(m.created_at, name, &m.id, issues),
            status(m.is_banned),
        ]);
    }

    sheet
}

fn agent_listing_sheet(name: &str, agents: &[Agent], snapshot: &Snapshot, issues: &mut Vec<AssemblyError>) -> Sheet {
    let mut sheet = Sheet::new(name, AGENT_LISTING_WIDTHS);
    sheet.header(&[
        "#",
        "ID",
        "Name",
        "Email",
        "Referral Code",
        "Referred Members",
        "Joined",
        "Status",
    ]);

    for (i, a) in agents.iter().enumerate() {
        let code = a.referral_code.as_deref().filter(|c| !c.trim().is_empty());
        let referred = code.map_or(0, |code| {
            snapshot
                .members
                .iter()
                .filter(|m| m.referral_code.as_deref() == Some(code))
                .count()
        });
        sheet.push(vec![
            Cell::from(i + 1),
            Cell::text(a.id.as_str()),
            Cell::text(a.name.as_str()),
            Cell::text(a.email.as_str()),
            Cell::text(code.unwrap_or(constants::NOT_AVAILABLE)),
            Cell::from(referred),
            joined_cell(a.joined_at.or(a.created_at), name, &a.id, issues),
            status(a.is_banned),
        ]);
    }

    sheet
}

// ══════════════════════════════════════════════════════════════════════════════
// PACKAGE DISTRIBUTION & TIME SERIES
// ══════════════════════════════════════════════════════════════════════════════

fn package_distribution_sheet(snapshot: &Snapshot) -> Sheet {
    let mut sheet = Sheet::new(constants::SHEET_PACKAGE_DISTRIBUTION, DISTRIBUTION_WIDTHS);
    sheet.header(&[
        "Package",
        "Price",
        "Active Users",
        "Total Purchases",
        "Current Revenue",
        "Total Revenue",
        "Avg Revenue per Active User",
    ]);
    for tier in &snapshot.tier_prices {
        sheet.push(vec![
            Cell::text(tier.tier_name.as_str()),
            Cell::from(tier.price_in_coins),
            Cell::from(tier.current_active_users),
            Cell::from(tier.total_purchases),
            Cell::from(tier.current_revenue),
            Cell::from(tier.total_revenue),
            Cell::from(revenue_per_active_user(tier)),
        ]);
    }
    sheet
}

/// Series dates become date cells when parseable, else stay as given.
fn series_date(raw: &str) -> Cell {
    parse_timestamp(raw).map_or_else(|| Cell::text(raw), |ts| Cell::Date(ts.date_naive()))
}

fn user_growth_sheet(series: &TimeSeriesInputs) -> Sheet {
    let mut sheet = Sheet::new(constants::SHEET_USER_GROWTH, USER_GROWTH_WIDTHS);
    sheet.header(&["Date", "New Users", "Total Users"]);
    for point in &series.user_growth {
        sheet.push(vec![
            series_date(&point.date),
            Cell::from(point.new_users),
            Cell::from(point.total_users),
        ]);
    }
    sheet
}

fn revenue_trend_sheet(series: &TimeSeriesInputs) -> Sheet {
    let mut sheet = Sheet::new(constants::SHEET_REVENUE_TREND, REVENUE_TREND_WIDTHS);
    sheet.header(&["Date", "Revenue", "Packages Sold"]);
    for point in series.revenue.iter().filter(|p| p.revenue != 0.0) {
        sheet.push(vec![
            series_date(&point.date),
            Cell::from(point.revenue),
            Cell::from(point.packages_sold),
        ]);
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RevenuePoint, TierPriceEntry, UserGrowthPoint};
    use chrono::{TimeZone, Utc};

    fn clock() -> RunClock {
        RunClock::at(Utc.with_ymd_and_hms(2026, 10, 16, 10, 30, 0).unwrap())
    }

    fn snapshot() -> Snapshot {
        let this_month = Utc.with_ymd_and_hms(2026, 10, 5, 14, 5, 9).unwrap();
        let last_month = Utc.with_ymd_and_hms(2026, 9, 20, 9, 0, 0).unwrap();
        Snapshot {
            members: vec![
                Member {
                    id: "m1".into(),
                    name: "Ada".into(),
                    tier_name: Some("Gold".into()),
                    referral_code: Some("REF1".into()),
                    created_at: Some(this_month),
                    ..Default::default()
                },
                Member {
                    id: "m2".into(),
                    name: "Bo".into(),
                    tier_name: Some("Gold".into()),
                    created_at: Some(last_month),
                    ..Default::default()
                },
                Member {
                    id: "m3".into(),
                    name: "Cy".into(),
                    created_at: None,
                    is_banned: true,
                    ..Default::default()
                },
                Member {
                    id: "t1".into(),
                    name: "Mentor Mo".into(),
                    role: Role::Mentor,
                    created_at: Some(this_month),
                    ..Default::default()
                },
                Member {
                    id: "s1".into(),
                    name: "Root".into(),
                    role: Role::SuperAdmin,
                    created_at: Some(last_month),
                    ..Default::default()
                },
            ],
            agents: vec![Agent {
                id: "a1".into(),
                name: "A1".into(),
                referral_code: Some("REF1".into()),
                joined_at: Some(this_month),
                ..Default::default()
            }],
            tier_prices: vec![TierPriceEntry {
                tier_name: "Gold".into(),
                price_in_coins: 500,
                current_active_users: 0,
                total_purchases: 12,
                current_revenue: 1500,
                total_revenue: 6000,
            }],
        }
    }

    fn build(snapshot: &Snapshot, series: &TimeSeriesInputs) -> Workbook {
        assemble_report(&ReportData {
            snapshot,
            series,
            clock: &clock(),
        })
    }

    #[test]
    fn sheets_come_in_fixed_order() {
        let wb = build(&snapshot(), &TimeSeriesInputs::default());
        assert_eq!(
            wb.sheet_names(),
            vec![
                "Monthly Report",
                "Executive Summary",
                "This Month Members",
                "This Month Agents",
                "This Month Mentors",
                "This Month Admins",
                "All Members",
                "All Agents",
                "All Mentors",
                "All Admins",
                "Package Distribution",
                "User Growth",
                "Revenue Trend",
            ]
        );
    }

    #[test]
    fn monthly_summary_counts_only_this_months_members() {
        let wb = build(&snapshot(), &TimeSeriesInputs::default());
        let sheet = wb.sheet("Monthly Report").unwrap();
        assert_eq!(sheet.rows[0], vec![Cell::heading("Monthly Report - October 2026")]);
        assert_eq!(sheet.rows[3], vec![Cell::text("New Members"), Cell::Integer(1)]);
        assert_eq!(sheet.rows[4], vec![Cell::text("Total Revenue (coins)"), Cell::Integer(500)]);
        assert_eq!(sheet.rows[5], vec![Cell::text("Average Revenue per Member"), Cell::Integer(500)]);

        let details = sheet.find_heading("Member Details").unwrap();
        let first = &sheet.rows[details + 2];
        assert_eq!(first[1], Cell::text("Ada"));
        assert_eq!(first[5], Cell::text("A1"));
        assert_eq!(first[7], Cell::text("14:05:09"));
    }

    #[test]
    fn empty_month_renders_zeroes_and_header_only_breakdowns() {
        let mut snap = snapshot();
        snap.members.retain(|m| m.id != "m1" && m.id != "t1");
        let wb = build(&snap, &TimeSeriesInputs::default());
        let sheet = wb.sheet("Monthly Report").unwrap();

        assert_eq!(sheet.rows[3][1], Cell::Integer(0));
        assert_eq!(sheet.rows[4][1], Cell::Integer(0));
        assert_eq!(sheet.rows[5][1], Cell::Integer(0));

        let packages = sheet.find_heading("Package Breakdown").unwrap();
        let agents = sheet.find_heading("Agent Breakdown").unwrap();
        // section heading, column header, blank separator
        assert_eq!(agents - packages, 3);
        // agent table is the last section: heading + column header only
        assert_eq!(sheet.rows.len(), agents + 2);
    }

    #[test]
    fn missing_timestamps_become_placeholders() {
        let wb = build(&snapshot(), &TimeSeriesInputs::default());
        let all = wb.sheet("All Members").unwrap();
        let cy = all.rows.iter().find(|r| r[1] == Cell::text("m3")).unwrap();
        assert_eq!(cy[9], Cell::text("N/A"));
        assert_eq!(cy[10], Cell::text("Banned"));
        assert_eq!(
            wb.issues,
            vec![AssemblyError::MissingTimestamp {
                sheet: "All Members".into(),
                record_id: "m3".into(),
            }]
        );
    }

    #[test]
    fn executive_summary_metrics_and_revenue() {
        let wb = build(&snapshot(), &TimeSeriesInputs::default());
        let sheet = wb.sheet("Executive Summary").unwrap();

        let metrics = sheet.find_heading("Platform Metrics").unwrap();
        // Members: 1 this month of 3 all time → 1 / 2 = 50%
        assert_eq!(
            sheet.rows[metrics + 2],
            vec![Cell::text("Members"), Cell::Integer(1), Cell::Integer(3), Cell::Number(50.0)]
        );
        // Admins include the super-admin, none joined this month
        assert_eq!(sheet.rows[metrics + 5][1..3], [Cell::Integer(0), Cell::Integer(1)]);

        let revenue = sheet.find_heading("Revenue Summary").unwrap();
        assert_eq!(sheet.rows[revenue + 2][1], Cell::Integer(6000));
        assert_eq!(sheet.rows[revenue + 3][1], Cell::Integer(1500));
        assert_eq!(sheet.rows[revenue + 4][1], Cell::Integer(500));
        assert_eq!(sheet.rows[revenue + 5][1], Cell::Integer(500));
        assert_eq!(sheet.rows[revenue + 6][1], Cell::Integer(0));
    }

    #[test]
    fn agent_listing_counts_referrals() {
        let wb = build(&snapshot(), &TimeSeriesInputs::default());
        let sheet = wb.sheet("This Month Agents").unwrap();
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1][4], Cell::text("REF1"));
        assert_eq!(sheet.rows[1][5], Cell::Integer(1));
    }

    #[test]
    fn distribution_guards_zero_active_users() {
        let wb = build(&snapshot(), &TimeSeriesInputs::default());
        let sheet = wb.sheet("Package Distribution").unwrap();
        assert_eq!(sheet.rows[1][6], Cell::Integer(0));
    }

    #[test]
    fn time_series_are_reshaped_and_zero_revenue_days_dropped() {
        let series = TimeSeriesInputs {
            user_growth: vec![UserGrowthPoint {
                date: "2026-10-01".into(),
                new_users: 3,
                total_users: 120,
            }],
            revenue: vec![
                RevenuePoint {
                    date: "2026-10-01".into(),
                    revenue: 0.0,
                    packages_sold: 0,
                },
                RevenuePoint {
                    date: "Oct 2".into(),
                    revenue: 1500.0,
                    packages_sold: 3,
                },
            ],
        };
        let wb = build(&snapshot(), &series);

        let growth = wb.sheet("User Growth").unwrap();
        assert_eq!(
            growth.rows[1],
            vec![
                Cell::Date(chrono::NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()),
                Cell::Integer(3),
                Cell::Integer(120),
            ]
        );

        let trend = wb.sheet("Revenue Trend").unwrap();
        assert_eq!(trend.rows.len(), 2);
        assert_eq!(trend.rows[1][0], Cell::text("Oct 2"));
        assert_eq!(trend.rows[1][1], Cell::Number(1500.0));
    }
}
