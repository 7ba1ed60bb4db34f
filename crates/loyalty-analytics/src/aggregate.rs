//! Revenue and membership aggregates over one member set.
//!
//! All functions are pure and total. Coin sums saturate at the i64 bounds.
//! Grouping preserves first-seen order so the stable revenue sort breaks ties
//! by insertion order.

use std::collections::HashMap;

use crate::resolve::{JoinIndex, tier_label};
use crate::types::{Agent, Member, TierPriceEntry};

/// Members grouped by tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBreakdownRow {
    pub tier_name: String,
    pub count: i64,
    pub unit_price: i64,
    pub total_revenue: i64,
}

/// Members grouped by referring agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentBreakdownRow {
    pub agent_name: String,
    pub referred_count: i64,
    pub total_revenue: i64,
    pub average_revenue_per_user: i64,
}

/// Floor division that yields 0 instead of faulting on an empty group.
pub fn safe_average(total: i64, count: i64) -> i64 {
    if count > 0 { total.div_euclid(count) } else { 0 }
}

fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

/// Sum of resolved tier prices over all members.
pub fn compute_monthly_revenue(members: &[Member], tier_prices: &[TierPriceEntry]) -> i64 {
    let index = JoinIndex::new(&[], tier_prices);
    saturating_sum(members.iter().map(|m| index.tier_price(m.tier_name.as_deref())))
}

/// Order-preserving group-by: returns the row for `key`, creating it on first sight.
fn group_slot<'r, R>(
    rows: &'r mut Vec<R>,
    positions: &mut HashMap<String, usize>,
    key: &str,
    make: impl FnOnce() -> R,
) -> &'r mut R {
    let idx = *positions.entry(key.to_string()).or_insert_with(|| {
        rows.push(make());
        rows.len() - 1
    });
    &mut rows[idx]
}

pub fn compute_package_breakdown(members: &[Member], tier_prices: &[TierPriceEntry]) -> Vec<PackageBreakdownRow> {
    let index = JoinIndex::new(&[], tier_prices);
    let mut rows: Vec<PackageBreakdownRow> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for member in members {
        let tier = member.tier_name.as_deref();
        let label = tier_label(tier);
        let unit_price = index.tier_price(tier);
        let row = group_slot(&mut rows, &mut positions, label, || PackageBreakdownRow {
            tier_name: label.to_string(),
            count: 0,
            unit_price,
            total_revenue: 0,
        });
        row.count += 1;
    }

    for row in &mut rows {
        row.total_revenue = row.count.saturating_mul(row.unit_price);
    }

    // sort_by is stable: equal revenue keeps first-seen order
    rows.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    rows
}

pub fn compute_agent_breakdown(
    members: &[Member],
    agents: &[Agent],
    tier_prices: &[TierPriceEntry],
) -> Vec<AgentBreakdownRow> {
    let index = JoinIndex::new(agents, tier_prices);
    let mut rows: Vec<AgentBreakdownRow> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for member in members {
        let agent_name = index.agent_name(member.referral_code.as_deref());
        let price = index.tier_price(member.tier_name.as_deref());
        let row = group_slot(&mut rows, &mut positions, agent_name, || AgentBreakdownRow {
            agent_name: agent_name.to_string(),
            referred_count: 0,
            total_revenue: 0,
            average_revenue_per_user: 0,
        });
        row.referred_count += 1;
        row.total_revenue = row.total_revenue.saturating_add(price);
    }

    for row in &mut rows {
        row.average_revenue_per_user = safe_average(row.total_revenue, row.referred_count);
    }

    rows.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    rows
}

/// Month-over-month growth as a percentage of the pre-existing base.
///
/// The base is everything before this month (`all_time - this_month`). With an
/// empty base, any new entries count as 100% growth.
pub fn growth_percent(this_month: i64, all_time: i64) -> f64 {
    let previous = all_time.saturating_sub(this_month);
    if previous > 0 {
        (this_month as f64 / previous as f64 * 1000.0).round() / 10.0
    } else if this_month > 0 {
        100.0
    } else {
        0.0
    }
}

/// Headline revenue figures for the executive summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenueSummary {
    pub all_time: i64,
    pub current_active: i64,
    pub this_month: i64,
    pub last_month: i64,
}

impl RevenueSummary {
    pub fn compute(
        tier_prices: &[TierPriceEntry],
        this_month_members: &[Member],
        last_month_members: &[Member],
    ) -> Self {
        Self {
            all_time: saturating_sum(tier_prices.iter().map(|t| t.total_revenue)),
            current_active: saturating_sum(tier_prices.iter().map(|t| t.current_revenue)),
            this_month: compute_monthly_revenue(this_month_members, tier_prices),
            last_month: compute_monthly_revenue(last_month_members, tier_prices),
        }
    }

    pub fn delta(&self) -> i64 {
        self.this_month.saturating_sub(self.last_month)
    }
}

/// Current revenue per active subscriber for one tier.
pub fn revenue_per_active_user(entry: &TierPriceEntry) -> i64 {
    safe_average(entry.current_revenue, entry.current_active_users)
}
