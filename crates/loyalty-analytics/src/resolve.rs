//! Cross-reference resolution between members, agents and tier prices.
//!
//! Every function here is total: an unresolved reference becomes a sentinel
//! value, never an error.
//!
//! `resolve_agent_name` and `resolve_tier_price` are the reference linear-scan
//! forms. A run resolves through [`JoinIndex`], which must agree with them.

use std::collections::HashMap;

use crate::constants;
use crate::types::{Agent, TierPriceEntry};

/// Treat empty and whitespace-only references as absent.
fn present(reference: Option<&str>) -> Option<&str> {
    reference.filter(|s| !s.trim().is_empty())
}

/// Map a referral code to the referring agent's name (linear scan).
pub fn resolve_agent_name<'a>(referral_code: Option<&str>, agents: &'a [Agent]) -> &'a str {
    let Some(code) = present(referral_code) else {
        return constants::DIRECT_REGISTRATION;
    };
    agents
        .iter()
        .find(|a| a.referral_code.as_deref() == Some(code))
        .map_or(constants::UNKNOWN_EXECUTIVE, |a| a.name.as_str())
}

/// Map a tier name to its unit price in coins (linear scan).
pub fn resolve_tier_price(tier_name: Option<&str>, tier_prices: &[TierPriceEntry]) -> i64 {
    let Some(name) = present(tier_name) else {
        return 0;
    };
    tier_prices
        .iter()
        .find(|t| t.tier_name == name)
        .map_or(0, |t| t.price_in_coins)
}

/// Group label for a member's tier.
pub fn tier_label(tier_name: Option<&str>) -> &str {
    present(tier_name).unwrap_or(constants::NO_PACKAGE)
}

/// Hash-indexed form of the two resolvers, built once per run.
///
/// Duplicate codes or tier names resolve to the first entry in collection
/// order, same as the linear scans above.
pub struct JoinIndex<'a> {
    agents_by_code: HashMap<&'a str, &'a str>,
    prices_by_tier: HashMap<&'a str, i64>,
}

impl<'a> JoinIndex<'a> {
    pub fn new(agents: &'a [Agent], tier_prices: &'a [TierPriceEntry]) -> Self {
        let mut agents_by_code = HashMap::with_capacity(agents.len());
        for agent in agents {
            if let Some(code) = present(agent.referral_code.as_deref()) {
                agents_by_code.entry(code).or_insert(agent.name.as_str());
            }
        }

        let mut prices_by_tier = HashMap::with_capacity(tier_prices.len());
        for entry in tier_prices {
            prices_by_tier
                .entry(entry.tier_name.as_str())
                .or_insert(entry.price_in_coins);
        }

        Self {
            agents_by_code,
            prices_by_tier,
        }
    }

    pub fn agent_name(&self, referral_code: Option<&str>) -> &'a str {
        match present(referral_code) {
            None => constants::DIRECT_REGISTRATION,
            Some(code) => self
                .agents_by_code
                .get(code)
                .copied()
                .unwrap_or(constants::UNKNOWN_EXECUTIVE),
        }
    }

    pub fn tier_price(&self, tier_name: Option<&str>) -> i64 {
        present(tier_name)
            .and_then(|name| self.prices_by_tier.get(name).copied())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str, code: Option<&str>) -> Agent {
        Agent {
            name: name.into(),
            referral_code: code.map(Into::into),
            ..Default::default()
        }
    }

    fn tier(name: &str, price: i64) -> TierPriceEntry {
        TierPriceEntry {
            tier_name: name.into(),
            price_in_coins: price,
            ..Default::default()
        }
    }

    #[test]
    fn missing_code_is_direct_registration() {
        let agents = vec![agent("A1", Some("REF1"))];
        assert_eq!(resolve_agent_name(None, &agents), "Direct Registration");
        assert_eq!(resolve_agent_name(Some(""), &agents), "Direct Registration");
        assert_eq!(resolve_agent_name(Some("  "), &agents), "Direct Registration");
    }

    #[test]
    fn unmatched_code_is_unknown_executive() {
        let agents = vec![agent("A1", Some("REF1"))];
        assert_eq!(resolve_agent_name(Some("REF9"), &agents), "Unknown Executive");
        assert_eq!(resolve_agent_name(Some("REF9"), &[]), "Unknown Executive");
    }

    #[test]
    fn matched_code_returns_agent_name() {
        let agents = vec![agent("A0", None), agent("A1", Some("REF1"))];
        assert_eq!(resolve_agent_name(Some("REF1"), &agents), "A1");
    }

    #[test]
    fn tier_price_fallbacks() {
        let prices = vec![tier("Gold", 500)];
        assert_eq!(resolve_tier_price(None, &prices), 0);
        assert_eq!(resolve_tier_price(Some("Platinum"), &prices), 0);
        assert_eq!(resolve_tier_price(Some("Gold"), &prices), 500);
        assert_eq!(tier_label(None), "No Package");
        assert_eq!(tier_label(Some("Gold")), "Gold");
    }

    #[test]
    fn index_agrees_with_linear_scan_on_duplicates() {
        let agents = vec![agent("First", Some("DUP")), agent("Second", Some("DUP"))];
        let prices = vec![tier("Gold", 500), tier("Gold", 900)];
        let index = JoinIndex::new(&agents, &prices);

        assert_eq!(index.agent_name(Some("DUP")), resolve_agent_name(Some("DUP"), &agents));
        assert_eq!(index.agent_name(Some("DUP")), "First");
        assert_eq!(index.tier_price(Some("Gold")), resolve_tier_price(Some("Gold"), &prices));
        assert_eq!(index.tier_price(Some("Gold")), 500);
        assert_eq!(index.agent_name(None), "Direct Registration");
        assert_eq!(index.agent_name(Some("nope")), "Unknown Executive");
    }
}
