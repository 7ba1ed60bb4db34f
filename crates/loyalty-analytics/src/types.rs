//! Platform entity snapshots and caller-supplied time series.
//!
//! Records arrive as loosely-typed JSON from the admin API, so every field is
//! decoded leniently: a malformed value degrades to its default instead of
//! rejecting the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// ── Credentials ─────────────────────────────────────────────────────────────

/// Bearer credential passed explicitly into the fetcher.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(****)")
    }
}

// ── Roles ───────────────────────────────────────────────────────────────────

/// Account role carried on member records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Member,
    Mentor,
    Admin,
    SuperAdmin,
    Other(String),
}

impl Role {
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "" | "member" | "user" | "customer" => Self::Member,
            "mentor" => Self::Mentor,
            "admin" => Self::Admin,
            "super_admin" | "superadmin" | "super-admin" => Self::SuperAdmin,
            other => Self::Other(other.to_string()),
        }
    }

    /// Admin listings and counts include super-admins.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member => write!(f, "Member"),
            Self::Mentor => write!(f, "Mentor"),
            Self::Admin => write!(f, "Admin"),
            Self::SuperAdmin => write!(f, "Super Admin"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

// ── Entities ────────────────────────────────────────────────────────────────

/// An enrolled platform user (also carries mentors and admins, by role).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default, alias = "_id", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub tier_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub referral_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub coin_balance: i64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Role,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_banned: bool,
}

/// A referral intermediary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(default, alias = "_id", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub referral_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_banned: bool,
}

/// Platform-wide aggregate row for one subscription tier.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPriceEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub tier_name: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub price_in_coins: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub current_active_users: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_purchases: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub current_revenue: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_revenue: i64,
}

// ── Caller-supplied time series ─────────────────────────────────────────────

/// Daily user growth, already windowed upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGrowthPoint {
    pub date: String,
    #[serde(default)]
    pub new_users: i64,
    #[serde(default)]
    pub total_users: i64,
}

/// Daily package revenue, already windowed upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    pub date: String,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub packages_sold: i64,
}

/// The two precomputed series a run reshapes into sheets.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesInputs {
    pub user_growth: Vec<UserGrowthPoint>,
    pub revenue: Vec<RevenuePoint>,
}

// ── Snapshot bundle ─────────────────────────────────────────────────────────

/// Everything fetched for one run.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub members: Vec<Member>,
    pub agents: Vec<Agent>,
    pub tier_prices: Vec<TierPriceEntry>,
}

// ── Lenient field decoders ──────────────────────────────────────────────────

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

fn lenient_role<'de, D: Deserializer<'de>>(d: D) -> Result<Role, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Role::from_str_lossy(&s),
        _ => Role::Member,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => parse_timestamp(&s),
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

/// Parse RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or a bare date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
