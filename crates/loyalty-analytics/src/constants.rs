//! Sentinel labels, API defaults and sheet names

// =============================================================================
// Join resolution sentinels
// =============================================================================

/// Agent name for members registered without a referral code
pub const DIRECT_REGISTRATION: &str = "Direct Registration";

/// Agent name for referral codes that match no known agent
pub const UNKNOWN_EXECUTIVE: &str = "Unknown Executive";

/// Tier group for members without a package
pub const NO_PACKAGE: &str = "No Package";

/// Placeholder for cells whose source value is missing or malformed
pub const NOT_AVAILABLE: &str = "N/A";

// =============================================================================
// API defaults
// =============================================================================

pub const DEFAULT_MEMBERS_PATH: &str = "/admin/users";
pub const DEFAULT_AGENTS_PATH: &str = "/admin/agents";
pub const DEFAULT_TIER_PRICES_PATH: &str = "/admin/packages/stats";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Report output
// =============================================================================

pub const DEFAULT_FILE_PREFIX: &str = "Platform";
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Generic text shown to the user when a run fails
pub const USER_FACING_FAILURE: &str = "Failed to generate the analytics report. Please try again.";

pub const SHEET_MONTHLY_REPORT: &str = "Monthly Report";
pub const SHEET_EXECUTIVE_SUMMARY: &str = "Executive Summary";
pub const SHEET_PACKAGE_DISTRIBUTION: &str = "Package Distribution";
pub const SHEET_USER_GROWTH: &str = "User Growth";
pub const SHEET_REVENUE_TREND: &str = "Revenue Trend";
