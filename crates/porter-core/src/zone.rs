//! # Geographic Zone Classifier
//!
//! Maps a postal code to a service zone. Pure function over static zone
//! tables: no I/O, no locking, safe to call concurrently.
//!
//! ## Zones
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  core       Manhattan                     serviceable, no surcharge     │
//! │  surcharge  Brooklyn, Queens, Bronx, SI   serviceable, flat surcharge   │
//! │  (none)     everywhere else               not serviceable               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each booking address is classified independently, so a Manhattan to
//! Brooklyn move carries exactly one surcharge and a Brooklyn to Queens
//! move carries two.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Zone Tables
// =============================================================================

/// Core service area: Manhattan ZIP ranges (inclusive).
const CORE_RANGES: &[(u32, u32)] = &[(10001, 10282)];

/// Surcharge service area ZIP ranges (inclusive).
/// Staten Island, Bronx, western Queens, Brooklyn, eastern Queens.
const SURCHARGE_RANGES: &[(u32, u32)] = &[
    (10301, 10314), // Staten Island
    (10451, 10475), // Bronx
    (11004, 11005), // Glen Oaks
    (11101, 11120), // Long Island City / Astoria
    (11201, 11256), // Brooklyn
    (11351, 11697), // Flushing through the Rockaways
];

// =============================================================================
// Result Type
// =============================================================================

/// Service zone for a classified postal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Core,
    Surcharge,
}

/// Outcome of classifying one postal code.
///
/// `message` carries the human-readable reason when the code is blank,
/// malformed, or outside the service area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ZoneResult {
    pub serviceable: bool,
    pub requires_surcharge: bool,
    pub zone: Option<Zone>,
    pub message: Option<String>,
}

impl ZoneResult {
    fn core() -> Self {
        ZoneResult {
            serviceable: true,
            requires_surcharge: false,
            zone: Some(Zone::Core),
            message: None,
        }
    }

    fn surcharge() -> Self {
        ZoneResult {
            serviceable: true,
            requires_surcharge: true,
            zone: Some(Zone::Surcharge),
            message: None,
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        ZoneResult {
            serviceable: false,
            requires_surcharge: false,
            zone: None,
            message: Some(message.into()),
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Classifies a postal code into a service zone.
///
/// ## Rules
/// - Input is trimmed; a trailing ZIP+4 extension ("-XXXX") is stripped
/// - Blank input is rejected with "postal code required"
/// - Non-5-digit input is rejected as malformed
/// - Unknown but well-formed codes are not serviceable and get a
///   suggestion to request a custom quote
///
/// ## Example
/// ```rust
/// use porter_core::zone::{classify, Zone};
///
/// let midtown = classify("10018-2701");
/// assert!(midtown.serviceable);
/// assert_eq!(midtown.zone, Some(Zone::Core));
///
/// let brooklyn = classify("11215");
/// assert!(brooklyn.requires_surcharge);
///
/// let chicago = classify("60601");
/// assert!(!chicago.serviceable);
/// ```
pub fn classify(postal_code: &str) -> ZoneResult {
    let trimmed = postal_code.trim();
    if trimmed.is_empty() {
        return ZoneResult::rejected("postal code required");
    }

    // ZIP+4 extensions are irrelevant to zone membership
    let base = trimmed.split('-').next().unwrap_or(trimmed);

    if base.len() != 5 || !base.chars().all(|c| c.is_ascii_digit()) {
        return ZoneResult::rejected(format!(
            "'{trimmed}' is not a valid 5-digit ZIP code"
        ));
    }

    // 5 ASCII digits always parse
    let code: u32 = base.parse().unwrap_or(0);

    if in_ranges(code, CORE_RANGES) {
        return ZoneResult::core();
    }
    if in_ranges(code, SURCHARGE_RANGES) {
        return ZoneResult::surcharge();
    }

    ZoneResult::rejected(format!(
        "We don't currently serve {base}. Call us for a custom quote."
    ))
}

#[inline]
fn in_ranges(code: u32, ranges: &[(u32, u32)]) -> bool {
    ranges.iter().any(|&(lo, hi)| code >= lo && code <= hi)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_zone() {
        let result = classify("10001");
        assert!(result.serviceable);
        assert!(!result.requires_surcharge);
        assert_eq!(result.zone, Some(Zone::Core));
        assert_eq!(result.message, None);
    }

    #[test]
    fn test_surcharge_zones() {
        for zip in ["11215", "10455", "11101", "10301", "11694"] {
            let result = classify(zip);
            assert!(result.serviceable, "{zip} should be serviceable");
            assert!(result.requires_surcharge, "{zip} should carry a surcharge");
            assert_eq!(result.zone, Some(Zone::Surcharge));
        }
    }

    #[test]
    fn test_plus_four_extension_stripped() {
        let result = classify("10018-2701");
        assert!(result.serviceable);
        assert_eq!(result.zone, Some(Zone::Core));
    }

    #[test]
    fn test_whitespace_trimmed() {
        let result = classify("  10005  ");
        assert!(result.serviceable);
    }

    #[test]
    fn test_blank_is_required_error() {
        let result = classify("   ");
        assert!(!result.serviceable);
        assert_eq!(result.message.as_deref(), Some("postal code required"));
    }

    #[test]
    fn test_malformed_rejected() {
        for bad in ["1000", "100016", "1O001", "abcde"] {
            let result = classify(bad);
            assert!(!result.serviceable, "{bad} should be rejected");
            assert!(result.zone.is_none());
            assert!(result
                .message
                .as_deref()
                .unwrap()
                .contains("not a valid 5-digit ZIP"));
        }
    }

    #[test]
    fn test_unknown_code_gets_suggestion() {
        let result = classify("60601");
        assert!(!result.serviceable);
        assert!(result.zone.is_none());
        assert!(result
            .message
            .as_deref()
            .unwrap()
            .contains("custom quote"));
    }
}
