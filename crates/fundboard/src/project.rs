//! Core project types for fundboard.
//!
//! A [`Project`] is one fundraising initiative: a stable slug, a display
//! title, the goal and amount raised so far, and the data needed to build
//! its outbound donation link.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// A single fundraising project record.
///
/// Field order matches the persisted JSON layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique, immutable lookup key.
    pub slug: String,

    /// Human-readable title.
    pub title: String,

    /// Fundraising goal.
    #[serde(default, deserialize_with = "lenient_integer")]
    pub target: i64,

    /// Amount raised so far. May exceed `target`.
    #[serde(default, deserialize_with = "lenient_integer")]
    pub raised: i64,

    /// Key into the shared donation link table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donation_key: Option<String>,

    /// Per-project donation URL, preferred over `donation_key` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donation_url: Option<String>,
}

impl Project {
    /// Create a project linked to a shared donation key.
    #[must_use]
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        target: i64,
        raised: i64,
        donation_key: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            target,
            raised,
            donation_key: Some(donation_key.into()),
            donation_url: None,
        }
    }

    /// Progress toward the goal as a whole percentage in `0..=100`.
    #[must_use]
    pub fn percent(&self) -> u8 {
        crate::progress::percent(self.raised, self.target)
    }
}

/// The collection seeded into a fresh data directory.
#[must_use]
pub fn default_projects() -> Vec<Project> {
    vec![
        Project::new(
            "ai-education",
            "Personalized Education with AI",
            50_000,
            18_250,
            "pilots",
        ),
        Project::new(
            "teacher-formation",
            "Teacher Formation & Time Redemption",
            30_000,
            8_200,
            "teachers",
        ),
        Project::new(
            "houses-nicaragua",
            "Houses for Teachers in Nicaragua",
            120_000,
            35_500,
            "houses",
        ),
        Project::new(
            "fifth-century",
            "5th Century Education",
            40_000,
            6_100,
            "fifth",
        ),
    ]
}

/// Parse a user-supplied amount.
///
/// Accepts integers and decimals (truncated toward zero), with surrounding
/// whitespace. Returns `None` for anything else, including empty input,
/// non-finite values and values outside the `i64` range.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    raw.parse::<f64>().ok().and_then(float_to_amount)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_amount(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

/// Deserialize an amount stored as an integer, a decimal, or a numeric string.
fn lenient_integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct AmountVisitor;

    impl Visitor<'_> for AmountVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer, a decimal number, or a numeric string")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
            i64::try_from(value).map_err(|_| E::custom(format!("amount {value} is out of range")))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
            float_to_amount(value)
                .ok_or_else(|| E::custom(format!("amount {value} is out of range")))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
            parse_amount(value).ok_or_else(|| E::custom(format!("invalid amount {value:?}")))
        }

        fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}
