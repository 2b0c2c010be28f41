//! # Order Sequencing
//!
//! Human-readable order identifiers and the pure planning half of every
//! renumbering pass. The database side (salon-ops `OrderSequencer`) fetches
//! rows, calls into here, and writes back what the plan says.
//!
//! ## Identifier Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  {PREFIX}{SEQUENCE}/{YEAR CODE}                         │
//! │                                                                         │
//! │   RNG 0042 / 2526     ← 42nd sales order                                │
//! │   SC  0007 / 2526     ← 7th salon-consumption order                     │
//! │   RNG 81234567 / 2526 ← timestamp fallback (lookup failed)              │
//! │                                                                         │
//! │  PREFIX     RNG = sales, SC = salon consumption                         │
//! │  SEQUENCE   dense per partition, 1-based, zero padded to 4 digits       │
//! │  YEAR CODE  see year_code()                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Partitions
//! Sales and salon-consumption orders are numbered independently. Two
//! partitions interleaved in time never affect each other's sequence:
//! ```text
//!   created_at:  t1    t2    t3    t4    t5    t6    t7
//!   category:    S     S     C     S     C     S     S
//!   number:      RNG1  RNG2  SC1   RNG3  SC2   RNG4  RNG5
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::SALON_CONSUMPTION_CLIENT;

/// Year code used for every order dated 2025 or later.
pub const CURRENT_YEAR_CODE: &str = "2526";

/// Sequence width of a regular identifier.
const SEQUENCE_WIDTH: usize = 4;

/// Digits kept from the epoch-millis timestamp in a fallback identifier.
const FALLBACK_DIGITS: usize = 8;

// =============================================================================
// Order Category
// =============================================================================

/// Which numbering stream an order belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderCategory {
    /// Regular client sale.
    Sales,
    /// Products used internally by the salon.
    SalonConsumption,
}

impl OrderCategory {
    /// Both partitions, in the order passes process them.
    pub const ALL: [OrderCategory; 2] = [OrderCategory::Sales, OrderCategory::SalonConsumption];

    /// Identifier prefix for this partition.
    pub const fn prefix(&self) -> &'static str {
        match self {
            OrderCategory::Sales => "RNG",
            OrderCategory::SalonConsumption => "SC",
        }
    }

    /// Returns true for the salon-consumption partition.
    pub const fn is_salon_consumption(&self) -> bool {
        matches!(self, OrderCategory::SalonConsumption)
    }

    /// Category for a boolean "is this a salon order" flag.
    pub const fn from_salon_flag(is_salon: bool) -> Self {
        if is_salon {
            OrderCategory::SalonConsumption
        } else {
            OrderCategory::Sales
        }
    }

    /// Stored column value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderCategory::Sales => "sales",
            OrderCategory::SalonConsumption => "salon_consumption",
        }
    }
}

impl fmt::Display for OrderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Legacy Classification
// =============================================================================

/// The heuristic fields older orders were classified by.
///
/// New orders store an explicit [`OrderCategory`]; this only classifies rows
/// written before that column existed, and drives the one-time backfill.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyOrderFlags<'a> {
    pub is_salon_consumption: bool,
    pub order_type: Option<&'a str>,
    pub consumption_purpose: Option<&'a str>,
    pub client_name: &'a str,
}

/// Classifies an order from its legacy heuristic fields.
///
/// ## Rules (any match means salon consumption)
/// - explicit `is_salon_consumption` flag
/// - `type` is `salon_consumption` or `salon-consumption`
/// - a non-blank consumption purpose
/// - client name exactly equals [`SALON_CONSUMPTION_CLIENT`]
pub fn classify_legacy(flags: &LegacyOrderFlags<'_>) -> OrderCategory {
    let typed_as_salon = matches!(
        flags.order_type,
        Some("salon_consumption") | Some("salon-consumption")
    );
    let has_purpose = flags
        .consumption_purpose
        .map(|p| !p.trim().is_empty())
        .unwrap_or(false);

    OrderCategory::from_salon_flag(
        flags.is_salon_consumption
            || typed_as_salon
            || has_purpose
            || flags.client_name == SALON_CONSUMPTION_CLIENT,
    )
}

// =============================================================================
// Year Code
// =============================================================================

/// Derives the year code printed after the slash.
///
/// Every date in 2025 or later maps to [`CURRENT_YEAR_CODE`]. Earlier years
/// print their last two digits followed by the century: 2024 → `"2420"`.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use salon_core::sequence::year_code;
///
/// assert_eq!(year_code(&Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap()), "2526");
/// assert_eq!(year_code(&Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap()), "2420");
/// ```
pub fn year_code(date: &impl Datelike) -> String {
    year_code_for(date.year())
}

/// [`year_code`] for a bare calendar year.
pub fn year_code_for(year: i32) -> String {
    if year >= 2025 {
        CURRENT_YEAR_CODE.to_string()
    } else {
        format!("{:02}{}", year.rem_euclid(100), year.div_euclid(100))
    }
}

// =============================================================================
// Order Number
// =============================================================================

/// A parsed or freshly assigned order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderNumber {
    pub category: OrderCategory,
    pub sequence: u64,
    pub year_code: String,
}

impl OrderNumber {
    /// Builds the number for `sequence` in `category`, dated `date`.
    pub fn new(category: OrderCategory, sequence: u64, date: &impl Datelike) -> Self {
        OrderNumber {
            category,
            sequence,
            year_code: year_code(date),
        }
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}/{}",
            self.category.prefix(),
            self.sequence,
            self.year_code,
            width = SEQUENCE_WIDTH
        )
    }
}

impl FromStr for OrderNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, rest) = if let Some(rest) = s.strip_prefix("RNG") {
            (OrderCategory::Sales, rest)
        } else if let Some(rest) = s.strip_prefix("SC") {
            (OrderCategory::SalonConsumption, rest)
        } else {
            return Err(CoreError::invalid_order_number(s, "unknown prefix"));
        };

        let (digits, year_code) = rest
            .split_once('/')
            .ok_or_else(|| CoreError::invalid_order_number(s, "missing year code"))?;

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::invalid_order_number(s, "sequence must be numeric"));
        }
        if year_code.len() != 4 || !year_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::invalid_order_number(s, "year code must be 4 digits"));
        }

        let sequence = digits
            .parse::<u64>()
            .map_err(|e| CoreError::invalid_order_number(s, e.to_string()))?;

        Ok(OrderNumber {
            category,
            sequence,
            year_code: year_code.to_string(),
        })
    }
}

/// Builds the timestamp-derived identifier used when the count lookup fails.
///
/// Keeps the last eight digits of the epoch milliseconds, so the result is
/// unique enough for a single salon but outside the dense sequence. The
/// repair pass finds these later via [`is_fallback_id`].
pub fn fallback_order_id(category: OrderCategory, now: DateTime<Utc>) -> String {
    let modulus = 10_i64.pow(FALLBACK_DIGITS as u32);
    let stamp = now.timestamp_millis().rem_euclid(modulus);
    format!(
        "{}{:0width$}/{}",
        category.prefix(),
        stamp,
        year_code(&now),
        width = FALLBACK_DIGITS
    )
}

/// Returns true if `id` looks like a timestamp fallback identifier.
pub fn is_fallback_id(id: &str) -> bool {
    let rest = id
        .strip_prefix("RNG")
        .or_else(|| id.strip_prefix("SC"))
        .unwrap_or("");
    match rest.split_once('/') {
        Some((digits, _)) => {
            digits.len() >= FALLBACK_DIGITS && digits.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Returns true if a stored identifier needs repair: absent, unparseable,
/// fallback-shaped, or carrying the wrong partition prefix.
pub fn needs_repair(id: Option<&str>, category: OrderCategory) -> bool {
    match id {
        None => true,
        Some(id) if is_fallback_id(id) => true,
        Some(id) => match id.parse::<OrderNumber>() {
            Ok(number) => number.category != category,
            Err(_) => true,
        },
    }
}

// =============================================================================
// Renumbering Plans
// =============================================================================

/// The minimal view of an order a renumbering plan needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedOrder {
    pub id: String,
    pub category: OrderCategory,
    pub created_at: DateTime<Utc>,
}

/// One identifier to write back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberAssignment {
    /// Row id of the order.
    pub order_id: String,
    pub number: OrderNumber,
}

/// Sorts orders by creation time, ties broken by id.
fn sort_by_creation(orders: &mut [&SequencedOrder]) {
    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// Plans a dense renumbering of one partition.
///
/// Orders outside `category` are ignored. The year code of each number
/// comes from the order's own creation date.
pub fn plan_partition(orders: &[SequencedOrder], category: OrderCategory) -> Vec<NumberAssignment> {
    plan_from(orders, category, 1)
}

/// Plans a dense renumbering of both partitions.
pub fn plan_bulk_renumber(orders: &[SequencedOrder]) -> Vec<NumberAssignment> {
    OrderCategory::ALL
        .iter()
        .flat_map(|category| plan_partition(orders, *category))
        .collect()
}

/// Plans the renumbering that follows a deletion.
///
/// `preceding` is the number of same-partition orders created strictly
/// before the deleted one; `subsequent` holds the orders created at or after
/// it. Only the subsequent orders are renumbered, starting at
/// `preceding + 1`.
pub fn plan_after_deletion(
    deleted: &SequencedOrder,
    preceding: u64,
    subsequent: &[SequencedOrder],
) -> Vec<NumberAssignment> {
    let remaining: Vec<SequencedOrder> = subsequent
        .iter()
        .filter(|o| o.id != deleted.id && o.created_at >= deleted.created_at)
        .cloned()
        .collect();
    plan_from(&remaining, deleted.category, preceding + 1)
}

fn plan_from(orders: &[SequencedOrder], category: OrderCategory, start: u64) -> Vec<NumberAssignment> {
    let mut partition: Vec<&SequencedOrder> =
        orders.iter().filter(|o| o.category == category).collect();
    sort_by_creation(&mut partition);

    partition
        .into_iter()
        .zip(start..)
        .map(|(order, sequence)| NumberAssignment {
            order_id: order.id.clone(),
            number: OrderNumber::new(category, sequence, &order.created_at),
        })
        .collect()
}

/// The identifier a brand-new order receives, given how many orders the
/// partition already holds.
pub fn next_order_number(category: OrderCategory, existing: u64, now: DateTime<Utc>) -> OrderNumber {
    OrderNumber::new(category, existing + 1, &now)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn order(id: &str, category: OrderCategory, minute: i64) -> SequencedOrder {
        SequencedOrder {
            id: id.to_string(),
            category,
            created_at: at(minute),
        }
    }

    #[test]
    fn test_year_code() {
        assert_eq!(year_code_for(2025), "2526");
        assert_eq!(year_code_for(2031), "2526");
        assert_eq!(year_code_for(2024), "2420");
        assert_eq!(year_code_for(2005), "0520");
        assert_eq!(year_code_for(1999), "9919");
    }

    #[test]
    fn test_order_number_display_and_parse() {
        let number = OrderNumber::new(OrderCategory::Sales, 7, &at(0));
        assert_eq!(number.to_string(), "RNG0007/2526");

        let parsed: OrderNumber = "SC0012/2420".parse().unwrap();
        assert_eq!(parsed.category, OrderCategory::SalonConsumption);
        assert_eq!(parsed.sequence, 12);
        assert_eq!(parsed.year_code, "2420");

        // Sequences past 9999 widen instead of wrapping
        let big = OrderNumber::new(OrderCategory::Sales, 12345, &at(0));
        assert_eq!(big.to_string(), "RNG12345/2526");
    }

    #[test]
    fn test_order_number_rejects_garbage() {
        assert!("INV0001/2526".parse::<OrderNumber>().is_err());
        assert!("RNG0001".parse::<OrderNumber>().is_err());
        assert!("RNGabc/2526".parse::<OrderNumber>().is_err());
        assert!("RNG0001/25".parse::<OrderNumber>().is_err());
    }

    #[test]
    fn test_classify_legacy() {
        let base = LegacyOrderFlags {
            client_name: "Priya",
            ..Default::default()
        };
        assert_eq!(classify_legacy(&base), OrderCategory::Sales);

        let flagged = LegacyOrderFlags {
            is_salon_consumption: true,
            ..base
        };
        assert_eq!(classify_legacy(&flagged), OrderCategory::SalonConsumption);

        for t in ["salon_consumption", "salon-consumption"] {
            let typed = LegacyOrderFlags {
                order_type: Some(t),
                ..base
            };
            assert_eq!(classify_legacy(&typed), OrderCategory::SalonConsumption);
        }

        let sale_type = LegacyOrderFlags {
            order_type: Some("sale"),
            ..base
        };
        assert_eq!(classify_legacy(&sale_type), OrderCategory::Sales);

        let purpose = LegacyOrderFlags {
            consumption_purpose: Some("Hair spa stock"),
            ..base
        };
        assert_eq!(classify_legacy(&purpose), OrderCategory::SalonConsumption);

        let blank_purpose = LegacyOrderFlags {
            consumption_purpose: Some("  "),
            ..base
        };
        assert_eq!(classify_legacy(&blank_purpose), OrderCategory::Sales);

        let sentinel = LegacyOrderFlags {
            client_name: "Salon Consumption",
            ..Default::default()
        };
        assert_eq!(classify_legacy(&sentinel), OrderCategory::SalonConsumption);
    }

    #[test]
    fn test_bulk_plan_interleaved_partitions() {
        // 5 sales and 2 consumption orders, interleaved in time
        let orders = vec![
            order("c1", OrderCategory::SalonConsumption, 3),
            order("s1", OrderCategory::Sales, 1),
            order("s2", OrderCategory::Sales, 2),
            order("s3", OrderCategory::Sales, 4),
            order("c2", OrderCategory::SalonConsumption, 5),
            order("s4", OrderCategory::Sales, 6),
            order("s5", OrderCategory::Sales, 7),
        ];

        let plan = plan_bulk_renumber(&orders);
        let labels: Vec<(String, String)> = plan
            .iter()
            .map(|a| (a.order_id.clone(), a.number.to_string()))
            .collect();

        assert_eq!(
            labels,
            vec![
                ("s1".to_string(), "RNG0001/2526".to_string()),
                ("s2".to_string(), "RNG0002/2526".to_string()),
                ("s3".to_string(), "RNG0003/2526".to_string()),
                ("s4".to_string(), "RNG0004/2526".to_string()),
                ("s5".to_string(), "RNG0005/2526".to_string()),
                ("c1".to_string(), "SC0001/2526".to_string()),
                ("c2".to_string(), "SC0002/2526".to_string()),
            ]
        );
    }

    #[test]
    fn test_plan_ties_break_by_id() {
        let orders = vec![
            order("b", OrderCategory::Sales, 0),
            order("a", OrderCategory::Sales, 0),
        ];
        let plan = plan_partition(&orders, OrderCategory::Sales);
        assert_eq!(plan[0].order_id, "a");
        assert_eq!(plan[1].order_id, "b");
    }

    #[test]
    fn test_plan_after_deletion_shifts_only_later_orders() {
        let deleted = order("s3", OrderCategory::Sales, 3);
        let subsequent = vec![
            order("s4", OrderCategory::Sales, 4),
            order("c1", OrderCategory::SalonConsumption, 4),
            order("s5", OrderCategory::Sales, 5),
        ];

        let plan = plan_after_deletion(&deleted, 2, &subsequent);
        let labels: Vec<String> = plan.iter().map(|a| a.number.to_string()).collect();
        assert_eq!(labels, vec!["RNG0003/2526", "RNG0004/2526"]);
        assert_eq!(plan[0].order_id, "s4");
    }

    #[test]
    fn test_plan_after_deletion_ignores_deleted_row_if_still_listed() {
        let deleted = order("s1", OrderCategory::Sales, 1);
        let subsequent = vec![deleted.clone(), order("s2", OrderCategory::Sales, 2)];

        let plan = plan_after_deletion(&deleted, 0, &subsequent);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].number.to_string(), "RNG0001/2526");
    }

    #[test]
    fn test_year_code_follows_each_order() {
        let old = SequencedOrder {
            id: "old".to_string(),
            category: OrderCategory::Sales,
            created_at: Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap(),
        };
        let new = order("new", OrderCategory::Sales, 0);
        let plan = plan_partition(&[new, old], OrderCategory::Sales);
        assert_eq!(plan[0].number.to_string(), "RNG0001/2420");
        assert_eq!(plan[1].number.to_string(), "RNG0002/2526");
    }

    #[test]
    fn test_fallback_ids() {
        let now = Utc.timestamp_millis_opt(1_751_234_567_890).unwrap();
        let id = fallback_order_id(OrderCategory::Sales, now);
        assert_eq!(id, "RNG34567890/2526");
        assert!(is_fallback_id(&id));

        assert!(!is_fallback_id("RNG0004/2526"));
        assert!(!is_fallback_id("RNG12345/2526"));
        assert!(is_fallback_id("SC00000123/2526"));
    }

    #[test]
    fn test_needs_repair() {
        assert!(needs_repair(None, OrderCategory::Sales));
        assert!(needs_repair(Some("RNG34567890/2526"), OrderCategory::Sales));
        assert!(needs_repair(Some("legacy-17"), OrderCategory::Sales));
        assert!(needs_repair(Some("SC0001/2526"), OrderCategory::Sales));
        assert!(!needs_repair(Some("RNG0001/2526"), OrderCategory::Sales));
    }

    #[test]
    fn test_next_order_number() {
        let next = next_order_number(OrderCategory::SalonConsumption, 0, at(0));
        assert_eq!(next.to_string(), "SC0001/2526");

        let next = next_order_number(OrderCategory::Sales, 41, at(0));
        assert_eq!(next.to_string(), "RNG0042/2526");
    }
}
