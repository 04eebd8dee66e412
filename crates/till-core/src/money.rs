//! # Money Module
//!
//! Provides the `Money` and `TaxRate` types for handling monetary values
//! and percentages exactly.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A REAL column holding 12.35 may read back as 12.349999...             │
//! │  and round to 12.34 on the next receipt.                               │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units + basis points                       │
//! │    100.00 → 10000 paise         5%    → 500 bps                        │
//! │    2.50%  → 250 bps             0.01% → 1 bps                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::{Money, TaxRate};
//!
//! let price: Money = "100.00".parse().unwrap();
//! assert_eq!(price.cents(), 10_000);
//!
//! let rate: TaxRate = "2.5".parse().unwrap();
//! assert_eq!(rate.bps(), 250);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::MAX_TAX_RATE_BPS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (paise, cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: arithmetic stays closed under subtraction
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **No float constructor**: decimals enter through [`FromStr`] only
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_mul_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Calculates tax on this amount, rounding half-up to whole minor units.
    ///
    /// ## Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  HALF-UP ROUNDING, PER LINE                                         │
    /// │                                                                     │
    /// │  tax = round(amount × rate / 100, 2)                                │
    /// │                                                                     │
    /// │  In minor units and basis points:                                   │
    /// │    tax_cents = (amount_cents × bps + 5000) / 10000                  │
    /// │                                                                     │
    /// │  12.50 × 9%  = 1.125  → 1.13                                        │
    /// │  12.49 × 9%  = 1.1241 → 1.12                                        │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// The formula is exact for non-negative amounts, which is the only
    /// domain the tax engine calls it with.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::{Money, TaxRate};
    ///
    /// let subtotal = Money::from_cents(1250);
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(900));
    /// assert_eq!(tax.cents(), 113);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128: amount × 10000 cannot overflow
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering, two fractional digits, no currency symbol.
///
/// Receipts print this verbatim, so the format must never depend on locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    /// Parses `"100"`, `"100.5"`, `"100.50"` or `"-5.50"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let cents = parse_hundredths(digits, "amount")?;
        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 500 bps = 5% (a common CGST slab), 250 bps = 2.5%
///
/// A rate only becomes meaningful after [`crate::validation::validate_tax_rate_bps`];
/// the type itself holds any `u32` so that stored rows always decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// True when the rate lies within 0%..=100%.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 <= MAX_TAX_RATE_BPS
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// Percentage rendering without trailing zeros: `5%`, `2.5%`, `8.25%`.
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        match frac {
            0 => write!(f, "{}%", whole),
            f10 if f10 % 10 == 0 => write!(f, "{}.{}%", whole, f10 / 10),
            _ => write!(f, "{}.{:02}%", whole, frac),
        }
    }
}

impl FromStr for TaxRate {
    type Err = ValidationError;

    /// Parses a percentage such as `"5"`, `"2.5"` or `"8.25%"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_suffix('%').unwrap_or(s).trim_end();
        let bps = parse_hundredths(s, "tax_rate")?;
        if bps > MAX_TAX_RATE_BPS as i64 {
            return Err(ValidationError::OutOfRange {
                field: "tax_rate".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(TaxRate(bps as u32))
    }
}

// =============================================================================
// Decimal Parsing
// =============================================================================

/// Parses an unsigned decimal with at most two fractional digits into
/// hundredths (`"12.5"` → 1250).
fn parse_hundredths(s: &str, field: &str) -> Result<i64, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    if s.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected digits before the decimal point"));
    }
    if frac.len() > 2 {
        return Err(invalid("at most two decimal places are allowed"));
    }
    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected digits after the decimal point"));
    }

    let overflow = || ValidationError::Overflow {
        field: field.to_string(),
    };
    let whole: i64 = whole.parse().map_err(|_| overflow())?;
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| overflow())? * 10,
        _ => frac.parse().map_err(|_| overflow())?,
    };

    whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(overflow)
}

// =============================================================================
// Unit Tests
// =============================================================================
