//! Cost specifications: the `{...}` / `{{...}}` lot annotation.
//!
//! A [`CostSpec`] records the attributes the author wrote between braces on
//! a posting. Every field is optional; a ledger engine later matches the
//! spec against inventory lots and fills in what was elided. Single braces
//! carry a per-unit number, double braces a total.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::intern::InternedStr;

/// Lot attributes written in a cost annotation.
///
/// ```
/// use tallybook_core::CostSpec;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// // {500.00 USD, 2014-04-01, "lot-A"}
/// let spec = CostSpec::default()
///     .with_number_per(dec!(500.00))
///     .with_currency("USD")
///     .with_date(NaiveDate::from_ymd_opt(2014, 4, 1).unwrap())
///     .with_label("lot-A");
///
/// assert_eq!(spec.number_per, Some(dec!(500.00)));
/// assert!(spec.number_total.is_none());
/// assert!(!spec.merge);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CostSpec {
    /// Cost per unit, from `{N ...}`.
    pub number_per: Option<Decimal>,
    /// Total cost, from `{{N ...}}`.
    pub number_total: Option<Decimal>,
    /// Cost currency.
    pub currency: Option<InternedStr>,
    /// Acquisition date override.
    pub date: Option<NaiveDate>,
    /// Lot label.
    pub label: Option<String>,
    /// `{*}` marker requesting an average-cost merge.
    pub merge: bool,
}

impl CostSpec {
    /// An empty spec, as produced by `{}`.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the per-unit number.
    #[must_use]
    pub const fn with_number_per(mut self, number: Decimal) -> Self {
        self.number_per = Some(number);
        self
    }

    /// Set the total number.
    #[must_use]
    pub const fn with_number_total(mut self, number: Decimal) -> Self {
        self.number_total = Some(number);
        self
    }

    /// Set the currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<InternedStr>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Set the acquisition date.
    #[must_use]
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the lot label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether no attribute at all was written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.number_per.is_none()
            && self.number_total.is_none()
            && self.currency.is_none()
            && self.date.is_none()
            && self.label.is_none()
            && !self.merge
    }
}

impl fmt::Display for CostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.number_total.is_some() && self.number_per.is_none();
        f.write_str(if total { "{{" } else { "{" })?;

        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if first {
                first = false;
                Ok(())
            } else {
                f.write_str(", ")
            }
        };

        if let Some(n) = self.number_per {
            sep(f)?;
            write!(f, "{n}")?;
            if let Some(c) = &self.currency {
                write!(f, " {c}")?;
            }
        } else if let Some(n) = self.number_total {
            sep(f)?;
            write!(f, "{n}")?;
            if let Some(c) = &self.currency {
                write!(f, " {c}")?;
            }
        } else if let Some(c) = &self.currency {
            sep(f)?;
            write!(f, "{c}")?;
        }
        if let Some(d) = self.date {
            sep(f)?;
            write!(f, "{d}")?;
        }
        if let Some(l) = &self.label {
            sep(f)?;
            write!(f, "\"{l}\"")?;
        }
        if self.merge {
            sep(f)?;
            f.write_str("*")?;
        }

        f.write_str(if total { "}}" } else { "}" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn per_unit_display() {
        let spec = CostSpec::default()
            .with_number_per(dec!(500.00))
            .with_currency("USD")
            .with_label("lot-A");
        assert_eq!(spec.to_string(), "{500.00 USD, \"lot-A\"}");
    }

    #[test]
    fn total_display() {
        let spec = CostSpec::default()
            .with_number_total(dec!(1500.00))
            .with_currency("USD");
        assert_eq!(spec.to_string(), "{{1500.00 USD}}");
    }

    #[test]
    fn empty_display() {
        assert_eq!(CostSpec::empty().to_string(), "{}");
        assert!(CostSpec::empty().is_empty());
    }

    #[test]
    fn merge_marker() {
        let mut spec = CostSpec::empty();
        spec.merge = true;
        assert_eq!(spec.to_string(), "{*}");
        assert!(!spec.is_empty());
    }
}
