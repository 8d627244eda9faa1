//! Core types for tallybook
//!
//! This crate provides the typed AST shared by the parser and every
//! downstream consumer:
//!
//! - [`Amount`] - A decimal number with a currency
//! - [`IncompleteAmount`] - An amount with elided components, pre-interpolation
//! - [`CostSpec`] - The `{...}` / `{{...}}` lot annotation on a posting
//! - [`Directive`] - All dated directive types (Transaction, Balance, Open, ...)
//! - [`MetaValue`] / [`Metadata`] - Polymorphic `key: value` metadata
//! - [`Options`] - The typed `option` table collected during a parse
//!
//! # Example
//!
//! ```
//! use tallybook_core::{Amount, Posting, Transaction};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let txn = Transaction::new(
//!     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!     "Lamb tagine",
//! )
//! .with_payee("Cafe Mogador")
//! .with_posting(Posting::new(
//!     "Liabilities:CreditCard",
//!     Amount::new(dec!(-37.45), "USD"),
//! ))
//! .with_posting(Posting::auto("Expenses:Restaurant"));
//!
//! assert_eq!(txn.postings.len(), 2);
//! assert!(txn.postings[1].units.is_none());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod cost;
pub mod directive;
pub mod format;
pub mod intern;
pub mod options;

pub use amount::{Amount, IncompleteAmount};
pub use cost::CostSpec;
pub use directive::{
    Balance, Close, Commodity, Custom, Directive, Document, Event, MetaValue, Metadata, Note, Open,
    Pad, Posting, Price, PriceAnnotation, Query, Transaction,
};
pub use format::{render_directive, RenderConfig};
pub use intern::{InternedStr, Interner};
pub use options::{OptionWarning, Options};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
