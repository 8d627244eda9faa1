//! Directive types: the dated statements of a ledger file.
//!
//! Twelve directive kinds can carry a date:
//!
//! - [`Transaction`] - a transfer between accounts, with postings
//! - [`Balance`] - assert an account's balance, with optional tolerance
//! - [`Open`] / [`Close`] - account lifecycle
//! - [`Commodity`] - declare a currency
//! - [`Pad`] - request automatic padding toward a balance assertion
//! - [`Price`] - record a commodity price observation
//! - [`Event`] - record a named state change
//! - [`Note`] / [`Document`] - annotate an account
//! - [`Query`] - store a named query string
//! - [`Custom`] - user-defined extension directive
//!
//! Undated statements (`option`, `include`, `plugin`, `pushtag`, `poptag`)
//! never appear here; the parser routes them into dedicated collections on
//! its result.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::{Amount, CostSpec, IncompleteAmount, InternedStr};

/// A polymorphic metadata value.
///
/// Metadata values inhabit a small closed set of kinds; which kind was
/// written is preserved exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaValue {
    /// Quoted string.
    String(String),
    /// Account reference.
    Account(String),
    /// Currency code.
    Currency(String),
    /// `#tag` reference (without the hash).
    Tag(String),
    /// `^link` reference (without the caret).
    Link(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Bare number (possibly the result of an arithmetic expression).
    Number(Decimal),
    /// `TRUE` / `FALSE`.
    Bool(bool),
    /// Number with currency.
    Amount(Amount),
    /// Key written with no value.
    None,
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Account(a) => write!(f, "{a}"),
            Self::Currency(c) => write!(f, "{c}"),
            Self::Tag(t) => write!(f, "#{t}"),
            Self::Link(l) => write!(f, "^{l}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::Amount(a) => write!(f, "{a}"),
            Self::None => Ok(()),
        }
    }
}

/// Key-value metadata attached to a directive or posting.
pub type Metadata = HashMap<String, MetaValue>;

/// One leg of a [`Transaction`].
///
/// A posting with `units: None` is an interpolation placeholder: the amount
/// is to be computed by a ledger engine so the transaction balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Optional per-posting flag.
    pub flag: Option<char>,
    /// The account, colon-separated.
    pub account: InternedStr,
    /// The units, possibly with elided components, or `None`.
    pub units: Option<IncompleteAmount>,
    /// Cost annotation, if written.
    pub cost: Option<CostSpec>,
    /// Price annotation (`@` / `@@`), if written.
    pub price: Option<PriceAnnotation>,
    /// Posting-level metadata.
    pub meta: Metadata,
}

impl Posting {
    /// A posting with a complete amount.
    #[must_use]
    pub fn new(account: impl Into<InternedStr>, units: Amount) -> Self {
        Self {
            flag: None,
            account: account.into(),
            units: Some(IncompleteAmount::Complete(units)),
            cost: None,
            price: None,
            meta: Metadata::new(),
        }
    }

    /// A posting with a possibly incomplete amount.
    #[must_use]
    pub fn with_units(account: impl Into<InternedStr>, units: IncompleteAmount) -> Self {
        Self {
            flag: None,
            account: account.into(),
            units: Some(units),
            cost: None,
            price: None,
            meta: Metadata::new(),
        }
    }

    /// An amount-less posting to be interpolated.
    #[must_use]
    pub fn auto(account: impl Into<InternedStr>) -> Self {
        Self {
            flag: None,
            account: account.into(),
            units: None,
            cost: None,
            price: None,
            meta: Metadata::new(),
        }
    }

    /// Attach a cost annotation.
    #[must_use]
    pub fn with_cost(mut self, cost: CostSpec) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Attach a price annotation.
    #[must_use]
    pub fn with_price(mut self, price: PriceAnnotation) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the posting flag.
    #[must_use]
    pub const fn with_flag(mut self, flag: char) -> Self {
        self.flag = Some(flag);
        self
    }

    /// The complete amount, if fully written.
    #[must_use]
    pub fn amount(&self) -> Option<&Amount> {
        self.units.as_ref().and_then(IncompleteAmount::as_amount)
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("  ")?;
        if let Some(flag) = self.flag {
            write!(f, "{flag} ")?;
        }
        write!(f, "{}", self.account)?;
        if let Some(units) = &self.units {
            write!(f, "  {units}")?;
        }
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        if let Some(price) = &self.price {
            write!(f, " {price}")?;
        }
        Ok(())
    }
}

/// A posting's price annotation: `@` is per-unit, `@@` is total.
///
/// Like posting units, the amount may have elided components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAnnotation {
    /// The written amount; `None` when the author wrote a bare `@` / `@@`.
    pub amount: Option<IncompleteAmount>,
    /// `true` for `@@` (total), `false` for `@` (per-unit).
    pub is_total: bool,
}

impl PriceAnnotation {
    /// A per-unit (`@`) annotation with a complete amount.
    #[must_use]
    pub fn unit(amount: Amount) -> Self {
        Self {
            amount: Some(IncompleteAmount::Complete(amount)),
            is_total: false,
        }
    }

    /// A total (`@@`) annotation with a complete amount.
    #[must_use]
    pub fn total(amount: Amount) -> Self {
        Self {
            amount: Some(IncompleteAmount::Complete(amount)),
            is_total: true,
        }
    }

    /// The complete amount, if fully written.
    #[must_use]
    pub fn amount(&self) -> Option<&Amount> {
        self.amount.as_ref().and_then(IncompleteAmount::as_amount)
    }
}

impl fmt::Display for PriceAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_total { "@@" } else { "@" })?;
        if let Some(amount) = &self.amount {
            write!(f, " {amount}")?;
        }
        Ok(())
    }
}

/// Any dated directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Transfer between accounts.
    Transaction(Transaction),
    /// Balance assertion.
    Balance(Balance),
    /// Account opening.
    Open(Open),
    /// Account closing.
    Close(Close),
    /// Commodity declaration.
    Commodity(Commodity),
    /// Automatic padding request.
    Pad(Pad),
    /// Price observation.
    Price(Price),
    /// Named state change.
    Event(Event),
    /// Account note.
    Note(Note),
    /// Document attachment.
    Document(Document),
    /// Stored query.
    Query(Query),
    /// User extension.
    Custom(Custom),
}

impl Directive {
    /// The directive's date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Transaction(d) => d.date,
            Self::Balance(d) => d.date,
            Self::Open(d) => d.date,
            Self::Close(d) => d.date,
            Self::Commodity(d) => d.date,
            Self::Pad(d) => d.date,
            Self::Price(d) => d.date,
            Self::Event(d) => d.date,
            Self::Note(d) => d.date,
            Self::Document(d) => d.date,
            Self::Query(d) => d.date,
            Self::Custom(d) => d.date,
        }
    }

    /// The directive's metadata.
    #[must_use]
    pub const fn meta(&self) -> &Metadata {
        match self {
            Self::Transaction(d) => &d.meta,
            Self::Balance(d) => &d.meta,
            Self::Open(d) => &d.meta,
            Self::Close(d) => &d.meta,
            Self::Commodity(d) => &d.meta,
            Self::Pad(d) => &d.meta,
            Self::Price(d) => &d.meta,
            Self::Event(d) => &d.meta,
            Self::Note(d) => &d.meta,
            Self::Document(d) => &d.meta,
            Self::Query(d) => &d.meta,
            Self::Custom(d) => &d.meta,
        }
    }

    /// Mutable access to the directive's metadata.
    pub fn meta_mut(&mut self) -> &mut Metadata {
        match self {
            Self::Transaction(d) => &mut d.meta,
            Self::Balance(d) => &mut d.meta,
            Self::Open(d) => &mut d.meta,
            Self::Close(d) => &mut d.meta,
            Self::Commodity(d) => &mut d.meta,
            Self::Pad(d) => &mut d.meta,
            Self::Price(d) => &mut d.meta,
            Self::Event(d) => &mut d.meta,
            Self::Note(d) => &mut d.meta,
            Self::Document(d) => &mut d.meta,
            Self::Query(d) => &mut d.meta,
            Self::Custom(d) => &mut d.meta,
        }
    }

    /// The directive kind as a lowercase name.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Transaction(_) => "transaction",
            Self::Balance(_) => "balance",
            Self::Open(_) => "open",
            Self::Close(_) => "close",
            Self::Commodity(_) => "commodity",
            Self::Pad(_) => "pad",
            Self::Price(_) => "price",
            Self::Event(_) => "event",
            Self::Note(_) => "note",
            Self::Document(_) => "document",
            Self::Query(_) => "query",
            Self::Custom(_) => "custom",
        }
    }

    /// The transaction payload, if this is one.
    #[must_use]
    pub const fn as_transaction(&self) -> Option<&Transaction> {
        match self {
            Self::Transaction(t) => Some(t),
            _ => None,
        }
    }
}

/// A transfer between accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction date.
    pub date: NaiveDate,
    /// Status flag (`*`, `!`, ...).
    pub flag: char,
    /// Optional payee (first of two header strings).
    pub payee: Option<String>,
    /// Narration (the only, or second, header string).
    pub narration: String,
    /// Tags, explicit plus inherited from the pushed-tag context.
    pub tags: Vec<String>,
    /// Links.
    pub links: Vec<String>,
    /// Metadata.
    pub meta: Metadata,
    /// Postings, in source order.
    pub postings: Vec<Posting>,
}

impl Transaction {
    /// A `*`-flagged transaction with the given narration.
    #[must_use]
    pub fn new(date: NaiveDate, narration: impl Into<String>) -> Self {
        Self {
            date,
            flag: '*',
            payee: None,
            narration: narration.into(),
            tags: Vec::new(),
            links: Vec::new(),
            meta: Metadata::new(),
            postings: Vec::new(),
        }
    }

    /// Set the flag.
    #[must_use]
    pub const fn with_flag(mut self, flag: char) -> Self {
        self.flag = flag;
        self
    }

    /// Set the payee.
    #[must_use]
    pub fn with_payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = Some(payee.into());
        self
    }

    /// Add a tag, ignoring duplicates.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tag(tag.into());
        self
    }

    /// Add a link.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.links.push(link.into());
        self
    }

    /// Append a posting.
    #[must_use]
    pub fn with_posting(mut self, posting: Posting) -> Self {
        self.postings.push(posting);
        self
    }

    /// Add a tag in place, ignoring duplicates.
    pub fn add_tag(&mut self, tag: String) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.date, self.flag)?;
        if let Some(payee) = &self.payee {
            write!(f, "\"{payee}\" ")?;
        }
        write!(f, "\"{}\"", self.narration)?;
        for tag in &self.tags {
            write!(f, " #{tag}")?;
        }
        for link in &self.links {
            write!(f, " ^{link}")?;
        }
        for posting in &self.postings {
            write!(f, "\n{posting}")?;
        }
        Ok(())
    }
}

/// A balance assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Assertion date.
    pub date: NaiveDate,
    /// Account being asserted.
    pub account: InternedStr,
    /// Expected amount.
    pub amount: Amount,
    /// Explicit tolerance from `~ N`, if written.
    pub tolerance: Option<Decimal>,
    /// Metadata.
    pub meta: Metadata,
}

impl Balance {
    /// A new assertion without explicit tolerance.
    #[must_use]
    pub fn new(date: NaiveDate, account: impl Into<InternedStr>, amount: Amount) -> Self {
        Self {
            date,
            account: account.into(),
            amount,
            tolerance: None,
            meta: Metadata::new(),
        }
    }

    /// Set the explicit tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} balance {} {}", self.date, self.account, self.amount.number)?;
        if let Some(tol) = self.tolerance {
            write!(f, " ~ {tol}")?;
        }
        write!(f, " {}", self.amount.currency)
    }
}

/// An account opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Open {
    /// Opening date.
    pub date: NaiveDate,
    /// Account name.
    pub account: InternedStr,
    /// Constraint currencies; empty means unconstrained.
    pub currencies: Vec<InternedStr>,
    /// Booking method string, if written.
    pub booking: Option<String>,
    /// Metadata.
    pub meta: Metadata,
}

impl Open {
    /// A new opening with no currency constraint.
    #[must_use]
    pub fn new(date: NaiveDate, account: impl Into<InternedStr>) -> Self {
        Self {
            date,
            account: account.into(),
            currencies: Vec::new(),
            booking: None,
            meta: Metadata::new(),
        }
    }

    /// Set the constraint currencies.
    #[must_use]
    pub fn with_currencies(mut self, currencies: Vec<InternedStr>) -> Self {
        self.currencies = currencies;
        self
    }

    /// Set the booking method.
    #[must_use]
    pub fn with_booking(mut self, booking: impl Into<String>) -> Self {
        self.booking = Some(booking.into());
        self
    }
}

impl fmt::Display for Open {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} open {}", self.date, self.account)?;
        if !self.currencies.is_empty() {
            let list: Vec<&str> = self.currencies.iter().map(InternedStr::as_str).collect();
            write!(f, " {}", list.join(","))?;
        }
        if let Some(booking) = &self.booking {
            write!(f, " \"{booking}\"")?;
        }
        Ok(())
    }
}

/// An account closing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Close {
    /// Closing date.
    pub date: NaiveDate,
    /// Account name.
    pub account: InternedStr,
    /// Metadata.
    pub meta: Metadata,
}

impl Close {
    /// A new closing.
    #[must_use]
    pub fn new(date: NaiveDate, account: impl Into<InternedStr>) -> Self {
        Self {
            date,
            account: account.into(),
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Close {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} close {}", self.date, self.account)
    }
}

/// A commodity declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
    /// Declaration date.
    pub date: NaiveDate,
    /// The currency code.
    pub currency: InternedStr,
    /// Metadata.
    pub meta: Metadata,
}

impl Commodity {
    /// A new declaration.
    #[must_use]
    pub fn new(date: NaiveDate, currency: impl Into<InternedStr>) -> Self {
        Self {
            date,
            currency: currency.into(),
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} commodity {}", self.date, self.currency)
    }
}

/// An automatic padding request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pad {
    /// Pad date.
    pub date: NaiveDate,
    /// Account to pad.
    pub account: InternedStr,
    /// Account the padding amount is drawn from.
    pub source_account: InternedStr,
    /// Metadata.
    pub meta: Metadata,
}

impl Pad {
    /// A new pad.
    #[must_use]
    pub fn new(
        date: NaiveDate,
        account: impl Into<InternedStr>,
        source_account: impl Into<InternedStr>,
    ) -> Self {
        Self {
            date,
            account: account.into(),
            source_account: source_account.into(),
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pad {} {}", self.date, self.account, self.source_account)
    }
}

/// A price observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Observation date.
    pub date: NaiveDate,
    /// The commodity being priced.
    pub currency: InternedStr,
    /// Its price in another currency.
    pub amount: Amount,
    /// Metadata.
    pub meta: Metadata,
}

impl Price {
    /// A new observation.
    #[must_use]
    pub fn new(date: NaiveDate, currency: impl Into<InternedStr>, amount: Amount) -> Self {
        Self {
            date,
            currency: currency.into(),
            amount,
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} price {} {}", self.date, self.currency, self.amount)
    }
}

/// A named state change, e.g. `2014-06-01 event "location" "Paris"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event date.
    pub date: NaiveDate,
    /// Event kind (first string).
    pub name: String,
    /// Event value (second string).
    pub value: String,
    /// Metadata.
    pub meta: Metadata,
}

impl Event {
    /// A new event.
    #[must_use]
    pub fn new(date: NaiveDate, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
            value: value.into(),
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} event \"{}\" \"{}\"", self.date, self.name, self.value)
    }
}

/// A free-form note on an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Note date.
    pub date: NaiveDate,
    /// Annotated account.
    pub account: InternedStr,
    /// Note text.
    pub comment: String,
    /// Metadata.
    pub meta: Metadata,
}

impl Note {
    /// A new note.
    #[must_use]
    pub fn new(date: NaiveDate, account: impl Into<InternedStr>, comment: impl Into<String>) -> Self {
        Self {
            date,
            account: account.into(),
            comment: comment.into(),
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} note {} \"{}\"", self.date, self.account, self.comment)
    }
}

/// A document attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Attachment date.
    pub date: NaiveDate,
    /// Annotated account.
    pub account: InternedStr,
    /// Path to the document file.
    pub path: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Links.
    pub links: Vec<String>,
    /// Metadata.
    pub meta: Metadata,
}

impl Document {
    /// A new attachment.
    #[must_use]
    pub fn new(date: NaiveDate, account: impl Into<InternedStr>, path: impl Into<String>) -> Self {
        Self {
            date,
            account: account.into(),
            path: path.into(),
            tags: Vec::new(),
            links: Vec::new(),
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} document {} \"{}\"", self.date, self.account, self.path)
    }
}

/// A stored, named query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Query date.
    pub date: NaiveDate,
    /// Query name.
    pub name: String,
    /// The query string itself.
    pub query: String,
    /// Metadata.
    pub meta: Metadata,
}

impl Query {
    /// A new stored query.
    #[must_use]
    pub fn new(date: NaiveDate, name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
            query: query.into(),
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} query \"{}\" \"{}\"", self.date, self.name, self.query)
    }
}

/// A user-defined extension directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Custom {
    /// Directive date.
    pub date: NaiveDate,
    /// Extension type name.
    pub name: String,
    /// Positional values, each of any metadata kind.
    pub values: Vec<MetaValue>,
    /// Metadata.
    pub meta: Metadata,
}

impl Custom {
    /// A new extension directive with no values.
    #[must_use]
    pub fn new(date: NaiveDate, name: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
            values: Vec::new(),
            meta: Metadata::new(),
        }
    }

    /// Append a positional value.
    #[must_use]
    pub fn with_value(mut self, value: MetaValue) -> Self {
        self.values.push(value);
        self
    }
}

impl fmt::Display for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} custom \"{}\"", self.date, self.name)?;
        for value in &self.values {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn transaction_builders() {
        let txn = Transaction::new(date(2024, 1, 15), "Groceries")
            .with_payee("Corner Store")
            .with_flag('!')
            .with_tag("food")
            .with_tag("food")
            .with_posting(Posting::new("Expenses:Food", Amount::new(dec!(50), "USD")))
            .with_posting(Posting::auto("Assets:Checking"));

        assert_eq!(txn.flag, '!');
        assert_eq!(txn.payee.as_deref(), Some("Corner Store"));
        assert_eq!(txn.tags, vec!["food"]);
        assert_eq!(txn.postings.len(), 2);
        assert!(txn.postings[1].units.is_none());
    }

    #[test]
    fn directive_date_and_kind() {
        let d = Directive::Open(Open::new(date(2024, 1, 1), "Assets:Checking"));
        assert_eq!(d.date(), date(2024, 1, 1));
        assert_eq!(d.kind_name(), "open");
        assert!(d.as_transaction().is_none());
    }

    #[test]
    fn balance_display_with_tolerance() {
        let bal = Balance::new(
            date(2014, 8, 1),
            "Assets:Checking",
            Amount::new(dec!(1234.00), "USD"),
        )
        .with_tolerance(dec!(0.02));
        assert_eq!(
            bal.to_string(),
            "2014-08-01 balance Assets:Checking 1234.00 ~ 0.02 USD"
        );
    }

    #[test]
    fn posting_display() {
        let p = Posting::new("Assets:Cash", Amount::new(dec!(100.00), "USD"))
            .with_price(PriceAnnotation::unit(Amount::new(dec!(1.10), "CAD")));
        assert_eq!(p.to_string(), "  Assets:Cash  100.00 USD @ 1.10 CAD");
    }

    #[test]
    fn meta_value_display() {
        assert_eq!(MetaValue::Tag("trip".into()).to_string(), "#trip");
        assert_eq!(MetaValue::Bool(true).to_string(), "TRUE");
        assert_eq!(MetaValue::None.to_string(), "");
    }
}
