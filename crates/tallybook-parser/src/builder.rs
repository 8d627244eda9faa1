//! The builder interface: construction callbacks invoked on each reduction.
//!
//! The grammar engine never assembles directives itself. Every production
//! calls the correspondingly named method on a [`Builder`] with the
//! already-reduced children and an explicit source location, and receives a
//! typed node back. A method may refuse with a [`BuildError`]; the engine
//! then abandons that reduction, records the failure, and recovers at the
//! next end of line. Control never unwinds through the engine.
//!
//! [`LedgerBuilder`] is the reference implementation: it constructs the
//! `tallybook-core` tree, owns the error accumulator and the pushed-tag
//! context, applies options into the typed table, and hands everything
//! back through [`LedgerBuilder::finalize`]. Embedders wanting a different
//! sink (statistics, syntax highlighting, a streaming consumer) implement
//! [`Builder`] themselves and drive [`run_parser`](crate::run_parser).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

use tallybook_core::{
    Amount, CostSpec, Directive, IncompleteAmount, Interner, Metadata, MetaValue, Options, Posting,
    PriceAnnotation, Transaction,
};

use crate::error::{ParseError, ParseErrorKind};
use crate::location::{SourceLoc, Span, Spanned};
use crate::ParseResult;

/// A builder method's refusal. Carries only a message; the engine supplies
/// the location and span when it wraps this into a [`ParseError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError {
    /// What the builder objected to.
    pub message: String,
}

impl BuildError {
    /// Create a new refusal.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BuildError {}

/// Accumulator for a transaction header: the strings, tags and links that
/// may appear after the flag in any order.
#[derive(Debug, Clone, Default)]
pub struct TxnFields {
    /// Quoted strings; the first two become payee/narration.
    pub strings: Vec<String>,
    /// `#tag` references, hash stripped.
    pub tags: Vec<String>,
    /// `^link` references, caret stripped.
    pub links: Vec<String>,
}

/// A compound amount inside a cost annotation: `number [# number] currency`,
/// any part elidable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundAmount {
    /// Per-unit number, before the `#`.
    pub number_per: Option<Decimal>,
    /// Total number, after the `#`.
    pub number_total: Option<Decimal>,
    /// The cost currency.
    pub currency: Option<String>,
}

/// One component of a cost annotation's comma-separated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostComp {
    /// A compound amount.
    Amount(CompoundAmount),
    /// A lot date.
    Date(NaiveDate),
    /// A quoted lot label.
    Label(String),
    /// The `*` merge marker.
    Merge,
}

/// The stack of tags pushed by `pushtag` and not yet popped.
///
/// One context exists per parse; transactions reduced while tags are active
/// inherit them. `poptag` removes the most recent matching entry.
#[derive(Debug, Clone, Default)]
pub struct TagContext {
    stack: Vec<String>,
}

impl TagContext {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a tag.
    pub fn push(&mut self, tag: &str) {
        self.stack.push(tag.to_string());
    }

    /// Pop the most recent occurrence of `tag`. Returns `false` if the tag
    /// was never pushed.
    pub fn pop(&mut self, tag: &str) -> bool {
        match self.stack.iter().rposition(|t| t == tag) {
            Some(i) => {
                self.stack.remove(i);
                true
            }
            None => false,
        }
    }

    /// The currently active tags, oldest first.
    #[must_use]
    pub fn active(&self) -> &[String] {
        &self.stack
    }

    /// Whether no tags are pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// The construction callbacks the grammar invokes on each reduction.
///
/// Method names and argument positions follow the grammar productions and
/// are part of the stable boundary between the parser and its embedder.
/// Every method is pure with respect to grammar state: the only observable
/// state a builder mutates is its directive list, error list, option /
/// include / plugin collections, and tag context. Invocations are strictly
/// sequential.
#[allow(clippy::too_many_arguments)]
pub trait Builder {
    /// Reduce `number_expr CURRENCY` to an amount.
    fn amount(&mut self, loc: &SourceLoc, number: Decimal, currency: &str)
        -> Result<Amount, BuildError>;

    /// Reduce a compound amount inside a cost annotation.
    fn compound_amount(
        &mut self,
        loc: &SourceLoc,
        number_per: Option<Decimal>,
        number_total: Option<Decimal>,
        currency: Option<&str>,
    ) -> Result<CompoundAmount, BuildError>;

    /// Assemble a cost spec from its component list. When a component kind
    /// repeats, the last write wins and a warning-class record is emitted.
    fn cost_spec(
        &mut self,
        loc: &SourceLoc,
        span: Span,
        comps: Vec<CostComp>,
        is_total: bool,
    ) -> Result<CostSpec, BuildError>;

    /// Reduce a `key: value` metadata entry.
    fn key_value(
        &mut self,
        loc: &SourceLoc,
        key: &str,
        value: MetaValue,
    ) -> Result<(String, MetaValue), BuildError>;

    /// Start a fresh transaction-header accumulator.
    fn txn_fields_new(&mut self) -> TxnFields {
        TxnFields::default()
    }

    /// Add a header string (payee or narration).
    fn txn_field_string(
        &mut self,
        loc: &SourceLoc,
        fields: &mut TxnFields,
        value: String,
    ) -> Result<(), BuildError>;

    /// Add a header tag.
    fn txn_field_tag(
        &mut self,
        loc: &SourceLoc,
        fields: &mut TxnFields,
        tag: &str,
    ) -> Result<(), BuildError>;

    /// Add a header link.
    fn txn_field_link(
        &mut self,
        loc: &SourceLoc,
        fields: &mut TxnFields,
        link: &str,
    ) -> Result<(), BuildError>;

    /// Reduce one posting line.
    fn posting(
        &mut self,
        loc: &SourceLoc,
        flag: Option<char>,
        account: &str,
        units: Option<IncompleteAmount>,
        cost: Option<CostSpec>,
        price: Option<PriceAnnotation>,
    ) -> Result<Posting, BuildError>;

    /// Reduce a whole transaction. Tags active in the tag context are
    /// merged into the result here.
    fn transaction(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        flag: char,
        fields: TxnFields,
        postings: Vec<Posting>,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Reduce a balance assertion.
    fn balance(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        amount: Amount,
        tolerance: Option<Decimal>,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Reduce an account opening.
    fn open(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        currencies: Vec<String>,
        booking: Option<String>,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Reduce an account closing.
    fn close(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Reduce a commodity declaration.
    fn commodity(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        currency: &str,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Reduce a pad directive.
    fn pad(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        source_account: &str,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Reduce a price observation.
    fn price(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        currency: &str,
        amount: Amount,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Reduce an event directive.
    fn event(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        name: String,
        value: String,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Reduce a note directive.
    fn note(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        comment: String,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Reduce a document directive.
    fn document(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        path: String,
        tags: Vec<String>,
        links: Vec<String>,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Reduce a stored query.
    fn query(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        name: String,
        query: String,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Reduce a custom directive.
    fn custom(
        &mut self,
        loc: &SourceLoc,
        date: NaiveDate,
        name: String,
        values: Vec<MetaValue>,
        meta: Metadata,
    ) -> Result<Directive, BuildError>;

    /// Record an `option` directive. Validation problems become
    /// warning-class records, never failures.
    fn option(
        &mut self,
        loc: &SourceLoc,
        span: Span,
        name: &str,
        value: &str,
    ) -> Result<(), BuildError>;

    /// Record an `include` directive. The path is never resolved here.
    fn include(&mut self, loc: &SourceLoc, span: Span, filename: String)
        -> Result<(), BuildError>;

    /// Record a `plugin` directive.
    fn plugin(
        &mut self,
        loc: &SourceLoc,
        span: Span,
        name: String,
        config: Option<String>,
    ) -> Result<(), BuildError>;

    /// Push a tag onto the tag context.
    fn pushtag(&mut self, loc: &SourceLoc, tag: &str) -> Result<(), BuildError>;

    /// Pop a tag from the tag context. Popping an absent tag is a failure.
    fn poptag(&mut self, loc: &SourceLoc, tag: &str) -> Result<(), BuildError>;

    /// Append an error record. Called by the engine for lexer and grammar
    /// errors and for wrapped builder failures.
    fn error(&mut self, err: ParseError);

    /// Terminal callback: receive the completed directive list.
    fn store_result(&mut self, directives: Vec<Spanned<Directive>>);
}

/// The reference [`Builder`]: constructs the typed tree.
#[derive(Debug)]
pub struct LedgerBuilder {
    interner: Interner,
    directives: Vec<Spanned<Directive>>,
    errors: Vec<ParseError>,
    options: Options,
    includes: Vec<(String, Span)>,
    plugins: Vec<(String, Option<String>, Span)>,
    tags: TagContext,
}

impl LedgerBuilder {
    /// A fresh builder for the named source file.
    #[must_use]
    pub fn new(filename: &str) -> Self {
        let mut options = Options::new();
        options.filename = Some(filename.to_string());
        Self {
            interner: Interner::new(),
            directives: Vec::new(),
            errors: Vec::new(),
            options,
            includes: Vec::new(),
            plugins: Vec::new(),
            tags: TagContext::new(),
        }
    }

    /// The tags currently pushed, for inspection in tests and tools.
    #[must_use]
    pub fn tag_context(&self) -> &TagContext {
        &self.tags
    }

    /// Consume the builder into the final [`ParseResult`].
    #[must_use]
    pub fn finalize(self, incomplete: bool) -> ParseResult {
        ParseResult {
            directives: self.directives,
            options: self.options,
            includes: self.includes,
            plugins: self.plugins,
            errors: self.errors,
            incomplete,
        }
    }
}

impl Builder for LedgerBuilder {
    fn amount(
        &mut self,
        _loc: &SourceLoc,
        number: Decimal,
        currency: &str,
    ) -> Result<Amount, BuildError> {
        Ok(Amount::new(number, self.interner.intern(currency)))
    }

    fn compound_amount(
        &mut self,
        _loc: &SourceLoc,
        number_per: Option<Decimal>,
        number_total: Option<Decimal>,
        currency: Option<&str>,
    ) -> Result<CompoundAmount, BuildError> {
        Ok(CompoundAmount {
            number_per,
            number_total,
            currency: currency.map(str::to_string),
        })
    }

    fn cost_spec(
        &mut self,
        loc: &SourceLoc,
        span: Span,
        comps: Vec<CostComp>,
        is_total: bool,
    ) -> Result<CostSpec, BuildError> {
        let mut spec = CostSpec::default();
        let mut dup = |errors: &mut Vec<ParseError>, what: &str| {
            errors.push(ParseError::new(
                ParseErrorKind::DuplicateCostComponent(what.to_string()),
                loc.clone(),
                span,
            ));
        };

        for comp in comps {
            match comp {
                CostComp::Amount(ca) => {
                    // Inside {{...}} a plain number is a total.
                    let (per, total) = if is_total && ca.number_total.is_none() {
                        (None, ca.number_per)
                    } else {
                        (ca.number_per, ca.number_total)
                    };
                    if let Some(n) = per {
                        if spec.number_per.is_some() {
                            dup(&mut self.errors, "per-unit number");
                        }
                        spec.number_per = Some(n);
                    }
                    if let Some(n) = total {
                        if spec.number_total.is_some() {
                            dup(&mut self.errors, "total number");
                        }
                        spec.number_total = Some(n);
                    }
                    if let Some(c) = ca.currency {
                        if spec.currency.is_some() {
                            dup(&mut self.errors, "currency");
                        }
                        spec.currency = Some(self.interner.intern(&c));
                    }
                }
                CostComp::Date(d) => {
                    if spec.date.is_some() {
                        dup(&mut self.errors, "date");
                    }
                    spec.date = Some(d);
                }
                CostComp::Label(l) => {
                    if spec.label.is_some() {
                        dup(&mut self.errors, "label");
                    }
                    spec.label = Some(l);
                }
                CostComp::Merge => {
                    spec.merge = true;
                }
            }
        }
        Ok(spec)
    }

    fn key_value(
        &mut self,
        _loc: &SourceLoc,
        key: &str,
        value: MetaValue,
    ) -> Result<(String, MetaValue), BuildError> {
        Ok((key.to_string(), value))
    }

    fn txn_field_string(
        &mut self,
        _loc: &SourceLoc,
        fields: &mut TxnFields,
        value: String,
    ) -> Result<(), BuildError> {
        if fields.strings.len() >= 2 {
            return Err(BuildError::new(
                "too many strings in transaction description",
            ));
        }
        fields.strings.push(value);
        Ok(())
    }

    fn txn_field_tag(
        &mut self,
        _loc: &SourceLoc,
        fields: &mut TxnFields,
        tag: &str,
    ) -> Result<(), BuildError> {
        fields.tags.push(tag.to_string());
        Ok(())
    }

    fn txn_field_link(
        &mut self,
        _loc: &SourceLoc,
        fields: &mut TxnFields,
        link: &str,
    ) -> Result<(), BuildError> {
        fields.links.push(link.to_string());
        Ok(())
    }

    fn posting(
        &mut self,
        _loc: &SourceLoc,
        flag: Option<char>,
        account: &str,
        units: Option<IncompleteAmount>,
        cost: Option<CostSpec>,
        price: Option<PriceAnnotation>,
    ) -> Result<Posting, BuildError> {
        Ok(Posting {
            flag,
            account: self.interner.intern(account),
            units,
            cost,
            price,
            meta: Metadata::new(),
        })
    }

    fn transaction(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        flag: char,
        fields: TxnFields,
        postings: Vec<Posting>,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        let mut strings = fields.strings.into_iter();
        let (payee, narration) = match (strings.next(), strings.next()) {
            (Some(first), Some(second)) => (Some(first), second),
            (Some(only), None) => (None, only),
            _ => (None, String::new()),
        };

        let mut txn = Transaction {
            date,
            flag,
            payee,
            narration,
            tags: Vec::new(),
            links: fields.links,
            meta,
            postings,
        };
        for tag in fields.tags {
            txn.add_tag(tag);
        }
        for tag in self.tags.active() {
            if !txn.tags.contains(tag) {
                txn.tags.push(tag.clone());
            }
        }
        Ok(Directive::Transaction(txn))
    }

    fn balance(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        amount: Amount,
        tolerance: Option<Decimal>,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        Ok(Directive::Balance(tallybook_core::Balance {
            date,
            account: self.interner.intern(account),
            amount,
            tolerance,
            meta,
        }))
    }

    fn open(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        currencies: Vec<String>,
        booking: Option<String>,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        Ok(Directive::Open(tallybook_core::Open {
            date,
            account: self.interner.intern(account),
            currencies: currencies
                .iter()
                .map(|c| self.interner.intern(c))
                .collect(),
            booking,
            meta,
        }))
    }

    fn close(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        Ok(Directive::Close(tallybook_core::Close {
            date,
            account: self.interner.intern(account),
            meta,
        }))
    }

    fn commodity(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        currency: &str,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        Ok(Directive::Commodity(tallybook_core::Commodity {
            date,
            currency: self.interner.intern(currency),
            meta,
        }))
    }

    fn pad(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        source_account: &str,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        Ok(Directive::Pad(tallybook_core::Pad {
            date,
            account: self.interner.intern(account),
            source_account: self.interner.intern(source_account),
            meta,
        }))
    }

    fn price(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        currency: &str,
        amount: Amount,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        Ok(Directive::Price(tallybook_core::Price {
            date,
            currency: self.interner.intern(currency),
            amount,
            meta,
        }))
    }

    fn event(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        name: String,
        value: String,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        Ok(Directive::Event(tallybook_core::Event {
            date,
            name,
            value,
            meta,
        }))
    }

    fn note(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        comment: String,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        Ok(Directive::Note(tallybook_core::Note {
            date,
            account: self.interner.intern(account),
            comment,
            meta,
        }))
    }

    fn document(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        account: &str,
        path: String,
        tags: Vec<String>,
        links: Vec<String>,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        Ok(Directive::Document(tallybook_core::Document {
            date,
            account: self.interner.intern(account),
            path,
            tags,
            links,
            meta,
        }))
    }

    fn query(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        name: String,
        query: String,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        Ok(Directive::Query(tallybook_core::Query {
            date,
            name,
            query,
            meta,
        }))
    }

    fn custom(
        &mut self,
        _loc: &SourceLoc,
        date: NaiveDate,
        name: String,
        values: Vec<MetaValue>,
        meta: Metadata,
    ) -> Result<Directive, BuildError> {
        Ok(Directive::Custom(tallybook_core::Custom {
            date,
            name,
            values,
            meta,
        }))
    }

    fn option(
        &mut self,
        loc: &SourceLoc,
        span: Span,
        name: &str,
        value: &str,
    ) -> Result<(), BuildError> {
        for warning in self.options.set(name, value) {
            self.errors.push(ParseError::new(
                ParseErrorKind::InvalidOption(warning.message),
                loc.clone(),
                span,
            ));
        }
        Ok(())
    }

    fn include(
        &mut self,
        _loc: &SourceLoc,
        span: Span,
        filename: String,
    ) -> Result<(), BuildError> {
        self.includes.push((filename, span));
        Ok(())
    }

    fn plugin(
        &mut self,
        _loc: &SourceLoc,
        span: Span,
        name: String,
        config: Option<String>,
    ) -> Result<(), BuildError> {
        self.plugins.push((name, config, span));
        Ok(())
    }

    fn pushtag(&mut self, _loc: &SourceLoc, tag: &str) -> Result<(), BuildError> {
        self.tags.push(tag);
        Ok(())
    }

    fn poptag(&mut self, _loc: &SourceLoc, tag: &str) -> Result<(), BuildError> {
        if self.tags.pop(tag) {
            Ok(())
        } else {
            Err(BuildError::new(format!(
                "attempting to pop absent tag: #{tag}"
            )))
        }
    }

    fn error(&mut self, err: ParseError) {
        self.errors.push(err);
    }

    fn store_result(&mut self, directives: Vec<Spanned<Directive>>) {
        self.directives = directives;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loc() -> SourceLoc {
        SourceLoc::new("<string>", 1)
    }

    #[test]
    fn tag_context_pops_most_recent() {
        let mut ctx = TagContext::new();
        ctx.push("a");
        ctx.push("b");
        ctx.push("a");
        assert!(ctx.pop("a"));
        assert_eq!(ctx.active(), ["a", "b"]);
        assert!(!ctx.pop("zzz"));
    }

    #[test]
    fn transaction_splits_payee_and_narration() {
        let mut b = LedgerBuilder::new("<string>");
        let mut fields = b.txn_fields_new();
        b.txn_field_string(&loc(), &mut fields, "Payee".into())
            .unwrap();
        b.txn_field_string(&loc(), &mut fields, "Narration".into())
            .unwrap();
        let d = b
            .transaction(
                &loc(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                '*',
                fields,
                Vec::new(),
                Metadata::new(),
            )
            .unwrap();
        let txn = d.as_transaction().unwrap();
        assert_eq!(txn.payee.as_deref(), Some("Payee"));
        assert_eq!(txn.narration, "Narration");
    }

    #[test]
    fn third_header_string_is_refused() {
        let mut b = LedgerBuilder::new("<string>");
        let mut fields = b.txn_fields_new();
        b.txn_field_string(&loc(), &mut fields, "one".into())
            .unwrap();
        b.txn_field_string(&loc(), &mut fields, "two".into())
            .unwrap();
        let err = b
            .txn_field_string(&loc(), &mut fields, "three".into())
            .unwrap_err();
        assert!(err.message.contains("too many strings"));
    }

    #[test]
    fn pushed_tags_merge_into_transactions() {
        let mut b = LedgerBuilder::new("<string>");
        b.pushtag(&loc(), "trip").unwrap();
        let fields = b.txn_fields_new();
        let d = b
            .transaction(
                &loc(),
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                '*',
                fields,
                Vec::new(),
                Metadata::new(),
            )
            .unwrap();
        assert_eq!(d.as_transaction().unwrap().tags, ["trip"]);
    }

    #[test]
    fn popping_absent_tag_is_refused() {
        let mut b = LedgerBuilder::new("<string>");
        let err = b.poptag(&loc(), "ghost").unwrap_err();
        assert!(err.message.contains("absent tag"));
    }

    #[test]
    fn duplicate_cost_component_warns_and_keeps_last() {
        let mut b = LedgerBuilder::new("<string>");
        let comps = vec![
            CostComp::Label("first".into()),
            CostComp::Label("second".into()),
        ];
        let spec = b
            .cost_spec(&loc(), Span::new(0, 1), comps, false)
            .unwrap();
        assert_eq!(spec.label.as_deref(), Some("second"));
        let result = b.finalize(false);
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(
            result.errors[0].kind,
            ParseErrorKind::DuplicateCostComponent(_)
        ));
    }

    #[test]
    fn total_brace_moves_plain_number_to_total() {
        let mut b = LedgerBuilder::new("<string>");
        let comps = vec![CostComp::Amount(CompoundAmount {
            number_per: Some(dec!(1500.00)),
            number_total: None,
            currency: Some("USD".into()),
        })];
        let spec = b.cost_spec(&loc(), Span::new(0, 1), comps, true).unwrap();
        assert_eq!(spec.number_total, Some(dec!(1500.00)));
        assert!(spec.number_per.is_none());
    }
}
