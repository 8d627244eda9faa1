//! The grammar engine.
//!
//! A recursive-descent parser over the token stream. Each production
//! reduces its children and hands them to the [`Builder`]; the engine never
//! assembles AST nodes itself. Error handling follows one rule everywhere:
//! a failed reduction reports a record through the builder and discards
//! tokens through the next end of line, then parsing resumes, so one bad
//! line never swallows the rest of the file.
//!
//! Builder refusals are values, not unwinding: a method returning
//! [`BuildError`] aborts only the reduction that called it.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use tallybook_core::{
    Directive, IncompleteAmount, InternedStr, Metadata, MetaValue, Posting, PriceAnnotation,
};

use crate::builder::{BuildError, Builder, CostComp, TxnFields};
use crate::error::{ParseError, ParseErrorKind};
use crate::expr::{self, EvalOptions};
use crate::lexer::{tokenize, unquote, Token, TokenStream};
use crate::location::{LineIndex, SourceLoc, Span, Spanned};
use crate::ParseOptions;

type PResult<T> = Result<T, ParseError>;

/// Run the grammar over `source`, driving `builder`. Returns `false` when
/// the parse was cancelled before reaching end of input.
pub(crate) fn parse_source<B: Builder>(
    source: &str,
    opts: &ParseOptions,
    builder: &mut B,
) -> bool {
    // A leading byte-order-mark is tolerated.
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let file: InternedStr = opts
        .filename
        .as_deref()
        .unwrap_or("<string>")
        .into();

    let engine = Grammar {
        toks: TokenStream::new(tokenize(source)),
        lines: LineIndex::new(source),
        file,
        eval: opts.eval,
        verbose: opts.verbose_errors,
        cancel: opts.cancel.clone(),
        builder,
        directives: Vec::new(),
    };
    engine.parse_file()
}

struct Grammar<'src, 'b, B: Builder> {
    toks: TokenStream<'src>,
    lines: LineIndex,
    file: InternedStr,
    eval: EvalOptions,
    verbose: bool,
    cancel: Option<crate::CancelFlag>,
    builder: &'b mut B,
    directives: Vec<Spanned<Directive>>,
}

impl<'src, B: Builder> Grammar<'src, '_, B> {
    // ===== Top level =====

    /// `file -> declarations`: the entry production.
    fn parse_file(mut self) -> bool {
        loop {
            if self.cancel.as_ref().is_some_and(crate::CancelFlag::is_cancelled) {
                self.builder.store_result(self.directives);
                return false;
            }
            match self.toks.peek() {
                None => break,
                Some(Token::Newline) => {
                    self.toks.bump();
                }
                Some(Token::Comment(_)) => {
                    self.skip_line();
                }
                // Orphaned continuation lines and section headings are
                // dropped without comment, like any other skipped text.
                Some(Token::Indent | Token::Asterisk) => {
                    self.skip_line();
                }
                _ => match self.declaration() {
                    Ok(Some(directive)) => self.directives.push(directive),
                    Ok(None) => {}
                    Err(err) => {
                        self.report(err);
                        self.recover_to_eol();
                    }
                },
            }
        }
        self.builder.store_result(self.directives);
        true
    }

    /// One top-level statement: a dated directive or an undated one.
    fn declaration(&mut self) -> PResult<Option<Spanned<Directive>>> {
        let start = self.toks.span();
        let loc = self.loc_at(start);

        match self.toks.peek() {
            Some(Token::Option_) => {
                self.toks.bump();
                let name = self.expect_string()?;
                let value = self.expect_string()?;
                self.expect_eol()?;
                let span = start.merge(self.toks.prev_span());
                if let Err(e) = self.builder.option(&loc, span, &name, &value) {
                    self.report_build(&loc, span, e);
                }
                Ok(None)
            }
            Some(Token::Include) => {
                self.toks.bump();
                let filename = self.expect_string()?;
                self.expect_eol()?;
                let span = start.merge(self.toks.prev_span());
                if let Err(e) = self.builder.include(&loc, span, filename) {
                    self.report_build(&loc, span, e);
                }
                Ok(None)
            }
            Some(Token::Plugin) => {
                self.toks.bump();
                let name = self.expect_string()?;
                let config = match self.toks.peek() {
                    Some(Token::Str(_)) => Some(self.expect_string()?),
                    _ => None,
                };
                self.expect_eol()?;
                let span = start.merge(self.toks.prev_span());
                if let Err(e) = self.builder.plugin(&loc, span, name, config) {
                    self.report_build(&loc, span, e);
                }
                Ok(None)
            }
            Some(Token::Pushtag) => {
                self.toks.bump();
                let tag = self.expect_tag()?.to_string();
                self.expect_eol()?;
                let span = start.merge(self.toks.prev_span());
                if let Err(e) = self.builder.pushtag(&loc, &tag) {
                    self.report_build(&loc, span, e);
                }
                Ok(None)
            }
            Some(Token::Poptag) => {
                self.toks.bump();
                let tag = self.expect_tag()?.to_string();
                self.expect_eol()?;
                let span = start.merge(self.toks.prev_span());
                if let Err(e) = self.builder.poptag(&loc, &tag) {
                    self.report_build(&loc, span, e);
                }
                Ok(None)
            }
            Some(Token::Date(_)) => {
                let date = self.expect_date()?;
                let built = self.dated_directive(&loc, date)?;
                let span = start.merge(self.toks.prev_span());
                Ok(built.map(|d| Spanned::new(d, span)))
            }
            _ => Err(self.unexpected("a directive")),
        }
    }

    /// The directive body after `DATE` has been consumed.
    fn dated_directive(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        match self.toks.peek() {
            Some(t) if t.is_txn_flag() => self.transaction(loc, date),
            Some(Token::Balance) => self.balance(loc, date),
            Some(Token::Open) => self.open(loc, date),
            Some(Token::Close) => self.close(loc, date),
            Some(Token::Commodity) => self.commodity(loc, date),
            Some(Token::Pad) => self.pad(loc, date),
            Some(Token::Price) => self.price(loc, date),
            Some(Token::Event) => self.event(loc, date),
            Some(Token::Note) => self.note(loc, date),
            Some(Token::Document) => self.document(loc, date),
            Some(Token::Query) => self.query(loc, date),
            Some(Token::Custom) => self.custom(loc, date),
            _ => Err(self.unexpected("a directive keyword")),
        }
    }

    // ===== Transactions =====

    fn transaction(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        let flag = self.take_flag()?;
        let mut fields = self.builder.txn_fields_new();
        self.txn_fields(loc, &mut fields)?;
        self.expect_eol()?;

        let mut postings: Vec<Posting> = Vec::new();
        let mut meta = Metadata::new();
        self.posting_or_kv_list(loc, &mut fields, &mut postings, &mut meta);

        let built = self
            .builder
            .transaction(loc, date, flag, fields, postings, meta);
        self.finish_directive(loc, built)
    }

    /// `txn_fields`: strings, tags and links after the flag, in any order.
    fn txn_fields(&mut self, loc: &SourceLoc, fields: &mut TxnFields) -> PResult<()> {
        loop {
            match self.toks.peek() {
                Some(Token::Str(s)) => {
                    let value = unquote(s);
                    let span = self.toks.span();
                    self.toks.bump();
                    let res = self.builder.txn_field_string(loc, fields, value);
                    self.wrap_build(loc, span, res)?;
                }
                Some(Token::Tag(t)) => {
                    let t = *t;
                    let span = self.toks.span();
                    self.toks.bump();
                    let res = self.builder.txn_field_tag(loc, fields, &t[1..]);
                    self.wrap_build(loc, span, res)?;
                }
                Some(Token::Link(l)) => {
                    let l = *l;
                    let span = self.toks.span();
                    self.toks.bump();
                    let res = self.builder.txn_field_link(loc, fields, &l[1..]);
                    self.wrap_build(loc, span, res)?;
                }
                Some(Token::Pipe) => {
                    let span = self.toks.span();
                    self.report(ParseError::new(
                        ParseErrorKind::Deprecated(
                            "'|' separating payee and narration".to_string(),
                        ),
                        self.loc_at(span),
                        span,
                    ));
                    self.toks.bump();
                }
                _ => return Ok(()),
            }
        }
    }

    /// The indented block under a transaction header: postings, metadata
    /// entries, tag/link continuations, comments. A bad line is recovered
    /// without abandoning the block.
    fn posting_or_kv_list(
        &mut self,
        loc: &SourceLoc,
        fields: &mut TxnFields,
        postings: &mut Vec<Posting>,
        meta: &mut Metadata,
    ) {
        loop {
            match self.toks.peek() {
                Some(Token::Comment(_)) => {
                    self.skip_line();
                }
                Some(Token::Indent) => match self.toks.peek_nth(1) {
                    Some(Token::Comment(_) | Token::Newline) | None => self.skip_line(),
                    Some(Token::Key(_)) => {
                        self.toks.bump();
                        match self.key_value() {
                            Ok(Some((key, value))) => {
                                // Entries after a posting belong to it;
                                // earlier ones belong to the transaction.
                                match postings.last_mut() {
                                    Some(p) => p.meta.insert(key, value),
                                    None => meta.insert(key, value),
                                };
                            }
                            Ok(None) => {}
                            Err(err) => {
                                self.report(err);
                                self.recover_to_eol();
                            }
                        }
                    }
                    Some(Token::Tag(_) | Token::Link(_)) => {
                        self.toks.bump();
                        if let Err(err) = self.tags_links_line(loc, fields) {
                            self.report(err);
                            self.recover_to_eol();
                        }
                    }
                    _ => {
                        self.toks.bump();
                        match self.posting_line() {
                            Ok(Some(p)) => postings.push(p),
                            Ok(None) => {}
                            Err(err) => {
                                self.report(err);
                                self.recover_to_eol();
                            }
                        }
                    }
                },
                _ => return,
            }
        }
    }

    /// A continuation line holding only tags and links.
    fn tags_links_line(&mut self, loc: &SourceLoc, fields: &mut TxnFields) -> PResult<()> {
        loop {
            match self.toks.peek() {
                Some(Token::Tag(t)) => {
                    let t = *t;
                    let span = self.toks.span();
                    self.toks.bump();
                    let res = self.builder.txn_field_tag(loc, fields, &t[1..]);
                    self.wrap_build(loc, span, res)?;
                }
                Some(Token::Link(l)) => {
                    let l = *l;
                    let span = self.toks.span();
                    self.toks.bump();
                    let res = self.builder.txn_field_link(loc, fields, &l[1..]);
                    self.wrap_build(loc, span, res)?;
                }
                _ => break,
            }
        }
        self.expect_eol()
    }

    /// `posting: [FLAG] ACCOUNT [amount] [cost_spec] [price_annotation] EOL`.
    /// The leading INDENT has already been consumed.
    fn posting_line(&mut self) -> PResult<Option<Posting>> {
        let start = self.toks.span();
        let loc = self.loc_at(start);

        let flag = match self.toks.peek() {
            Some(Token::Flag(s)) => {
                let c = s.chars().next();
                self.toks.bump();
                c
            }
            Some(Token::Asterisk) => {
                self.toks.bump();
                Some('*')
            }
            Some(Token::Hash) => {
                self.toks.bump();
                Some('#')
            }
            // A lone uppercase letter directly before the account is a
            // letter flag, not a currency.
            Some(Token::Currency(c))
                if c.len() == 1 && matches!(self.toks.peek_nth(1), Some(Token::Account(_))) =>
            {
                let c = c.chars().next();
                self.toks.bump();
                c
            }
            _ => None,
        };

        let account = self.expect_account()?;
        let units = self.incomplete_amount(&loc)?;
        let cost = match self.toks.peek() {
            Some(Token::LCurl) => Some(self.cost_spec(false)?),
            Some(Token::LCurlCurl) => Some(self.cost_spec(true)?),
            _ => None,
        };
        let price = match self.toks.peek() {
            Some(Token::At | Token::AtAt) => Some(self.price_annotation(&loc)?),
            _ => None,
        };
        self.expect_eol()?;

        let span = start.merge(self.toks.prev_span());
        let built = self
            .builder
            .posting(&loc, flag, account, units, cost, price);
        match built {
            Ok(p) => Ok(Some(p)),
            Err(e) => {
                self.report_build(&loc, span, e);
                Ok(None)
            }
        }
    }

    // ===== Amounts, costs, prices =====

    /// An amount with possibly elided components, or nothing at all.
    fn incomplete_amount(&mut self, loc: &SourceLoc) -> PResult<Option<IncompleteAmount>> {
        match self.toks.peek() {
            Some(t) if t.starts_expr() => {
                let number = self.number_expr()?;
                match self.toks.peek() {
                    Some(Token::Currency(c)) => {
                        let currency = *c;
                        let span = self.toks.span();
                        self.toks.bump();
                        let res = self.builder.amount(loc, number, currency);
                        let amount = self.wrap_build(loc, span, res)?;
                        Ok(Some(IncompleteAmount::Complete(amount)))
                    }
                    _ => Ok(Some(IncompleteAmount::NumberOnly(number))),
                }
            }
            Some(Token::Currency(c)) => {
                let currency: InternedStr = (*c).into();
                self.toks.bump();
                Ok(Some(IncompleteAmount::CurrencyOnly(currency)))
            }
            _ => Ok(None),
        }
    }

    /// `amount: number_expr CURRENCY`, both required.
    fn amount(&mut self, loc: &SourceLoc) -> PResult<tallybook_core::Amount> {
        let number = self.number_expr()?;
        let currency = self.expect_currency()?;
        let span = self.toks.prev_span();
        let res = self.builder.amount(loc, number, currency);
        self.wrap_build(loc, span, res)
    }

    /// `cost_spec: LCURL lot_comp_list RCURL | LCURLCURL lot_comp_list
    /// RCURLCURL`. Comma separates components; `/` is accepted as a
    /// deprecated separator.
    fn cost_spec(&mut self, is_total: bool) -> PResult<tallybook_core::CostSpec> {
        let start = self.toks.span();
        let loc = self.loc_at(start);
        self.toks.bump();

        let mut comps = Vec::new();
        loop {
            match self.toks.peek() {
                Some(Token::RCurl) if !is_total => {
                    self.toks.bump();
                    break;
                }
                Some(Token::RCurlCurl) if is_total => {
                    self.toks.bump();
                    break;
                }
                Some(Token::Comma) => {
                    self.toks.bump();
                }
                Some(Token::Slash) => {
                    let span = self.toks.span();
                    self.report(ParseError::new(
                        ParseErrorKind::Deprecated(
                            "'/' separating cost components".to_string(),
                        ),
                        self.loc_at(span),
                        span,
                    ));
                    self.toks.bump();
                }
                Some(Token::Asterisk) => {
                    self.toks.bump();
                    comps.push(CostComp::Merge);
                }
                Some(Token::Date(_)) => {
                    let date = self.expect_date()?;
                    comps.push(CostComp::Date(date));
                }
                Some(Token::Str(s)) => {
                    let label = unquote(s);
                    self.toks.bump();
                    comps.push(CostComp::Label(label));
                }
                Some(t) if t.starts_expr() || matches!(t, Token::Hash | Token::Currency(_)) => {
                    let comp = self.compound_amount(&loc)?;
                    comps.push(CostComp::Amount(comp));
                }
                _ => {
                    return Err(self.unexpected(if is_total { "'}}'" } else { "'}'" }));
                }
            }
        }

        let span = start.merge(self.toks.prev_span());
        let res = self.builder.cost_spec(&loc, span, comps, is_total);
        self.wrap_build(&loc, span, res)
    }

    /// `compound_amount: [number_expr] [HASH [number_expr]] [CURRENCY]`.
    fn compound_amount(&mut self, loc: &SourceLoc) -> PResult<crate::builder::CompoundAmount> {
        let start = self.toks.span();
        let per = match self.toks.peek() {
            Some(t) if t.starts_expr() => Some(self.number_expr()?),
            _ => None,
        };
        let total = match self.toks.peek() {
            Some(Token::Hash) => {
                self.toks.bump();
                match self.toks.peek() {
                    Some(t) if t.starts_expr() => Some(self.number_expr()?),
                    _ => None,
                }
            }
            _ => None,
        };
        let currency = match self.toks.peek() {
            Some(Token::Currency(c)) => {
                let c = *c;
                self.toks.bump();
                Some(c)
            }
            _ => None,
        };
        let span = start.merge(self.toks.prev_span());
        let res = self.builder.compound_amount(loc, per, total, currency);
        self.wrap_build(loc, span, res)
    }

    /// `price_annotation: (AT | ATAT) [incomplete_amount]`.
    fn price_annotation(&mut self, loc: &SourceLoc) -> PResult<PriceAnnotation> {
        let is_total = matches!(self.toks.peek(), Some(Token::AtAt));
        self.toks.bump();
        let amount = self.incomplete_amount(loc)?;
        Ok(PriceAnnotation { amount, is_total })
    }

    // ===== Metadata =====

    /// A `key: value` line; the INDENT has been consumed, the KEY has not.
    /// Builder refusals are reported inline and yield `Ok(None)`.
    fn key_value(&mut self) -> PResult<Option<(String, MetaValue)>> {
        let start = self.toks.span();
        let loc = self.loc_at(start);
        let key = match self.toks.peek() {
            Some(Token::Key(k)) => {
                let k = *k;
                self.toks.bump();
                &k[..k.len() - 1]
            }
            _ => return Err(self.unexpected("a metadata key")),
        };
        let value = self.meta_value(&loc)?.unwrap_or(MetaValue::None);
        self.expect_eol()?;

        let span = start.merge(self.toks.prev_span());
        match self.builder.key_value(&loc, key, value) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                self.report_build(&loc, span, e);
                Ok(None)
            }
        }
    }

    /// `key_value_value`: one of the closed set of metadata value kinds,
    /// or `None` when the line ends without a value.
    fn meta_value(&mut self, loc: &SourceLoc) -> PResult<Option<MetaValue>> {
        let value = match self.toks.peek() {
            Some(Token::Str(s)) => {
                let v = MetaValue::String(unquote(s));
                self.toks.bump();
                v
            }
            Some(Token::Account(a)) => {
                let v = MetaValue::Account((*a).to_string());
                self.toks.bump();
                v
            }
            Some(Token::Tag(t)) => {
                let v = MetaValue::Tag(t[1..].to_string());
                self.toks.bump();
                v
            }
            Some(Token::Link(l)) => {
                let v = MetaValue::Link(l[1..].to_string());
                self.toks.bump();
                v
            }
            Some(Token::True) => {
                self.toks.bump();
                MetaValue::Bool(true)
            }
            Some(Token::False) => {
                self.toks.bump();
                MetaValue::Bool(false)
            }
            Some(Token::Date(_)) => MetaValue::Date(self.expect_date()?),
            Some(t) if t.starts_expr() => {
                let number = self.number_expr()?;
                match self.toks.peek() {
                    Some(Token::Currency(c)) => {
                        let currency = *c;
                        let span = self.toks.span();
                        self.toks.bump();
                        let res = self.builder.amount(loc, number, currency);
                        MetaValue::Amount(self.wrap_build(loc, span, res)?)
                    }
                    _ => MetaValue::Number(number),
                }
            }
            Some(Token::Currency(c)) => {
                let v = MetaValue::Currency((*c).to_string());
                self.toks.bump();
                v
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// `key_value_list`: indented metadata lines following a directive.
    fn key_value_list(&mut self) -> Metadata {
        let mut meta = Metadata::new();
        loop {
            match self.toks.peek() {
                Some(Token::Comment(_)) => self.skip_line(),
                Some(Token::Indent) => match self.toks.peek_nth(1) {
                    Some(Token::Key(_)) => {
                        self.toks.bump();
                        match self.key_value() {
                            Ok(Some((key, value))) => {
                                meta.insert(key, value);
                            }
                            Ok(None) => {}
                            Err(err) => {
                                self.report(err);
                                self.recover_to_eol();
                            }
                        }
                    }
                    Some(Token::Comment(_) | Token::Newline) | None => self.skip_line(),
                    _ => return meta,
                },
                _ => return meta,
            }
        }
    }

    // ===== Simple dated directives =====

    /// `balance: DATE BALANCE ACCOUNT amount_tolerance EOL key_value_list`.
    fn balance(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        self.toks.bump();
        let account = self.expect_account()?;
        let number = self.number_expr()?;
        let tolerance = match self.toks.peek() {
            Some(Token::Tilde) => {
                self.toks.bump();
                Some(self.number_expr()?)
            }
            _ => None,
        };
        let currency = self.expect_currency()?;
        let span = self.toks.prev_span();
        let res = self.builder.amount(loc, number, currency);
        let amount = self.wrap_build(loc, span, res)?;
        self.expect_eol()?;
        let meta = self.key_value_list();

        let built = self
            .builder
            .balance(loc, date, account, amount, tolerance, meta);
        self.finish_directive(loc, built)
    }

    /// `open: DATE OPEN ACCOUNT currency_list opt_booking EOL key_value_list`.
    fn open(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        self.toks.bump();
        let account = self.expect_account()?;

        let mut currencies = Vec::new();
        if matches!(self.toks.peek(), Some(Token::Currency(_))) {
            loop {
                currencies.push(self.expect_currency()?.to_string());
                match self.toks.peek() {
                    Some(Token::Comma) => {
                        self.toks.bump();
                    }
                    _ => break,
                }
            }
        }

        let booking = match self.toks.peek() {
            Some(Token::Str(_)) => Some(self.expect_string()?),
            _ => None,
        };
        self.expect_eol()?;
        let meta = self.key_value_list();

        let built = self
            .builder
            .open(loc, date, account, currencies, booking, meta);
        self.finish_directive(loc, built)
    }

    fn close(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        self.toks.bump();
        let account = self.expect_account()?;
        self.expect_eol()?;
        let meta = self.key_value_list();

        let built = self.builder.close(loc, date, account, meta);
        self.finish_directive(loc, built)
    }

    fn commodity(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        self.toks.bump();
        let currency = self.expect_currency()?;
        self.expect_eol()?;
        let meta = self.key_value_list();

        let built = self.builder.commodity(loc, date, currency, meta);
        self.finish_directive(loc, built)
    }

    fn pad(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        self.toks.bump();
        let account = self.expect_account()?;
        let source_account = self.expect_account()?;
        self.expect_eol()?;
        let meta = self.key_value_list();

        let built = self.builder.pad(loc, date, account, source_account, meta);
        self.finish_directive(loc, built)
    }

    fn price(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        self.toks.bump();
        let currency = self.expect_currency()?.to_string();
        let amount = self.amount(loc)?;
        self.expect_eol()?;
        let meta = self.key_value_list();

        let built = self.builder.price(loc, date, &currency, amount, meta);
        self.finish_directive(loc, built)
    }

    fn event(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        self.toks.bump();
        let name = self.expect_string()?;
        let value = self.expect_string()?;
        self.expect_eol()?;
        let meta = self.key_value_list();

        let built = self.builder.event(loc, date, name, value, meta);
        self.finish_directive(loc, built)
    }

    fn note(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        self.toks.bump();
        let account = self.expect_account()?;
        let comment = self.expect_string()?;
        self.expect_eol()?;
        let meta = self.key_value_list();

        let built = self.builder.note(loc, date, account, comment, meta);
        self.finish_directive(loc, built)
    }

    /// `document: DATE DOCUMENT ACCOUNT filename tags_links EOL ...`.
    fn document(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        self.toks.bump();
        let account = self.expect_account()?;
        let path = self.expect_string()?;

        let mut tags = Vec::new();
        let mut links = Vec::new();
        loop {
            match self.toks.peek() {
                Some(Token::Tag(t)) => {
                    tags.push(t[1..].to_string());
                    self.toks.bump();
                }
                Some(Token::Link(l)) => {
                    links.push(l[1..].to_string());
                    self.toks.bump();
                }
                _ => break,
            }
        }
        self.expect_eol()?;
        let meta = self.key_value_list();

        let built = self
            .builder
            .document(loc, date, account, path, tags, links, meta);
        self.finish_directive(loc, built)
    }

    fn query(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        self.toks.bump();
        let name = self.expect_string()?;
        let query = self.expect_string()?;
        self.expect_eol()?;
        let meta = self.key_value_list();

        let built = self.builder.query(loc, date, name, query, meta);
        self.finish_directive(loc, built)
    }

    /// `custom: DATE CUSTOM STRING value* EOL key_value_list`.
    fn custom(&mut self, loc: &SourceLoc, date: NaiveDate) -> PResult<Option<Directive>> {
        self.toks.bump();
        let name = self.expect_string()?;
        let mut values = Vec::new();
        while let Some(value) = self.meta_value(loc)? {
            values.push(value);
        }
        self.expect_eol()?;
        let meta = self.key_value_list();

        let built = self.builder.custom(loc, date, name, values, meta);
        self.finish_directive(loc, built)
    }

    // ===== Reduction plumbing =====

    /// Close out a dated reduction: a builder refusal becomes an error
    /// record and the directive is dropped, but parsing continues.
    fn finish_directive(
        &mut self,
        loc: &SourceLoc,
        built: Result<Directive, BuildError>,
    ) -> PResult<Option<Directive>> {
        match built {
            Ok(d) => Ok(Some(d)),
            Err(e) => {
                let span = self.toks.prev_span();
                self.report_build(loc, span, e);
                Ok(None)
            }
        }
    }

    fn wrap_build<T>(
        &mut self,
        loc: &SourceLoc,
        span: Span,
        res: Result<T, BuildError>,
    ) -> PResult<T> {
        res.map_err(|e| {
            ParseError::new(ParseErrorKind::Builder(e.message), loc.clone(), span)
        })
    }

    fn report_build(&mut self, loc: &SourceLoc, span: Span, e: BuildError) {
        self.report(ParseError::new(
            ParseErrorKind::Builder(e.message),
            loc.clone(),
            span,
        ));
    }

    fn report(&mut self, err: ParseError) {
        self.builder.error(err);
    }

    // ===== Token helpers =====

    fn number_expr(&mut self) -> PResult<Decimal> {
        expr::evaluate(&mut self.toks, &self.eval)
            .map_err(|(kind, span)| ParseError::new(kind, self.loc_at(span), span))
    }

    fn take_flag(&mut self) -> PResult<char> {
        let flag = match self.toks.peek() {
            Some(Token::Txn | Token::Asterisk) => '*',
            Some(Token::Hash) => '#',
            Some(Token::Flag(s)) => s.chars().next().unwrap_or('*'),
            Some(Token::Currency(c)) if c.len() == 1 => c.chars().next().unwrap_or('*'),
            _ => return Err(self.unexpected("a transaction flag")),
        };
        self.toks.bump();
        Ok(flag)
    }

    fn expect_account(&mut self) -> PResult<&'src str> {
        match self.toks.peek() {
            Some(Token::Account(s)) => {
                let s = *s;
                self.toks.bump();
                Ok(s)
            }
            _ => Err(self.unexpected("an account")),
        }
    }

    fn expect_currency(&mut self) -> PResult<&'src str> {
        match self.toks.peek() {
            Some(Token::Currency(s)) => {
                let s = *s;
                self.toks.bump();
                Ok(s)
            }
            _ => Err(self.unexpected("a currency")),
        }
    }

    fn expect_string(&mut self) -> PResult<String> {
        match self.toks.peek() {
            Some(Token::Str(s)) => {
                let s = unquote(s);
                self.toks.bump();
                Ok(s)
            }
            _ => Err(self.unexpected("a string")),
        }
    }

    fn expect_tag(&mut self) -> PResult<&'src str> {
        match self.toks.peek() {
            Some(Token::Tag(t)) => {
                let t = *t;
                self.toks.bump();
                Ok(&t[1..])
            }
            _ => Err(self.unexpected("a tag")),
        }
    }

    fn expect_date(&mut self) -> PResult<NaiveDate> {
        match self.toks.peek() {
            Some(Token::Date(lexeme)) => {
                let lexeme = *lexeme;
                let span = self.toks.span();
                self.toks.bump();
                parse_date(lexeme)
                    .ok_or_else(|| {
                        ParseError::new(
                            ParseErrorKind::InvalidDate(lexeme.to_string()),
                            self.loc_at(span),
                            span,
                        )
                    })
            }
            _ => Err(self.unexpected("a date")),
        }
    }

    /// Consume an optional comment and the end of the line (or input).
    fn expect_eol(&mut self) -> PResult<()> {
        if matches!(self.toks.peek(), Some(Token::Comment(_))) {
            self.toks.bump();
        }
        match self.toks.peek() {
            None => Ok(()),
            Some(Token::Newline) => {
                self.toks.bump();
                Ok(())
            }
            Some(_) => Err(self.unexpected("end of line")),
        }
    }

    /// Discard tokens through the next end of line.
    fn recover_to_eol(&mut self) {
        while let Some((token, _)) = self.toks.bump() {
            if matches!(token, Token::Newline) {
                break;
            }
        }
    }

    fn skip_line(&mut self) {
        self.recover_to_eol();
    }

    fn loc_at(&self, span: Span) -> SourceLoc {
        SourceLoc {
            file: self.file.clone(),
            line: self.lines.line(span.start),
        }
    }

    /// An error for the current token, naming what would have been
    /// accepted when verbose reporting is on. Lexer error tokens are
    /// absorbed here and reported as lex errors.
    fn unexpected(&self, expected: &str) -> ParseError {
        let span = self.toks.span();
        let loc = self.loc_at(span);
        match self.toks.peek() {
            None => ParseError::new(ParseErrorKind::UnexpectedEof, loc, span),
            Some(Token::Error(lexeme)) => {
                ParseError::new(ParseErrorKind::Lex((*lexeme).to_string()), loc, span)
            }
            Some(t) => ParseError::new(
                ParseErrorKind::UnexpectedToken {
                    found: t.name(),
                    expected: self.verbose.then(|| expected.to_string()),
                },
                loc,
                span,
            ),
        }
    }
}

/// Parse a `YYYY-MM-DD` / `YYYY/MM/DD` lexeme into a date, checking range
/// validity.
fn parse_date(lexeme: &str) -> Option<NaiveDate> {
    let mut parts = lexeme.split(['-', '/']);
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::parse_date;

    #[test]
    fn date_lexemes() {
        assert!(parse_date("2014-03-01").is_some());
        assert!(parse_date("2014/03/01").is_some());
        assert!(parse_date("2014-13-01").is_none());
        assert!(parse_date("2014-02-30").is_none());
    }
}
