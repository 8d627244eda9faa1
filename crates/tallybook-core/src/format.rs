//! Directive renderer.
//!
//! Renders any [`Directive`] back to canonical ledger text. The output is
//! re-parseable; the parser's round-trip tests rely on that.

use crate::{Directive, MetaValue, Metadata, Posting, Transaction};
use std::fmt::Write;

/// Renderer configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Indentation prefix for postings.
    pub indent: String,
    /// Indentation prefix for metadata lines.
    pub meta_indent: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            meta_indent: "    ".to_string(),
        }
    }
}

/// Render a directive to ledger text, without a trailing newline.
#[must_use]
pub fn render_directive(directive: &Directive, config: &RenderConfig) -> String {
    match directive {
        Directive::Transaction(txn) => render_transaction(txn, config),
        other => {
            let mut out = header_line(other);
            push_meta(&mut out, directive.meta(), &config.indent);
            out
        }
    }
}

fn header_line(directive: &Directive) -> String {
    match directive {
        Directive::Transaction(_) => unreachable!("transactions render separately"),
        Directive::Balance(d) => d.to_string(),
        Directive::Open(d) => d.to_string(),
        Directive::Close(d) => d.to_string(),
        Directive::Commodity(d) => d.to_string(),
        Directive::Pad(d) => d.to_string(),
        Directive::Price(d) => d.to_string(),
        Directive::Event(d) => d.to_string(),
        Directive::Note(d) => d.to_string(),
        Directive::Document(d) => d.to_string(),
        Directive::Query(d) => d.to_string(),
        Directive::Custom(d) => d.to_string(),
    }
}

fn render_transaction(txn: &Transaction, config: &RenderConfig) -> String {
    let mut out = String::new();
    write!(out, "{} {} ", txn.date, txn.flag).unwrap();
    if let Some(payee) = &txn.payee {
        write!(out, "\"{}\" ", escape(payee)).unwrap();
    }
    write!(out, "\"{}\"", escape(&txn.narration)).unwrap();
    for tag in &txn.tags {
        write!(out, " #{tag}").unwrap();
    }
    for link in &txn.links {
        write!(out, " ^{link}").unwrap();
    }
    push_meta(&mut out, &txn.meta, &config.indent);
    for posting in &txn.postings {
        out.push('\n');
        render_posting(&mut out, posting, config);
    }
    out
}

fn render_posting(out: &mut String, posting: &Posting, config: &RenderConfig) {
    out.push_str(&config.indent);
    if let Some(flag) = posting.flag {
        write!(out, "{flag} ").unwrap();
    }
    write!(out, "{}", posting.account).unwrap();
    if let Some(units) = &posting.units {
        write!(out, "  {units}").unwrap();
    }
    if let Some(cost) = &posting.cost {
        write!(out, " {cost}").unwrap();
    }
    if let Some(price) = &posting.price {
        write!(out, " {price}").unwrap();
    }
    push_meta(out, &posting.meta, &config.meta_indent);
}

// Keys are rendered sorted so output is deterministic.
fn push_meta(out: &mut String, meta: &Metadata, indent: &str) {
    let mut keys: Vec<&String> = meta.keys().collect();
    keys.sort();
    for key in keys {
        out.push('\n');
        out.push_str(indent);
        match &meta[key] {
            MetaValue::None => write!(out, "{key}:").unwrap(),
            value => write!(out, "{key}: {value}").unwrap(),
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Amount, Balance, Open};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn render_open() {
        let d = Directive::Open(
            Open::new(date(2024, 1, 1), "Assets:Checking").with_currencies(vec!["USD".into()]),
        );
        assert_eq!(
            render_directive(&d, &RenderConfig::default()),
            "2024-01-01 open Assets:Checking USD"
        );
    }

    #[test]
    fn render_transaction_with_postings() {
        let txn = Transaction::new(date(2024, 1, 15), "Morning coffee")
            .with_payee("Coffee Shop")
            .with_posting(Posting::new(
                "Expenses:Coffee",
                Amount::new(dec!(5.00), "USD"),
            ))
            .with_posting(Posting::auto("Assets:Cash"));
        let text = render_directive(&Directive::Transaction(txn), &RenderConfig::default());
        assert_eq!(
            text,
            "2024-01-15 * \"Coffee Shop\" \"Morning coffee\"\n  Expenses:Coffee  5.00 USD\n  Assets:Cash"
        );
    }

    #[test]
    fn render_escapes_quotes() {
        let txn = Transaction::new(date(2024, 1, 15), "say \"hi\"");
        let text = render_directive(&Directive::Transaction(txn), &RenderConfig::default());
        assert!(text.contains("\\\"hi\\\""));
    }

    #[test]
    fn render_balance_meta_sorted() {
        let mut bal = Balance::new(
            date(2024, 2, 1),
            "Assets:Checking",
            Amount::new(dec!(10), "USD"),
        );
        bal.meta
            .insert("zkey".to_string(), MetaValue::Number(dec!(1)));
        bal.meta
            .insert("akey".to_string(), MetaValue::String("v".to_string()));
        let text = render_directive(&Directive::Balance(bal), &RenderConfig::default());
        let akey = text.find("akey").unwrap();
        let zkey = text.find("zkey").unwrap();
        assert!(akey < zkey);
    }
}
