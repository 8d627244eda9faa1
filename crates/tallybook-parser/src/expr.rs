//! Infix arithmetic over decimal literals.
//!
//! Wherever the grammar accepts a number it actually accepts an expression:
//! `+ -` below `* /` below unary minus below parentheses, all
//! left-associative. Evaluation happens during parsing; only the resulting
//! [`Decimal`] ever reaches the builder.
//!
//! Division is the one lossy operation. Quotients are carried to a
//! configurable number of fractional digits with a configurable rounding
//! strategy, defaulting to 28 digits and banker's rounding.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::error::ParseErrorKind;
use crate::lexer::{Token, TokenStream};
use crate::location::Span;

/// Evaluator configuration.
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    /// Fractional digits carried by inexact divisions.
    pub div_scale: u32,
    /// Rounding applied when a quotient exceeds `div_scale`.
    pub rounding: RoundingStrategy,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            div_scale: 28,
            rounding: RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// An evaluation failure, positioned for the caller to wrap.
pub(crate) type ExprError = (ParseErrorKind, Span);

/// Evaluate one expression starting at the cursor's current token.
///
/// Consumes exactly the tokens belonging to the expression; the cursor is
/// left on the first token after it.
pub(crate) fn evaluate(
    toks: &mut TokenStream<'_>,
    opts: &EvalOptions,
) -> Result<Decimal, ExprError> {
    additive(toks, opts)
}

/// Turn a number lexeme into a decimal, stripping thousands commas.
pub(crate) fn decimal_from_lexeme(lexeme: &str, span: Span) -> Result<Decimal, ExprError> {
    let mut clean = String::with_capacity(lexeme.len() + 1);
    if lexeme.starts_with('.') {
        clean.push('0');
    }
    clean.extend(lexeme.chars().filter(|&c| c != ','));
    Decimal::from_str(&clean)
        .map_err(|_| (ParseErrorKind::InvalidNumber(lexeme.to_string()), span))
}

fn additive(toks: &mut TokenStream<'_>, opts: &EvalOptions) -> Result<Decimal, ExprError> {
    let mut acc = multiplicative(toks, opts)?;
    loop {
        let negate = match toks.peek() {
            Some(Token::Plus) => false,
            Some(Token::Minus) => true,
            _ => return Ok(acc),
        };
        let op_span = toks.span();
        toks.bump();
        let rhs = multiplicative(toks, opts)?;
        let rhs = if negate { -rhs } else { rhs };
        acc = acc
            .checked_add(rhs)
            .ok_or((ParseErrorKind::InvalidNumber("arithmetic overflow".into()), op_span))?;
    }
}

fn multiplicative(toks: &mut TokenStream<'_>, opts: &EvalOptions) -> Result<Decimal, ExprError> {
    let mut acc = unary(toks, opts)?;
    loop {
        let divide = match toks.peek() {
            Some(Token::Asterisk) => false,
            Some(Token::Slash) => true,
            _ => return Ok(acc),
        };
        let op_span = toks.span();
        toks.bump();
        let rhs = unary(toks, opts)?;
        acc = if divide {
            if rhs.is_zero() {
                return Err((ParseErrorKind::DivisionByZero, op_span));
            }
            acc.checked_div(rhs)
                .ok_or((
                    ParseErrorKind::InvalidNumber("arithmetic overflow".into()),
                    op_span,
                ))?
                .round_dp_with_strategy(opts.div_scale, opts.rounding)
        } else {
            acc.checked_mul(rhs).ok_or((
                ParseErrorKind::InvalidNumber("arithmetic overflow".into()),
                op_span,
            ))?
        };
    }
}

fn unary(toks: &mut TokenStream<'_>, opts: &EvalOptions) -> Result<Decimal, ExprError> {
    let mut negate = false;
    loop {
        match toks.peek() {
            Some(Token::Minus) => {
                negate = !negate;
                toks.bump();
            }
            Some(Token::Plus) => {
                toks.bump();
            }
            _ => break,
        }
    }
    let value = atom(toks, opts)?;
    Ok(if negate { -value } else { value })
}

fn atom(toks: &mut TokenStream<'_>, opts: &EvalOptions) -> Result<Decimal, ExprError> {
    match toks.peek() {
        Some(Token::Number(lexeme)) => {
            let lexeme = *lexeme;
            let span = toks.span();
            toks.bump();
            decimal_from_lexeme(lexeme, span)
        }
        Some(Token::LParen) => {
            toks.bump();
            let value = additive(toks, opts)?;
            match toks.peek() {
                Some(Token::RParen) => {
                    toks.bump();
                    Ok(value)
                }
                found => {
                    let kind = ParseErrorKind::UnexpectedToken {
                        found: found.map_or_else(|| "end of file".to_string(), Token::name),
                        expected: Some("')'".to_string()),
                    };
                    Err((kind, toks.span()))
                }
            }
        }
        found => {
            let kind = ParseErrorKind::UnexpectedToken {
                found: found.map_or_else(|| "end of file".to_string(), Token::name),
                expected: Some("a number".to_string()),
            };
            Err((kind, toks.span()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use rust_decimal_macros::dec;

    fn eval(source: &str) -> Result<Decimal, ExprError> {
        let mut toks = TokenStream::new(tokenize(source));
        evaluate(&mut toks, &EvalOptions::default())
    }

    fn eval_ok(source: &str) -> Decimal {
        eval(source).expect("expression should evaluate")
    }

    #[test]
    fn literals() {
        assert_eq!(eval_ok("42"), dec!(42));
        assert_eq!(eval_ok("1,234.56"), dec!(1234.56));
        assert_eq!(eval_ok(".50"), dec!(0.50));
    }

    #[test]
    fn precedence() {
        assert_eq!(eval_ok("1.5 + 2 * 3"), dec!(7.5));
        assert_eq!(eval_ok("(1.5 + 2) * 3"), dec!(10.5));
        assert_eq!(eval_ok("10 + 5 * 2"), dec!(20));
    }

    #[test]
    fn left_associativity() {
        assert_eq!(eval_ok("10 - 5 - 2"), dec!(3));
        assert_eq!(eval_ok("100 / 10 / 2"), dec!(5));
    }

    #[test]
    fn unary_minus() {
        assert_eq!(eval_ok("-1 - -2"), dec!(1));
        assert_eq!(eval_ok("- -5"), dec!(5));
        assert_eq!(eval_ok("-(2 + 3)"), dec!(-5));
    }

    #[test]
    fn division_carries_scale() {
        let third = eval_ok("(100 + 50) / 3");
        assert_eq!(third, dec!(50));

        let inexact = eval_ok("1 / 3");
        assert_eq!(inexact.round_dp(8), dec!(0.33333333));
        assert!(inexact.scale() >= 8);
    }

    #[test]
    fn division_by_zero_is_reported() {
        let err = eval("1 / 0").unwrap_err();
        assert_eq!(err.0, ParseErrorKind::DivisionByZero);
    }

    #[test]
    fn truncating_rounding_mode() {
        let opts = EvalOptions {
            div_scale: 2,
            rounding: RoundingStrategy::ToZero,
        };
        let mut toks = TokenStream::new(tokenize("2 / 3"));
        assert_eq!(evaluate(&mut toks, &opts).unwrap(), dec!(0.66));
    }

    #[test]
    fn stops_at_first_non_expression_token() {
        let mut toks = TokenStream::new(tokenize("10 USD"));
        let value = evaluate(&mut toks, &EvalOptions::default()).unwrap();
        assert_eq!(value, dec!(10));
        assert!(matches!(toks.peek(), Some(Token::Currency("USD"))));
    }

    #[test]
    fn unbalanced_paren_is_reported() {
        let err = eval("(1 + 2").unwrap_err();
        assert!(matches!(err.0, ParseErrorKind::UnexpectedToken { .. }));
    }
}
