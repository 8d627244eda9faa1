//! The typed `option` table.
//!
//! `option "name" "value"` directives configure downstream processing; the
//! parser applies known names into this typed table and keeps everything
//! else in a custom map. Validation never fails a parse: problems surface
//! as [`OptionWarning`] records which the driver folds into the error list.

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// Option names the table understands.
const KNOWN_OPTIONS: &[&str] = &[
    "title",
    "filename",
    "operating_currency",
    "name_assets",
    "name_liabilities",
    "name_equity",
    "name_income",
    "name_expenses",
    "account_previous_balances",
    "account_current_earnings",
    "conversion_currency",
    "inferred_tolerance_default",
    "inferred_tolerance_multiplier",
    "infer_tolerance_from_cost",
    "insert_pythonpath",
    "render_commas",
    "plugin_processing_mode",
    "booking_method",
    "documents",
    "long_string_maxlines",
];

/// Options that may legitimately appear more than once.
const REPEATABLE_OPTIONS: &[&str] = &["operating_currency", "documents", "insert_pythonpath"];

/// A non-fatal problem found while applying an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionWarning {
    /// Human-readable description.
    pub message: String,
    /// The option name.
    pub option: String,
}

/// The collected option values of one parse.
#[derive(Debug, Clone)]
pub struct Options {
    /// Ledger title.
    pub title: Option<String>,
    /// Source filename, set by the driver.
    pub filename: Option<String>,
    /// Reporting currencies; repeatable.
    pub operating_currency: Vec<String>,
    /// Root account rename for assets.
    pub name_assets: String,
    /// Root account rename for liabilities.
    pub name_liabilities: String,
    /// Root account rename for equity.
    pub name_equity: String,
    /// Root account rename for income.
    pub name_income: String,
    /// Root account rename for expenses.
    pub name_expenses: String,
    /// Account receiving opening balances.
    pub account_previous_balances: String,
    /// Account receiving current earnings.
    pub account_current_earnings: String,
    /// Currency used for conversions, if set.
    pub conversion_currency: Option<String>,
    /// Per-currency default tolerances (`"USD:0.005"` style entries).
    pub inferred_tolerance_default: HashMap<String, Decimal>,
    /// Multiplier applied to inferred tolerances.
    pub inferred_tolerance_multiplier: Decimal,
    /// Whether cost currencies participate in tolerance inference.
    pub infer_tolerance_from_cost: bool,
    /// Extra plugin search paths; repeatable.
    pub insert_pythonpath: Vec<String>,
    /// Whether reports render thousands separators.
    pub render_commas: bool,
    /// Plugin processing mode.
    pub plugin_processing_mode: Option<String>,
    /// Default booking method.
    pub booking_method: String,
    /// Directories scanned for documents; repeatable.
    pub documents: Vec<String>,
    /// Maximum line count of a multi-line string.
    pub long_string_maxlines: u32,
    /// Unknown options, verbatim.
    pub custom: HashMap<String, String>,

    seen: HashSet<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            title: None,
            filename: None,
            operating_currency: Vec::new(),
            name_assets: "Assets".to_string(),
            name_liabilities: "Liabilities".to_string(),
            name_equity: "Equity".to_string(),
            name_income: "Income".to_string(),
            name_expenses: "Expenses".to_string(),
            account_previous_balances: "Equity:Opening-Balances".to_string(),
            account_current_earnings: "Equity:Earnings:Current".to_string(),
            conversion_currency: None,
            inferred_tolerance_default: HashMap::new(),
            inferred_tolerance_multiplier: Decimal::new(5, 1),
            infer_tolerance_from_cost: true,
            insert_pythonpath: Vec::new(),
            render_commas: false,
            plugin_processing_mode: None,
            booking_method: "STRICT".to_string(),
            documents: Vec::new(),
            long_string_maxlines: 64,
            custom: HashMap::new(),
            seen: HashSet::new(),
        }
    }
}

impl Options {
    /// Create the default table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one `option` directive. Returns warnings for unknown names,
    /// duplicate non-repeatable names, and unparseable values; the value is
    /// still recorded on a best-effort basis.
    pub fn set(&mut self, key: &str, value: &str) -> Vec<OptionWarning> {
        let mut warnings = Vec::new();
        let warn = |message: String| OptionWarning {
            message,
            option: key.to_string(),
        };

        if !KNOWN_OPTIONS.contains(&key) {
            warnings.push(warn(format!("unknown option \"{key}\"")));
        } else if !REPEATABLE_OPTIONS.contains(&key) && self.seen.contains(key) {
            warnings.push(warn(format!("option \"{key}\" may only be set once")));
        }
        self.seen.insert(key.to_string());

        match key {
            "title" => self.title = Some(value.to_string()),
            "filename" => self.filename = Some(value.to_string()),
            "operating_currency" => self.operating_currency.push(value.to_string()),
            "name_assets" => self.name_assets = value.to_string(),
            "name_liabilities" => self.name_liabilities = value.to_string(),
            "name_equity" => self.name_equity = value.to_string(),
            "name_income" => self.name_income = value.to_string(),
            "name_expenses" => self.name_expenses = value.to_string(),
            "account_previous_balances" => self.account_previous_balances = value.to_string(),
            "account_current_earnings" => self.account_current_earnings = value.to_string(),
            "conversion_currency" => self.conversion_currency = Some(value.to_string()),
            "inferred_tolerance_default" => match value.split_once(':') {
                Some((currency, tol)) => match Decimal::from_str(tol) {
                    Ok(d) => {
                        self.inferred_tolerance_default.insert(currency.to_string(), d);
                    }
                    Err(_) => warnings.push(warn(format!(
                        "invalid tolerance \"{tol}\" for option \"{key}\""
                    ))),
                },
                None => warnings.push(warn(format!(
                    "invalid value \"{value}\" for option \"{key}\": expected CURRENCY:TOLERANCE"
                ))),
            },
            "inferred_tolerance_multiplier" => match Decimal::from_str(value) {
                Ok(d) => self.inferred_tolerance_multiplier = d,
                Err(_) => warnings.push(warn(format!(
                    "invalid value \"{value}\" for option \"{key}\": expected a decimal number"
                ))),
            },
            "infer_tolerance_from_cost" => match parse_bool(value) {
                Some(b) => self.infer_tolerance_from_cost = b,
                None => warnings.push(warn(format!(
                    "invalid value \"{value}\" for option \"{key}\": expected TRUE or FALSE"
                ))),
            },
            "insert_pythonpath" => self.insert_pythonpath.push(value.to_string()),
            "render_commas" => match parse_bool(value) {
                Some(b) => self.render_commas = b,
                None => warnings.push(warn(format!(
                    "invalid value \"{value}\" for option \"{key}\": expected TRUE or FALSE"
                ))),
            },
            "plugin_processing_mode" => self.plugin_processing_mode = Some(value.to_string()),
            "booking_method" => {
                const METHODS: &[&str] = &["STRICT", "FIFO", "LIFO", "HIFO", "AVERAGE", "NONE"];
                if !METHODS.contains(&value.to_uppercase().as_str()) {
                    warnings.push(warn(format!(
                        "invalid value \"{}\" for option \"{}\": expected one of {}",
                        value,
                        key,
                        METHODS.join(", ")
                    )));
                }
                self.booking_method = value.to_string();
            }
            "documents" => self.documents.push(value.to_string()),
            "long_string_maxlines" => match value.parse::<u32>() {
                Ok(n) => self.long_string_maxlines = n,
                Err(_) => warnings.push(warn(format!(
                    "invalid value \"{value}\" for option \"{key}\": expected an integer"
                ))),
            },
            _ => {
                self.custom.insert(key.to_string(), value.to_string());
            }
        }

        warnings
    }

    /// Look up an unknown option recorded in the custom map.
    #[must_use]
    pub fn get_custom(&self, key: &str) -> Option<&str> {
        self.custom.get(key).map(String::as_str)
    }

    /// The five root account name prefixes, post-rename.
    #[must_use]
    pub fn root_names(&self) -> [&str; 5] {
        [
            &self.name_assets,
            &self.name_liabilities,
            &self.name_equity,
            &self.name_income,
            &self.name_expenses,
        ]
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = Options::new();
        assert_eq!(opts.name_assets, "Assets");
        assert_eq!(opts.booking_method, "STRICT");
        assert!(opts.infer_tolerance_from_cost);
        assert!(!opts.render_commas);
    }

    #[test]
    fn set_known_options() {
        let mut opts = Options::new();
        assert!(opts.set("title", "My Ledger").is_empty());
        assert!(opts.set("operating_currency", "USD").is_empty());
        assert!(opts.set("operating_currency", "EUR").is_empty());
        assert_eq!(opts.title.as_deref(), Some("My Ledger"));
        assert_eq!(opts.operating_currency, vec!["USD", "EUR"]);
    }

    #[test]
    fn unknown_option_warns_and_lands_in_custom() {
        let mut opts = Options::new();
        let warnings = opts.set("frobnicate", "yes");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("unknown option"));
        assert_eq!(opts.get_custom("frobnicate"), Some("yes"));
    }

    #[test]
    fn duplicate_non_repeatable_warns() {
        let mut opts = Options::new();
        assert!(opts.set("title", "First").is_empty());
        let warnings = opts.set("title", "Second");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("only be set once"));
        // Last write still wins.
        assert_eq!(opts.title.as_deref(), Some("Second"));
    }

    #[test]
    fn tolerance_default_parses_pairs() {
        let mut opts = Options::new();
        assert!(opts.set("inferred_tolerance_default", "USD:0.005").is_empty());
        assert_eq!(
            opts.inferred_tolerance_default.get("USD"),
            Some(&Decimal::new(5, 3))
        );

        let warnings = opts.set("inferred_tolerance_default", "USD=0.005");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn invalid_bool_warns() {
        let mut opts = Options::new();
        let warnings = opts.set("render_commas", "maybe");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("TRUE or FALSE"));
    }

    #[test]
    fn booking_method_validated() {
        let mut opts = Options::new();
        assert!(opts.set("booking_method", "FIFO").is_empty());
        let warnings = opts.set("booking_method", "RANDOM");
        assert_eq!(warnings.len(), 1);
    }
}
