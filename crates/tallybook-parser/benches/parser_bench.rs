//! Parser throughput benchmarks.
//!
//! Run with: cargo bench -p tallybook-parser

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tallybook_parser::parse;

/// Generate a synthetic ledger with `num_transactions` transactions.
fn generate_ledger(num_transactions: usize) -> String {
    let mut lines = vec![
        "option \"title\" \"Synthetic Ledger\"".to_string(),
        "2024-01-01 open Assets:Bank:Checking USD".to_string(),
        "2024-01-01 open Expenses:Food USD".to_string(),
        "2024-01-01 open Expenses:Coffee USD".to_string(),
        "2024-01-01 open Expenses:Transport USD".to_string(),
        String::new(),
    ];

    let categories = ["Food", "Coffee", "Transport"];
    let payees = ["Corner Store", "Cafe", "Metro", "Market"];
    let (mut year, mut month, mut day) = (2024, 1, 1);

    for i in 0..num_transactions {
        let category = categories[i % categories.len()];
        let payee = payees[i % payees.len()];
        let amount = format!("{}.{:02}", 10 + i % 90, i % 100);

        lines.push(format!(
            "{year:04}-{month:02}-{day:02} * \"{payee}\" \"Purchase {i}\" #daily"
        ));
        lines.push(format!("  Expenses:{category}  {amount} USD"));
        lines.push("  Assets:Bank:Checking".to_string());
        lines.push(String::new());

        day += 1;
        if day > 28 {
            day = 1;
            month += 1;
            if month > 12 {
                month = 1;
                year += 1;
            }
        }
    }

    lines.join("\n")
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for size in [10usize, 100, 1_000] {
        let ledger = generate_ledger(size);
        group.throughput(Throughput::Bytes(ledger.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &ledger, |b, ledger| {
            b.iter(|| parse(black_box(ledger)));
        });
    }
    group.finish();
}

fn bench_parse_arithmetic(c: &mut Criterion) {
    let source = "2024-01-01 * \"split\"\n  Assets:Cash  (100.00 + 50.00) / 3 * 2 - 1 USD\n  Equity:Plug\n"
        .repeat(200);
    c.bench_function("parse_arithmetic_200", |b| {
        b.iter(|| parse(black_box(&source)));
    });
}

criterion_group!(benches, bench_parse, bench_parse_arithmetic);
criterion_main!(benches);
