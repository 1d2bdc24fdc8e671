//! Plain-text views for the terminal.

use fleet_ledger::{
    CategoryBreakdown, EntitySummary, LedgerTotals, ProfitLossReport, ReconciledEntry,
};
use std::collections::BTreeMap;

use crate::config::DisplaySection;
use crate::export::{format_date, format_money};

pub fn print_ledger(ledger: &[ReconciledEntry], display: &DisplaySection) {
    if ledger.is_empty() {
        println!("(no entries)");
        return;
    }

    let money = |amount: i64| format_money(amount, &display.currency_symbol);
    println!(
        "{:<12} {:<18} {:<9} {:>12} {:>12} {:>12}  {}",
        "DATE", "TYPE", "STATUS", "CREDIT", "DEBIT", "BALANCE", "REMARKS"
    );
    for r in ledger {
        println!(
            "{:<12} {:<18} {:<9} {:>12} {:>12} {:>12}  {}",
            format_date(r.entry.effective_date.or(r.entry.created_at), &display.date_format),
            r.classified_type.label(),
            r.entry.approval_status,
            if r.credit > 0 { money(r.credit) } else { String::new() },
            if r.debit > 0 { money(r.debit) } else { String::new() },
            money(r.running_balance),
            r.entry.remarks.as_deref().unwrap_or(""),
        );
    }

    let totals = LedgerTotals::from_reconciled(ledger);
    println!(
        "\nCredit {} | Debit {} | Closing balance {}",
        money(totals.total_credit),
        money(totals.total_debit),
        money(totals.closing_balance)
    );
    let counts: Vec<String> = totals
        .counts_by_type
        .iter()
        .map(|(label, n)| format!("{label}={n}"))
        .collect();
    println!("Entries: {}", counts.join(", "));
}

pub fn print_summaries(summaries: &[EntitySummary], display: &DisplaySection) {
    if summaries.is_empty() {
        println!("(no entities)");
        return;
    }
    for s in summaries {
        println!(
            "{:<24} income={:>12} expense={:>12} net={:>12} | {} entries ({} approved)",
            s.entity_label,
            format_money(s.income_total, &display.currency_symbol),
            format_money(s.expense_total, &display.currency_symbol),
            format_money(s.net_total, &display.currency_symbol),
            s.entry_count,
            s.approved_entry_count,
        );
    }
}

pub fn print_breakdown(
    summaries: &[EntitySummary],
    breakdown: &BTreeMap<String, Vec<CategoryBreakdown>>,
    display: &DisplaySection,
) {
    print_summaries(summaries, display);
    for s in summaries {
        let Some(rows) = breakdown.get(&s.entity_id).filter(|rows| !rows.is_empty()) else {
            continue;
        };
        println!("\n{}", s.entity_label);
        for row in rows {
            println!(
                "  {:<22} income={:>12} expense={:>12}",
                row.category,
                format_money(row.income_total, &display.currency_symbol),
                format_money(row.expense_total, &display.currency_symbol),
            );
        }
    }
}

pub fn print_report(report: &ProfitLossReport, display: &DisplaySection) {
    let window = match (report.from, report.to) {
        (None, None) => "all dates".to_string(),
        (from, to) => format!(
            "{} to {}",
            format_date(from, &display.date_format),
            format_date(to, &display.date_format)
        ),
    };
    println!("# P&L by {} ({window})\n", report.group_by.as_str());
    print_summaries(&report.rows, display);

    let t = &report.totals;
    println!(
        "\nTotal income {} | expense {} | net {}",
        format_money(t.income_total, &display.currency_symbol),
        format_money(t.expense_total, &display.currency_symbol),
        format_money(t.net_total, &display.currency_symbol),
    );
    println!(
        "{} entries, {} approved, {} pending, {} rejected",
        t.entry_count, t.approved_entry_count, report.pending_count, report.rejected_count
    );
}
