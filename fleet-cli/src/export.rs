//! Presentation of engine output: money/date formatting, CSV and HTML export.
//!
//! Rows arrive fully classified and balanced; nothing here recomputes them.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fleet_ledger::{ExportRow, ProfitLossReport};
use std::fmt::Write as _;
use std::io::Write;

use crate::config::DisplaySection;

/// `-₹1,250` style amount with thousands separators.
pub fn format_money(amount: i64, symbol: &str) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{symbol}{grouped}")
}

/// Falls back to `%Y-%m-%d` when `fmt` has an invalid specifier.
pub fn format_date(date: Option<DateTime<Utc>>, fmt: &str) -> String {
    let Some(date) = date else {
        return "-".to_string();
    };
    let mut out = String::new();
    if write!(out, "{}", date.format(fmt)).is_err() {
        return date.format("%Y-%m-%d").to_string();
    }
    out
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// CSV with plain signed integers so spreadsheets can sum them.
pub fn write_csv<W: Write>(rows: &[ExportRow], display: &DisplaySection, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "entity", "date", "category", "module", "status", "amount", "balance", "notes",
    ])
        .context("writing csv header")?;
    for row in rows {
        wtr.write_record([
            row.entity.clone(),
            format_date(row.date, &display.date_format),
            row.category.clone(),
            row.module.clone(),
            row.status.to_string(),
            row.signed_amount.to_string(),
            row.running_balance.to_string(),
            row.notes.clone(),
        ])
        .context("writing csv row")?;
    }
    wtr.flush().context("flushing csv")?;
    Ok(())
}

/// Standalone HTML document handed to the PDF renderer.
pub fn render_html(
    title: &str,
    rows: &[ExportRow],
    report: Option<&ProfitLossReport>,
    display: &DisplaySection,
) -> String {
    let money = |amount: i64| escape_html(&format_money(amount, &display.currency_symbol));
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    html.push_str(&format!("<title>{}</title>", escape_html(title)));
    html.push_str("<style>td.num{text-align:right}.neg{color:#b00020}</style></head><body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));

    if let Some(report) = report {
        html.push_str("<table class=\"summary\">\n<tr><th>Entity</th><th>Income</th><th>Expense</th><th>Net</th><th>Entries</th></tr>\n");
        for row in &report.rows {
            html.push_str(&format!(
                "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}/{}</td></tr>\n",
                escape_html(&row.entity_label),
                money(row.income_total),
                money(row.expense_total),
                money(row.net_total),
                row.approved_entry_count,
                row.entry_count,
            ));
        }
        html.push_str(&format!(
            "<tr><th>Total</th><th class=\"num\">{}</th><th class=\"num\">{}</th><th class=\"num\">{}</th><th class=\"num\">{}/{}</th></tr>\n</table>\n",
            money(report.totals.income_total),
            money(report.totals.expense_total),
            money(report.totals.net_total),
            report.totals.approved_entry_count,
            report.totals.entry_count,
        ));
    }

    html.push_str("<table class=\"ledger\">\n<tr><th>Entity</th><th>Date</th><th>Category</th><th>Module</th><th>Status</th><th>Amount</th><th>Balance</th><th>Notes</th></tr>\n");
    for row in rows {
        let class = if row.signed_amount < 0 { "num neg" } else { "num" };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"{class}\">{}</td><td class=\"num\">{}</td><td>{}</td></tr>\n",
            escape_html(&row.entity),
            escape_html(&format_date(row.date, &display.date_format)),
            escape_html(&row.category),
            escape_html(&row.module),
            row.status,
            money(row.signed_amount),
            money(row.running_balance),
            escape_html(&row.notes),
        ));
    }
    html.push_str("</table>\n</body></html>\n");
    html
}
