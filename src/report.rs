//! Plain-text rendering of extraction results and costs.
//!
//! Kept in the library rather than the binary so the formatting rules
//! (grouped token counts, four-decimal USD, whole-unit local currency) are
//! unit-testable.

use crate::cost::{CurrencyDisplay, UsageCost};
use crate::extract::{CardReport, SideReport};
use crate::schema::{ExtractionResult, Side, StayTable};
use std::fmt::Write as _;

/// `1234567` → `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `$0.0075 (≈ ₩11)`.
pub fn format_total(usd: f64, currency: &CurrencyDisplay) -> String {
    format!("${:.4} (≈ {})", usd, currency.format(usd))
}

/// Field block for a parsed result.
pub fn render_result(result: &ExtractionResult) -> String {
    let mut out = String::new();
    for (key, value) in result.scalar_fields() {
        let _ = writeln!(out, "  {:<18} {}", format!("{key}:"), value);
    }
    if let ExtractionResult::Back(back) = result {
        if let StayTable::Masked(value) = &back.duration_of_stay {
            let _ = writeln!(out, "  {:<18} {}", "Duration of Stay:", value);
            return out;
        }
        let _ = writeln!(out, "  Duration of Stay:");
        if back.duration_of_stay.rows().is_empty() {
            let _ = writeln!(out, "    (no rows)");
        }
        for (i, row) in back.duration_of_stay.rows().iter().enumerate() {
            let _ = writeln!(
                out,
                "    {:>2}. {} → {}  {}",
                i + 1,
                row.start_date,
                row.end_date,
                row.check
            );
        }
    }
    out
}

/// Token and cost breakdown for one call.
pub fn render_cost(cost: &UsageCost, currency: &CurrencyDisplay) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  Tokens:  {} in / {} out",
        group_thousands(cost.prompt_tokens),
        group_thousands(cost.completion_tokens)
    );
    let _ = writeln!(
        out,
        "  Cost:    ${:.4} in / ${:.4} out",
        cost.input_cost, cost.output_cost
    );
    let _ = writeln!(out, "  Total:   {}", format_total(cost.total_cost, currency));
    out
}

/// Full block for one side, success or failure.
pub fn render_side(report: &SideReport, currency: &CurrencyDisplay) -> String {
    let title = match report.side {
        Side::Front => "Front",
        Side::Back => "Back",
    };
    let mut out = format!(
        "── {} ({:.2}s) ──\n",
        title,
        report.duration_ms as f64 / 1000.0
    );
    if let Some(ref result) = report.result {
        out.push_str(&render_result(result));
    }
    if let Some(ref cost) = report.cost {
        out.push_str(&render_cost(cost, currency));
    }
    if let Some(ref error) = report.error {
        let _ = writeln!(out, "  Error:   {error}");
    }
    out
}

/// Every side followed by the session total.
pub fn render_card(report: &CardReport, currency: &CurrencyDisplay) -> String {
    let mut out = String::new();
    for side in &report.sides {
        out.push_str(&render_side(side, currency));
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "Session total: {}",
        format_total(report.total.total_cost, currency)
    );
    out
}
