use rust_decimal::Decimal;

use crate::fmt::{dollars, pp_abs};
use crate::kpi::{KpiSnapshot, Variance};

/// Plain-language commentary on actual vs budget, in a fixed order: net
/// income, then revenue and margin rate (only with revenue), then opex.
pub fn insights(actual: &KpiSnapshot, budget: &KpiSnapshot, has_revenue: bool) -> Vec<String> {
    let v = Variance::between(actual, budget);
    let mut out = Vec::new();

    if v.net_income > Decimal::ZERO {
        out.push(format!("Net income finished {} above budget.", dollars(v.net_income)));
    } else if v.net_income < Decimal::ZERO {
        out.push(format!(
            "Net income finished {} below budget.",
            dollars(v.net_income.abs())
        ));
    } else {
        out.push("Net income finished in line with budget.".to_string());
    }

    if has_revenue {
        if v.revenue < Decimal::ZERO {
            out.push("Revenue came in below plan.".to_string());
        } else if v.revenue > Decimal::ZERO {
            out.push("Revenue exceeded plan.".to_string());
        }

        if v.gross_margin_pp > Decimal::ZERO {
            out.push(format!(
                "Gross margin rate improved by {} pp.",
                pp_abs(v.gross_margin_pp)
            ));
        } else if v.gross_margin_pp < Decimal::ZERO {
            out.push(format!(
                "Gross margin rate declined by {} pp.",
                pp_abs(v.gross_margin_pp)
            ));
        }
    }

    if v.opex_savings < Decimal::ZERO {
        out.push(format!(
            "Operating expenses were {} higher than budget.",
            dollars(v.opex_savings.abs())
        ));
    } else if v.opex_savings > Decimal::ZERO {
        out.push(format!(
            "Operating expenses were {} below budget.",
            dollars(v.opex_savings)
        ));
    }

    out
}

pub fn paragraph(sentences: &[String]) -> String {
    sentences.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::summarize;
    use crate::kpi::tests::{example_actuals, example_budget, row};
    use crate::models::Account;
    use rust_decimal_macros::dec;

    #[test]
    fn test_example_insights() {
        let actual = summarize(&example_actuals());
        let budget = summarize(&example_budget());
        let text = insights(&actual, &budget, true);
        assert_eq!(
            text,
            vec![
                "Net income finished $70 above budget.",
                "Revenue exceeded plan.",
                "Gross margin rate declined by 1.1 pp.",
                "Operating expenses were $20 higher than budget.",
            ]
        );
        assert!(paragraph(&text).contains("Net income finished $70 above budget."));
    }

    #[test]
    fn test_in_line_is_only_equality_branch() {
        let snap = summarize(&example_actuals());
        let text = insights(&snap, &snap, true);
        assert_eq!(text, vec!["Net income finished in line with budget."]);
    }

    #[test]
    fn test_below_budget_uses_absolute_amount() {
        let actual = summarize(&example_budget());
        let budget = summarize(&example_actuals());
        let text = insights(&actual, &budget, true);
        assert_eq!(text[0], "Net income finished $70 below budget.");
        assert_eq!(text[1], "Revenue came in below plan.");
        assert_eq!(text[2], "Gross margin rate improved by 1.1 pp.");
        assert_eq!(text[3], "Operating expenses were $20 below budget.");
    }

    #[test]
    fn test_cost_center_has_no_revenue_sentences() {
        let actual = summarize(&[row("Ops", (2024, 1, 1), Account::Opex, dec!(-500))]);
        let budget = summarize(&[row("Ops", (2024, 1, 1), Account::Opex, dec!(-450))]);
        let text = insights(&actual, &budget, false);
        assert_eq!(
            text,
            vec![
                "Net income finished $50 below budget.",
                "Operating expenses were $50 higher than budget.",
            ]
        );
        assert!(!text.iter().any(|s| s.contains("Revenue") || s.contains("margin")));
    }
}
