use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use rust_decimal::Decimal;

use crate::fmt::dollars;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const BOLD: Style = Style::new().add_modifier(Modifier::BOLD);

/// Whole-dollar amount colored by sign.
pub fn money_span(amount: Decimal) -> Span<'static> {
    let style = if amount < Decimal::ZERO {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(dollars(amount), style)
}

/// Delta text colored by whether it is good news.
pub fn delta_span(text: &str, favorable: Option<bool>) -> Span<'static> {
    let style = match favorable {
        Some(true) => AMOUNT_POS_STYLE,
        Some(false) => AMOUNT_NEG_STYLE,
        None => FOOTER_STYLE,
    };
    Span::styled(text.to_string(), style)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_wrap_text_counts_lines() {
        let (wrapped, lines) = wrap_text("Net income finished $70 above budget.", 20);
        assert_eq!(lines, 2);
        assert!(wrapped.lines().all(|l| l.len() <= 20));
        assert_eq!(wrap_text("x", 0), ("x".to_string(), 1));
    }

    #[test]
    fn test_money_span_colors_by_sign() {
        assert_eq!(money_span(dec!(-5)).style, AMOUNT_NEG_STYLE);
        assert_eq!(money_span(dec!(5)).content, "$5");
        assert_eq!(delta_span("$0", None).style, FOOTER_STYLE);
    }
}
