//! Display formatting for prices, dates and estados.
//!
//! Output follows the Spanish (es-ES) conventions used across the inventory:
//! whole euros with `.` grouping from five integer digits on, and short dates
//! like `15 ene 2024, 10:30`. Dates are rendered in UTC.

use chrono::{DateTime, Datelike, Timelike, Utc};
use shared::Estado;

const MONTHS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

/// Format a euro amount without decimals, e.g. `225.000 €`
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    // es-ES only groups thousands when there are at least five integer digits
    let grouped = if digits.len() >= 5 {
        group_thousands(&digits)
    } else {
        digits
    };

    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}\u{a0}€", sign, grouped)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Format an optional price, `—` when unknown
pub fn format_optional_currency(amount: Option<f64>) -> String {
    amount.map(format_currency).unwrap_or_else(|| "—".to_string())
}

/// Format a timestamp as `15 ene 2024, 10:30`
pub fn format_date(date: DateTime<Utc>) -> String {
    format!(
        "{} {} {}, {:02}:{:02}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year(),
        date.hour(),
        date.minute()
    )
}

/// Badge classes for an estado
pub fn estado_color(estado: Estado) -> &'static str {
    match estado {
        Estado::Libre => "bg-green-100 text-green-800 border-green-200",
        Estado::Bloqueada => "bg-yellow-100 text-yellow-800 border-yellow-200",
        Estado::Reservada => "bg-red-100 text-red-800 border-red-200",
    }
}

/// Chart color for an estado
pub fn estado_hex(estado: Estado) -> &'static str {
    match estado {
        Estado::Libre => "#10b981",
        Estado::Bloqueada => "#f59e0b",
        Estado::Reservada => "#ef4444",
    }
}

pub fn estado_icon(estado: Estado) -> &'static str {
    match estado {
        Estado::Libre => "check-circle",
        Estado::Bloqueada => "lock",
        Estado::Reservada => "user-check",
    }
}

/// Plural label used on dashboard cards and in the distribution chart
pub fn estado_plural_label(estado: Estado) -> &'static str {
    match estado {
        Estado::Libre => "Libres",
        Estado::Bloqueada => "Bloqueadas",
        Estado::Reservada => "Reservadas",
    }
}
