// src/utils/mod.rs
// ============================================================================
// UTILITIES
// ============================================================================
// Shared helpers:
// 1. Logging setup
// 2. Display formatting for amounts and names
// ============================================================================

pub use logging::{init_logging, init_logging_from_env, LogFormat, LogLevel, LoggingConfig, LoggingGuard};

pub mod logging;

use crate::params::{NEAR_DISPLAY_DECIMALS, YOCTO_PER_NEAR};

/// Where to cut a string that is too long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncateAt {
    Middle,
    End,
}

/// Truncate to at most `max` characters (plus an ellipsis).
pub fn truncate_text(text: &str, at: TruncateAt, max: usize) -> String {
    let len = text.chars().count();
    if len <= max {
        return text.to_string();
    }
    match at {
        TruncateAt::End => format!("{}...", text.chars().take(max).collect::<String>()),
        TruncateAt::Middle => {
            let head = max.div_ceil(2);
            let tail = max - head;
            let start: String = text.chars().take(head).collect();
            let end: String = text.chars().skip(len - tail).collect();
            format!("{}...{}", start, end)
        }
    }
}

/// Render a yoctoNEAR amount as NEAR, rounded to four decimals, with
/// thousands separators and trailing zeros trimmed.
pub fn format_near_amount(yocto: u128) -> String {
    let unit = YOCTO_PER_NEAR / 10u128.pow(NEAR_DISPLAY_DECIMALS);
    // Round half up at the last shown decimal.
    let scaled = yocto / unit + u128::from(yocto % unit >= unit / 2);
    let divisor = 10u128.pow(NEAR_DISPLAY_DECIMALS);
    let whole = scaled / divisor;
    let fraction = scaled % divisor;

    let whole = group_thousands(&whole.to_string());
    if fraction == 0 {
        return whole;
    }
    let fraction = format!("{:0width$}", fraction, width = NEAR_DISPLAY_DECIMALS as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
