//! STX ↔ microSTX conversion.
//!
//! Integer-only: prices are split on the decimal point and scaled, so no
//! `f64` rounding ever reaches an advertised amount.

use crate::constants::STX_DECIMALS;
use crate::error::X402Error;

/// Parse a human-readable STX amount (`"0.1"`, `"2"`, `"1.5 STX"`) into microSTX.
///
/// Digits beyond the sixth decimal place are truncated.
pub fn stx_to_micro_stx(stx: &str) -> Result<u64, X402Error> {
    if stx.contains(['-', '+']) || has_exponent(stx) {
        return Err(X402Error::InvalidAmount(format!(
            "invalid STX amount '{stx}': signs and exponents are not allowed"
        )));
    }

    let cleaned: String = stx
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return Err(X402Error::InvalidAmount(format!(
            "invalid STX amount '{stx}': no numeric content"
        )));
    }

    let decimals = STX_DECIMALS as usize;
    let multiplier = 10u64.pow(STX_DECIMALS);
    let overflow = || X402Error::InvalidAmount(format!("invalid STX amount '{stx}': overflow"));

    let (integer_part, fractional_part) = cleaned
        .split_once('.')
        .unwrap_or((cleaned.as_str(), ""));

    let integer: u64 = if integer_part.is_empty() {
        0
    } else {
        integer_part.parse::<u64>().map_err(|e| {
            X402Error::InvalidAmount(format!("invalid STX amount '{stx}': integer part: {e}"))
        })?
    };

    let frac_str = &fractional_part[..fractional_part.len().min(decimals)];
    let fractional: u64 = if frac_str.is_empty() {
        0
    } else {
        frac_str.parse::<u64>().map_err(|e| {
            X402Error::InvalidAmount(format!("invalid STX amount '{stx}': fractional part: {e}"))
        })?
    };
    let scale = 10u64.pow((decimals - frac_str.len()) as u32);

    integer
        .checked_mul(multiplier)
        .ok_or_else(overflow)?
        .checked_add(fractional.checked_mul(scale).ok_or_else(overflow)?)
        .ok_or_else(overflow)
}

fn has_exponent(stx: &str) -> bool {
    stx.as_bytes()
        .windows(2)
        .any(|w| (w[0].is_ascii_digit() || w[0] == b'.') && matches!(w[1], b'e' | b'E'))
}

/// Render microSTX as a decimal STX string with trailing zeros trimmed.
pub fn micro_stx_to_stx(micro: u64) -> String {
    let multiplier = 10u64.pow(STX_DECIMALS);
    let whole = micro / multiplier;
    let frac = micro % multiplier;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = STX_DECIMALS as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
