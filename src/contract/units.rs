//! Ether/wei conversion at the UI boundary.
//!
//! Everything below the view controller works in wei (`U256`).

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::U256;

use crate::error::{SessionError, SessionResult};

/// Decimal places of the native currency.
pub const ETHER_DECIMALS: usize = 18;

/// Parse a positive decimal ether amount ("0.5") into wei.
pub fn parse_amount(input: &str) -> SessionResult<U256> {
    let amount = input.trim();
    let invalid = || SessionError::InvalidInput(format!("'{}' is not a valid amount", input));

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (amount, None),
    };
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) || !fraction.map_or(true, is_digits) {
        return Err(invalid());
    }
    if fraction.is_some_and(|f| f.len() > ETHER_DECIMALS) {
        return Err(SessionError::InvalidInput(format!(
            "'{}' has more than {} decimal places",
            input, ETHER_DECIMALS
        )));
    }

    let wei = parse_ether(amount).map_err(|_| invalid())?;
    if wei.is_zero() {
        return Err(SessionError::InvalidInput("amount must be positive".to_string()));
    }
    Ok(wei)
}

/// Render wei as ether without trailing zeros ("0.5", "1.0").
pub fn format_amount(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", formatted),
    }
}
