use crate::error::AppError;
use alloy_primitives::U256;
use chrono::{DateTime, NaiveDate, Utc};

/// IDRX token decimals on-chain.
pub const IDRX_DECIMALS: u32 = 18;

const WEI_PER_IDRX: f64 = 10u64.pow(IDRX_DECIMALS) as f64;

/// Convert an IDRX amount to token base units, flooring fractional wei.
pub fn to_idrx_wei(amount: f64) -> U256 {
    if amount <= 0.0 {
        return U256::ZERO;
    }
    let scaled = (amount * WEI_PER_IDRX).floor();
    U256::from(scaled as u128)
}

/// Convert token base units back to an IDRX amount.
pub fn from_idrx_wei(wei: U256) -> f64 {
    match u128::try_from(wei) {
        Ok(v) => v as f64 / WEI_PER_IDRX,
        // Out of range for display purposes; clamp rather than panic.
        Err(_) => f64::MAX,
    }
}

/// Group an IDRX amount with id-ID thousand separators, e.g. `1.500.000`.
pub fn format_idrx(amount: f64) -> String {
    let rounded = amount.round() as i128;
    let negative = rounded < 0;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Funding progress as a percentage, clamped to 0..100.
pub fn calculate_progress(current: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    (current / target * 100.0).clamp(0.0, 100.0)
}

/// Simple-interest profit estimate: monthly rate times duration.
pub fn calculate_estimated_profit(amount: f64, roi_percentage: f64, duration_months: u32) -> f64 {
    let monthly_rate = roi_percentage / 12.0 / 100.0;
    amount * monthly_rate * duration_months as f64
}

/// Principal plus full-period ROI.
pub fn expected_return(amount: f64, roi_percentage: f64) -> f64 {
    amount * (1.0 + roi_percentage / 100.0)
}

/// Whole days until `end_date`, floored at zero. Accepts RFC 3339 timestamps
/// or bare `YYYY-MM-DD` dates.
pub fn days_remaining(end_date: &str) -> i64 {
    let end = match DateTime::parse_from_rfc3339(end_date) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => match NaiveDate::parse_from_str(end_date, "%Y-%m-%d") {
            Ok(date) => match date.and_hms_opt(0, 0, 0) {
                Some(naive) => DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc),
                None => return 0,
            },
            Err(_) => return 0,
        },
    };

    let secs = (end - Utc::now()).num_seconds();
    if secs <= 0 {
        0
    } else {
        // Ceiling division so a partial day still counts.
        (secs + 86_399) / 86_400
    }
}

/// `0x1234...abcd` style display form for addresses and hashes.
pub fn shorten_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Validate an investment amount against the campaign minimum and the
/// investor's balance. Rejection here means no transaction is submitted.
pub fn validate_investment(amount: f64, minimum: f64, balance: f64) -> Result<(), AppError> {
    if amount <= 0.0 {
        return Err(AppError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    if amount < minimum {
        return Err(AppError::InvalidAmount(format!(
            "minimum investment is Rp {}",
            format_idrx(minimum)
        )));
    }
    if amount > balance {
        return Err(AppError::InsufficientBalance(
            "insufficient IDRX balance".to_string(),
        ));
    }
    Ok(())
}
