//! Fixed-point stake arithmetic.
//!
//! Stakes and percentages share one unit: hundredths of a percent.
//! `10_000` is 100.00%, `1` is 0.01%.
//!
//! All arithmetic is checked and products are widened to 128 bits. Overflow
//! rejects the operation instead of wrapping, so a failed computation never
//! reaches the ledger.

use crate::error::{Error, Result};

/// A stake or equity amount, in hundredths of a percent of some total.
pub type Amount = u64;

/// 100.00% in stake units.
pub const FULL_STAKE: Amount = 10_000;

/// Result of issuing a new slice of equity by dilution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dilution {
    /// Amount issued to the new holder.
    pub new_stake: Amount,
    /// Total equity after issuance.
    pub new_total: Amount,
}

/// Checked addition.
pub fn add(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_add(b).ok_or(Error::ArithmeticOverflow)
}

/// Checked subtraction.
pub fn sub(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_sub(b).ok_or(Error::ArithmeticOverflow)
}

/// `a × b / d` with a 128-bit intermediate. Fails only when the quotient
/// does not fit an `Amount`.
fn mul_div(a: Amount, b: Amount, d: Amount) -> Result<Amount> {
    let wide = u128::from(a) * u128::from(b) / u128::from(d);
    Amount::try_from(wide).map_err(|_| Error::ArithmeticOverflow)
}

/// Compute the stake to issue so the new holder owns `percent` of the
/// enlarged total.
///
/// Formula: `new_total = total × 10000 / (10000 − percent)`,
/// `new_stake = new_total − total`. Integer division rounds the new total
/// down, so the holder receives at most the requested share.
///
/// `percent` must lie in `1..10000`: 100% would divide by zero and 0% would
/// issue an empty stake.
///
/// # Examples
///
/// ```
/// use equity_ledger::compute_diluted_stake;
///
/// let dilution = compute_diluted_stake(10_000, 1_000).unwrap(); // 10%
/// assert_eq!(dilution.new_total, 11_111);
/// assert_eq!(dilution.new_stake, 1_111);
/// ```
pub fn compute_diluted_stake(total: Amount, percent: Amount) -> Result<Dilution> {
    if percent == 0 || percent >= FULL_STAKE {
        return Err(Error::InvalidDilutionPercent(percent));
    }
    let new_total = mul_div(total, FULL_STAKE, FULL_STAKE - percent)?;
    let new_stake = sub(new_total, total)?;
    Ok(Dilution {
        new_stake,
        new_total,
    })
}

/// A stake as a share of `total`, in stake units.
///
/// Multiplies before dividing so the two implied decimals survive; the
/// product is taken in 128 bits so large totals stay exact.
/// Returns 0 when `total` is 0.
pub fn stake_percent(stake: Amount, total: Amount) -> Result<Amount> {
    if total == 0 {
        return Ok(0);
    }
    mul_div(stake, FULL_STAKE, total)
}

/// Render stake units as a percentage string, e.g. `1234` → `"12.34%"`.
pub fn format_percent(units: Amount) -> String {
    format!("{}.{:02}%", units / 100, units % 100)
}
