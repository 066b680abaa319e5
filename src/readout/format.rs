//! Text formatting for the three readout rows.

use crate::frame::sky::normalize_ra;

/// Zero-padded fixed point, e.g. `00.0`, `-1.0`, `12.3` for one decimal.
pub fn format_pixel(value: f64, decimals: usize) -> String {
    format!("{:0width$.prec$}", value, width = decimals + 3, prec = decimals)
}

/// Signed scientific notation with a two-digit exponent, e.g. `+1.00000e+00`.
pub fn format_scientific(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "+nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+inf" } else { "-inf" }.to_string();
    }
    let raw = format!("{:+.prec$e}", value, prec = decimals);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => raw,
    }
}

/// Finest sexagesimal precision; more digits are clamped to this.
pub const MAX_SEXAGESIMAL_DECIMALS: u32 = 9;

/// Split an angle in degrees into whole units, minutes and scaled seconds,
/// rounding once at the requested precision so carries propagate.
fn sexagesimal_parts(value: f64, units_per_degree: f64, decimals: u32) -> (u64, u64, u64) {
    let scale = 10u64.pow(decimals);
    let total = (value * units_per_degree * 3600.0 * scale as f64).round() as u64;
    let unit = 3600 * scale;
    (total / unit, (total % unit) / (60 * scale), total % (60 * scale))
}

fn format_seconds(scaled: u64, decimals: u32) -> String {
    let scale = 10u64.pow(decimals);
    let width = if decimals == 0 { 2 } else { decimals as usize + 3 };
    format!(
        "{:0width$.prec$}",
        scaled as f64 / scale as f64,
        width = width,
        prec = decimals as usize
    )
}

/// Right ascension in hours, e.g. `22h30m04.8674s`.
pub fn format_hms(ra_deg: f64, decimals: u32) -> String {
    let decimals = decimals.min(MAX_SEXAGESIMAL_DECIMALS);
    let (h, m, s) = sexagesimal_parts(normalize_ra(ra_deg), 1.0 / 15.0, decimals);
    format!("{:02}h{:02}m{}s", h % 24, m, format_seconds(s, decimals))
}

/// Declination with an explicit sign, e.g. `-20d49m59.9990s`.
pub fn format_dms(dec_deg: f64, decimals: u32) -> String {
    let decimals = decimals.min(MAX_SEXAGESIMAL_DECIMALS);
    let sign = if dec_deg < 0.0 { '-' } else { '+' };
    let (d, m, s) = sexagesimal_parts(dec_deg.abs(), 1.0, decimals);
    format!("{}{:02}d{:02}m{}s", sign, d, m, format_seconds(s, decimals))
}
