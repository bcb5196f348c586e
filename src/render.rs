use crate::schema::{DetectionResponse, DetectionStatus};
use colored::Colorize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub color: bool,
    /// Replace every underscore in keys, not just the first
    pub normalize_keys: bool,
}

/// Visual treatment of the status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStyle {
    /// Hidden data is likely present
    Warning,
    Positive,
}

pub fn status_style(status: DetectionStatus) -> StatusStyle {
    match status {
        DetectionStatus::Likely => StatusStyle::Warning,
        DetectionStatus::Unlikely => StatusStyle::Positive,
    }
}

/// `0.87` -> `87.00%`
pub fn format_percent(value: f64) -> String {
    format!("{}%", to_fixed_2(value * 100.0))
}

/// Two decimals, rounding the exact binary value with ties away from zero
/// (`0.125` -> `0.13`), the way a browser's `toFixed(2)` does.
fn to_fixed_2(x: f64) -> String {
    if !x.is_finite() || x.abs() >= 1e21 {
        return format_number(x);
    }
    // 1074 fractional digits is the exact expansion of any finite f64
    let exact = format!("{:.1074}", x.abs());
    let (int, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut digits: Vec<u8> = int.bytes().chain(frac.bytes().take(2)).collect();
    if frac.as_bytes().get(2).is_some_and(|d| *d >= b'5') {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, b'1');
                break;
            }
            i -= 1;
            if digits[i] == b'9' {
                digits[i] = b'0';
            } else {
                digits[i] += 1;
                break;
            }
        }
    }
    let (whole, cents) = digits.split_at(digits.len() - 2);
    let sign = if x < 0.0 { "-" } else { "" };
    format!(
        "{sign}{}.{}",
        String::from_utf8_lossy(whole),
        String::from_utf8_lossy(cents)
    )
}

/// Shortest round-trip form, switching to exponent notation outside
/// `[1e-6, 1e21)` with an explicit `+` on positive exponents (`1e+21`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&n.abs()) {
        return n.to_string();
    }
    let sci = format!("{:e}", n);
    match sci.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => sci,
    }
}

pub fn format_key(key: &str, normalize: bool) -> String {
    if normalize {
        key.replace('_', " ")
    } else {
        key.replacen('_', " ", 1)
    }
}

fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().cyan().to_string()
    } else {
        text.to_string()
    }
}

fn styled_status(status: DetectionStatus, color: bool) -> String {
    let label = status.as_str();
    if !color {
        return label.to_string();
    }
    match status_style(status) {
        StatusStyle::Warning => label.red().bold().to_string(),
        StatusStyle::Positive => label.green().to_string(),
    }
}

fn push_row(out: &mut String, label: &str, value: &str) {
    out.push('\n');
    out.push_str("  ");
    out.push_str(label);
    out.push_str(": ");
    out.push_str(value);
}

/// Human-readable report for one response. Deterministic for a given input.
pub fn render_human(response: &DetectionResponse, opts: RenderOptions) -> String {
    let mut out = String::new();

    out.push_str(&heading("Detection Results:", opts.color));
    push_row(&mut out, "Filename", &response.filename);
    push_row(&mut out, "File Type", &response.file_type);
    push_row(
        &mut out,
        "Status",
        &styled_status(response.detection.status, opts.color),
    );
    push_row(
        &mut out,
        "Confidence",
        &format_percent(response.detection.confidence),
    );

    out.push('\n');
    out.push_str(&heading("Detection Details:", opts.color));
    for (key, value) in response.detection.details.iter() {
        push_row(
            &mut out,
            &format_key(key, opts.normalize_keys),
            &format_percent(*value),
        );
    }

    out.push('\n');
    out.push_str(&heading("Metadata:", opts.color));
    for (key, value) in response.metadata.iter() {
        push_row(
            &mut out,
            &format_key(key, opts.normalize_keys),
            &value.to_string(),
        );
    }

    out
}

pub fn render_json(response: &DetectionResponse) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(response)
}
