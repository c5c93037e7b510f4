//! Human-readable byte sizes (1024-based).

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Target unit for [`bytes_to_unit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Kb,
    Mb,
    Gb,
}

/// Formats a byte count with up to two decimals, e.g. `1.5 MB`, `500 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut exponent = 0usize;
    let mut value = bytes as f64;
    while value >= 1024.0 && exponent < UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }

    let mut number = format!("{value:.2}");
    if number.contains('.') {
        number = number.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{number} {}", UNITS[exponent])
}

/// Converts a byte count to the given unit.
pub fn bytes_to_unit(bytes: u64, unit: SizeUnit) -> f64 {
    let power = match unit {
        SizeUnit::Kb => 1,
        SizeUnit::Mb => 2,
        SizeUnit::Gb => 3,
    };
    bytes as f64 / 1024f64.powi(power)
}

/// Returns `true` if `size` does not exceed `max`.
pub fn is_file_size_valid(size: u64, max: u64) -> bool {
    size <= max
}
