// ============================================================================
// FORMATEO - Textos para la UI (tiempo restante, tamaños, fechas)
// ============================================================================

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;

const MONTHS_ES: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

/// "Hh Mm" o "Mm"; cero o negativo -> "0m"
pub fn format_remaining(ms: i64) -> String {
    if ms <= 0 {
        return "0m".to_string();
    }

    let hours = ms / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// 1536 -> "1.5 KB"
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Acepta RFC 3339 o "YYYY-MM-DDTHH:MM:SS" sin zona (se asume UTC)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// "hace 5 min", "hace 3h", "hace 2 días", o la fecha corta
pub fn format_relative_date(value: &str, now: DateTime<Utc>) -> String {
    if value.trim().is_empty() {
        return "Fecha no disponible".to_string();
    }

    let date = match parse_timestamp(value) {
        Some(date) => date,
        None => {
            log::warn!("⚠️ Fecha de notificación inválida: {}", value);
            return "Fecha inválida".to_string();
        }
    };

    let diff = now.signed_duration_since(date);
    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if minutes < 1 {
        "hace un momento".to_string()
    } else if minutes < 60 {
        format!("hace {} min", minutes)
    } else if hours < 24 {
        format!("hace {}h", hours)
    } else if days < 7 {
        format!("hace {} día{}", days, if days > 1 { "s" } else { "" })
    } else {
        format!(
            "{:02} {} {}",
            date.day(),
            MONTHS_ES[date.month0() as usize],
            date.year()
        )
    }
}

/// Percent-encoding para valores de query string (cursores opacos)
pub fn encode_query_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
