use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::pagination::PaginationMeta;
use crate::utils::format::format_file_size;

// ============================================================================
// IMÁGENES DE VUELO
// ============================================================================

/// Entrada cruda de `list-images`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageListResponse {
    #[serde(alias = "items")]
    pub images: Vec<ImageEntry>,
    #[serde(default)]
    pub pagination: PaginationMeta,
}

/// Imagen lista para la galería
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightImage {
    /// "{vuelo}_{página}_{índice}"
    pub id: String,
    pub src: String,
    pub thumbnail: String,
    pub alt: String,
    pub name: String,
    pub size: String,
    pub upload_date: String,
    pub key: String,
    pub etag: Option<String>,
    pub page: u32,
}

impl FlightImage {
    pub fn from_entry(flight: &str, page: u32, index: usize, entry: ImageEntry, fallback_date: &str) -> Self {
        Self {
            id: format!("{}_{}_{}", flight, page, index),
            src: entry.url.clone(),
            thumbnail: entry.url,
            alt: format!("{} del vuelo {}", entry.filename, flight),
            size: format_file_size(entry.size),
            upload_date: entry
                .last_modified
                .unwrap_or_else(|| fallback_date.to_string()),
            name: entry.filename,
            key: entry.key,
            etag: entry.etag,
            page,
        }
    }
}

// ============================================================================
// VUELOS: nombres "{ruta}-YYYYMMDD-HHMM"
// ============================================================================

/// `list-flights` devuelve `{ flights: [...] }` o directamente el array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlightListPayload {
    Wrapped { flights: Vec<String> },
    Bare(Vec<String>),
}

impl FlightListPayload {
    pub fn into_names(self) -> Vec<String> {
        match self {
            FlightListPayload::Wrapped { flights } => flights,
            FlightListPayload::Bare(flights) => flights,
        }
    }
}

/// Fecha "YYYYMMDD" del nombre del vuelo
pub fn flight_date_key(name: &str) -> Option<&str> {
    let mut parts = name.rsplit('-');
    let _time = parts.next()?;
    let date = parts.next()?;
    if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) {
        Some(date)
    } else {
        None
    }
}

/// Fecha y hora del vuelo; None si el nombre no sigue el formato
pub fn flight_timestamp(name: &str) -> Option<NaiveDateTime> {
    let mut parts = name.rsplit('-');
    let time = parts.next()?;
    let date = parts.next()?;

    let valid = date.len() == 8
        && time.len() == 4
        && date.bytes().all(|b| b.is_ascii_digit())
        && time.bytes().all(|b| b.is_ascii_digit());
    if !valid {
        return None;
    }

    NaiveDateTime::parse_from_str(&format!("{}{}", date, time), "%Y%m%d%H%M").ok()
}

/// Más recientes primero; los nombres sin fecha van al final en su orden original
pub fn sort_newest_first(flights: &mut [String]) {
    flights.sort_by(|a, b| flight_timestamp(b).cmp(&flight_timestamp(a)));
}

/// Nombre de vuelo a partir de la ruta y un instante
pub fn compose_flight_name(route: &str, at: NaiveDateTime) -> String {
    format!("{}-{}", route, at.format("%Y%m%d-%H%M"))
}

/// Filtro por fecha sobre la lista completa de vuelos
#[derive(Debug, Clone, PartialEq)]
pub enum FlightFilter {
    All,
    SingleDay(NaiveDate),
    /// Rango inclusivo, extremos opcionales
    Range {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl FlightFilter {
    pub fn matches(&self, flight: &str) -> bool {
        match self {
            FlightFilter::All => true,
            FlightFilter::Range { from: None, to: None } => true,
            FlightFilter::SingleDay(day) => {
                flight_date_key(flight) == Some(day.format("%Y%m%d").to_string().as_str())
            }
            FlightFilter::Range { from, to } => {
                let Some(date) = flight_date_key(flight) else {
                    return false;
                };
                if let Some(from) = from {
                    if date < from.format("%Y%m%d").to_string().as_str() {
                        return false;
                    }
                }
                if let Some(to) = to {
                    if date > to.format("%Y%m%d").to_string().as_str() {
                        return false;
                    }
                }
                true
            }
        }
    }

    pub fn apply(&self, flights: &[String]) -> Vec<String> {
        flights.iter().filter(|f| self.matches(f)).cloned().collect()
    }
}
