//! Core types for the SÚKL medicines registry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical SÚKL code: digits with leading zeros stripped
pub type SuklCode = String;

/// Width of the zero-padded code form used by SÚKL itself
pub const PADDED_CODE_WIDTH: usize = 7;

/// Normalize a SÚKL code so `"0000123"` and `"123"` resolve to the same key.
///
/// Leading zeros are stripped; at least one digit is always kept, so an
/// all-zero (or empty) code becomes `"0"`. Surrounding whitespace is ignored.
pub fn normalize_code(code: &str) -> SuklCode {
    let stripped = code.trim().trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// Zero-padded 7-digit form expected by the SÚKL document registry
pub fn padded_code(code: &str) -> String {
    format!("{:0>width$}", normalize_code(code), width = PADDED_CODE_WIDTH)
}

/// Round to two decimal places (currency)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Patient surcharge: what is left of the maximum price after the insurer's
/// reimbursement, rounded to cents and never negative.
pub fn patient_surcharge(max_price: Option<f64>, reimbursement: Option<f64>) -> Option<f64> {
    match (max_price, reimbursement) {
        (Some(price), Some(amount)) => {
            let rounded = round2(price - amount);
            Some(if rounded <= 0.0 { 0.0 } else { rounded })
        }
        _ => None,
    }
}

/// One registered medicinal product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineRecord {
    /// Normalized SÚKL code (unique)
    pub sukl_code: SuklCode,
    pub name: String,
    pub strength: Option<String>,
    pub form: Option<String>,
    /// Package description (balení)
    pub package: Option<String>,
    pub atc_code: Option<String>,
    /// Active substance
    pub substance: Option<String>,
    /// Marketing authorization holder
    pub holder: Option<String>,
    /// Registration status code ("R" = registered)
    pub registration_status: Option<String>,
    /// Dispensing category
    pub dispensing: Option<String>,
}

/// Subset of [`MedicineRecord`] returned by list-style operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineBasic {
    pub sukl_code: SuklCode,
    pub name: String,
    pub strength: Option<String>,
    pub form: Option<String>,
    pub package: Option<String>,
    pub atc_code: Option<String>,
    pub substance: Option<String>,
    pub holder: Option<String>,
    pub registration_status: Option<String>,
}

impl From<&MedicineRecord> for MedicineBasic {
    fn from(m: &MedicineRecord) -> Self {
        Self {
            sukl_code: m.sukl_code.clone(),
            name: m.name.clone(),
            strength: m.strength.clone(),
            form: m.form.clone(),
            package: m.package.clone(),
            atc_code: m.atc_code.clone(),
            substance: m.substance.clone(),
            holder: m.holder.clone(),
            registration_status: m.registration_status.clone(),
        }
    }
}

/// Node of the WHO ATC classification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtcEntry {
    pub code: String,
    /// Czech display name
    pub name_cs: String,
    pub level: u8,
    /// Advisory only; not checked at load time
    pub parent_code: Option<String>,
}

/// ATC entry with the medicines classified under it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtcDetail {
    #[serde(flatten)]
    pub entry: AtcEntry,
    pub medicines: Vec<MedicineBasic>,
    pub medicines_total: usize,
}

/// One registered pharmacy workplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacyRecord {
    /// Workplace code (KOD_PRACOVISTE)
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub web: Option<String>,
    pub has_erecept: bool,
    pub is_24h: bool,
}

/// Filters for pharmacy lookup; all given filters must match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PharmacyFilter {
    /// Case-insensitive substring of the city name
    pub city: Option<String>,
    /// Postal code prefix
    pub postal_code: Option<String>,
    pub is_24h: Option<bool>,
}

impl PharmacyFilter {
    pub fn matches(&self, pharmacy: &PharmacyRecord) -> bool {
        if let Some(city) = &self.city {
            if !pharmacy
                .city
                .to_lowercase()
                .contains(&city.to_lowercase())
            {
                return false;
            }
        }
        if let Some(prefix) = &self.postal_code {
            if !pharmacy.postal_code.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(is_24h) = self.is_24h {
            if pharmacy.is_24h != is_24h {
                return false;
            }
        }
        true
    }
}

/// Pricing and insurance coverage for one SÚKL code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReimbursementRecord {
    pub sukl_code: SuklCode,
    /// Prescription restriction group (e.g. "ATB", "DIA,END,INT")
    pub reimbursement_group: Option<String>,
    pub max_price: Option<f64>,
    pub reimbursement_amount: Option<f64>,
    pub patient_surcharge: Option<f64>,
}

/// Market availability as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Available,
    Limited,
    Unavailable,
    Unknown,
}

impl AvailabilityStatus {
    /// Provisional heuristic: registered products count as available.
    /// There is no live distribution feed behind this.
    pub fn from_registration(status: Option<&str>) -> Self {
        match status {
            Some("R") => AvailabilityStatus::Available,
            _ => AvailabilityStatus::Unknown,
        }
    }
}

/// Availability summary for one medicine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityInfo {
    pub sukl_code: SuklCode,
    pub name: String,
    pub status: AvailabilityStatus,
    pub last_checked: DateTime<Utc>,
    pub distribution_status: Option<String>,
    pub expected_availability: Option<String>,
    pub notes: Option<String>,
}

/// Result of checking several codes at once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAvailability {
    pub results: Vec<AvailabilityInfo>,
    pub total_checked: usize,
    pub available_count: usize,
    pub unavailable_count: usize,
    pub checked_at: DateTime<Utc>,
}

/// Ranked search output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub medicines: Vec<MedicineBasic>,
    pub total_count: usize,
    pub search_time_ms: u64,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self {
            medicines: Vec::new(),
            total_count: 0,
            search_time_ms: 0,
        }
    }
}

/// Regulatory document kinds published per product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Patient Information Leaflet (příbalový leták)
    #[serde(rename = "PIL")]
    Pil,
    /// Summary of Product Characteristics
    #[serde(rename = "SPC")]
    Spc,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pil => "PIL",
            DocumentKind::Spc => "SPC",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PIL" => Ok(DocumentKind::Pil),
            "SPC" | "SMPC" => Ok(DocumentKind::Spc),
            other => Err(format!("Unknown document type: {}", other)),
        }
    }
}

/// Document metadata plus a download link (content itself is not fetched)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentContent {
    pub sukl_code: SuklCode,
    pub document_type: DocumentKind,
    pub title: String,
    /// Human-readable status message for the caller
    pub content: String,
    pub language: String,
    pub document_id: Option<String>,
    pub document_url: Option<String>,
}

/// Counts and freshness of the loaded dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataStats {
    pub medicines: usize,
    pub atc_codes: usize,
    pub pharmacies: usize,
    pub reimbursements: usize,
    /// Timestamp recorded by the bundle build step
    pub bundle_timestamp: Option<String>,
    pub loaded_at: DateTime<Utc>,
    pub cache_age_secs: u64,
}
