//! Bundled dataset wire format
//!
//! The offline build step writes one JSON document with single-letter keys to
//! keep the file small. Everything here is decoded straight into the named
//! domain types; no other module sees the compact representation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SuklError};
use crate::types::{
    normalize_code, patient_surcharge, AtcEntry, MedicineRecord, PharmacyRecord,
    ReimbursementRecord,
};

/// Top-level bundle document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundledData {
    /// Medicines
    #[serde(rename = "m", default)]
    pub medicines: Vec<BundledMedicine>,
    /// ATC classification
    #[serde(rename = "a", default)]
    pub atc: Vec<BundledAtc>,
    /// Pharmacies (older bundles lack them)
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub pharmacies: Option<Vec<BundledPharmacy>>,
    /// Reimbursements (older bundles lack them)
    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub reimbursements: Option<Vec<BundledReimbursement>>,
    #[serde(rename = "_", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BundleMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundledMedicine {
    #[serde(rename = "c")]
    pub code: String,
    #[serde(rename = "n", default)]
    pub name: String,
    #[serde(rename = "s", default)]
    pub strength: String,
    #[serde(rename = "f", default)]
    pub form: String,
    #[serde(rename = "p", default)]
    pub package: String,
    #[serde(rename = "a", default)]
    pub atc: String,
    #[serde(rename = "u", default)]
    pub substance: String,
    #[serde(rename = "h", default)]
    pub holder: String,
    #[serde(rename = "r", default)]
    pub registration: String,
    #[serde(rename = "d", default)]
    pub dispensing: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundledAtc {
    #[serde(rename = "c")]
    pub code: String,
    #[serde(rename = "n", default)]
    pub name: String,
    #[serde(rename = "l", default)]
    pub level: u8,
    #[serde(rename = "p", default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundledPharmacy {
    #[serde(rename = "n", default)]
    pub name: String,
    #[serde(rename = "k")]
    pub workplace_code: String,
    #[serde(rename = "a", default)]
    pub address: String,
    #[serde(rename = "c", default)]
    pub city: String,
    #[serde(rename = "z", default)]
    pub postal_code: String,
    #[serde(rename = "t", default)]
    pub phone: String,
    #[serde(rename = "e", default)]
    pub email: String,
    #[serde(rename = "w", default)]
    pub web: String,
    #[serde(rename = "r", default)]
    pub erecept: bool,
    #[serde(rename = "h", default)]
    pub emergency: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundledReimbursement {
    #[serde(rename = "c")]
    pub code: String,
    #[serde(rename = "g", default)]
    pub group: Option<String>,
    #[serde(rename = "m", default)]
    pub max_price: Option<f64>,
    #[serde(rename = "a", default)]
    pub amount: Option<f64>,
    #[serde(rename = "s", default)]
    pub surcharge: Option<f64>,
}

/// Build timestamp and per-collection counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleMetadata {
    #[serde(rename = "t", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "c", default)]
    pub counts: BundleCounts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleCounts {
    #[serde(rename = "m", default)]
    pub medicines: usize,
    #[serde(rename = "a", default)]
    pub atc: usize,
    #[serde(rename = "p", default)]
    pub pharmacies: Option<usize>,
    #[serde(rename = "r", default)]
    pub reimbursements: Option<usize>,
}

impl BundledData {
    /// Parse a bundle from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| SuklError::DataUnavailable(format!("bundle is not valid JSON: {}", e)))
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl From<BundledMedicine> for MedicineRecord {
    fn from(m: BundledMedicine) -> Self {
        Self {
            sukl_code: normalize_code(&m.code),
            name: m.name,
            strength: non_empty(m.strength),
            form: non_empty(m.form),
            package: non_empty(m.package),
            atc_code: non_empty(m.atc),
            substance: non_empty(m.substance),
            holder: non_empty(m.holder),
            registration_status: non_empty(m.registration),
            dispensing: non_empty(m.dispensing),
        }
    }
}

impl From<BundledAtc> for AtcEntry {
    fn from(a: BundledAtc) -> Self {
        Self {
            code: a.code,
            name_cs: a.name,
            level: a.level,
            parent_code: a.parent.and_then(non_empty),
        }
    }
}

impl From<BundledPharmacy> for PharmacyRecord {
    fn from(p: BundledPharmacy) -> Self {
        Self {
            id: p.workplace_code,
            name: p.name,
            address: p.address,
            city: p.city,
            postal_code: p.postal_code,
            phone: non_empty(p.phone),
            email: non_empty(p.email),
            web: non_empty(p.web),
            has_erecept: p.erecept,
            is_24h: p.emergency,
        }
    }
}

impl From<BundledReimbursement> for ReimbursementRecord {
    fn from(r: BundledReimbursement) -> Self {
        // Recompute when both inputs exist so the non-negative invariant holds
        // regardless of what the build step wrote.
        let surcharge = patient_surcharge(r.max_price, r.amount).or(r.surcharge);
        Self {
            sukl_code: normalize_code(&r.code),
            reimbursement_group: r.group.and_then(non_empty),
            max_price: r.max_price,
            reimbursement_amount: r.amount,
            patient_surcharge: surcharge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_compact_medicine() {
        let raw = r#"{"c":"0254045","n":"PARALEN 500","s":"500MG","f":"TBL NOB","p":"24","a":"N02BE01","u":"PARACETAMOL","h":"Opella","r":"R","d":""}"#;
        let bundled: BundledMedicine = serde_json::from_str(raw).unwrap();
        let record = MedicineRecord::from(bundled);

        assert_eq!(record.sukl_code, "254045");
        assert_eq!(record.name, "PARALEN 500");
        assert_eq!(record.atc_code.as_deref(), Some("N02BE01"));
        assert_eq!(record.dispensing, None);
    }

    #[test]
    fn test_decode_reimbursement_recomputes_surcharge() {
        let raw = r#"{"c":"0094156","g":"ATB","m":150.0,"a":200.0,"s":-50.0}"#;
        let bundled: BundledReimbursement = serde_json::from_str(raw).unwrap();
        let record = ReimbursementRecord::from(bundled);

        assert_eq!(record.sukl_code, "94156");
        assert_eq!(record.patient_surcharge, Some(0.0));
    }

    #[test]
    fn test_decode_reimbursement_keeps_bundled_surcharge_when_partial() {
        let raw = r#"{"c":"0094156","g":null,"m":null,"a":80.0,"s":12.5}"#;
        let record = ReimbursementRecord::from(
            serde_json::from_str::<BundledReimbursement>(raw).unwrap(),
        );
        assert_eq!(record.patient_surcharge, Some(12.5));
        assert_eq!(record.reimbursement_group, None);
    }

    #[test]
    fn test_bundle_without_optional_collections() {
        let raw = br#"{"m":[],"a":[],"_":{"t":"2026-01-01T00:00:00Z","c":{"m":0,"a":0}}}"#;
        let bundle = BundledData::from_slice(raw).unwrap();
        assert!(bundle.pharmacies.is_none());
        assert!(bundle.reimbursements.is_none());
        assert_eq!(
            bundle.metadata.unwrap().timestamp.as_deref(),
            Some("2026-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_invalid_bundle_is_data_unavailable() {
        let err = BundledData::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, SuklError::DataUnavailable(_)));
    }

    #[test]
    fn test_atc_root_has_no_parent() {
        let raw = r#"{"c":"N","n":"Nervový systém","l":1,"p":""}"#;
        let entry = AtcEntry::from(serde_json::from_str::<BundledAtc>(raw).unwrap());
        assert_eq!(entry.parent_code, None);
        assert_eq!(entry.level, 1);
    }
}
