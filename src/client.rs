//! Read-only query operations over the SÚKL dataset
//!
//! Every operation first asks the [`DataStore`] for a current snapshot, so
//! callers never deal with loading or refresh. Missing entities come back as
//! `None`; `Err` is reserved for an unusable dataset.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::data::DataStore;
use crate::error::{Result, SuklError};
use crate::registry::{DocumentListing, DocumentRegistry};
use crate::types::{
    padded_code, AtcDetail, AtcEntry, AvailabilityInfo, AvailabilityStatus, BatchAvailability,
    DataStats, DocumentContent, DocumentKind, MedicineBasic, MedicineRecord, PharmacyFilter,
    PharmacyRecord, ReimbursementRecord, SearchResponse,
};

/// Maximum number of codes checked by one batch availability call
pub const BATCH_AVAILABILITY_LIMIT: usize = 50;

const AVAILABILITY_NOTE: &str =
    "Data based on registration status. Real-time availability not yet implemented.";

/// Query service shared by the tool layer and the CLI
#[derive(Clone)]
pub struct SuklClient {
    store: Arc<DataStore>,
    registry: Arc<dyn DocumentRegistry>,
}

impl SuklClient {
    pub fn new(store: Arc<DataStore>, registry: Arc<dyn DocumentRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    /// Fuzzy search, best match first. The index scan runs on the blocking
    /// pool.
    pub async fn search(&self, query: &str, limit: usize) -> Result<SearchResponse> {
        let snapshot = self.store.snapshot().await?;
        let started = Instant::now();

        if snapshot.medicines().is_empty() {
            return Ok(SearchResponse::empty());
        }

        let query = query.to_string();
        let medicines: Vec<MedicineBasic> = tokio::task::spawn_blocking(move || {
            snapshot
                .search(&query, limit)
                .into_iter()
                .map(MedicineBasic::from)
                .collect()
        })
        .await
        .map_err(|e| SuklError::Internal(format!("search task failed: {}", e)))?;

        Ok(SearchResponse {
            total_count: medicines.len(),
            medicines,
            search_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Full record by SÚKL code in any zero-padding
    pub async fn get_by_code(&self, code: &str) -> Result<Option<MedicineRecord>> {
        let snapshot = self.store.snapshot().await?;
        Ok(snapshot.medicine(code).cloned())
    }

    pub async fn get_reimbursement(&self, code: &str) -> Result<Option<ReimbursementRecord>> {
        let snapshot = self.store.snapshot().await?;
        Ok(snapshot.reimbursement(code).cloned())
    }

    /// Exact ATC lookup
    pub async fn get_atc_info(&self, atc_code: &str) -> Result<Option<AtcEntry>> {
        let snapshot = self.store.snapshot().await?;
        Ok(snapshot.atc(atc_code).cloned())
    }

    /// All medicines whose ATC code starts with `prefix`, in bundle order
    pub async fn get_medicines_by_atc(&self, prefix: &str) -> Result<Vec<MedicineBasic>> {
        let snapshot = self.store.snapshot().await?;
        Ok(snapshot
            .medicines()
            .iter()
            .filter(|m| {
                m.atc_code
                    .as_deref()
                    .map_or(false, |atc| atc.starts_with(prefix))
            })
            .map(MedicineBasic::from)
            .collect())
    }

    /// ATC entry plus the first `limit` medicines classified under it
    pub async fn get_atc_detail(&self, atc_code: &str, limit: usize) -> Result<Option<AtcDetail>> {
        let Some(entry) = self.get_atc_info(atc_code).await? else {
            return Ok(None);
        };
        let mut medicines = self.get_medicines_by_atc(atc_code).await?;
        let medicines_total = medicines.len();
        medicines.truncate(limit);

        Ok(Some(AtcDetail {
            entry,
            medicines,
            medicines_total,
        }))
    }

    /// Availability derived from registration status.
    ///
    /// Registered products are reported as available; there is no live
    /// distribution feed behind this.
    pub async fn check_availability(&self, code: &str) -> Result<Option<AvailabilityInfo>> {
        let snapshot = self.store.snapshot().await?;
        Ok(snapshot.medicine(code).map(availability_of))
    }

    /// Availability for up to [`BATCH_AVAILABILITY_LIMIT`] codes; the rest
    /// are ignored and unknown codes are left out of the results.
    pub async fn batch_check_availability(&self, codes: &[String]) -> Result<BatchAvailability> {
        let snapshot = self.store.snapshot().await?;
        let checked = &codes[..codes.len().min(BATCH_AVAILABILITY_LIMIT)];

        let results: Vec<AvailabilityInfo> = checked
            .iter()
            .filter_map(|code| snapshot.medicine(code))
            .map(availability_of)
            .collect();

        let count = |status| results.iter().filter(|r| r.status == status).count();
        Ok(BatchAvailability {
            total_checked: checked.len(),
            available_count: count(AvailabilityStatus::Available),
            unavailable_count: count(AvailabilityStatus::Unavailable),
            results,
            checked_at: Utc::now(),
        })
    }

    /// Pharmacies matching every given filter, in bundle order
    pub async fn find_pharmacies(&self, filter: &PharmacyFilter) -> Result<Vec<PharmacyRecord>> {
        let snapshot = self.store.snapshot().await?;
        Ok(snapshot
            .pharmacies()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    /// PIL/SPC metadata and download link.
    ///
    /// `None` only when the medicine itself is unknown. Registry trouble of
    /// any kind degrades to a placeholder message.
    pub async fn get_document_content(
        &self,
        code: &str,
        kind: DocumentKind,
    ) -> Result<Option<DocumentContent>> {
        let Some(medicine) = self.get_by_code(code).await? else {
            return Ok(None);
        };

        let padded = padded_code(&medicine.sukl_code);
        let mut document = DocumentContent {
            sukl_code: medicine.sukl_code.clone(),
            document_type: kind,
            title: format!("{} - {}", kind, medicine.name),
            content: String::new(),
            language: "cs".to_string(),
            document_id: None,
            document_url: None,
        };

        match self.registry.list_documents(&padded).await {
            Ok(DocumentListing::Unavailable { status }) => {
                document.content = format!(
                    "Dokumenty pro {} nejsou v SÚKL API k dispozici (HTTP {}).",
                    medicine.name, status
                );
            }
            Ok(DocumentListing::Found(documents)) => {
                match documents
                    .into_iter()
                    .find(|d| d.kind.to_uppercase() == kind.as_str())
                {
                    Some(doc) => {
                        document.content = format!(
                            "Dokument {} pro přípravek {} je dostupný ke stažení. \
                             Pro zpracování obsahu PDF doporučujeme použít docling-mcp server.",
                            kind, medicine.name
                        );
                        document.document_url = Some(self.registry.document_url(&doc.id));
                        document.document_id = Some(doc.id);
                    }
                    None => {
                        document.content =
                            format!("Dokument {} pro {} není k dispozici.", kind, medicine.name);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    sukl_code = %padded,
                    kind = %kind,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Document registry lookup failed"
                );
                document.content = "Nepodařilo se získat dokument z SÚKL API.".to_string();
            }
        }

        Ok(Some(document))
    }

    pub async fn stats(&self) -> Result<DataStats> {
        Ok(self.store.snapshot().await?.stats())
    }
}

fn availability_of(medicine: &MedicineRecord) -> AvailabilityInfo {
    AvailabilityInfo {
        sukl_code: medicine.sukl_code.clone(),
        name: medicine.name.clone(),
        status: AvailabilityStatus::from_registration(medicine.registration_status.as_deref()),
        last_checked: Utc::now(),
        distribution_status: None,
        expected_availability: None,
        notes: Some(AVAILABILITY_NOTE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BundledAtc, BundledData, BundledMedicine, BundledPharmacy, BundledReimbursement};
    use crate::registry::DocumentMeta;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct FakeRegistry {
        listing: Option<DocumentListing>,
    }

    #[async_trait]
    impl DocumentRegistry for FakeRegistry {
        async fn list_documents(&self, _padded_code: &str) -> Result<DocumentListing> {
            self.listing
                .clone()
                .ok_or_else(|| SuklError::Registry("connection refused".into()))
        }

        fn document_url(&self, document_id: &str) -> String {
            format!("https://registry.test/dokumenty/{}", document_id)
        }
    }

    fn medicine(code: &str, name: &str, atc: &str, registration: &str) -> BundledMedicine {
        BundledMedicine {
            code: code.into(),
            name: name.into(),
            atc: atc.into(),
            registration: registration.into(),
            ..Default::default()
        }
    }

    fn fixture() -> BundledData {
        BundledData {
            medicines: vec![
                medicine("0254045", "PARALEN 500", "N02BE01", "R"),
                medicine("0094156", "IBALGIN 400", "M01AE01", "R"),
                medicine("0012345", "PANADOL", "N02BE01", "B"),
            ],
            atc: vec![BundledAtc {
                code: "N02BE01".into(),
                name: "Paracetamol".into(),
                level: 5,
                parent: Some("N02BE".into()),
            }],
            pharmacies: Some(vec![
                BundledPharmacy {
                    name: "Lékárna Na Poříčí".into(),
                    workplace_code: "1001".into(),
                    city: "Praha 1".into(),
                    postal_code: "11000".into(),
                    emergency: true,
                    ..Default::default()
                },
                BundledPharmacy {
                    name: "Lékárna Brno".into(),
                    workplace_code: "2001".into(),
                    city: "Brno".into(),
                    postal_code: "60200".into(),
                    ..Default::default()
                },
            ]),
            reimbursements: Some(vec![BundledReimbursement {
                code: "0254045".into(),
                group: None,
                max_price: Some(45.5),
                amount: Some(30.0),
                surcharge: None,
            }]),
            metadata: None,
        }
    }

    fn client_with(listing: Option<DocumentListing>) -> SuklClient {
        SuklClient::new(
            Arc::new(DataStore::from_bundle(fixture())),
            Arc::new(FakeRegistry { listing }),
        )
    }

    fn client() -> SuklClient {
        client_with(None)
    }

    #[tokio::test]
    async fn test_search() {
        let client = client();
        let response = client.search("paralen", 10).await.unwrap();
        assert_eq!(response.medicines[0].sukl_code, "254045");
        assert_eq!(response.total_count, response.medicines.len());

        let empty = client.search("", 10).await.unwrap();
        assert_eq!(empty.total_count, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_search_max_length_query() {
        let client = client();
        let query = "paralen ".repeat(25);
        assert_eq!(query.trim().chars().count(), 199);

        let response = client.search(&query, 10).await.unwrap();
        assert_eq!(response.total_count, 0);

        // concurrent searches share one snapshot
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.search("ibalgin", 5).await })
            })
            .collect();
        for handle in handles {
            let response = handle.await.unwrap().unwrap();
            assert_eq!(response.medicines[0].sukl_code, "94156");
        }
    }

    #[tokio::test]
    async fn test_get_by_code_any_padding() {
        let client = client();
        let padded = client.get_by_code("0254045").await.unwrap().unwrap();
        let bare = client.get_by_code("254045").await.unwrap().unwrap();
        assert_eq!(padded, bare);
        assert!(client.get_by_code("9999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reimbursement_surcharge() {
        let record = client().get_reimbursement("254045").await.unwrap().unwrap();
        assert_eq!(record.patient_surcharge, Some(15.5));
    }

    #[tokio::test]
    async fn test_atc_lookup_and_prefix() {
        let client = client();
        assert!(client.get_atc_info("N02BE01").await.unwrap().is_some());
        assert!(client.get_atc_info("n02be01").await.unwrap().is_none());

        let by_prefix = client.get_medicines_by_atc("N02").await.unwrap();
        assert_eq!(by_prefix.len(), 2);

        let detail = client.get_atc_detail("N02BE01", 1).await.unwrap().unwrap();
        assert_eq!(detail.medicines.len(), 1);
        assert_eq!(detail.medicines_total, 2);
    }

    #[tokio::test]
    async fn test_availability_heuristic() {
        let client = client();
        let registered = client.check_availability("0254045").await.unwrap().unwrap();
        assert_eq!(registered.status, AvailabilityStatus::Available);
        assert!(registered.notes.is_some());

        let other = client.check_availability("12345").await.unwrap().unwrap();
        assert_eq!(other.status, AvailabilityStatus::Unknown);
    }

    #[tokio::test]
    async fn test_batch_availability_caps_and_skips() {
        let mut codes: Vec<String> = vec!["0254045".into(), "nonsense".into(), "94156".into()];
        codes.extend((0..57).map(|i| format!("{}", 8_000_000 + i)));
        assert_eq!(codes.len(), 60);

        let batch = client().batch_check_availability(&codes).await.unwrap();
        assert_eq!(batch.total_checked, 50);
        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.available_count, 2);
        assert_eq!(batch.unavailable_count, 0);
    }

    #[tokio::test]
    async fn test_find_pharmacies() {
        let client = client();
        assert_eq!(
            client
                .find_pharmacies(&PharmacyFilter::default())
                .await
                .unwrap()
                .len(),
            2
        );

        let praha_24h = client
            .find_pharmacies(&PharmacyFilter {
                city: Some("praha".into()),
                is_24h: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(praha_24h.len(), 1);
        assert_eq!(praha_24h[0].id, "1001");

        let none = client
            .find_pharmacies(&PharmacyFilter {
                city: Some("Brno".into()),
                postal_code: Some("110".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_document_found() {
        let client = client_with(Some(DocumentListing::Found(vec![
            DocumentMeta {
                id: "spc-1".into(),
                kind: "SPC".into(),
                title: None,
            },
            DocumentMeta {
                id: "pil-1".into(),
                kind: "pil".into(),
                title: Some("Příbalová informace".into()),
            },
        ])));

        let doc = client
            .get_document_content("254045", DocumentKind::Pil)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.title, "PIL - PARALEN 500");
        assert_eq!(doc.document_id.as_deref(), Some("pil-1"));
        assert_eq!(
            doc.document_url.as_deref(),
            Some("https://registry.test/dokumenty/pil-1")
        );
        assert_eq!(doc.language, "cs");
    }

    #[tokio::test]
    async fn test_document_with_numeric_registry_id() {
        let listing: Vec<DocumentMeta> =
            serde_json::from_str(r#"[{"id":123456,"typ":"PIL","nazev":"Příbalová informace"}]"#)
                .unwrap();
        let doc = client_with(Some(DocumentListing::Found(listing)))
            .get_document_content("0254045", DocumentKind::Pil)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(doc.document_id.as_deref(), Some("123456"));
        assert_eq!(
            doc.document_url.as_deref(),
            Some("https://registry.test/dokumenty/123456")
        );
    }

    #[tokio::test]
    async fn test_document_placeholders() {
        let missing_kind = client_with(Some(DocumentListing::Found(vec![])))
            .get_document_content("254045", DocumentKind::Spc)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(missing_kind.content, "Dokument SPC pro PARALEN 500 není k dispozici.");
        assert!(missing_kind.document_url.is_none());

        let http_error = client_with(Some(DocumentListing::Unavailable { status: 404 }))
            .get_document_content("254045", DocumentKind::Pil)
            .await
            .unwrap()
            .unwrap();
        assert!(http_error.content.contains("HTTP 404"));

        let unreachable = client()
            .get_document_content("254045", DocumentKind::Pil)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unreachable.content, "Nepodařilo se získat dokument z SÚKL API.");
    }

    #[tokio::test]
    async fn test_document_unknown_medicine() {
        let doc = client()
            .get_document_content("7777777", DocumentKind::Pil)
            .await
            .unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_stats() {
        let stats = client().stats().await.unwrap();
        assert_eq!(stats.medicines, 3);
        assert_eq!(stats.atc_codes, 1);
        assert_eq!(stats.pharmacies, 2);
        assert_eq!(stats.reimbursements, 1);
    }
}
