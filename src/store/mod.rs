//! Working record and history, persisted through a key/value storage.
//!
//! The form state is two JSON documents: the record being edited and the list
//! of recently generated records. Every mutation is written through
//! immediately; concurrent writers simply overwrite each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::document::{render_document, RenderedDocument};
use crate::errors::AppError;
use crate::improve::{self, ReportImprover};
use crate::models::{DiariaRecord, FinanceUpdate, History, Servant, Trip};

/// Storage key of the record being edited.
pub const FORM_DATA_KEY: &str = "diaria_form_data";
/// Storage key of the generated-records history.
pub const HISTORY_KEY: &str = "diaria_history";

/// String-keyed persistent storage for JSON documents.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// Storage kept in memory only. Nothing survives a restart.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    entries: tokio::sync::RwLock<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

struct FormState {
    record: DiariaRecord,
    history: History,
}

/// Owner of the working record and the history for the single form session.
pub struct FormStore {
    storage: Arc<dyn KeyValueStorage>,
    state: Mutex<FormState>,
    improving: AtomicBool,
}

impl FormStore {
    /// Load the persisted state. Entries that fail to parse are replaced by defaults.
    pub async fn open(storage: Arc<dyn KeyValueStorage>) -> Result<Self, AppError> {
        let record: DiariaRecord = load_or_default(storage.as_ref(), FORM_DATA_KEY).await?;
        let entries: Vec<DiariaRecord> = load_or_default(storage.as_ref(), HISTORY_KEY).await?;
        let history = History::from_entries(entries);

        if history.is_empty() {
            tracing::info!("Loaded form state, history is empty");
        } else {
            tracing::info!("Loaded form state with {} history entries", history.len());
        }

        Ok(Self {
            storage,
            state: Mutex::new(FormState {
                record: record.normalized(),
                history,
            }),
            improving: AtomicBool::new(false),
        })
    }

    pub async fn record(&self) -> DiariaRecord {
        self.state.lock().await.record.clone()
    }

    /// Replace the whole working record. The total is recomputed from its factors.
    pub async fn replace_record(&self, record: DiariaRecord) -> Result<DiariaRecord, AppError> {
        self.mutate(|current| *current = record).await
    }

    pub async fn update_servant(&self, servant: Servant) -> Result<DiariaRecord, AppError> {
        self.mutate(|record| record.servant = servant).await
    }

    pub async fn update_trip(&self, trip: Trip) -> Result<DiariaRecord, AppError> {
        self.mutate(|record| record.trip = trip).await
    }

    pub async fn update_report(&self, report: String) -> Result<DiariaRecord, AppError> {
        self.mutate(|record| record.report = report).await
    }

    pub async fn update_finance(&self, update: FinanceUpdate) -> Result<DiariaRecord, AppError> {
        self.mutate(|record| *record = record.clone().apply_finance(update))
            .await
    }

    /// Reset every field to its default.
    pub async fn clear(&self) -> Result<DiariaRecord, AppError> {
        tracing::info!("Clearing all form fields");
        self.mutate(|record| *record = DiariaRecord::default()).await
    }

    pub async fn history(&self) -> History {
        self.state.lock().await.history.clone()
    }

    pub async fn history_entry(&self, index: usize) -> Result<DiariaRecord, AppError> {
        self.state
            .lock()
            .await
            .history
            .get(index)
            .cloned()
            .ok_or_else(|| history_not_found(index))
    }

    /// Replace the working record with a history snapshot.
    pub async fn load_from_history(&self, index: usize) -> Result<DiariaRecord, AppError> {
        let mut state = self.state.lock().await;
        let snapshot = state
            .history
            .get(index)
            .cloned()
            .ok_or_else(|| history_not_found(index))?
            .normalized();

        save_json(self.storage.as_ref(), FORM_DATA_KEY, &snapshot).await?;
        state.record = snapshot.clone();
        Ok(snapshot)
    }

    /// Render the working record and keep a snapshot of it in the history.
    ///
    /// Records without a servant name or departure date are rendered but not
    /// kept. The state lock is held throughout, so no edit lands between the
    /// rendering and the history update.
    pub async fn generate_document(&self) -> Result<RenderedDocument, AppError> {
        let mut state = self.state.lock().await;
        let document = render_document(&state.record);

        let mut history = state.history.clone();
        if history.record_generated(&state.record) {
            save_json(self.storage.as_ref(), HISTORY_KEY, &history).await?;
            state.history = history;
            tracing::info!(
                "Generated {} and added it to history ({} entries)",
                document.filename,
                state.history.len()
            );
        } else {
            tracing::info!(
                "Generated {}; not added to history (missing name or departure date)",
                document.filename
            );
        }

        Ok(document)
    }

    /// Rewrite the report through `improver`, keeping it unchanged if the call fails.
    ///
    /// Requires both the report notes and the trip purpose. Only one
    /// improvement may run at a time; the state is not locked while the
    /// external call is in flight.
    pub async fn improve_report(
        &self,
        improver: &dyn ReportImprover,
    ) -> Result<DiariaRecord, AppError> {
        let (notes, objective) = {
            let state = self.state.lock().await;
            if !state.record.can_improve_report() {
                return Err(AppError::Validation(
                    "Fill in the mission objective and the report notes first".to_string(),
                ));
            }
            (state.record.report.clone(), state.record.trip.purpose.clone())
        };

        let _guard = self.begin_improvement()?;
        let improved = improve::improve_report(improver, &notes, &objective).await;
        self.update_report(improved).await
    }

    pub fn is_improving(&self) -> bool {
        self.improving.load(Ordering::Acquire)
    }

    fn begin_improvement(&self) -> Result<ImprovementGuard<'_>, AppError> {
        self.improving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                AppError::Busy("A report improvement is already in progress".to_string())
            })?;
        Ok(ImprovementGuard(&self.improving))
    }

    async fn mutate<F>(&self, edit: F) -> Result<DiariaRecord, AppError>
    where
        F: FnOnce(&mut DiariaRecord),
    {
        let mut state = self.state.lock().await;
        let mut next = state.record.clone();
        edit(&mut next);
        let next = next.normalized();

        save_json(self.storage.as_ref(), FORM_DATA_KEY, &next).await?;
        state.record = next.clone();
        Ok(next)
    }
}

/// Clears the busy flag when the improvement ends, however it ends.
struct ImprovementGuard<'a>(&'a AtomicBool);

impl Drop for ImprovementGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn history_not_found(index: usize) -> AppError {
    AppError::NotFound(format!("History entry {} not found", index))
}

async fn load_or_default<T>(storage: &dyn KeyValueStorage, key: &str) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = storage.get(key).await? else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!("Stored {} is not valid, starting from defaults: {}", key, e);
            Ok(T::default())
        }
    }
}

async fn save_json<T: Serialize>(
    storage: &dyn KeyValueStorage,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let json = serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize {}: {}", key, e)))?;
    storage.set(key, &json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Finance, Zone, HISTORY_CAPACITY};
    use tokio::sync::Notify;

    async fn open_memory() -> (Arc<MemoryStorage>, FormStore) {
        let storage = Arc::new(MemoryStorage::default());
        let store = FormStore::open(storage.clone()).await.unwrap();
        (storage, store)
    }

    fn populated_record() -> DiariaRecord {
        let mut record = DiariaRecord::default();
        record.servant.name = "João Silva".to_string();
        record.servant.tax_id = "123.456.789-00".to_string();
        record.trip.destination = "Petrolina".to_string();
        record.trip.zone = Zone::Rural;
        record.trip.departure_date = "2024-05-01".to_string();
        record.trip.purpose = "Audiência pública".to_string();
        record.finance = Finance::default().with_unit_value(210.0).with_quantity(2.0);
        record.report = "fui na audiencia".to_string();
        record
    }

    struct EchoImprover;

    #[async_trait]
    impl ReportImprover for EchoImprover {
        async fn improve(&self, notes: &str, objective: &str) -> Result<String, AppError> {
            Ok(format!("[{}] {}", objective, notes.to_uppercase()))
        }
    }

    struct FailingImprover;

    #[async_trait]
    impl ReportImprover for FailingImprover {
        async fn improve(&self, _notes: &str, _objective: &str) -> Result<String, AppError> {
            Err(AppError::Upstream("network down".to_string()))
        }
    }

    /// Blocks until released so a second call can observe the busy flag.
    struct GatedImprover {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ReportImprover for GatedImprover {
        async fn improve(&self, notes: &str, _objective: &str) -> Result<String, AppError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(format!("{} (revisado)", notes))
        }
    }

    #[tokio::test]
    async fn test_open_empty_storage_uses_defaults() {
        let (_, store) = open_memory().await;
        assert_eq!(store.record().await, DiariaRecord::default());
        assert!(store.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_record_round_trips_through_storage() {
        let (storage, store) = open_memory().await;
        let record = populated_record();
        store.replace_record(record.clone()).await.unwrap();

        let reopened = FormStore::open(storage).await.unwrap();
        assert_eq!(reopened.record().await, record);
    }

    #[tokio::test]
    async fn test_overflowing_total_survives_reopen() {
        let (storage, store) = open_memory().await;
        let mut servant = Servant::default();
        servant.name = "Ana".to_string();
        store.update_servant(servant).await.unwrap();

        let update: FinanceUpdate =
            serde_json::from_str(r#"{"unitValue":"1e200","quantity":"1e200"}"#).unwrap();
        let saved = store.update_finance(update).await.unwrap();
        assert!(saved.finance.total.is_infinite());

        let reopened = FormStore::open(storage).await.unwrap();
        let record = reopened.record().await;
        assert_eq!(record.servant.name, "Ana");
        assert_eq!(record.finance.unit_value, 1e200);
        assert_eq!(record.finance.quantity, 1e200);
        assert!(record.finance.total.is_infinite());
    }

    #[tokio::test]
    async fn test_corrupted_storage_falls_back_to_defaults() {
        let storage = Arc::new(MemoryStorage::default());
        storage.set(FORM_DATA_KEY, "{not json").await.unwrap();
        storage.set(HISTORY_KEY, r#"{"oops":1}"#).await.unwrap();

        let store = FormStore::open(storage).await.unwrap();
        assert_eq!(store.record().await, DiariaRecord::default());
        assert!(store.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_replace_record_recomputes_total() {
        let (_, store) = open_memory().await;
        let mut record = populated_record();
        record.finance.total = 9999.0;

        let saved = store.replace_record(record).await.unwrap();
        assert_eq!(saved.finance.total, 420.0);
    }

    #[tokio::test]
    async fn test_finance_updates_in_either_order() {
        let (_, store) = open_memory().await;

        store
            .update_finance(FinanceUpdate {
                unit_value: None,
                quantity: Some(2.5),
            })
            .await
            .unwrap();
        let record = store
            .update_finance(FinanceUpdate {
                unit_value: Some(177.3),
                quantity: None,
            })
            .await
            .unwrap();
        assert_eq!(record.finance.total, 177.3 * 2.5);

        let record = store
            .update_finance(FinanceUpdate {
                unit_value: None,
                quantity: Some(3.0),
            })
            .await
            .unwrap();
        assert_eq!(record.finance.total, 177.3 * 3.0);
    }

    #[tokio::test]
    async fn test_section_updates_leave_other_fields() {
        let (_, store) = open_memory().await;
        store.replace_record(populated_record()).await.unwrap();

        let mut servant = Servant::default();
        servant.name = "Maria".to_string();
        let record = store.update_servant(servant).await.unwrap();
        assert_eq!(record.servant.name, "Maria");
        assert_eq!(record.trip.destination, "Petrolina");

        let record = store.update_trip(Trip::default()).await.unwrap();
        assert_eq!(record.trip, Trip::default());
        assert_eq!(record.servant.name, "Maria");
        assert_eq!(record.finance.total, 420.0);
    }

    #[tokio::test]
    async fn test_clear_resets_to_defaults() {
        let (storage, store) = open_memory().await;
        store.replace_record(populated_record()).await.unwrap();

        let cleared = store.clear().await.unwrap();
        assert_eq!(cleared, DiariaRecord::default());
        assert_eq!(cleared.trip.vehicle, "Official");
        assert_eq!(cleared.finance.quantity, 1.0);
        assert_eq!(cleared.finance.total, 0.0);

        let reopened = FormStore::open(storage).await.unwrap();
        assert_eq!(reopened.record().await, DiariaRecord::default());
    }

    #[tokio::test]
    async fn test_generate_document_pushes_history() {
        let (storage, store) = open_memory().await;

        for n in 0..12 {
            let mut record = populated_record();
            record.servant.name = format!("Servidor {}", n);
            record.trip.departure_date = format!("{:02}/05/2024", n + 1);
            store.replace_record(record).await.unwrap();

            let document = store.generate_document().await.unwrap();
            assert_eq!(
                document.filename,
                format!("Allowance_Servidor_{}_{:02}-05-2024.pdf", n, n + 1)
            );
        }

        let history = store.history().await;
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.get(0).unwrap().servant.name, "Servidor 11");

        let reopened = FormStore::open(storage).await.unwrap();
        assert_eq!(reopened.history().await, history);
    }

    #[tokio::test]
    async fn test_generate_without_name_or_date_skips_history() {
        let (_, store) = open_memory().await;
        store.replace_record(populated_record()).await.unwrap();
        store.generate_document().await.unwrap();

        let mut record = populated_record();
        record.servant.name.clear();
        store.replace_record(record).await.unwrap();
        let document = store.generate_document().await.unwrap();
        assert!(document.bytes.starts_with(b"%PDF"));

        let mut record = populated_record();
        record.trip.departure_date.clear();
        store.replace_record(record).await.unwrap();
        store.generate_document().await.unwrap();

        assert_eq!(store.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_load_from_history_replaces_record() {
        let (_, store) = open_memory().await;
        store.replace_record(populated_record()).await.unwrap();
        store.generate_document().await.unwrap();
        store.clear().await.unwrap();

        let loaded = store.load_from_history(0).await.unwrap();
        assert_eq!(loaded, populated_record());
        assert_eq!(store.record().await, populated_record());
        assert_eq!(store.history_entry(0).await.unwrap(), populated_record());

        let err = store.load_from_history(1).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_improve_requires_objective_and_notes() {
        let (_, store) = open_memory().await;
        let mut record = populated_record();
        record.trip.purpose.clear();
        store.replace_record(record).await.unwrap();

        let err = store.improve_report(&EchoImprover).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(store.record().await.report, "fui na audiencia");
    }

    #[tokio::test]
    async fn test_improve_rewrites_report() {
        let (_, store) = open_memory().await;
        store.replace_record(populated_record()).await.unwrap();

        let record = store.improve_report(&EchoImprover).await.unwrap();
        assert_eq!(record.report, "[Audiência pública] FUI NA AUDIENCIA");
        assert!(!store.is_improving());
    }

    #[tokio::test]
    async fn test_improve_failure_keeps_notes() {
        let (_, store) = open_memory().await;
        store.replace_record(populated_record()).await.unwrap();

        let record = store.improve_report(&FailingImprover).await.unwrap();
        assert_eq!(record.report, "fui na audiencia");
        assert!(!store.is_improving());
    }

    #[tokio::test]
    async fn test_second_improvement_is_rejected_while_busy() {
        let (_, store) = open_memory().await;
        store.replace_record(populated_record()).await.unwrap();
        let store = Arc::new(store);
        let improver = Arc::new(GatedImprover {
            entered: Notify::new(),
            release: Notify::new(),
        });

        let first = {
            let store = store.clone();
            let improver = improver.clone();
            tokio::spawn(async move { store.improve_report(improver.as_ref()).await })
        };
        improver.entered.notified().await;
        assert!(store.is_improving());

        let err = store.improve_report(&EchoImprover).await.unwrap_err();
        assert_eq!(err.error_code(), "IMPROVEMENT_IN_PROGRESS");

        improver.release.notify_one();
        let record = first.await.unwrap().unwrap();
        assert_eq!(record.report, "fui na audiencia (revisado)");
        assert!(!store.is_improving());
    }
}
