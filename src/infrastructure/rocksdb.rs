use crate::domain::payment::{PaymentIntent, PaymentReference, PaymentStats, PaymentStatus};
use crate::domain::ports::PaymentIntentStore;
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteOptions};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing payment intents keyed by reference.
pub const CF_PAYMENT_INTENTS: &str = "payment_intents";

/// A persistent intent store implementation using RocksDB.
///
/// Every write is synced before returning. Inserts and transitions are
/// serialised by `write_lock`, which makes the read-check-write of a
/// transition one critical section against the database; RocksDB's own
/// lock file keeps other processes out.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "payment_intents" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_intents = ColumnFamilyDescriptor::new(CF_PAYMENT_INTENTS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_intents])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn read(&self, reference: &PaymentReference) -> Result<Option<PaymentIntent>> {
        let cf = self.cf()?;
        match self.db.get_cf(cf, reference.as_str().as_bytes())? {
            Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                CoreError::PersistenceError(format!("Deserialization error: {}", e))
            }),
            None => Ok(None),
        }
    }

    fn write(&self, intent: &PaymentIntent) -> Result<()> {
        let cf = self.cf()?;
        let value = serde_json::to_vec(intent)
            .map_err(|e| CoreError::PersistenceError(format!("Serialization error: {}", e)))?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db
            .put_cf_opt(cf, intent.reference.as_str().as_bytes(), value, &write_opts)?;
        Ok(())
    }

    /// Full scan of the intents column family.
    fn for_each_intent(&self, mut visit: impl FnMut(PaymentIntent)) -> Result<()> {
        let cf = self.cf()?;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let intent: PaymentIntent = serde_json::from_slice(&value).map_err(|e| {
                CoreError::PersistenceError(format!("Failed to deserialize intent: {}", e))
            })?;
            visit(intent);
        }
        Ok(())
    }

    fn cf(&self) -> Result<&ColumnFamily> {
        self.db.cf_handle(CF_PAYMENT_INTENTS).ok_or_else(|| {
            CoreError::PersistenceError("Payment intents column family not found".to_string())
        })
    }
}

#[async_trait]
impl PaymentIntentStore for RocksDBStore {
    async fn insert(&self, intent: PaymentIntent) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.read(&intent.reference)?.is_some() {
            return Err(CoreError::PersistenceError(format!(
                "Duplicate payment reference {}",
                intent.reference
            )));
        }
        self.write(&intent)
    }

    async fn get_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<PaymentIntent>> {
        self.read(reference)
    }

    async fn transition(
        &self,
        reference: &PaymentReference,
        new_status: PaymentStatus,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut intent = self
            .read(reference)?
            .ok_or_else(|| CoreError::NotFound(reference.to_string()))?;
        if !intent.status.can_transition_to(new_status) {
            return Ok(false);
        }
        intent.status = new_status;
        self.write(&intent)?;
        Ok(true)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PaymentIntent>> {
        let mut intents = Vec::new();
        self.for_each_intent(|intent| {
            if intent.user_id == user_id {
                intents.push(intent);
            }
        })?;
        intents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(intents)
    }

    async fn payment_stats(&self) -> Result<PaymentStats> {
        let mut stats = PaymentStats::default();
        self.for_each_intent(|intent| stats.record(&intent))?;
        Ok(stats)
    }
}
