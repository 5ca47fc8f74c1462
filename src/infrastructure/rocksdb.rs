use crate::domain::allocation::Allocation;
use crate::domain::ports::{PaymentStore, ReceivableStore};
use crate::domain::receipt::ReceiptPayment;
use crate::domain::receivable::Receivable;
use crate::error::{EmiError, Result};
use async_trait::async_trait;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column Family for receivable snapshots.
pub const CF_RECEIVABLES: &str = "receivables";
/// Column Family for allocation records.
pub const CF_ALLOCATIONS: &str = "allocations";
/// Column Family for receipts.
pub const CF_RECEIPTS: &str = "receipts";

const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%9f";
/// Default Column Family key holding the next write sequence number.
const SEQUENCE_KEY: &str = "#sequence";

/// A persistent store implementation using RocksDB.
///
/// Receivables, allocations and receipts live in separate Column Families.
/// Keys start with `<loan account>/` so an account's records are one
/// contiguous range, ordered by the timestamp that follows the prefix.
/// Receivables and allocations also carry a write sequence after the
/// timestamp, so records sharing a timestamp are all kept, in write order.
/// Receipts are additionally indexed by receipt number to enforce uniqueness.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    // Serializes every write, so the persisted sequence only moves forward
    write_lock: Arc<Mutex<()>>,
    sequence: Arc<AtomicU64>,
}

fn account_prefix(loan_account_no: &str) -> String {
    format!("{}/", loan_account_no)
}

fn receivable_key(receivable: &Receivable, sequence: u64) -> String {
    format!(
        "{}{}/{:020}",
        account_prefix(&receivable.loan_account_no),
        receivable.created_date.format(KEY_TIMESTAMP_FORMAT),
        sequence
    )
}

fn allocation_key(allocation: &Allocation, sequence: u64) -> String {
    format!(
        "{}{}/{:020}",
        account_prefix(&allocation.loan_account_no),
        allocation.allocation_date.format(KEY_TIMESTAMP_FORMAT),
        sequence
    )
}

fn receipt_key(receipt: &ReceiptPayment) -> String {
    format!(
        "{}{}/{}",
        account_prefix(&receipt.loan_account_no),
        receipt.payment_date.format(KEY_TIMESTAMP_FORMAT),
        receipt.receipt_no
    )
}

fn receipt_index_key(receipt_no: &str) -> String {
    format!("#{}", receipt_no)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| EmiError::storage(format!("Serialization error: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| EmiError::storage(format!("Deserialization error: {}", e)))
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "receivables", "allocations" and "receipts" column
    /// families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_RECEIVABLES, CF_ALLOCATIONS, CF_RECEIPTS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        let sequence = match db.get(SEQUENCE_KEY)? {
            Some(bytes) => u64::from_be_bytes(
                bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| EmiError::storage("Corrupt write sequence"))?,
            ),
            None => 0,
        };

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
            sequence: Arc::new(AtomicU64::new(sequence)),
        })
    }

    /// Takes the next write sequence and persists its successor in `batch`.
    /// Callers must hold `write_lock`.
    fn next_sequence(&self, batch: &mut WriteBatch) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        batch.put(SEQUENCE_KEY, (sequence + 1).to_be_bytes());
        sequence
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| EmiError::storage(format!("Column family '{}' not found", name)))
    }

    /// Decodes every record in `cf_name` whose key starts with the account prefix.
    fn scan_account<T: DeserializeOwned>(
        &self,
        cf_name: &str,
        loan_account_no: &str,
    ) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let prefix = account_prefix(loan_account_no);
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix.as_bytes(), Direction::Forward));

        let mut records = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            records.push(decode(&value)?);
        }
        Ok(records)
    }

    fn ensure_new_receipt(&self, receipt_no: &str) -> Result<()> {
        let cf = self.cf(CF_RECEIPTS)?;
        if self
            .db
            .get_pinned_cf(&cf, receipt_index_key(receipt_no))?
            .is_some()
        {
            return Err(EmiError::storage(format!(
                "Duplicate receipt number: {}",
                receipt_no
            )));
        }
        Ok(())
    }

    fn put_receipt(&self, batch: &mut WriteBatch, receipt: &ReceiptPayment) -> Result<()> {
        let cf = self.cf(CF_RECEIPTS)?;
        let key = receipt_key(receipt);
        batch.put_cf(&cf, &key, encode(receipt)?);
        batch.put_cf(&cf, receipt_index_key(&receipt.receipt_no), key.as_bytes());
        Ok(())
    }
}

#[async_trait]
impl ReceivableStore for RocksDBStore {
    async fn store(&self, receivable: Receivable) -> Result<()> {
        let cf = self.cf(CF_RECEIVABLES)?;
        let value = encode(&receivable)?;

        let _guard = self.write_lock.lock().await;
        let mut batch = WriteBatch::default();
        let sequence = self.next_sequence(&mut batch);
        batch.put_cf(&cf, receivable_key(&receivable, sequence), value);
        self.db.write(batch)?;
        Ok(())
    }

    async fn find_by_account(&self, loan_account_no: &str) -> Result<Option<Receivable>> {
        let snapshots: Vec<Receivable> = self.scan_account(CF_RECEIVABLES, loan_account_no)?;
        Ok(snapshots.into_iter().last())
    }

    async fn pending(&self, loan_account_no: &str) -> Result<Vec<Receivable>> {
        let snapshots: Vec<Receivable> = self.scan_account(CF_RECEIVABLES, loan_account_no)?;
        Ok(snapshots.into_iter().filter(|r| r.is_pending()).collect())
    }

    async fn total_pending_amount(&self, loan_account_no: &str) -> Result<Decimal> {
        let snapshots: Vec<Receivable> = self.scan_account(CF_RECEIVABLES, loan_account_no)?;
        Ok(snapshots.iter().map(|r| r.total_amount).sum())
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn save_allocation(&self, allocation: Allocation) -> Result<Allocation> {
        let cf = self.cf(CF_ALLOCATIONS)?;
        let value = encode(&allocation)?;

        let _guard = self.write_lock.lock().await;
        let mut batch = WriteBatch::default();
        let sequence = self.next_sequence(&mut batch);
        batch.put_cf(&cf, allocation_key(&allocation, sequence), value);
        self.db.write(batch)?;
        Ok(allocation)
    }

    async fn save_receipt_payment(&self, receipt: ReceiptPayment) -> Result<ReceiptPayment> {
        let _guard = self.write_lock.lock().await;
        self.ensure_new_receipt(&receipt.receipt_no)?;

        let mut batch = WriteBatch::default();
        self.put_receipt(&mut batch, &receipt)?;
        self.db.write(batch)?;
        Ok(receipt)
    }

    async fn record_payment(
        &self,
        allocation: Allocation,
        receipt: ReceiptPayment,
    ) -> Result<(Allocation, ReceiptPayment)> {
        let _guard = self.write_lock.lock().await;
        self.ensure_new_receipt(&receipt.receipt_no)?;

        let cf = self.cf(CF_ALLOCATIONS)?;
        let value = encode(&allocation)?;
        let mut batch = WriteBatch::default();
        let sequence = self.next_sequence(&mut batch);
        batch.put_cf(&cf, allocation_key(&allocation, sequence), value);
        self.put_receipt(&mut batch, &receipt)?;
        self.db.write(batch)?;

        Ok((allocation, receipt))
    }

    async fn allocations(&self, loan_account_no: &str) -> Result<Vec<Allocation>> {
        self.scan_account(CF_ALLOCATIONS, loan_account_no)
    }

    async fn receipts(&self, loan_account_no: &str) -> Result<Vec<ReceiptPayment>> {
        self.scan_account(CF_RECEIPTS, loan_account_no)
    }

    async fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
