//! Record collection backed by its own JSON array file.

use crate::codec;
use crate::collection::defaults::{Defaults, Record};
use crate::error::{CoreError, CoreResult};
use crate::value::Value;
use lightdb_storage::{AtomicStore, EmptyShape, WriteTicket};
use rand::seq::SliceRandom;
use std::path::Path;
use tracing::debug;

/// An ordered list of flat records persisted as one JSON array.
///
/// Each collection owns an independent [`AtomicStore`], so its writes never
/// wait on the root document or on other collections.
///
/// Filtering uses plain closures:
///
/// ```rust,ignore
/// let adults = users.find(|r| r.get("age").and_then(Value::as_i64) >= Some(18));
/// ```
pub struct Collection {
    /// Collection name, also the file stem.
    name: String,
    /// Records in insertion order.
    records: Vec<Record>,
    /// Defaults applied on insert.
    defaults: Defaults,
    /// Persistence for the record array.
    store: AtomicStore,
    /// Whether mutations save automatically.
    auto_save: bool,
    /// Indentation of the persisted JSON.
    tab_size: usize,
    /// Ticket of the most recent save.
    last_save: Option<WriteTicket>,
}

impl Collection {
    /// Opens a collection over `store`, reading its current records.
    ///
    /// An absent file is created as `[]`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be read and
    /// [`CoreError::InvalidFormat`] if it is not an array of objects.
    pub fn open(
        name: impl Into<String>,
        store: AtomicStore,
        defaults: Defaults,
        auto_save: bool,
        tab_size: usize,
    ) -> CoreResult<Self> {
        let bytes = store.read(EmptyShape::Array)?;
        let records = parse_records(&bytes)?;
        let name = name.into();

        debug!(collection = %name, records = records.len(), "collection loaded");

        Ok(Self {
            name,
            records,
            defaults,
            store,
            auto_save,
            tab_size,
            last_save: None,
        })
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the file backing this collection.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Returns the defaults applied on insert.
    #[must_use]
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the collection holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns every record in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Record] {
        &self.records
    }

    /// Returns clones of every record matching `filter`.
    pub fn find(&self, filter: impl Fn(&Record) -> bool) -> Vec<Record> {
        self.records.iter().filter(|&r| filter(r)).cloned().collect()
    }

    /// Returns the first record matching `filter`.
    pub fn find_one(&self, filter: impl Fn(&Record) -> bool) -> Option<Record> {
        self.records.iter().find(|&r| filter(r)).cloned()
    }

    /// Returns true if any record matches `filter`.
    pub fn has(&self, filter: impl Fn(&Record) -> bool) -> bool {
        self.records.iter().any(filter)
    }

    /// Picks `amount` distinct records at random.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidValue`] if `amount` is zero or larger
    /// than the number of records.
    pub fn random(&self, amount: usize) -> CoreResult<Vec<Record>> {
        if amount == 0 {
            return Err(CoreError::invalid_value("amount must be bigger than 0"));
        }
        if amount > self.records.len() {
            return Err(CoreError::invalid_value(format!(
                "amount {amount} exceeds the {} records in collection {:?}",
                self.records.len(),
                self.name
            )));
        }

        Ok(self
            .records
            .choose_multiple(&mut rand::thread_rng(), amount)
            .cloned()
            .collect())
    }

    /// Appends `record` after filling in its defaults.
    ///
    /// Returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error only if the auto-save cannot be serialized.
    pub fn insert(&mut self, mut record: Record) -> CoreResult<Record> {
        self.defaults.complete(&mut record, &self.records);
        self.records.push(record.clone());
        self.persist()?;
        Ok(record)
    }

    /// Like [`insert`](Self::insert) for a dynamically typed value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidValue`] if `value` is not an object.
    pub fn insert_value(&mut self, value: Value) -> CoreResult<Record> {
        match value.as_object() {
            Some(record) => self.insert(record.clone()),
            None => Err(CoreError::invalid_value(format!(
                "a record must be an object, found {}",
                value.type_name()
            ))),
        }
    }

    /// Removes every record matching `filter` and returns how many went.
    ///
    /// # Errors
    ///
    /// Returns an error only if the auto-save cannot be serialized.
    pub fn delete(&mut self, filter: impl Fn(&Record) -> bool) -> CoreResult<usize> {
        let before = self.records.len();
        self.records.retain(|r| !filter(r));
        let removed = before - self.records.len();

        self.persist()?;
        Ok(removed)
    }

    /// Applies `mutator` to every record matching `filter`.
    ///
    /// Returns how many records were visited.
    ///
    /// # Errors
    ///
    /// Returns an error only if the auto-save cannot be serialized.
    pub fn update(
        &mut self,
        mut mutator: impl FnMut(&mut Record),
        filter: impl Fn(&Record) -> bool,
    ) -> CoreResult<usize> {
        let mut updated = 0;
        for record in &mut self.records {
            if filter(record) {
                mutator(record);
                updated += 1;
            }
        }

        self.persist()?;
        Ok(updated)
    }

    /// Queues a write of all records.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be serialized.
    pub fn save(&mut self) -> CoreResult<WriteTicket> {
        let bytes = codec::encode(&self.records, self.tab_size)?;
        let ticket = self.store.write(bytes);
        self.last_save = Some(ticket.clone());
        Ok(ticket)
    }

    /// Waits for pending writes and returns the outcome of the last save.
    ///
    /// # Errors
    ///
    /// Returns the storage error of the last save, if it failed.
    pub fn flush(&self) -> CoreResult<()> {
        self.store.wait_idle();
        match &self.last_save {
            Some(ticket) => Ok(ticket.wait()?),
            None => Ok(()),
        }
    }

    fn persist(&mut self) -> CoreResult<()> {
        if self.auto_save {
            self.save()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("records", &self.records.len())
            .field("path", &self.path())
            .finish()
    }
}

fn parse_records(bytes: &[u8]) -> CoreResult<Vec<Record>> {
    let Value::Array(items) = codec::decode::<Value>(bytes)? else {
        return Err(CoreError::invalid_format("a collection must be a JSON array"));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_object().cloned().ok_or_else(|| {
                CoreError::invalid_format(format!(
                    "record {index} is {}, expected an object",
                    item.type_name()
                ))
            })
        })
        .collect()
}
