//! Append-only, line-oriented audit journal.
//!
//! One line per order lifecycle event, flushed immediately. Grounded on
//! `original_source/PersistenceManager.h`'s `logOrderEvent`: an append-mode
//! file stream behind a mutex, written and flushed on every call. Failures
//! are logged and swallowed — a slow or missing disk must never affect
//! `submit`'s return value (spec.md §6/§7).

use crate::types::Order;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// The lifecycle events a submit can produce, in the wire vocabulary of
/// spec.md §6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JournalEvent {
    New,
    Rested,
    PartialFill,
    Filled,
    Canceled,
}

impl JournalEvent {
    fn as_str(self) -> &'static str {
        match self {
            JournalEvent::New => "NEW",
            JournalEvent::Rested => "RESTED",
            JournalEvent::PartialFill => "PARTIAL_FILL",
            JournalEvent::Filled => "FILLED",
            JournalEvent::Canceled => "CANCELED",
        }
    }
}

/// Best-effort append-only journal writer.
///
/// `Journal::disabled()` is a no-op sink for engines that don't need
/// durable audit output (e.g. benchmarks, unit tests).
pub struct Journal {
    file: Option<Mutex<File>>,
}

impl Journal {
    /// Opens (or creates) `path` in append mode.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(Mutex::new(file)),
        })
    }

    /// A journal that discards every event. Used where no audit trail is
    /// required.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    /// Writes one journal line for `order`. Never fails observably: I/O
    /// errors are logged at `warn` and otherwise swallowed.
    pub fn log(&self, event: JournalEvent, order: &Order) {
        let Some(file) = &self.file else {
            return;
        };

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        let line = format!(
            "{now_ms}|{event}|{id}|{symbol}|{side}|{type_int}|{price}|{quantity}|{filled_qty}|{ts}\n",
            event = event.as_str(),
            id = order.id,
            symbol = order.symbol,
            side = order.side,
            type_int = order.order_type.type_int(),
            price = order.price,
            quantity = order.quantity,
            filled_qty = order.filled_qty,
            ts = order.timestamp,
        );

        let write_result = (|| -> std::io::Result<()> {
            let mut f = file.lock().expect("journal mutex poisoned");
            f.write_all(line.as_bytes())?;
            f.flush()
        })();

        if let Err(e) = write_result {
            tracing::warn!(error = %e, "journal write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderId, OrderType, Side};
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn sample_order() -> Order {
        Order {
            id: OrderId("o1".into()),
            symbol: "AAPL".into(),
            side: Side::Buy,
            order_type: OrderType::Limit,
            price: 100,
            quantity: 10,
            filled_qty: 3,
            timestamp: 123,
            sequence: 1,
        }
    }

    #[test]
    fn writes_pipe_delimited_line() {
        let tmp = NamedTempFile::new().expect("tmpfile");
        let journal = Journal::open(tmp.path()).expect("open journal");
        journal.log(JournalEvent::PartialFill, &sample_order());

        let mut contents = String::new();
        File::open(tmp.path()).unwrap().read_to_string(&mut contents).unwrap();

        let fields: Vec<&str> = contents.trim_end().split('|').collect();
        assert_eq!(fields.len(), 10);
        assert_eq!(fields[1], "PARTIAL_FILL");
        assert_eq!(fields[2], "o1");
        assert_eq!(fields[3], "AAPL");
        assert_eq!(fields[4], "BUY");
        assert_eq!(fields[5], "1");
        assert_eq!(fields[6], "100");
        assert_eq!(fields[7], "10");
        assert_eq!(fields[8], "3");
        assert_eq!(fields[9], "123");
    }

    #[test]
    fn disabled_journal_is_a_no_op() {
        let journal = Journal::disabled();
        journal.log(JournalEvent::New, &sample_order());
    }

    #[test]
    fn appends_across_multiple_writes() {
        let tmp = NamedTempFile::new().expect("tmpfile");
        let journal = Journal::open(tmp.path()).expect("open journal");
        journal.log(JournalEvent::New, &sample_order());
        journal.log(JournalEvent::Filled, &sample_order());

        let mut contents = String::new();
        File::open(tmp.path()).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
