//! Human-readable progress messages.
//!
//! The pool pushes one message per observable change to an optional
//! [`EventSink`]. Without a sink only `tracing` sees them.

use std::sync::{Arc, Mutex};

use boxoffice_rt::threads::mpsc::{self, Receiver, Sender};

use crate::ledger::{Purchase, Release, Sale};

/// Receives pool messages. Called while the pool lock is held, so an
/// implementation must not call back into the pool.
pub trait EventSink: Send + Sync {
    fn log(&self, message: &str);
}

impl<F> EventSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}

/// Forwards every message over a channel, e.g. to a scrolling log view.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<String>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: Sender<String>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn log(&self, message: &str) {
        // A gone receiver just means nobody is watching anymore.
        let _ = self.tx.send(message.to_owned());
    }
}

/// Keeps every message in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl EventSink for MemorySink {
    fn log(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(message.to_owned());
    }
}

/// Formats pool events once for both `tracing` and the sink.
#[derive(Clone, Default)]
pub(crate) struct Announcer {
    sink: Option<Arc<dyn EventSink>>,
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl Announcer {
    pub fn new(sink: Option<Arc<dyn EventSink>>) -> Self {
        Self { sink }
    }

    pub fn release(&self, who: &str, release: &Release) {
        match release {
            Release::Minted {
                count, pool_size, ..
            } if *count > 0 => {
                tracing::debug!(who, count, pool_size, "tickets released");
                self.emit(format!(
                    "{who} added {count} tickets. Total tickets in pool: {pool_size}"
                ));
            }
            Release::Minted { .. } => {}
            Release::Halted => {
                tracing::debug!(who, "vendor production stopped");
                self.emit("Vendor production stopped".to_string());
            }
        }
    }

    pub fn purchase(&self, who: &str, purchase: &Purchase) {
        match purchase {
            Purchase::Bought(sale) if sale.count() > 0 => self.sale(who, "bought", sale),
            Purchase::Drained(sale) => self.sale(who, "drained", sale),
            Purchase::Bought(_) | Purchase::SoldOut | Purchase::Cancelled => {}
        }
    }

    pub fn retrieval_stopped(&self) {
        tracing::debug!("customer retrieval stopped");
        self.emit("Customer retrieval stopped".to_string());
    }

    fn sale(&self, who: &str, verb: &str, sale: &Sale) {
        let count = sale.count();
        tracing::debug!(who, verb, count, remaining = sale.remaining, sold = sale.sold, "tickets sold");
        self.emit(format!(
            "{who} {verb} {count} tickets. Tickets remaining in pool: {}. Total tickets sold: {}",
            sale.remaining, sale.sold
        ));
    }

    fn emit(&self, message: String) {
        if let Some(sink) = &self.sink {
            sink.log(&message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::TicketId;

    #[test]
    fn quiet_outcomes_produce_no_message() {
        let sink = Arc::new(MemorySink::default());
        let announcer = Announcer::new(Some(sink.clone()));

        announcer.release(
            "Vendor-1",
            &Release::Minted {
                first: TicketId(1),
                count: 0,
                pool_size: 4,
            },
        );
        announcer.purchase(
            "Customer-1",
            &Purchase::Bought(Sale {
                tickets: vec![],
                remaining: 4,
                sold: 0,
            }),
        );
        announcer.purchase("Customer-1", &Purchase::Cancelled);
        announcer.purchase("Customer-1", &Purchase::SoldOut);

        assert!(sink.messages().is_empty());
    }

    #[test]
    fn messages_match_log_format() {
        let sink = Arc::new(MemorySink::default());
        let announcer = Announcer::new(Some(sink.clone()));

        announcer.release(
            "Vendor-1",
            &Release::Minted {
                first: TicketId(6),
                count: 3,
                pool_size: 8,
            },
        );
        announcer.release("Vendor-2", &Release::Halted);
        announcer.purchase(
            "Customer-1",
            &Purchase::Drained(Sale {
                tickets: vec![TicketId(9), TicketId(10)],
                remaining: 0,
                sold: 10,
            }),
        );

        assert_eq!(
            sink.messages(),
            vec![
                "Vendor-1 added 3 tickets. Total tickets in pool: 8",
                "Vendor production stopped",
                "Customer-1 drained 2 tickets. Tickets remaining in pool: 0. Total tickets sold: 10",
            ]
        );
    }

    #[test]
    fn channel_and_closure_sinks_receive_messages() {
        let (sink, rx) = ChannelSink::new();
        sink.log("hello");
        assert_eq!(rx.recv().unwrap(), "hello");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let collector = seen.clone();
        let closure = move |message: &str| collector.lock().unwrap().push(message.len());
        closure.log("four");
        assert_eq!(*seen.lock().unwrap(), vec![4]);
    }
}
