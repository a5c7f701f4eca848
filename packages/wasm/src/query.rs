//! Query emission channel.
//!
//! Clicking a node body asks an insight surface about that node. The
//! surface may not be mounted, so the bus both notifies live subscribers
//! and keeps the latest request per document until someone takes it.
//! The session only ever holds the write-only [`QuerySender`].
//!
//! A subscriber may publish in turn; such requests are queued and delivered
//! to every subscriber once the current delivery has finished.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// "Explain this node" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    pub document_id: String,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            document_id: document_id.into(),
        }
    }
}

type Subscriber = Box<dyn FnMut(&QueryRequest)>;

#[derive(Default)]
struct BusInner {
    subscribers: Vec<Subscriber>,
    pending: HashMap<String, QueryRequest>,
    /// Requests waiting for delivery.
    queue: VecDeque<QueryRequest>,
    dispatching: bool,
}

/// Single-threaded publish/subscribe bus owned by the application shell.
#[derive(Clone, Default)]
pub struct QueryBus {
    inner: Rc<RefCell<BusInner>>,
}

impl QueryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write-only handle for producers.
    pub fn sender(&self) -> QuerySender {
        QuerySender {
            inner: Rc::clone(&self.inner),
        }
    }

    pub fn subscribe(&self, subscriber: impl FnMut(&QueryRequest) + 'static) {
        self.inner.borrow_mut().subscribers.push(Box::new(subscriber));
    }

    /// Latest unconsumed request for a document, removing it.
    pub fn take_pending(&self, document_id: &str) -> Option<QueryRequest> {
        self.inner.borrow_mut().pending.remove(document_id)
    }

    pub fn has_pending(&self, document_id: &str) -> bool {
        self.inner.borrow().pending.contains_key(document_id)
    }
}

/// Producer side of the [`QueryBus`].
#[derive(Clone)]
pub struct QuerySender {
    inner: Rc<RefCell<BusInner>>,
}

impl QuerySender {
    /// Record the request as pending for its document and notify every
    /// subscriber. Fire-and-forget.
    pub fn publish(&self, request: QueryRequest) {
        log::info!("query for {}: {:?}", request.document_id, request.query);

        {
            let mut inner = self.inner.borrow_mut();
            inner
                .pending
                .insert(request.document_id.clone(), request.clone());
            inner.queue.push_back(request);
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }

        // Subscribers run without the bus borrowed so they may call back in.
        loop {
            let (request, mut subscribers) = {
                let mut inner = self.inner.borrow_mut();
                let Some(request) = inner.queue.pop_front() else {
                    inner.dispatching = false;
                    return;
                };
                (request, std::mem::take(&mut inner.subscribers))
            };
            for subscriber in subscribers.iter_mut() {
                subscriber(&request);
            }
            let mut inner = self.inner.borrow_mut();
            subscribers.append(&mut inner.subscribers);
            inner.subscribers = subscribers;
        }
    }
}
