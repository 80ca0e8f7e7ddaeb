//! Background work: provider calls and timers run as tokio tasks and report
//! back through the event channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::error::AppError;
use crate::event::Event;
use crate::fs::hydrate;
use crate::fs::node::{NodeId, Separator};
use crate::fs::order::OrderSpec;
use crate::fs::provider::{Provider, TREE_METADATA};
use crate::fs::tree::{ListingRequest, ListingResponse};

#[derive(Clone)]
pub struct Dispatcher {
    provider: Arc<dyn Provider>,
    tx: UnboundedSender<Event>,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn Provider>, tx: UnboundedSender<Event>) -> Self {
        Self { provider, tx }
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    fn send(tx: &UnboundedSender<Event>, event: Event) {
        if tx.send(event).is_err() {
            tracing::debug!("event channel closed, dropping task result");
        }
    }

    /// Fetch a listing. A cancelled request still reports back so the tree
    /// can drop it.
    pub fn spawn_listing(&self, request: ListingRequest) {
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let ListingRequest {
                node,
                path,
                order,
                token,
                cancel,
            } = request;
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AppError::Cancelled),
                res = provider.list_directory(&path, &order, TREE_METADATA) => res,
            };
            Self::send(&tx, Event::ListingLoaded(ListingResponse { node, token, outcome }));
        });
    }

    pub fn spawn_listings(&self, requests: impl IntoIterator<Item = ListingRequest>) {
        for request in requests {
            self.spawn_listing(request);
        }
    }

    pub fn spawn_hydrate(&self, epoch: u64, path: String, order: OrderSpec, separator: Separator) {
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let hydrated = hydrate::hydrate(provider.as_ref(), &path, &order, separator).await;
            Self::send(&tx, Event::Hydrated { epoch, hydrated });
        });
    }

    pub fn spawn_scroll_retry(&self, target: NodeId, delay: Duration) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            Self::send(&tx, Event::ScrollRetry(target));
        });
    }

    pub fn spawn_read_text(&self, node: NodeId, path: String) {
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = provider.read_file_text(&path).await;
            Self::send(&tx, Event::TextLoaded { node, result });
        });
    }
}
