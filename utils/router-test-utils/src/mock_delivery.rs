/********************************************************************************
 * Copyright (c) 2026 Contributors to the wamp-router project
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;
use wamp_router::{
    DeliveryEngine, DeliveryHandle, Event, EventSink, Payload, PublicationId, PublishOptions,
    RouterError, SessionId, SubscribeOptions, SubscriberSession, SubscriptionId,
};

struct SinkEntry {
    entry_id: u64,
    topic_uri: String,
    sink: Arc<dyn EventSink>,
}

/// Exact-match in-memory delivery engine for integration tests.
///
/// Registered sinks receive every publication to their topic URI, so a test
/// can drive the whole publish path end to end. Registrations and
/// publications are recorded for assertions; handles returned from
/// `subscribe` remove their sink again on dispose.
pub struct RecordingDeliveryEngine {
    entries: Arc<Mutex<Vec<SinkEntry>>>,
    next_entry: AtomicU64,
    next_publication: AtomicI64,
    publications: Mutex<Vec<(String, Payload)>>,
    disposals: Arc<AtomicUsize>,
}

impl RecordingDeliveryEngine {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_entry: AtomicU64::new(1),
            next_publication: AtomicI64::new(100),
            publications: Mutex::new(Vec::new()),
            disposals: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sinks currently registered.
    pub fn subscription_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Every publication handed to the engine, in order.
    pub fn publications(&self) -> Vec<(String, Payload)> {
        self.publications.lock().unwrap().clone()
    }

    /// How many handles have been disposed.
    pub fn dispose_count(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

impl Default for RecordingDeliveryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryEngine for RecordingDeliveryEngine {
    async fn subscribe(
        &self,
        sink: Arc<dyn EventSink>,
        _options: &SubscribeOptions,
        topic_uri: &str,
    ) -> Result<Box<dyn DeliveryHandle>, RouterError> {
        let entry_id = self.next_entry.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().unwrap().push(SinkEntry {
            entry_id,
            topic_uri: topic_uri.to_owned(),
            sink,
        });
        debug!(topic_uri, entry_id, "recording engine registered sink");
        Ok(Box::new(RecordingDeliveryHandle {
            entries: self.entries.clone(),
            entry_id,
            disposals: self.disposals.clone(),
        }))
    }

    async fn publish(
        &self,
        options: &PublishOptions,
        topic_uri: &str,
        payload: Payload,
    ) -> Result<PublicationId, RouterError> {
        let publication_id = self.next_publication.fetch_add(1, Ordering::Relaxed);
        self.publications
            .lock()
            .unwrap()
            .push((topic_uri.to_owned(), payload.clone()));

        let matched: Vec<Arc<dyn EventSink>> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.topic_uri == topic_uri)
            .map(|entry| entry.sink.clone())
            .collect();
        debug!(
            topic_uri,
            publication_id,
            matched = matched.len(),
            "recording engine forwarding publication"
        );
        for sink in matched {
            sink.on_event(Event {
                publication_id,
                topic_uri: topic_uri.to_owned(),
                publisher: options.publisher,
                options: options.clone(),
                payload: payload.clone(),
            })
            .await;
        }
        Ok(publication_id)
    }
}

struct RecordingDeliveryHandle {
    entries: Arc<Mutex<Vec<SinkEntry>>>,
    entry_id: u64,
    disposals: Arc<AtomicUsize>,
}

#[async_trait]
impl DeliveryHandle for RecordingDeliveryHandle {
    async fn dispose(&self) {
        self.entries
            .lock()
            .unwrap()
            .retain(|entry| entry.entry_id != self.entry_id);
        self.disposals.fetch_add(1, Ordering::SeqCst);
        debug!(entry_id = self.entry_id, "recording engine sink disposed");
    }
}

/// Refuses every registration and publication with a network failure.
pub struct FailingDeliveryEngine {
    reason: String,
}

impl FailingDeliveryEngine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl DeliveryEngine for FailingDeliveryEngine {
    async fn subscribe(
        &self,
        _sink: Arc<dyn EventSink>,
        _options: &SubscribeOptions,
        _topic_uri: &str,
    ) -> Result<Box<dyn DeliveryHandle>, RouterError> {
        Err(RouterError::NetworkFailure(self.reason.clone()))
    }

    async fn publish(
        &self,
        _options: &PublishOptions,
        _topic_uri: &str,
        _payload: Payload,
    ) -> Result<PublicationId, RouterError> {
        Err(RouterError::NetworkFailure(self.reason.clone()))
    }
}

/// Subscriber session that stores every event written to it.
pub struct RecordingSubscriberSession {
    session: SessionId,
    events: Mutex<Vec<(SubscriptionId, Event)>>,
}

impl RecordingSubscriberSession {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<(SubscriptionId, Event)> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl SubscriberSession for RecordingSubscriberSession {
    fn session_id(&self) -> SessionId {
        self.session
    }

    async fn event(&self, subscription_id: SubscriptionId, event: &Event) {
        self.events
            .lock()
            .unwrap()
            .push((subscription_id, event.clone()));
        debug!(
            session = self.session,
            subscription_id,
            publication_id = event.publication_id,
            "recording session received event"
        );
    }
}
