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

//! Deterministic benchmark fixtures for the Criterion harness.

use crate::broker::delivery::{
    DeliveryEngine, DeliveryHandle, Event, EventSink, PublishOptions, SubscribeOptions,
    SubscriberSession,
};
use crate::broker::registry::TopicRegistry;
use crate::dealer::details::{
    CallDetails, CallOptions, CallerInfo, ExtendedCallDetails, InvocationDetails, RegisterOptions,
};
use crate::dealer::operation::CalleeOperation;
use crate::dealer::session::{
    CalleeSession, CallerChannel, ConnectionMonitor, DisconnectListener, InvocationHandler,
    OperationCatalog,
};
use crate::errors::RouterError;
use crate::ids::{
    IdAllocator, PublicationId, RegistrationId, RequestId, SessionId, SubscriptionId,
};
use crate::payload::{ArgDict, Payload};
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn resident_topic_uri(index: usize) -> String {
    format!("bench.resident.t{index}")
}

struct NoopDeliveryHandle;

#[async_trait]
impl DeliveryHandle for NoopDeliveryHandle {
    async fn dispose(&self) {}
}

/// Accepts every registration and publication without matching anything.
struct NoopDeliveryEngine {
    next_publication: AtomicI64,
}

impl Default for NoopDeliveryEngine {
    fn default() -> Self {
        Self {
            next_publication: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl DeliveryEngine for NoopDeliveryEngine {
    async fn subscribe(
        &self,
        _sink: Arc<dyn EventSink>,
        _options: &SubscribeOptions,
        _topic_uri: &str,
    ) -> Result<Box<dyn DeliveryHandle>, RouterError> {
        Ok(Box::new(NoopDeliveryHandle))
    }

    async fn publish(
        &self,
        _options: &PublishOptions,
        _topic_uri: &str,
        _payload: Payload,
    ) -> Result<PublicationId, RouterError> {
        Ok(self.next_publication.fetch_add(1, Ordering::Relaxed))
    }
}

/// Feeds every publication straight back to the registered sinks, which is
/// the fan-out path the `publish_fanout` benchmarks measure.
#[derive(Default)]
struct LoopbackDeliveryEngine {
    sinks: Mutex<Vec<Arc<dyn EventSink>>>,
    next_publication: AtomicI64,
}

#[async_trait]
impl DeliveryEngine for LoopbackDeliveryEngine {
    async fn subscribe(
        &self,
        sink: Arc<dyn EventSink>,
        _options: &SubscribeOptions,
        _topic_uri: &str,
    ) -> Result<Box<dyn DeliveryHandle>, RouterError> {
        self.sinks
            .lock()
            .expect("benchmark sink book should lock")
            .push(sink);
        Ok(Box::new(NoopDeliveryHandle))
    }

    async fn publish(
        &self,
        options: &PublishOptions,
        topic_uri: &str,
        payload: Payload,
    ) -> Result<PublicationId, RouterError> {
        let publication_id = self.next_publication.fetch_add(1, Ordering::Relaxed);
        let sinks: Vec<_> = self
            .sinks
            .lock()
            .expect("benchmark sink book should lock")
            .clone();
        for sink in sinks {
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

struct CountingSubscriber {
    session: SessionId,
    received: AtomicUsize,
}

impl CountingSubscriber {
    fn new(session: SessionId) -> Self {
        Self {
            session,
            received: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SubscriberSession for CountingSubscriber {
    fn session_id(&self) -> SessionId {
        self.session
    }

    async fn event(&self, _subscription_id: SubscriptionId, _event: &Event) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }
}

/// Fixed fixture for `topic_churn/*` benchmark IDs.
pub struct TopicChurnFixture {
    registry: TopicRegistry,
    churn_session: SessionId,
    churn_topic: String,
}

impl TopicChurnFixture {
    /// Seeds `resident_topics` long-lived topics so churn operations run
    /// against a populated index.
    pub async fn new(resident_topics: usize) -> Result<Self, RouterError> {
        let registry = TopicRegistry::new(
            Arc::new(NoopDeliveryEngine::default()),
            Arc::new(IdAllocator::new()),
        );

        for index in 0..resident_topics.max(1) {
            registry
                .subscribe(
                    Arc::new(CountingSubscriber::new(1_000 + index as SessionId)),
                    SubscribeOptions::default(),
                    &resident_topic_uri(index),
                )
                .await?;
        }

        Ok(Self {
            registry,
            churn_session: 1,
            churn_topic: "bench.churn.topic".to_owned(),
        })
    }

    /// First-subscriber path: creates the churn topic and returns its id.
    pub async fn subscribe_churn_topic(&self) -> Result<SubscriptionId, RouterError> {
        self.registry
            .subscribe(
                Arc::new(CountingSubscriber::new(self.churn_session)),
                SubscribeOptions::default(),
                &self.churn_topic,
            )
            .await
    }

    /// Last-subscriber path: empties the churn topic and tears it down.
    pub async fn unsubscribe_churn_topic(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<(), RouterError> {
        self.registry
            .unsubscribe(self.churn_session, subscription_id)
            .await
    }

    pub async fn lookup_count(&self) -> usize {
        self.registry.topic_count().await
    }
}

/// Fixed fixture for `publish_fanout/*` benchmark IDs.
pub struct PublishFanOutFixture {
    registry: TopicRegistry,
    topic_uri: String,
    options: PublishOptions,
}

impl PublishFanOutFixture {
    /// Subscribes `subscribers` sessions to one topic behind a loopback
    /// engine, so each publication exercises the full fan-out write path.
    pub async fn new(subscribers: usize) -> Result<Self, RouterError> {
        let registry = TopicRegistry::new(
            Arc::new(LoopbackDeliveryEngine::default()),
            Arc::new(IdAllocator::new()),
        );
        let topic_uri = "bench.fanout.topic".to_owned();

        for index in 0..subscribers.max(1) {
            registry
                .subscribe(
                    Arc::new(CountingSubscriber::new(10 + index as SessionId)),
                    SubscribeOptions::default(),
                    &topic_uri,
                )
                .await?;
        }

        Ok(Self {
            registry,
            topic_uri,
            options: PublishOptions {
                publisher: Some(1),
                ..Default::default()
            },
        })
    }

    pub async fn publish_once(&self) -> Result<PublicationId, RouterError> {
        self.registry
            .publish(
                &self.options,
                &self.topic_uri,
                Payload::Args(vec![serde_json::json!("benchmark-event")]),
            )
            .await
    }
}

#[derive(Default)]
struct CountingCallee {
    sent: AtomicUsize,
}

impl CountingCallee {
    fn sent_count(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ConnectionMonitor for CountingCallee {
    async fn register_disconnect_listener(&self, _listener: Arc<dyn DisconnectListener>) {}
    async fn unregister_disconnect_listener(&self, _listener: Arc<dyn DisconnectListener>) {}
}

#[async_trait]
impl CalleeSession for CountingCallee {
    async fn invocation(
        &self,
        _request_id: RequestId,
        _registration_id: RegistrationId,
        _details: &InvocationDetails,
        _payload: &Payload,
    ) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }
}

struct NoopInvocationHandler {
    next_request: AtomicI64,
}

impl Default for NoopInvocationHandler {
    fn default() -> Self {
        Self {
            next_request: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl InvocationHandler for NoopInvocationHandler {
    async fn register_invocation(
        &self,
        _operation: &CalleeOperation,
        _caller: &Arc<dyn CallerChannel>,
        _details: &InvocationDetails,
        _payload: &Payload,
    ) -> RequestId {
        self.next_request.fetch_add(1, Ordering::Relaxed)
    }

    async fn unregistered(&self, _operation: &CalleeOperation) {}
}

struct NoopCatalog;

#[async_trait]
impl OperationCatalog for NoopCatalog {
    async fn unregister(&self, _callee: &Arc<dyn CalleeSession>, _registration_id: RegistrationId) {
    }
}

struct NoopCallerChannel;

#[async_trait]
impl CallerChannel for NoopCallerChannel {
    async fn error(&self, _details: ArgDict, _error_uri: &str) {}
}

/// Executes one open-operation invocation, disclosure policy included, and
/// returns the callee's send count.
pub async fn run_invocation_dispatch_once() -> usize {
    let callee = Arc::new(CountingCallee::default());
    let operation = CalleeOperation::new(
        "bench.dispatch.procedure",
        1,
        RegisterOptions {
            disclose_caller: Some(true),
            ..Default::default()
        },
        callee.clone(),
        Arc::new(NoopInvocationHandler::default()),
        Arc::new(NoopCatalog),
    );
    operation.open().await;

    let caller: Arc<dyn CallerChannel> = Arc::new(NoopCallerChannel);
    operation
        .invoke(
            &caller,
            CallDetails::WithCaller(ExtendedCallDetails {
                base: InvocationDetails::default(),
                procedure_uri: "bench.dispatch.procedure".to_owned(),
                caller: CallerInfo {
                    session: 9,
                    auth_id: Some("benchmark".to_owned()),
                    auth_method: Some("anonymous".to_owned()),
                    auth_role: Some("caller".to_owned()),
                },
                options: CallOptions::default(),
            }),
            Payload::Args(vec![serde_json::json!(1)]),
        )
        .await;

    callee.sent_count()
}
