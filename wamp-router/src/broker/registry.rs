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

//! The topic subscription registry: topics come to life on first subscribe,
//! later subscribers share them, and the last leaver triggers a teardown that
//! re-verifies emptiness under the registry lock before anything is freed.

use crate::broker::delivery::{
    DeliveryEngine, EventSink, PublishOptions, SubscribeOptions, SubscriberSession,
};
use crate::broker::topic::Topic;
use crate::errors::RouterError;
use crate::ids::{IdAllocator, PublicationId, SessionId, SubscriptionId};
use crate::observability::{events, fields};
use crate::payload::Payload;
use crate::uri::{validate_uri, MatchPattern};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn, Level};

const COMPONENT: &str = "topic_registry";

/// Both topic indexes. One struct so one mutex covers them; a topic is
/// either in both maps or in neither.
#[derive(Default)]
struct TopicIndex {
    by_subscription_id: HashMap<SubscriptionId, Arc<Topic>>,
    by_topic_uri: HashMap<String, Arc<Topic>>,
}

/// Owns every live topic of a realm's broker side.
///
/// All membership mutations run under one async mutex, including the engine
/// registration performed while creating a topic, so id allocation, engine
/// registration and indexing are atomic against concurrent subscribers.
/// Publications never take that lock.
pub struct TopicRegistry {
    delivery: Arc<dyn DeliveryEngine>,
    ids: Arc<IdAllocator>,
    index: Mutex<TopicIndex>,
}

impl TopicRegistry {
    /// Creates a registry routing through `delivery`, minting subscription
    /// ids from the router-shared allocator.
    pub fn new(delivery: Arc<dyn DeliveryEngine>, ids: Arc<IdAllocator>) -> Self {
        Self {
            delivery,
            ids,
            index: Mutex::new(TopicIndex::default()),
        }
    }

    /// Subscribes `subscriber` to `topic_uri`, creating the topic if this is
    /// its first subscriber. Returns the topic's subscription id; every
    /// subscriber of the topic holds the same one.
    pub async fn subscribe(
        &self,
        subscriber: Arc<dyn SubscriberSession>,
        options: SubscribeOptions,
        topic_uri: &str,
    ) -> Result<SubscriptionId, RouterError> {
        validate_uri(topic_uri, options.pattern())?;
        let session = subscriber.session_id();

        let mut index = self.index.lock().await;

        if let Some(topic) = index.by_topic_uri.get(topic_uri) {
            let subscription_id = topic.subscription_id();
            topic.add_subscriber(subscriber, options).await;
            debug!(
                event = events::TOPIC_REUSE,
                component = COMPONENT,
                topic_uri,
                session,
                subscription_id,
                "added subscriber to live topic"
            );
            return Ok(subscription_id);
        }

        // Engine registration comes before indexing, so a refusal leaks
        // neither an id mapping nor a half-built topic.
        let subscription_id = self.ids.next_id();
        let topic = Arc::new(Topic::new(topic_uri, subscription_id));
        let sink: Arc<dyn EventSink> = topic.clone();
        let handle = match self.delivery.subscribe(sink, &options, topic_uri).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(
                    event = events::SUBSCRIBE_ENGINE_FAILED,
                    component = COMPONENT,
                    topic_uri,
                    session,
                    err = %err,
                    "delivery engine refused the subscription"
                );
                return Err(err);
            }
        };
        topic.attach_delivery_handle(handle).await;
        topic.add_subscriber(subscriber, options).await;
        index
            .by_subscription_id
            .insert(subscription_id, topic.clone());
        index.by_topic_uri.insert(topic_uri.to_owned(), topic);

        debug!(
            event = events::TOPIC_CREATE,
            component = COMPONENT,
            topic_uri,
            session,
            subscription_id,
            "created topic on first subscribe"
        );
        Ok(subscription_id)
    }

    /// Drops `session`'s membership in the given subscription. Fails without
    /// touching any state when the id is unknown or the session is not a
    /// member; a topic left empty is handed to the teardown handler.
    pub async fn unsubscribe(
        &self,
        session: SessionId,
        subscription_id: SubscriptionId,
    ) -> Result<(), RouterError> {
        if let Some(topic) = self.remove_member(session, subscription_id).await? {
            self.collect_if_empty(&topic).await;
        }
        Ok(())
    }

    /// Membership removal half of `unsubscribe`. Returns the topic when it
    /// was left empty; by the time the caller acts on that, the observation
    /// is already stale, which is exactly what `collect_if_empty` defends
    /// against.
    async fn remove_member(
        &self,
        session: SessionId,
        subscription_id: SubscriptionId,
    ) -> Result<Option<Arc<Topic>>, RouterError> {
        let index = self.index.lock().await;

        let Some(topic) = index.by_subscription_id.get(&subscription_id) else {
            warn!(
                event = events::UNSUBSCRIBE_UNKNOWN,
                component = COMPONENT,
                session,
                subscription_id,
                reason = "unknown_subscription",
                "unsubscribe addressed a subscription this realm does not hold"
            );
            return Err(RouterError::NoSuchSubscription(subscription_id));
        };

        if !topic.remove_subscriber(session).await {
            warn!(
                event = events::UNSUBSCRIBE_UNKNOWN,
                component = COMPONENT,
                session,
                subscription_id,
                topic_uri = %topic.topic_uri(),
                reason = "not_a_member",
                "unsubscribe from a session that never joined the topic"
            );
            return Err(RouterError::NoSuchSubscription(subscription_id));
        }

        let remaining = topic.subscriber_count().await;
        debug!(
            event = events::UNSUBSCRIBE_OK,
            component = COMPONENT,
            session,
            subscription_id,
            topic_uri = %topic.topic_uri(),
            subscriber_count = remaining,
            "removed subscriber"
        );

        if remaining > 0 {
            Ok(None)
        } else {
            Ok(Some(topic.clone()))
        }
    }

    /// Teardown handler for a topic that reported empty.
    ///
    /// The report arrives with no claim on the registry, so by now the topic
    /// may have been revived by a new subscriber or collected by somebody
    /// else. Both indexes and the emptiness check are therefore re-verified
    /// under the same lock `subscribe` and `unsubscribe` hold; only the
    /// winner detaches the delivery handle, and it disposes it after
    /// releasing the lock.
    async fn collect_if_empty(&self, topic: &Arc<Topic>) {
        let subscription_id = topic.subscription_id();
        let detached = {
            let mut index = self.index.lock().await;

            match index.by_subscription_id.get(&subscription_id) {
                Some(current) if Arc::ptr_eq(current, topic) => {}
                _ => {
                    debug!(
                        event = events::TOPIC_DISPOSE_STALE,
                        component = COMPONENT,
                        topic_uri = %topic.topic_uri(),
                        subscription_id,
                        reason = fields::REASON_TOPIC_REPLACED,
                        "empty report arrived for a topic no longer indexed"
                    );
                    return;
                }
            }

            if topic.has_subscribers().await {
                debug!(
                    event = events::TOPIC_DISPOSE_ABORTED,
                    component = COMPONENT,
                    topic_uri = %topic.topic_uri(),
                    subscription_id,
                    reason = fields::REASON_TOPIC_REVIVED,
                    "topic picked up a subscriber before teardown"
                );
                return;
            }

            index.by_subscription_id.remove(&subscription_id);
            index.by_topic_uri.remove(topic.topic_uri());
            topic.take_delivery_handle().await
        };

        if let Some(handle) = detached {
            handle.dispose().await;
        }
        debug!(
            event = events::TOPIC_DISPOSE,
            component = COMPONENT,
            topic_uri = %topic.topic_uri(),
            subscription_id,
            "tore down empty topic"
        );
    }

    /// Forwards a publication to the delivery engine and reports the id it
    /// assigned. Deliberately lock-free: publications to topics nobody
    /// subscribes are legal, and what matches is the engine's business.
    pub async fn publish(
        &self,
        options: &PublishOptions,
        topic_uri: &str,
        payload: Payload,
    ) -> Result<PublicationId, RouterError> {
        validate_uri(topic_uri, MatchPattern::Exact)?;

        let formatted_payload =
            tracing::enabled!(Level::DEBUG).then(|| fields::format_payload(&payload));

        match self.delivery.publish(options, topic_uri, payload).await {
            Ok(publication_id) => {
                if let Some(payload_value) = formatted_payload {
                    debug!(
                        event = events::PUBLISH_FORWARD,
                        component = COMPONENT,
                        topic_uri,
                        publication_id,
                        publisher = %fields::format_optional_session(options.publisher),
                        payload = %payload_value,
                        "publication handed to delivery engine"
                    );
                }
                Ok(publication_id)
            }
            Err(err) => {
                warn!(
                    event = events::PUBLISH_REJECTED,
                    component = COMPONENT,
                    topic_uri,
                    publisher = %fields::format_optional_session(options.publisher),
                    err = %err,
                    "delivery engine rejected the publication"
                );
                Err(err)
            }
        }
    }

    /// Removes a departing session from every topic it still subscribes and
    /// tears down the ones it leaves empty. Session layers call this when a
    /// connection dies without orderly unsubscribes.
    pub async fn drop_session(&self, session: SessionId) {
        let emptied: Vec<Arc<Topic>> = {
            let index = self.index.lock().await;
            let mut emptied = Vec::new();
            for topic in index.by_topic_uri.values() {
                if topic.remove_subscriber(session).await && !topic.has_subscribers().await {
                    emptied.push(topic.clone());
                }
            }
            emptied
        };

        debug!(
            event = events::SESSION_SWEEP,
            component = COMPONENT,
            session,
            emptied_topics = emptied.len(),
            "swept departing session from subscription state"
        );

        for topic in emptied {
            self.collect_if_empty(&topic).await;
        }
    }

    /// The subscription id serving `topic_uri`, when such a topic is live.
    pub async fn lookup(&self, topic_uri: &str) -> Option<SubscriptionId> {
        self.index
            .lock()
            .await
            .by_topic_uri
            .get(topic_uri)
            .map(|topic| topic.subscription_id())
    }

    pub async fn topic_count(&self) -> usize {
        self.index.lock().await.by_topic_uri.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::delivery::{DeliveryHandle, Event};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex as StdMutex;

    struct TestSession {
        session_id: SessionId,
    }

    impl TestSession {
        fn new(session_id: SessionId) -> Arc<Self> {
            Arc::new(Self { session_id })
        }
    }

    #[async_trait]
    impl SubscriberSession for TestSession {
        fn session_id(&self) -> SessionId {
            self.session_id
        }

        async fn event(&self, _subscription_id: SubscriptionId, _event: &Event) {}
    }

    struct RecordingHandle {
        topic_uri: String,
        dispose_calls: Arc<StdMutex<HashMap<String, usize>>>,
    }

    #[async_trait]
    impl DeliveryHandle for RecordingHandle {
        async fn dispose(&self) {
            let mut counts = self.dispose_calls.lock().expect("lock dispose_calls");
            *counts.entry(self.topic_uri.clone()).or_insert(0) += 1;
        }
    }

    #[derive(Default)]
    struct RecordingEngine {
        subscribe_calls: StdMutex<HashMap<String, usize>>,
        dispose_calls: Arc<StdMutex<HashMap<String, usize>>>,
        publications: StdMutex<Vec<(String, Payload)>>,
        next_publication_id: AtomicI64,
    }

    impl RecordingEngine {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                next_publication_id: AtomicI64::new(100),
                ..Default::default()
            })
        }

        fn subscribe_call_count(&self, topic_uri: &str) -> usize {
            self.subscribe_calls
                .lock()
                .expect("lock subscribe_calls")
                .get(topic_uri)
                .copied()
                .unwrap_or(0)
        }

        fn dispose_call_count(&self, topic_uri: &str) -> usize {
            self.dispose_calls
                .lock()
                .expect("lock dispose_calls")
                .get(topic_uri)
                .copied()
                .unwrap_or(0)
        }

        fn recorded_publications(&self) -> Vec<(String, Payload)> {
            self.publications.lock().expect("lock publications").clone()
        }
    }

    #[async_trait]
    impl DeliveryEngine for RecordingEngine {
        async fn subscribe(
            &self,
            _sink: Arc<dyn EventSink>,
            _options: &SubscribeOptions,
            topic_uri: &str,
        ) -> Result<Box<dyn DeliveryHandle>, RouterError> {
            let mut counts = self.subscribe_calls.lock().expect("lock subscribe_calls");
            *counts.entry(topic_uri.to_owned()).or_insert(0) += 1;
            Ok(Box::new(RecordingHandle {
                topic_uri: topic_uri.to_owned(),
                dispose_calls: self.dispose_calls.clone(),
            }))
        }

        async fn publish(
            &self,
            _options: &PublishOptions,
            topic_uri: &str,
            payload: Payload,
        ) -> Result<PublicationId, RouterError> {
            self.publications
                .lock()
                .expect("lock publications")
                .push((topic_uri.to_owned(), payload));
            Ok(self.next_publication_id.fetch_add(1, Ordering::Relaxed))
        }
    }

    struct RefusingEngine;

    #[async_trait]
    impl DeliveryEngine for RefusingEngine {
        async fn subscribe(
            &self,
            _sink: Arc<dyn EventSink>,
            _options: &SubscribeOptions,
            _topic_uri: &str,
        ) -> Result<Box<dyn DeliveryHandle>, RouterError> {
            Err(RouterError::NetworkFailure("engine offline".to_owned()))
        }

        async fn publish(
            &self,
            _options: &PublishOptions,
            _topic_uri: &str,
            _payload: Payload,
        ) -> Result<PublicationId, RouterError> {
            Err(RouterError::NetworkFailure("engine offline".to_owned()))
        }
    }

    fn make_registry(engine: Arc<RecordingEngine>) -> TopicRegistry {
        TopicRegistry::new(engine, Arc::new(IdAllocator::new()))
    }

    const TOPIC: &str = "com.myapp.topic1";

    #[tokio::test]
    async fn first_subscribe_creates_the_topic_and_later_ones_share_it() {
        let engine = RecordingEngine::new();
        let registry = make_registry(engine.clone());

        let first = registry
            .subscribe(TestSession::new(1), SubscribeOptions::default(), TOPIC)
            .await
            .expect("first subscribe");
        let second = registry
            .subscribe(TestSession::new(2), SubscribeOptions::default(), TOPIC)
            .await
            .expect("second subscribe");

        assert_eq!(first, second, "all subscribers share the topic's id");
        assert_eq!(engine.subscribe_call_count(TOPIC), 1);
        assert_eq!(registry.topic_count().await, 1);
        assert_eq!(registry.lookup(TOPIC).await, Some(first));
    }

    #[tokio::test]
    async fn unknown_unsubscribes_fail_without_mutating_state() {
        let engine = RecordingEngine::new();
        let registry = make_registry(engine.clone());

        let subscription_id = registry
            .subscribe(TestSession::new(1), SubscribeOptions::default(), TOPIC)
            .await
            .expect("subscribe");

        assert_eq!(
            registry.unsubscribe(1, subscription_id + 5).await,
            Err(RouterError::NoSuchSubscription(subscription_id + 5))
        );
        // Session 2 never joined; rejecting it must not disturb session 1.
        assert_eq!(
            registry.unsubscribe(2, subscription_id).await,
            Err(RouterError::NoSuchSubscription(subscription_id))
        );

        assert_eq!(registry.lookup(TOPIC).await, Some(subscription_id));
        assert_eq!(engine.dispose_call_count(TOPIC), 0);
    }

    #[tokio::test]
    async fn last_unsubscribe_tears_the_topic_down() {
        let engine = RecordingEngine::new();
        let registry = make_registry(engine.clone());

        let subscription_id = registry
            .subscribe(TestSession::new(1), SubscribeOptions::default(), TOPIC)
            .await
            .expect("subscribe 1");
        registry
            .subscribe(TestSession::new(2), SubscribeOptions::default(), TOPIC)
            .await
            .expect("subscribe 2");

        registry.unsubscribe(1, subscription_id).await.expect("unsubscribe 1");
        assert_eq!(engine.dispose_call_count(TOPIC), 0, "topic still has a subscriber");

        registry.unsubscribe(2, subscription_id).await.expect("unsubscribe 2");
        assert_eq!(engine.dispose_call_count(TOPIC), 1);
        assert_eq!(registry.lookup(TOPIC).await, None);
        assert_eq!(registry.topic_count().await, 0);

        let reborn = registry
            .subscribe(TestSession::new(3), SubscribeOptions::default(), TOPIC)
            .await
            .expect("resubscribe");
        assert_ne!(reborn, subscription_id, "ids are never reused");
    }

    #[tokio::test]
    async fn teardown_aborts_when_a_subscriber_returns_first() {
        let engine = RecordingEngine::new();
        let registry = make_registry(engine.clone());

        let subscription_id = registry
            .subscribe(TestSession::new(1), SubscribeOptions::default(), TOPIC)
            .await
            .expect("subscribe");

        // Split the unsubscribe the way a scheduler could: membership removal
        // reports the topic empty, and before collection runs a fresh
        // subscriber arrives.
        let emptied = registry
            .remove_member(1, subscription_id)
            .await
            .expect("remove member")
            .expect("topic reported empty");

        let revived = registry
            .subscribe(TestSession::new(2), SubscribeOptions::default(), TOPIC)
            .await
            .expect("revival subscribe");
        assert_eq!(revived, subscription_id, "the live topic was reused");

        registry.collect_if_empty(&emptied).await;

        assert_eq!(engine.dispose_call_count(TOPIC), 0, "teardown must abort");
        assert_eq!(registry.lookup(TOPIC).await, Some(subscription_id));
        assert_eq!(engine.subscribe_call_count(TOPIC), 1);
    }

    #[tokio::test]
    async fn stale_empty_reports_after_collection_are_no_ops() {
        let engine = RecordingEngine::new();
        let registry = make_registry(engine.clone());

        let subscription_id = registry
            .subscribe(TestSession::new(1), SubscribeOptions::default(), TOPIC)
            .await
            .expect("subscribe");
        let emptied = registry
            .remove_member(1, subscription_id)
            .await
            .expect("remove member")
            .expect("topic reported empty");

        registry.collect_if_empty(&emptied).await;
        assert_eq!(engine.dispose_call_count(TOPIC), 1);

        // A second report for the same instance, and one arriving after the
        // URI has been taken over by a successor topic, both fall through.
        registry.collect_if_empty(&emptied).await;
        let successor = registry
            .subscribe(TestSession::new(2), SubscribeOptions::default(), TOPIC)
            .await
            .expect("successor subscribe");
        registry.collect_if_empty(&emptied).await;

        assert_eq!(engine.dispose_call_count(TOPIC), 1, "one disposal total");
        assert_eq!(registry.lookup(TOPIC).await, Some(successor));
    }

    #[tokio::test]
    async fn engine_refusal_leaves_no_trace() {
        let registry = TopicRegistry::new(Arc::new(RefusingEngine), Arc::new(IdAllocator::new()));

        let result = registry
            .subscribe(TestSession::new(1), SubscribeOptions::default(), TOPIC)
            .await;

        assert_eq!(
            result,
            Err(RouterError::NetworkFailure("engine offline".to_owned()))
        );
        assert_eq!(registry.topic_count().await, 0);
        assert_eq!(registry.lookup(TOPIC).await, None);
    }

    #[tokio::test]
    async fn malformed_uris_are_rejected_before_any_state_changes() {
        let engine = RecordingEngine::new();
        let registry = make_registry(engine.clone());

        let bad_uri = "com..topic";
        assert_eq!(
            registry
                .subscribe(TestSession::new(1), SubscribeOptions::default(), bad_uri)
                .await,
            Err(RouterError::InvalidUri(bad_uri.to_owned()))
        );
        assert_eq!(
            registry
                .publish(&PublishOptions::default(), bad_uri, Payload::Empty)
                .await,
            Err(RouterError::InvalidUri(bad_uri.to_owned()))
        );
        assert_eq!(registry.topic_count().await, 0);
        assert!(engine.recorded_publications().is_empty());
    }

    #[tokio::test]
    async fn publish_passes_every_arity_through_unchanged() {
        let engine = RecordingEngine::new();
        let registry = make_registry(engine.clone());
        let mut kwargs = crate::payload::ArgDict::new();
        kwargs.insert("color".to_owned(), serde_json::json!("orange"));

        let payloads = vec![
            Payload::Empty,
            Payload::Args(vec![serde_json::json!(25)]),
            Payload::ArgsKwargs(vec![serde_json::json!(25)], kwargs),
        ];

        let mut seen_ids = Vec::new();
        for payload in payloads.clone() {
            let publication_id = registry
                .publish(&PublishOptions::default(), TOPIC, payload)
                .await
                .expect("publish");
            seen_ids.push(publication_id);
        }

        assert_eq!(seen_ids, vec![100, 101, 102], "engine-assigned ids pass through");
        let recorded: Vec<Payload> = engine
            .recorded_publications()
            .into_iter()
            .map(|(uri, payload)| {
                assert_eq!(uri, TOPIC);
                payload
            })
            .collect();
        assert_eq!(recorded, payloads);
    }

    #[tokio::test]
    async fn drop_session_sweeps_only_that_sessions_memberships() {
        let engine = RecordingEngine::new();
        let registry = make_registry(engine.clone());
        let shared = "com.myapp.shared";

        registry
            .subscribe(TestSession::new(1), SubscribeOptions::default(), TOPIC)
            .await
            .expect("session 1 topic");
        registry
            .subscribe(TestSession::new(1), SubscribeOptions::default(), shared)
            .await
            .expect("session 1 shared");
        let shared_id = registry
            .subscribe(TestSession::new(2), SubscribeOptions::default(), shared)
            .await
            .expect("session 2 shared");

        registry.drop_session(1).await;

        assert_eq!(registry.lookup(TOPIC).await, None);
        assert_eq!(engine.dispose_call_count(TOPIC), 1);
        assert_eq!(registry.lookup(shared).await, Some(shared_id));
        assert_eq!(engine.dispose_call_count(shared), 0);

        registry.drop_session(2).await;
        assert_eq!(registry.topic_count().await, 0);
        assert_eq!(engine.dispose_call_count(shared), 1);
    }
}
