//! One live topic: the subscriber book, the delivery-engine registration
//! that feeds it, and event fan-out to current subscribers.

use crate::broker::delivery::{DeliveryHandle, Event, EventSink, SubscribeOptions, SubscriberSession};
use crate::ids::{SessionId, SubscriptionId};
use crate::observability::{events, fields};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const COMPONENT: &str = "topic";

/// Book entry for one subscriber of a topic.
#[derive(Clone)]
pub(crate) struct TopicSubscriber {
    pub(crate) session: Arc<dyn SubscriberSession>,
    pub(crate) options: SubscribeOptions,
}

/// A topic with at least one subscriber, owned by the registry.
///
/// The registry serializes every book mutation under its own lock; the
/// internal mutex exists so event fan-out can read the book concurrently
/// with those mutations. The subscription id doubles as the topic's wire
/// identity: every subscriber shares it.
pub(crate) struct Topic {
    topic_uri: String,
    subscription_id: SubscriptionId,
    subscribers: Mutex<HashMap<SessionId, TopicSubscriber>>,
    delivery_handle: Mutex<Option<Box<dyn DeliveryHandle>>>,
}

impl Topic {
    pub(crate) fn new(topic_uri: impl Into<String>, subscription_id: SubscriptionId) -> Self {
        Self {
            topic_uri: topic_uri.into(),
            subscription_id,
            subscribers: Mutex::new(HashMap::new()),
            delivery_handle: Mutex::new(None),
        }
    }

    pub(crate) fn topic_uri(&self) -> &str {
        &self.topic_uri
    }

    pub(crate) fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Adds `session` to the book. Re-subscribing refreshes the stored
    /// options and keeps the membership single.
    pub(crate) async fn add_subscriber(
        &self,
        session: Arc<dyn SubscriberSession>,
        options: SubscribeOptions,
    ) {
        let session_id = session.session_id();
        self.subscribers
            .lock()
            .await
            .insert(session_id, TopicSubscriber { session, options });
    }

    /// Removes `session` from the book, reporting whether it was a member.
    pub(crate) async fn remove_subscriber(&self, session: SessionId) -> bool {
        self.subscribers.lock().await.remove(&session).is_some()
    }

    pub(crate) async fn has_subscribers(&self) -> bool {
        !self.subscribers.lock().await.is_empty()
    }

    pub(crate) async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    pub(crate) async fn subscriber_options(&self, session: SessionId) -> Option<SubscribeOptions> {
        self.subscribers
            .lock()
            .await
            .get(&session)
            .map(|subscriber| subscriber.options.clone())
    }

    pub(crate) async fn attach_delivery_handle(&self, handle: Box<dyn DeliveryHandle>) {
        *self.delivery_handle.lock().await = Some(handle);
    }

    /// Detaches the delivery-engine registration. Yields at most once; the
    /// teardown path relies on that for exactly-once disposal.
    pub(crate) async fn take_delivery_handle(&self) -> Option<Box<dyn DeliveryHandle>> {
        self.delivery_handle.lock().await.take()
    }
}

/// Receiver selection for one event: an eligible allow-list wins first, then
/// explicit exclusions, then the publisher's default self-exclusion.
fn event_reaches(event: &Event, session: SessionId) -> bool {
    if let Some(eligible) = &event.options.eligible {
        if !eligible.contains(&session) {
            return false;
        }
    }
    if event.options.exclude.contains(&session) {
        return false;
    }
    if event.options.excludes_publisher() && event.publisher == Some(session) {
        return false;
    }
    true
}

#[async_trait]
impl EventSink for Topic {
    async fn on_event(&self, event: Event) {
        // Snapshot under the lock, send after releasing it. A subscriber
        // added or removed mid-publication may or may not see this event;
        // ordering past this point belongs to the session layer.
        let recipients: Vec<Arc<dyn SubscriberSession>> = {
            let subscribers = self.subscribers.lock().await;
            subscribers
                .iter()
                .filter(|(session_id, _)| event_reaches(&event, **session_id))
                .map(|(_, subscriber)| subscriber.session.clone())
                .collect()
        };

        debug!(
            event = events::EVENT_FANOUT,
            component = COMPONENT,
            topic_uri = %self.topic_uri,
            subscription_id = self.subscription_id,
            publication_id = event.publication_id,
            subscriber_count = recipients.len(),
            payload = %fields::format_payload(&event.payload),
            "forwarding matched publication to subscribers"
        );

        for session in recipients {
            session.event(self.subscription_id, &event).await;
        }
    }
}
