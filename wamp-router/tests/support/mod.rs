use router_test_utils::{RecordingDeliveryEngine, RecordingSubscriberSession};
use std::sync::Arc;
use wamp_router::{IdAllocator, SessionId, TopicRegistry};

pub(crate) fn make_registry() -> (TopicRegistry, Arc<RecordingDeliveryEngine>) {
    let engine = Arc::new(RecordingDeliveryEngine::new());
    let registry = TopicRegistry::new(engine.clone(), Arc::new(IdAllocator::new()));
    (registry, engine)
}

pub(crate) fn make_subscriber(session: SessionId) -> Arc<RecordingSubscriberSession> {
    Arc::new(RecordingSubscriberSession::new(session))
}
