use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tokio::runtime::Builder;
use wamp_router::benchmark_support::{
    run_invocation_dispatch_once, PublishFanOutFixture, TopicChurnFixture,
};

const RESIDENT_TOPIC_ROWS: usize = 128;
const CHURN_BATCH_OPS: usize = 8;
const FANOUT_SUBSCRIBERS: usize = 64;

fn router_criterion(c: &mut Criterion) {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("benchmark runtime should build");

    let mut topic_churn_group = c.benchmark_group("topic_churn");
    topic_churn_group.bench_function("create_topic", |b| {
        b.iter_batched(
            || {
                runtime
                    .block_on(TopicChurnFixture::new(RESIDENT_TOPIC_ROWS))
                    .expect("topic-churn fixture should build")
            },
            |fixture| {
                for _ in 0..CHURN_BATCH_OPS {
                    let subscription_id = runtime
                        .block_on(fixture.subscribe_churn_topic())
                        .expect("create benchmark iteration should create topic");
                    runtime
                        .block_on(fixture.unsubscribe_churn_topic(subscription_id))
                        .expect("create benchmark iteration should clear topic");
                    black_box(subscription_id);
                }
            },
            BatchSize::SmallInput,
        );
    });
    topic_churn_group.bench_function("teardown_topic", |b| {
        b.iter_batched(
            || {
                let fixture = runtime
                    .block_on(TopicChurnFixture::new(RESIDENT_TOPIC_ROWS))
                    .expect("topic-churn fixture should build");
                let primed = runtime
                    .block_on(fixture.subscribe_churn_topic())
                    .expect("teardown benchmark setup should prime topic");
                (fixture, primed)
            },
            |(fixture, mut subscription_id)| {
                for _ in 0..CHURN_BATCH_OPS {
                    runtime
                        .block_on(fixture.unsubscribe_churn_topic(subscription_id))
                        .expect("teardown benchmark iteration should tear down topic");
                    subscription_id = runtime
                        .block_on(fixture.subscribe_churn_topic())
                        .expect("teardown benchmark iteration should restore topic");
                }
                black_box(subscription_id);
            },
            BatchSize::SmallInput,
        );
    });
    topic_churn_group.finish();

    let fanout_fixture = runtime
        .block_on(PublishFanOutFixture::new(FANOUT_SUBSCRIBERS))
        .expect("publish-fanout fixture should build");

    let mut publish_fanout_group = c.benchmark_group("publish_fanout");
    publish_fanout_group.bench_function("sixty_four_subscribers", |b| {
        b.iter(|| {
            let publication_id = runtime
                .block_on(fanout_fixture.publish_once())
                .expect("fan-out benchmark iteration should publish");
            black_box(publication_id);
        });
    });
    publish_fanout_group.finish();

    let mut invocation_dispatch_group = c.benchmark_group("invocation_dispatch");
    invocation_dispatch_group.bench_function("open_operation_call", |b| {
        b.iter(|| {
            let send_count = runtime.block_on(run_invocation_dispatch_once());
            assert_eq!(
                send_count, 1,
                "dispatch benchmark iteration should reach the callee"
            );
            black_box(send_count);
        });
    });
    invocation_dispatch_group.finish();
}

criterion_group!(benches, router_criterion);
criterion_main!(benches);
