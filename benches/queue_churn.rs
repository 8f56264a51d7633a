use criterion::{criterion_group, criterion_main, Criterion};
use matchbay_server::matchmaking::MatchmakingEngine;
use matchbay_server::metrics::ServerMetrics;
use matchbay_server::protocol::MatchId;
use matchbay_server::registry::PlayerRegistry;
use matchbay_server::simulation::ServerClock;
use matchbay_server::transport::{Transport, WsTransport};
use std::hint::black_box;
use std::sync::Arc;

fn engine() -> MatchmakingEngine {
    let metrics = Arc::new(ServerMetrics::new());
    MatchmakingEngine::new(
        Arc::new(PlayerRegistry::new()),
        Arc::new(WsTransport::new(Arc::clone(&metrics))) as Arc<dyn Transport>,
        Arc::new(ServerClock::new()),
        metrics,
    )
}

fn bench_queue_churn(c: &mut Criterion) {
    c.bench_function("enqueue_cancel_512", |b| {
        let engine = engine();
        b.iter(|| {
            for player in 0..512u64 {
                engine.enqueue(player, "default", 2, 4);
            }
            // Cancel rebuilds the queue, the cost that dominates churn.
            for player in 0..512u64 {
                engine.cancel(player);
            }
        });
    });

    c.bench_function("match_id_generate", |b| {
        b.iter(|| black_box(MatchId::generate()));
    });
}

criterion_group!(queue_churn, bench_queue_churn);
criterion_main!(queue_churn);
