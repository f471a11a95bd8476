//! Memoizing an expensive function with a shared statistics object.
//!
//! Run with `RUST_LOG=lrukit=trace` to see evictions and purges.

use std::rc::Rc;
use std::time::Duration;

use lrukit::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn collatz_len(n: u64) -> u64 {
    let (mut n, mut steps) = (n, 0);
    while n != 1 {
        n = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
        steps += 1;
    }
    steps
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "basic_cache=info,lrukit=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let stats = Statistics::with_keys([27u64]).into_shared();
    let mut cache = CacheBuilder::new(32).build::<u64, u64>();
    cache.monitor_with(Rc::clone(&stats));

    for n in (1..64).chain(1..64).chain([27, 27, 27]) {
        cache.get_or_insert_with(n, |&n| collatz_len(n));
    }

    info!(
        hits = stats.total_hits(),
        misses = stats.total_misses(),
        hit_rate = stats.hit_rate().unwrap_or(0.0),
        "memoized collatz lengths"
    );
    if let Ok(key_stats) = stats.stats_for(&27) {
        info!(hits = key_stats.hits, misses = key_stats.misses, "key 27");
    }
    cache.set_capacity(8);

    let mut sessions = CacheBuilder::new(4)
        .time_to_live(Duration::from_millis(50))
        .try_build_timed::<&str, u32>()
        .unwrap_or_else(|err| panic!("invalid configuration: {err}"));
    sessions.insert("alice", 1);
    sessions.insert("bob", 2);
    std::thread::sleep(Duration::from_millis(60));
    let all_expired = sessions.all_expired();
    let purged = sessions.purge_expired();
    info!(all_expired, purged, "session sweep");
}
