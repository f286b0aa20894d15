mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{harness, settings, FakeSource, FALLBACK};
use tokio::runtime::Handle;
use truerng::domain::model::SourceError;
use truerng::ports::random_source::RandomSource;
use truerng::ports::uniform::UniformRng;
use truerng::{AppContext, DrawFn, TrueRng};

#[tokio::test]
async fn empty_pool_serves_fallback_and_requests_one_refill() {
    let h = harness(FakeSource::new("key"), settings(10, 0.5));

    assert_eq!(h.rng.draw(), FALLBACK);
    assert!(h.rng.is_awaiting_refill());
    // A second draw while the refill is outstanding must not issue another one.
    assert_eq!(h.rng.draw(), FALLBACK);

    h.rng.refill_settled().await;
    assert_eq!(h.source.calls(), 1);
    assert_eq!(h.rng.pool_len(), 10);
    assert_eq!(h.rng.metrics().refills_issued, 1);
    assert_eq!(h.rng.metrics().fallback_draws, 2);
}

#[tokio::test]
async fn back_to_back_refill_requests_make_one_call() {
    let h = harness(FakeSource::new("key"), settings(10, 0.5));

    assert!(h.rng.request_refill());
    assert!(!h.rng.request_refill());
    h.rng.refill_settled().await;

    assert_eq!(h.source.calls(), 1);
    assert_eq!(*h.source.requested.lock().unwrap(), vec![(10, 5)]);
    assert!(!h.rng.is_awaiting_refill());
    assert!(h.rng.request_refill());
}

#[tokio::test]
async fn threshold_decides_whether_a_draw_refills() {
    let below = harness(FakeSource::new("key"), settings(50, 0.5));
    below.rng.preload(vec![0.25; 24]);
    below.rng.draw();
    assert!(below.rng.is_awaiting_refill());

    let at = harness(FakeSource::new("key"), settings(50, 0.5));
    at.rng.preload(vec![0.25; 25]);
    at.rng.draw();
    assert!(!at.rng.is_awaiting_refill());
    assert_eq!(at.rng.pool_len(), 24);
}

#[tokio::test]
async fn example_scenario_draws_by_clock_and_refills() {
    let h = harness(FakeSource::new("key"), settings(10, 0.5));
    h.rng.preload([0.11, 0.42, 0.93]);
    h.clock.0.store(1_000_004, Ordering::SeqCst); // 1_000_004 mod 3 = 2

    let v = h.rng.draw();
    assert_eq!(v, 0.93);
    assert_eq!(h.rng.pool_len(), 2);
    assert!(h.rng.is_awaiting_refill());
    assert_eq!(h.rng.last_drawn_value(), 0.93);

    h.rng.refill_settled().await;
    assert_eq!(h.rng.pool_len(), 12);
    assert_eq!(h.source.calls(), 1);
}

#[tokio::test]
async fn pre_hook_forcing_fallback_leaves_pool_untouched() {
    let h = harness(FakeSource::new("key"), settings(5, 0.5));
    h.rng.preload([0.1, 0.2, 0.3, 0.4, 0.5]);
    h.rng.on_pre_draw(|_, draw| {
        *draw = DrawFn::custom(|| 1.0);
        true
    });

    assert_eq!(h.rng.draw(), FALLBACK);
    assert_eq!(h.rng.pool_len(), 5);
    assert_eq!(h.rng.metrics().custom_draws, 0);
}

#[tokio::test]
async fn pre_hook_substitution_is_honoured_when_not_forcing() {
    let h = harness(FakeSource::new("key"), settings(5, 0.1));
    h.rng.preload([1.0, 1.0, 1.0, 1.0, 1.0]);
    h.rng.on_pre_draw(|_, draw| {
        *draw = DrawFn::custom(|| 0.0);
        false
    });
    h.rng.on_post_draw(|_, v| assert_eq!(*v, 0.0));

    assert_eq!(h.rng.draw(), 0.0);
    assert_eq!(h.rng.last_drawn_value(), 0.0);
    assert_eq!(h.rng.pool_len(), 5);
    assert_eq!(h.rng.metrics().custom_draws, 1);
}

#[tokio::test]
async fn post_hook_has_the_last_word() {
    let h = harness(FakeSource::new("key"), settings(5, 0.1));
    h.rng.preload([0.3, 0.3, 0.3]);
    h.rng.on_pre_draw(|_, draw| {
        *draw = DrawFn::Fallback;
        false
    });
    h.rng.on_post_draw(|_, v| *v = 2.0);

    // Out-of-range values pass through untouched.
    assert_eq!(h.rng.draw(), 2.0);
    assert_eq!(h.rng.last_drawn_value(), 2.0);
}

#[tokio::test]
async fn last_registration_wins_and_hooks_can_be_cleared() {
    let h = harness(FakeSource::new("key"), settings(5, 0.1));
    h.rng.preload([0.3; 4]);
    h.rng.on_post_draw(|_, v| *v = 7.0);
    h.rng.on_post_draw(|_, v| *v = 8.0);
    assert_eq!(h.rng.draw(), 8.0);

    h.rng.clear_post_draw();
    assert_eq!(h.rng.draw(), 0.3);
}

#[tokio::test]
async fn hooks_may_call_back_into_the_facade() {
    let h = harness(FakeSource::new("key"), settings(5, 0.1));
    h.rng.preload([0.5, 0.5]);
    h.rng.on_pre_draw(|rng, _| rng.pool_len() < 2);
    h.rng.on_post_draw(|rng, v| *v += rng.pool_len() as f64);

    // Pool holds 2, so no forced fallback; after the pop one value remains.
    assert_eq!(h.rng.draw(), 1.5);
}

#[tokio::test]
async fn disabled_bypasses_the_pool_entirely() {
    let h = harness(FakeSource::new("key"), settings(10, 0.5));
    h.rng.preload([0.1, 0.2]);
    h.rng.set_enabled(false);

    for _ in 0..5 {
        assert_eq!(h.rng.draw(), FALLBACK);
    }
    assert!(!h.rng.request_refill());
    tokio::task::yield_now().await;

    assert_eq!(h.rng.pool_len(), 2);
    assert_eq!(h.source.calls(), 0);
    assert!(!h.rng.is_awaiting_refill());
}

#[tokio::test]
async fn toggle_flips_enabled() {
    let h = harness(FakeSource::new("key"), settings(10, 0.5));
    assert!(!h.rng.toggle());
    assert!(!h.rng.is_enabled());
    assert!(h.rng.toggle());
    assert!(h.rng.is_enabled());
}

#[tokio::test]
async fn missing_key_alerts_once_and_never_refills() {
    let h = harness(FakeSource::new(""), settings(10, 0.5));
    h.rng.preload([0.4, 0.4]);

    for _ in 0..3 {
        assert_eq!(h.rng.draw(), FALLBACK);
    }
    assert!(h.rng.has_warned_missing_key());
    assert_eq!(h.alert.0.load(Ordering::SeqCst), 1);
    assert_eq!(h.rng.pool_len(), 2);
    assert_eq!(h.source.calls(), 0);
}

#[tokio::test]
async fn no_source_counts_as_unconfigured() {
    let alert = Arc::new(common::CountingAlert::default());
    let ctx = AppContext::new(common::FixedClock::at(0), Arc::new(|| FALLBACK), alert.clone());
    let rng = TrueRng::new(ctx, Handle::current());

    assert!(!rng.is_configured());
    assert_eq!(rng.draw(), FALLBACK);
    assert_eq!(alert.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn updating_the_source_refills_immediately() {
    let h = harness(FakeSource::new(""), settings(10, 0.5));
    let fresh = Arc::new(FakeSource::new("new-key"));
    let as_source: Arc<dyn RandomSource> = fresh.clone();

    assert!(h.rng.update_source(as_source));
    h.rng.refill_settled().await;

    assert!(h.rng.is_configured());
    assert_eq!(fresh.calls(), 1);
    assert_eq!(h.source.calls(), 0);
    assert_eq!(h.rng.pool_len(), 10);
}

#[tokio::test]
async fn failed_refill_is_absorbed_and_retried_on_next_draw() {
    let source = FakeSource::new("key").with_response(Err(SourceError::Rpc {
        code: 402,
        message: "quota exceeded".into(),
    }));
    let h = harness(source, settings(10, 0.5));

    assert_eq!(h.rng.draw(), FALLBACK);
    h.rng.refill_settled().await;
    assert_eq!(h.rng.pool_len(), 0);
    assert!(!h.rng.is_awaiting_refill());
    assert_eq!(h.rng.metrics().refills_failed, 1);

    assert_eq!(h.rng.draw(), FALLBACK);
    h.rng.refill_settled().await;
    assert_eq!(h.source.calls(), 2);
    assert_eq!(h.rng.pool_len(), 10);
}

#[tokio::test(start_paused = true)]
async fn hung_refill_is_abandoned_after_the_timeout() {
    let source = FakeSource::new("key").with_delay(Duration::from_secs(3600));
    let mut s = settings(10, 0.5);
    s.refill_timeout = Some(Duration::from_secs(1));
    let h = harness(source, s);

    assert!(h.rng.request_refill());
    h.rng.refill_settled().await;

    assert!(!h.rng.is_awaiting_refill());
    assert_eq!(h.rng.pool_len(), 0);
    assert_eq!(h.rng.metrics().refills_failed, 1);
}

#[tokio::test]
async fn draws_see_the_pre_refill_pool_until_the_task_runs() {
    let h = harness(FakeSource::new("key"), settings(10, 0.5));
    h.rng.preload([0.2, 0.2]);

    h.rng.draw();
    h.rng.draw();
    // Refill was issued on the first draw but has not been polled yet.
    assert_eq!(h.rng.pool_len(), 0);
    assert_eq!(h.rng.draw(), FALLBACK);

    h.rng.refill_settled().await;
    assert_eq!(h.rng.pool_len(), 10);
    assert_eq!(h.source.calls(), 1);
}

#[tokio::test]
async fn refills_use_current_settings() {
    let h = harness(FakeSource::new("key"), settings(10, 0.5));
    h.rng.set_capacity_target(20);
    h.rng.set_decimal_places(9);
    h.rng.set_refill_threshold(0.25);

    assert!(h.rng.request_refill());
    h.rng.refill_settled().await;

    assert_eq!(*h.source.requested.lock().unwrap(), vec![(20, 9)]);
    let s = h.rng.settings();
    assert_eq!(s.capacity_target, 20);
    assert_eq!(s.refill_threshold, 0.25);
}

#[tokio::test]
async fn works_as_a_plain_uniform_generator() {
    let h = harness(FakeSource::new("key"), settings(10, 0.1));
    h.rng.preload([0.5; 3]);
    let host: Arc<dyn UniformRng> = Arc::new(h.rng.clone());

    assert_eq!(host.next_f64(), 0.5);
    assert_eq!(h.rng.pool_len(), 2);
    assert_eq!(h.rng.get_random_number(), 0.5);
}

#[tokio::test]
async fn pool_drained_by_a_hook_is_served_by_the_fallback() {
    let h = harness(FakeSource::new("key"), settings(2, 0.1));
    h.rng.preload([0.3, 0.6]);
    h.rng.on_pre_draw(|rng, _| {
        while rng.pop().is_ok() {}
        false
    });

    assert_eq!(h.rng.draw(), FALLBACK);
    assert_eq!(h.rng.pool_len(), 0);
    let m = h.rng.metrics();
    assert_eq!(m.fallback_draws, 1);
    assert_eq!(m.pool_draws, 0);
    assert_eq!(h.rng.last_drawn_value(), FALLBACK);
}

#[tokio::test]
async fn zero_capacity_from_settings_is_raised_to_one() {
    let h = harness(FakeSource::new("key"), settings(0, 0.5));
    assert_eq!(h.rng.settings().capacity_target, 1);

    assert_eq!(h.rng.draw(), FALLBACK);
    h.rng.refill_settled().await;
    assert_eq!(*h.source.requested.lock().unwrap(), vec![(1, 5)]);
    assert_eq!(h.rng.pool_len(), 1);

    h.rng.set_capacity_target(0);
    assert_eq!(h.rng.settings().capacity_target, 1);
}

#[tokio::test]
async fn refill_threshold_stays_within_range() {
    let h = harness(FakeSource::new("key"), settings(10, 0.5));

    h.rng.set_refill_threshold(0.0);
    assert_eq!(h.rng.settings().refill_threshold, 0.01);
    h.rng.set_refill_threshold(-3.0);
    assert_eq!(h.rng.settings().refill_threshold, 0.01);
    h.rng.set_refill_threshold(4.0);
    assert_eq!(h.rng.settings().refill_threshold, 1.0);
    h.rng.set_refill_threshold(f64::NAN);
    assert_eq!(h.rng.settings().refill_threshold, 1.0);
    h.rng.set_refill_threshold(f64::INFINITY);
    assert_eq!(h.rng.settings().refill_threshold, 1.0);

    // At 1.0 any pool short of full asks for a refill.
    h.rng.preload([0.2; 9]);
    h.rng.draw();
    assert!(h.rng.is_awaiting_refill());
}

#[tokio::test]
async fn non_finite_threshold_from_settings_uses_the_default() {
    let h = harness(FakeSource::new("key"), settings(10, f64::NAN));
    assert_eq!(h.rng.settings().refill_threshold, 0.5);
}
