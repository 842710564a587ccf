#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use orbitcast::bus::MessageBus;
use orbitcast::config::ServiceConfig;
use orbitcast::db::LocalRepository;
use orbitcast::models::{ObserverLocation, OrbitalElements, SampleInstant, Subpoint};
use orbitcast::oracle::OrbitalOracle;
use orbitcast::services::TrackingEngine;
use orbitcast::{TrackingError, TrackingResult};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub const ISS_LINE1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
pub const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

pub fn epoch() -> SampleInstant {
    SampleInstant::parse("2024-06-01T00:00:00Z").unwrap()
}

pub fn iss_elements() -> OrbitalElements {
    OrbitalElements::new("25544", ISS_LINE1, ISS_LINE2).unwrap()
}

/// Oracle scripted by seconds elapsed since [`epoch`].
///
/// The altitude is fixed, latitude advances one degree per minute, and the
/// elevation seen by any observer follows `elevation`. Element sets whose id
/// is `"decayed"` fail every call.
pub struct ScriptedOracle {
    pub altitude_km: f64,
    pub elevation: Box<dyn Fn(i64) -> f64 + Send + Sync>,
    pub calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(altitude_km: f64, elevation: impl Fn(i64) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            altitude_km,
            elevation: Box::new(elevation),
            calls: AtomicUsize::new(0),
        }
    }

    /// Low orbit, never visible.
    pub fn leo() -> Self {
        Self::new(400.0, |_| -45.0)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OrbitalOracle for ScriptedOracle {
    fn subpoint_at(&self, elements: &OrbitalElements, instant: SampleInstant) -> TrackingResult<Subpoint> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if elements.id == "decayed" {
            return Err(TrackingError::oracle(&elements.id, "orbit decayed"));
        }
        let minutes = epoch().seconds_until(&instant) as f64 / 60.0;
        Ok(Subpoint {
            latitude: (minutes % 180.0) - 90.0,
            longitude: 0.0,
            altitude_km: self.altitude_km,
        })
    }

    fn elevation_at(
        &self,
        elements: &OrbitalElements,
        _observer: &ObserverLocation,
        instant: SampleInstant,
    ) -> TrackingResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if elements.id == "decayed" {
            return Err(TrackingError::oracle(&elements.id, "orbit decayed"));
        }
        Ok((self.elevation)(epoch().seconds_until(&instant)))
    }
}

/// Bus, store and engine wired together around `oracle`.
pub struct Harness {
    pub bus: MessageBus,
    pub store: LocalRepository,
    pub engine: TrackingEngine,
    pub oracle: Arc<ScriptedOracle>,
}

pub fn harness(oracle: ScriptedOracle) -> Harness {
    harness_with_config(oracle, ServiceConfig::default())
}

pub fn harness_with_config(oracle: ScriptedOracle, config: ServiceConfig) -> Harness {
    let bus = MessageBus::new(config.bus.channel_capacity);
    let store = LocalRepository::new(bus.clone());
    let oracle = Arc::new(oracle);
    let engine = TrackingEngine::new(oracle.clone(), Arc::new(store.clone()), config);
    Harness {
        bus,
        store,
        engine,
        oracle,
    }
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
