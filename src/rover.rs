//! Background random walk for autonomous creatures.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace, warn};

use crate::entity::{Direction, EntityId};
use crate::world::SharedWorld;

#[derive(Default)]
struct Flags {
    stop: AtomicBool,
    paused: AtomicBool,
    steps: AtomicUsize,
}

/// Handle to a thread that moves one entity in a random direction every
/// interval. Dropping the handle stops and joins the thread.
pub struct Rover {
    entity: EntityId,
    flags: Arc<Flags>,
    handle: Option<JoinHandle<()>>,
}

impl Rover {
    pub fn spawn(world: SharedWorld, entity: EntityId, interval: Duration, seed: u64) -> io::Result<Self> {
        let flags = Arc::new(Flags::default());
        let thread_flags = Arc::clone(&flags);

        let handle = thread::Builder::new()
            .name(format!("rover-{}", entity.0))
            .spawn(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                debug!(%entity, ?interval, "rover started");
                loop {
                    thread::park_timeout(interval);
                    if thread_flags.stop.load(Ordering::Acquire) {
                        break;
                    }
                    if thread_flags.paused.load(Ordering::Acquire) {
                        continue;
                    }
                    let moved = wander(&world, entity, &mut rng);
                    thread_flags.steps.fetch_add(1, Ordering::Relaxed);
                    trace!(%entity, moved, "rover step");
                }
                debug!(%entity, "rover stopped");
            })?;

        Ok(Rover {
            entity,
            flags,
            handle: Some(handle),
        })
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// While paused the thread keeps ticking but issues no moves.
    pub fn set_paused(&self, paused: bool) {
        self.flags.paused.store(paused, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused.load(Ordering::Acquire)
    }

    /// Move attempts made so far, successful or not.
    pub fn steps(&self) -> usize {
        self.flags.steps.load(Ordering::Relaxed)
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.flags.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            join_worker(handle, self.entity);
        }
    }
}

/// Join a finished rover thread, reporting a panic instead of dropping it.
/// Returns whether the thread exited cleanly.
fn join_worker(handle: JoinHandle<()>, entity: EntityId) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(%entity, %reason, "rover thread panicked");
            false
        }
    }
}

impl Drop for Rover {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One random step, taken under the world lock.
pub fn wander<R: Rng>(world: &SharedWorld, entity: EntityId, rng: &mut R) -> bool {
    let Some(&direction) = Direction::all().choose(rng) else {
        return false;
    };
    world.lock().move_entity(entity, direction)
}
