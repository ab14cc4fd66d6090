//! The four pairwise force-evaluation strategies (§4.4), plus the persistent
//! `WorkerPool`. Every strategy writes into `body.a` (stage 0) or
//! `body.a_stage[stage - 1]` (RK4 stages 1..=4); folding `external_force`
//! into acceleration once per body per stage happens separately in
//! `World::step` (§9's corrected, non-double-counted semantics), not here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

/// Task queue capacity (§5: "a bounded task queue"). One task is enqueued per
/// gravity-source-adjacent body per dispatch; this comfortably covers every
/// scenario in §8 while still exerting real backpressure rather than growing
/// without bound.
const TASK_QUEUE_CAPACITY: usize = 4096;

use crate::body::Body;
use crate::constants::G;
use crate::integrator::stage_position;
use crate::vector3::Vector3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceStrategy {
    Serial,
    PerBodyThread,
    WorkerPool,
    Partitioned,
}

impl Default for ForceStrategy {
    fn default() -> Self {
        ForceStrategy::Serial
    }
}

/// Read-only per-body data a force pass needs; snapshotting this before
/// parallel work starts means worker threads never alias the `Vec<Body>`.
#[derive(Debug, Clone, Copy)]
struct PairPoint {
    p: Vector3,
    mass: f64,
    contributes: bool,
}

fn snapshot(bodies: &[Body], stage: u8) -> Vec<PairPoint> {
    bodies
        .iter()
        .map(|b| PairPoint { p: stage_position(b, stage), mass: b.mass, contributes: b.contributes_to_gravity })
        .collect()
}

pub(crate) fn accel_slot(body: &mut Body, stage: u8) -> &mut Vector3 {
    if stage == 0 {
        &mut body.a
    } else {
        &mut body.a_stage[(stage - 1) as usize]
    }
}

/// `F_hat = G * d / |d|^3` between two stage-positions.
fn f_hat(pi: Vector3, pj: Vector3) -> Vector3 {
    let d = pj - pi;
    let mag = d.magnitude();
    d * (G / (mag * mag * mag))
}

/// Acceleration delta for one ordered pair, gated so that a non-contributing
/// (test) body never imparts gravity, matching Partitioned's physics exactly
/// (this is what makes the strategy-equivalence law in §8 hold when test
/// bodies are present: every strategy agrees that test bodies pull on no one).
fn pair_delta(points: &[PairPoint], i: usize, j: usize) -> (Vector3, Vector3) {
    let force = f_hat(points[i].p, points[j].p);
    let delta_i = if points[j].contributes { force * points[j].mass } else { Vector3::zero() };
    let delta_j = if points[i].contributes { force * (-points[i].mass) } else { Vector3::zero() };
    (delta_i, delta_j)
}

fn reduce_into(bodies: &mut [Body], stage: u8, deltas: &[Vector3]) {
    for (body, delta) in bodies.iter_mut().zip(deltas.iter()) {
        *accel_slot(body, stage) += *delta;
    }
}

/// Serial O(N^2) pass over all bodies, i < j.
fn serial(bodies: &mut [Body], stage: u8) {
    let points = snapshot(bodies, stage);
    let n = points.len();
    let mut deltas = vec![Vector3::zero(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            let (di, dj) = pair_delta(&points, i, j);
            deltas[i] += di;
            deltas[j] += dj;
        }
    }
    reduce_into(bodies, stage, &deltas);
}

/// One thread per `i`, sweeping `j > i`; each thread accumulates into a local
/// full-length delta vector so there is no shared mutable aliasing to guard.
fn per_body_thread(bodies: &mut [Body], stage: u8) {
    let points = snapshot(bodies, stage);
    let n = points.len();

    let partials: Vec<Vec<Vector3>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..n.saturating_sub(1))
            .map(|i| {
                let points = &points;
                scope.spawn(move || {
                    let mut local = vec![Vector3::zero(); n];
                    for j in (i + 1)..n {
                        let (di, dj) = pair_delta(points, i, j);
                        local[i] += di;
                        local[j] += dj;
                    }
                    local
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("force worker panicked")).collect()
    });

    let mut deltas = vec![Vector3::zero(); n];
    for partial in partials {
        for (slot, d) in deltas.iter_mut().zip(partial.into_iter()) {
            *slot += d;
        }
    }
    reduce_into(bodies, stage, &deltas);
}

/// `gravity_sources` pairs with Newton's third law; `gravity_sources` x
/// `test_bodies` one-sided. Skips test-test pairs entirely (they can
/// contribute nothing to each other), which is the source of the >90% CPU
/// saving scenario 5 exercises.
fn partitioned(bodies: &mut [Body], stage: u8, sources: &[usize], tests: &[usize]) {
    let points = snapshot(bodies, stage);
    let n = points.len();
    let mut deltas = vec![Vector3::zero(); n];

    for (a, &i) in sources.iter().enumerate() {
        for &j in &sources[a + 1..] {
            let (di, dj) = pair_delta(&points, i, j);
            deltas[i] += di;
            deltas[j] += dj;
        }
    }

    for &i in sources {
        for &t in tests {
            let (_, dt) = pair_delta(&points, i, t);
            deltas[t] += dt;
        }
    }

    reduce_into(bodies, stage, &deltas);
}

// --- WorkerPool -------------------------------------------------------------

struct Task {
    points: Arc<Vec<PairPoint>>,
    i: usize,
    n: usize,
}

struct TaskResult {
    i: usize,
    delta: Vec<Vector3>,
}

/// A fixed pool of threads consuming `(i, j_range)` tasks from a bounded
/// queue, alive for as long as `World`'s force strategy is `WorkerPool`
/// (§9). The queue itself is a `crossbeam_channel`; stage completion is a
/// hand-rolled countdown latch (`Mutex<usize>` + `Condvar`), mirroring the
/// source's worker thread pool one-for-one.
pub struct WorkerPool {
    task_tx: Sender<Task>,
    result_rx: Receiver<TaskResult>,
    pending: Arc<(Mutex<usize>, Condvar)>,
    handles: Vec<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(worker_count: usize) -> Self {
        let (task_tx, task_rx) = bounded::<Task>(TASK_QUEUE_CAPACITY);
        let (result_tx, result_rx) = unbounded::<TaskResult>();
        let pending = Arc::new((Mutex::new(0usize), Condvar::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let handles = (0..worker_count.max(1))
            .map(|_| {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                let pending = Arc::clone(&pending);
                let shutdown = Arc::clone(&shutdown);
                thread::spawn(move || {
                    while let Ok(task) = task_rx.recv() {
                        if shutdown.load(Ordering::SeqCst) {
                            break;
                        }
                        let mut local = vec![Vector3::zero(); task.n];
                        for j in (task.i + 1)..task.n {
                            let (di, dj) = pair_delta(&task.points, task.i, j);
                            local[task.i] += di;
                            local[j] += dj;
                        }
                        let _ = result_tx.send(TaskResult { i: task.i, delta: local });

                        let (lock, cvar) = &*pending;
                        let mut count = lock.lock().expect("worker pool mutex poisoned");
                        *count -= 1;
                        if *count == 0 {
                            cvar.notify_all();
                        }
                    }
                })
            })
            .collect();

        log::info!("worker pool started with {} threads", worker_count.max(1));
        Self { task_tx, result_rx, pending, handles, shutdown }
    }

    pub fn default_sized() -> Self {
        Self::new(num_cpus::get())
    }

    fn dispatch(&self, bodies: &mut [Body], stage: u8) {
        let points = Arc::new(snapshot(bodies, stage));
        let n = points.len();
        let task_count = n.saturating_sub(1);

        if task_count == 0 {
            return;
        }

        {
            let (lock, _cvar) = &*self.pending;
            *lock.lock().expect("worker pool mutex poisoned") = task_count;
        }

        for i in 0..task_count {
            let _ = self.task_tx.send(Task { points: Arc::clone(&points), i, n });
        }

        {
            let (lock, cvar) = &*self.pending;
            let guard = lock.lock().expect("worker pool mutex poisoned");
            let _guard = cvar.wait_while(guard, |count| *count > 0).expect("worker pool mutex poisoned");
        }

        let mut deltas = vec![Vector3::zero(); n];
        for _ in 0..task_count {
            match self.result_rx.recv() {
                Ok(result) => {
                    for (slot, d) in deltas.iter_mut().zip(result.delta.into_iter()) {
                        *slot += d;
                    }
                }
                Err(_) => {
                    log::warn!("worker pool result channel closed early at task {}", task_count);
                    break;
                }
            }
        }

        reduce_into(bodies, stage, &deltas);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Dropping the sender closes the channel; queued tasks already in
        // flight are still drained by `recv()` before workers see `Err` and
        // exit, satisfying the SchedulerShutdown policy of §7.
        let (task_tx, _) = unbounded::<Task>();
        let _ = std::mem::replace(&mut self.task_tx, task_tx);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        log::info!("worker pool shut down");
    }
}

/// Dispatches to the configured strategy. `pool` must be `Some` when
/// `strategy == WorkerPool` (the World owns and lazily creates it).
pub fn compute_accelerations(
    strategy: ForceStrategy,
    pool: Option<&WorkerPool>,
    bodies: &mut [Body],
    stage: u8,
    gravity_sources: &[usize],
    test_bodies: &[usize],
) {
    match strategy {
        ForceStrategy::Serial => serial(bodies, stage),
        ForceStrategy::PerBodyThread => per_body_thread(bodies, stage),
        ForceStrategy::WorkerPool => match pool {
            Some(pool) => pool.dispatch(bodies, stage),
            None => {
                log::warn!("WorkerPool strategy selected with no pool initialized; falling back to serial");
                serial(bodies, stage);
            }
        },
        ForceStrategy::Partitioned => partitioned(bodies, stage, gravity_sources, test_bodies),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyBuilder, BodyId};

    fn two_body_system() -> Vec<Body> {
        vec![
            BodyBuilder::new("a").mass(5.972e24).position(Vector3::zero()).build(BodyId(0)),
            BodyBuilder::new("b").mass(7.349e22).position(Vector3::new(3.844e8, 0.0, 0.0)).build(BodyId(1)),
        ]
    }

    #[test]
    fn serial_and_partitioned_agree_on_a_pure_source_system() {
        let mut a = two_body_system();
        let mut b = two_body_system();

        serial(&mut a, 0);
        partitioned(&mut b, 0, &[0, 1], &[]);

        assert!((a[0].a.x - b[0].a.x).abs() < 1e-9 * a[0].a.x.abs().max(1.0));
        assert!((a[1].a.x - b[1].a.x).abs() < 1e-9 * a[1].a.x.abs().max(1.0));
    }

    #[test]
    fn serial_and_per_body_thread_agree() {
        let mut a = two_body_system();
        let mut b = two_body_system();
        serial(&mut a, 0);
        per_body_thread(&mut b, 0);
        assert!((a[0].a.x - b[0].a.x).abs() < 1e-9 * a[0].a.x.abs().max(1.0));
        assert!((a[1].a.x - b[1].a.x).abs() < 1e-9 * a[1].a.x.abs().max(1.0));
    }

    #[test]
    fn test_bodies_never_impart_gravity() {
        let mut bodies = vec![
            BodyBuilder::new("source").mass(5.972e24).position(Vector3::zero()).build(BodyId(0)),
            BodyBuilder::new("test").mass(1.0).contributes_to_gravity(false).position(Vector3::new(1.0e7, 0.0, 0.0)).build(BodyId(1)),
        ];
        serial(&mut bodies, 0);
        assert_eq!(bodies[0].a, Vector3::zero(), "a massless test body must not pull on the source");
        assert!(bodies[1].a.magnitude() > 0.0, "the source must still pull on the test body");
    }

    #[test]
    fn worker_pool_agrees_with_serial() {
        let mut a = two_body_system();
        let mut b = two_body_system();
        serial(&mut a, 0);
        let pool = WorkerPool::new(2);
        pool.dispatch(&mut b, 0);
        assert!((a[0].a.x - b[0].a.x).abs() < 1e-9 * a[0].a.x.abs().max(1.0));
    }
}
