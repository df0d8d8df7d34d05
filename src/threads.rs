use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolClosed;

/// Flag shared between a pool and its workers. Once set, workers finish
/// the job in hand and take no further jobs.
#[derive(Clone, Debug, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct Worker {
    handle: thread::JoinHandle<()>,
}

impl Worker {
    fn new<I, F>(
        id: usize,
        mut job: F,
        rx: Arc<Mutex<mpsc::Receiver<I>>>,
        shutdown: Shutdown,
    ) -> Self
    where
        I: Send + 'static,
        F: FnMut(I) + Send + 'static,
    {
        let handle = thread::spawn(move || loop {
            if shutdown.is_triggered() {
                trace!(worker = id, "worker shutting down");
                return;
            }
            // The lock is only held while waiting for the next job
            let next = match rx.lock() {
                Ok(rx) => rx.recv(),
                Err(_) => return,
            };
            match next {
                Ok(input) => {
                    if shutdown.is_triggered() {
                        return;
                    }
                    job(input);
                }
                Err(_) => {
                    trace!(worker = id, "job queue closed");
                    return;
                }
            }
        });
        Self { handle }
    }
}

/// Fixed set of threads draining one job queue. At most `n` jobs run at once.
pub struct WorkerPool<I> {
    workers: Vec<Worker>,
    tx: Option<mpsc::Sender<I>>,
    shutdown: Shutdown,
}

impl<I> WorkerPool<I>
where
    I: Send + 'static,
{
    /// Starts `n` workers, each running the job built by one call to `f`.
    pub fn with<F, G>(n: usize, f: G) -> Self
    where
        F: FnMut(I) + Send + 'static,
        G: Fn() -> F,
    {
        Self::with_shutdown(n, Shutdown::new(), f)
    }

    /// Like [`WorkerPool::with`], with a shutdown flag the jobs can also see.
    pub fn with_shutdown<F, G>(n: usize, shutdown: Shutdown, f: G) -> Self
    where
        F: FnMut(I) + Send + 'static,
        G: Fn() -> F,
    {
        assert!(n > 0, "no workers");
        let (tx, rx) = mpsc::channel::<I>();
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..n)
            .map(|id| Worker::new(id, f(), rx.clone(), shutdown.clone()))
            .collect();
        Self {
            workers,
            tx: Some(tx),
            shutdown,
        }
    }

    pub fn submit(&self, input: I) -> Result<(), PoolClosed> {
        match &self.tx {
            Some(tx) => tx.send(input).map_err(|_| PoolClosed),
            None => Err(PoolClosed),
        }
    }

    /// Stops accepting jobs. Workers exit once the queue is drained.
    pub fn close(&mut self) {
        self.tx.take();
    }

    /// Abandons queued jobs. Jobs already running are not interrupted.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Closes the queue and waits for every worker to exit.
    pub fn join(mut self) {
        self.close();
        for worker in self.workers.drain(..) {
            let _ = worker.handle.join();
        }
    }
}

impl<I> Drop for WorkerPool<I> {
    fn drop(&mut self) {
        self.tx.take();
        if !self.workers.is_empty() {
            self.shutdown.trigger();
        }
    }
}
