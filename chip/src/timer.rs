//! The countdown timers and the workers driving them.
use {
    crate::definitions::timer,
    parking_lot::Mutex,
    std::{
        sync::{
            atomic::{AtomicU8, Ordering},
            mpsc::{self, RecvTimeoutError, SyncSender},
            Arc,
        },
        thread::{self, JoinHandle},
        time::{Duration, Instant},
    },
};

/// The value of a countdown timer, shared between the worker ticking it
/// and the interpreter reading and writing it.
///
/// Every access is a single atomic operation, so a tick can never be
/// lost or applied twice against a concurrent write.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU8>,
}

impl Counter {
    pub fn new(value: u8) -> Self {
        Self {
            value: Arc::new(AtomicU8::new(value)),
        }
    }

    /// Will get the value that the counter is currently at.
    pub fn read(&self) -> u8 {
        self.value.load(Ordering::Acquire)
    }

    /// Will set the value from which the counter shall count down from.
    pub fn write(&self, value: u8) {
        self.value.store(value, Ordering::Release);
    }

    /// Will count down by one, a counter at zero stays at zero.
    ///
    /// Returns the value after the tick.
    pub fn tick(&self) -> u8 {
        match self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |val| val.checked_sub(1))
        {
            Ok(previous) => previous - 1,
            Err(current) => current,
        }
    }
}

/// Something that calls a callback every interval.
pub trait TimedWorker {
    /// Will initialize the new worker.
    fn new() -> Self;

    /// Will start the worker that will run the callback function
    /// every interval.
    fn start<T>(&mut self, callback: T, interval: Duration)
    where
        T: Send + FnMut() + 'static;

    /// Will stop the worker.
    fn stop(&mut self);

    /// Checks if the worker is still running.
    fn is_alive(&self) -> bool;
}

/// Is the thread backed worker.
pub struct Worker {
    /// Contains the actuall thread, that is running.
    thread: Option<JoinHandle<()>>,
    /// Contains the sync sender used to gracefull shutdown the thread.
    shutdown: Option<SyncSender<()>>,
    /// Counts the references held by the running thread.
    alive: Arc<()>,
}

impl TimedWorker for Worker {
    fn new() -> Self {
        Self {
            thread: None,
            shutdown: None,
            alive: Arc::new(()),
        }
    }

    /// The callback is scheduled against fixed deadlines, so a slow callback
    /// or a late wake up does not make the worker drift.
    fn start<T>(&mut self, mut callback: T, interval: Duration)
    where
        T: Send + FnMut() + 'static,
    {
        self.stop();

        let (send, recv) = mpsc::sync_channel::<()>(1);
        let alive = self.alive.clone();
        let thread = thread::spawn(move || {
            // only held to count the references
            let _alive = alive;
            let mut deadline = Instant::now() + interval;
            loop {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match recv.recv_timeout(timeout) {
                    Err(RecvTimeoutError::Timeout) => {
                        callback();
                        deadline += interval;
                    }
                    Ok(_) | Err(RecvTimeoutError::Disconnected) => break, // shutdown
                }
            }
        });

        self.thread = Some(thread);
        self.shutdown = Some(send);
    }

    /// Will stop the worker, in two steps one by sending an empty message
    /// and second by droping the only sender for the given receiver.
    fn stop(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            // the thread might already be gone, the join below handles that
            let _ = sender.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("The timer worker thread panicked.");
            }
        }
    }

    fn is_alive(&self) -> bool {
        Arc::strong_count(&self.alive) > 1
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

type Callback = Box<dyn FnMut() + Send>;

/// A worker that only runs its callback when told to.
///
/// Used to drive timers by hand, e.g. in tests or a single stepping debugger.
#[derive(Default)]
pub struct ManualWorker {
    callback: Mutex<Option<Callback>>,
}

impl ManualWorker {
    /// Will run the callback once.
    pub fn fire(&self) {
        if let Some(callback) = self.callback.lock().as_mut() {
            callback();
        }
    }
}

impl TimedWorker for ManualWorker {
    fn new() -> Self {
        Self::default()
    }

    fn start<T>(&mut self, callback: T, _interval: Duration)
    where
        T: Send + FnMut() + 'static,
    {
        *self.callback.lock() = Some(Box::new(callback));
    }

    fn stop(&mut self) {
        self.callback.lock().take();
    }

    fn is_alive(&self) -> bool {
        self.callback.lock().is_some()
    }
}

/// Represents a timer inside of the chip
/// infrastruture, it will count down to
/// zero from what ever number given at 60Hz.
pub struct Timer<W: TimedWorker = Worker> {
    /// The worker ticking the counter.
    worker: W,
    /// will store the value of the timer
    counter: Counter,
}

impl<W: TimedWorker> Timer<W> {
    /// Will create a new timer with the given value, it starts counting
    /// down immediately.
    pub fn new(value: u8) -> Self {
        let counter = Counter::new(value);
        let ticking = counter.clone();

        let mut worker = W::new();
        worker.start(
            move || {
                ticking.tick();
            },
            timer::INTERVAL,
        );

        debug_assert!(
            worker.is_alive(),
            "Something went wrong while initializing the worker."
        );
        Self { worker, counter }
    }

    /// Will get the value that the timer is currently at.
    pub fn read(&self) -> u8 {
        self.counter.read()
    }

    /// Will set the value from which the timer shall count down from.
    pub fn write(&self, value: u8) {
        self.counter.write(value)
    }

    /// A handle to the shared value, for readers outside of the interpreter.
    pub fn counter(&self) -> Counter {
        self.counter.clone()
    }

    pub fn worker(&self) -> &W {
        &self.worker
    }

    pub fn worker_mut(&mut self) -> &mut W {
        &mut self.worker
    }
}
