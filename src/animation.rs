//! Frame clock driving the progressive render loop.
//!
//! [`Animation`] sits between the host's redraw machinery and the per-frame
//! user callback. The host owns the actual frame callbacks (vsync, redraw
//! events); it forwards each one to [`Animation::tick`], and the animation
//! asks for the next frame through a [`FrameScheduler`] as long as it is
//! running. Time comes from a [`Clock`] so tests can step it by hand.
//!
//! Total time reported to the callback excludes pauses: stopping and later
//! resuming shifts the internal origin forward by the pause length, so no
//! delta ever spans the pause. Resuming ticks once right away with a zero
//! delta; the next host frame reports an ordinary frame interval.

use std::rc::Rc;

use instant::Instant;

/// Monotonic time source, in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall-clock milliseconds since construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Host hook for requesting the next frame callback.
///
/// A windowed host forwards this to its event loop's redraw request; tests
/// just count the calls.
pub trait FrameScheduler {
    fn request_frame(&self);
}

/// A start/stoppable frame clock invoking a callback with
/// `(total_ms, delta_ms)` once per frame.
pub struct Animation {
    clock: Box<dyn Clock>,
    scheduler: Rc<dyn FrameScheduler>,
    callback: Box<dyn FnMut(f64, f64)>,
    running: bool,
    started: bool,
    /// Clock time corresponding to `total = 0`, shifted forward on resume so
    /// pauses never count into the total.
    start_time: f64,
    last_time: f64,
    stopped_at: f64,
}

impl Animation {
    pub fn new(
        clock: Box<dyn Clock>,
        scheduler: Rc<dyn FrameScheduler>,
        callback: Box<dyn FnMut(f64, f64)>,
    ) -> Self {
        Self {
            clock,
            scheduler,
            callback,
            running: false,
            started: false,
            start_time: 0.0,
            last_time: 0.0,
            stopped_at: 0.0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Restart from zero: the clock origin is reset and the callback fires
    /// immediately with `(0, 0)`, then a frame is requested.
    pub fn start(&mut self) {
        let now = self.clock.now_ms();
        self.start_time = now;
        self.last_time = now;
        self.running = true;
        self.started = true;
        (self.callback)(0.0, 0.0);
        self.scheduler.request_frame();
    }

    /// Halt the clock. Frame callbacks arriving while stopped are ignored.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.stopped_at = self.clock.now_ms();
    }

    /// Continue after [`stop`](Self::stop) without losing accumulated time.
    /// The callback fires immediately with the preserved total and a zero
    /// delta. Resuming an animation that never ran behaves like
    /// [`start`](Self::start).
    pub fn resume(&mut self) {
        if self.running {
            return;
        }
        if !self.started {
            self.start();
            return;
        }
        let pause = self.clock.now_ms() - self.stopped_at;
        self.start_time += pause;
        self.last_time += pause;
        self.running = true;
        self.tick();
    }

    /// Flip between running and stopped.
    pub fn toggle(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.resume();
        }
    }

    /// Host-side frame callback entry point. Invokes the user callback with
    /// the pause-corrected total and the delta since the previous tick, then
    /// schedules the next frame.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        let now = self.clock.now_ms();
        let delta = now - self.last_time;
        let total = now - self.start_time;
        self.last_time = now;
        (self.callback)(total, delta);
        self.scheduler.request_frame();
    }
}
