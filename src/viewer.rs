//! Sampling session
//!
//! [`SoundViewer`] ties the pipeline together. One pass reads the global
//! flag registers, then for each of the eight voices runs the channel
//! sampler and note detector, feeds the monitored voice to the transition
//! logger, and finally hands a [`ViewerFrame`] to the presentation sink.
//!
//! Passes only run while the viewer is shown. Showing starts a fresh
//! session (all voices silent) and runs one pass straight away; later
//! passes follow the [`PollScheduler`]. Everything happens on the calling
//! thread.

use crate::channel_state::ChannelState;
use crate::config::ViewerConfig;
use crate::dsp::{GlobalModes, RegisterSource, VOICE_COUNT};
use crate::presentation::PresentationSink;
use crate::scheduler::{PollScheduler, SchedulerState};
use crate::transition_log::TransitionLogger;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// State of every voice after one pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerFrame {
    /// Pass counter, starting at 1
    pub pass: u64,
    /// Per-voice state, indexed by voice
    pub channels: [ChannelState; VOICE_COUNT],
    /// Whether this pass appended a line to the note log
    pub logged_transition: bool,
}

/// Live sound viewer over a register source
pub struct SoundViewer<R, S> {
    source: R,
    sink: S,
    config: ViewerConfig,
    channels: [ChannelState; VOICE_COUNT],
    logger: Option<TransitionLogger>,
    scheduler: PollScheduler,
    pass: u64,
}

impl<R: RegisterSource, S: PresentationSink> SoundViewer<R, S> {
    /// Create a hidden viewer. If a monitor target is configured the note
    /// log is created with its header when missing.
    pub fn new(source: R, sink: S, config: ViewerConfig) -> Self {
        let logger = config.monitor.map(|target| {
            let logger = TransitionLogger::new(target, config.log_path.clone());
            logger.prepare();
            logger
        });
        let scheduler = PollScheduler::new(config.poll_interval());
        Self {
            source,
            sink,
            config,
            channels: fresh_channels(),
            logger,
            scheduler,
            pass: 0,
        }
    }

    /// Make the viewer active. On the Idle -> Running edge this starts a
    /// fresh session and runs one pass immediately.
    ///
    /// Returns `true` if the viewer was hidden before.
    pub fn show(&mut self) -> bool {
        if !self.scheduler.activate() {
            return false;
        }
        self.channels = fresh_channels();
        log::info!(
            "sound viewer session started ({} ms interval)",
            self.scheduler.interval().as_millis()
        );
        self.tick(Instant::now());
        true
    }

    /// Make the viewer inactive. No further passes are scheduled.
    ///
    /// Returns `true` if the viewer was shown before.
    pub fn hide(&mut self) -> bool {
        let was_running = self.scheduler.deactivate();
        if was_running {
            log::info!("sound viewer session stopped after {} passes", self.pass);
        }
        was_running
    }

    /// Run the next pass if it is due. Returns `true` if a pass ran.
    pub fn poll(&mut self) -> bool {
        self.tick(Instant::now())
    }

    /// Time until the next scheduled pass, `None` while hidden
    pub fn time_until_next_pass(&self) -> Option<Duration> {
        self.scheduler.time_until_due(Instant::now())
    }

    /// Run one pass now, regardless of scheduling, and return its frame.
    pub fn run_pass(&mut self) -> ViewerFrame {
        let globals = GlobalModes::read(&self.source);
        let mut logged_transition = false;

        for ch in self.channels.iter_mut() {
            ch.update(&self.source, &globals);
            if let Some(logger) = self.logger.as_mut() {
                if logger.target().voice == ch.channel {
                    logged_transition = logger.observe(&self.source);
                }
            }
        }

        self.pass += 1;
        let frame = ViewerFrame {
            pass: self.pass,
            channels: self.channels,
            logged_transition,
        };
        self.sink.present(&frame);
        frame
    }

    /// Follow `observer` until it is closed: passes run on schedule while
    /// it is visible, and the loop sleeps while it is hidden.
    pub fn run(&mut self, observer: &Observer) {
        loop {
            let seen = observer.snapshot();
            if seen.closed {
                self.hide();
                break;
            }
            if seen.visible {
                self.show();
            } else {
                self.hide();
            }

            let now = Instant::now();
            if self.tick(now) {
                continue;
            }
            observer.wait_for_change(seen, self.scheduler.time_until_due(now));
        }
    }

    fn tick(&mut self, now: Instant) -> bool {
        if !self.scheduler.begin_pass(now) {
            return false;
        }
        self.run_pass();
        self.scheduler.complete_pass(Instant::now());
        true
    }

    /// Scheduler state
    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Current per-voice state
    pub fn channels(&self) -> &[ChannelState; VOICE_COUNT] {
        &self.channels
    }

    /// Passes run since creation
    pub fn passes(&self) -> u64 {
        self.pass
    }

    /// Transition logger, if monitoring is enabled
    pub fn logger(&self) -> Option<&TransitionLogger> {
        self.logger.as_ref()
    }

    /// Active configuration
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Register source
    pub fn source(&self) -> &R {
        &self.source
    }

    /// Mutable register source, e.g. to step a capture
    pub fn source_mut(&mut self) -> &mut R {
        &mut self.source
    }

    /// Presentation sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Take the viewer apart
    pub fn into_parts(self) -> (R, S) {
        (self.source, self.sink)
    }
}

fn fresh_channels() -> [ChannelState; VOICE_COUNT] {
    std::array::from_fn(ChannelState::new)
}

/// Observer state as seen by the run loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverState {
    /// Observer wants live updates
    pub visible: bool,
    /// Observer is gone; the run loop exits
    pub closed: bool,
}

/// Visibility handle shared between a UI and [`SoundViewer::run`]
#[derive(Debug, Clone, Default)]
pub struct Observer {
    inner: Arc<(Mutex<ObserverState>, Condvar)>,
}

impl Observer {
    /// Create a hidden observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Show or hide
    pub fn set_visible(&self, visible: bool) {
        self.update(|state| state.visible = visible);
    }

    /// End the run loop
    pub fn close(&self) {
        self.update(|state| state.closed = true);
    }

    /// Current visibility
    pub fn is_visible(&self) -> bool {
        self.snapshot().visible
    }

    /// Current state
    pub fn snapshot(&self) -> ObserverState {
        *self.inner.0.lock()
    }

    fn update(&self, f: impl FnOnce(&mut ObserverState)) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock();
        f(&mut *state);
        cvar.notify_all();
    }

    /// Block until the state differs from `seen` or `timeout` elapses.
    /// Without a timeout, waits for a change only.
    fn wait_for_change(&self, seen: ObserverState, timeout: Option<Duration>) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock();
        match timeout {
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while *state == seen {
                    if cvar.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
            }
            None => {
                while *state == seen {
                    cvar.wait(&mut state);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{RegisterFile, SharedRegisters, VoiceRegister};
    use crate::presentation::FrameRecorder;

    fn quiet_config() -> ViewerConfig {
        ViewerConfig::default().with_monitor(None)
    }

    #[test]
    fn test_hidden_viewer_does_not_poll() {
        let mut viewer = SoundViewer::new(RegisterFile::new(), FrameRecorder::new(), quiet_config());
        assert_eq!(viewer.state(), SchedulerState::Idle);
        assert!(!viewer.poll());
        assert_eq!(viewer.passes(), 0);
        assert_eq!(viewer.time_until_next_pass(), None);
    }

    #[test]
    fn test_show_runs_one_pass_immediately() {
        let mut viewer = SoundViewer::new(RegisterFile::new(), FrameRecorder::new(), quiet_config());
        assert!(viewer.show());
        assert_eq!(viewer.passes(), 1);
        assert!(!viewer.show());
        assert_eq!(viewer.passes(), 1);
        assert!(!viewer.poll());
        assert_eq!(viewer.sink().frames().len(), 1);
    }

    #[test]
    fn test_show_starts_fresh_session() {
        let mut regs = RegisterFile::new();
        regs.write(VoiceRegister::Output.addr(0), 127);
        let mut viewer = SoundViewer::new(regs, FrameRecorder::new(), quiet_config());

        viewer.show();
        viewer.run_pass();
        assert!(viewer.channels()[0].amplitude > 0.4);

        viewer.hide();
        viewer.show();
        // One pass from a zero envelope
        assert!((viewer.channels()[0].amplitude - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_pass_numbers_increase() {
        let mut viewer = SoundViewer::new(RegisterFile::new(), FrameRecorder::new(), quiet_config());
        viewer.run_pass();
        viewer.run_pass();
        let passes: Vec<u64> = viewer.sink().frames().iter().map(|f| f.pass).collect();
        assert_eq!(passes, vec![1, 2]);
    }

    #[test]
    fn test_run_loop_follows_observer() {
        let regs = SharedRegisters::new();
        let observer = Observer::new();
        let config = quiet_config().with_poll_interval_ms(1);

        let loop_observer = observer.clone();
        let loop_regs = regs.clone();
        let handle = std::thread::spawn(move || {
            let mut viewer = SoundViewer::new(loop_regs, FrameRecorder::new(), config);
            viewer.run(&loop_observer);
            viewer.passes()
        });

        observer.set_visible(true);
        std::thread::sleep(Duration::from_millis(30));
        observer.set_visible(false);
        std::thread::sleep(Duration::from_millis(10));
        observer.close();

        let passes = handle.join().unwrap();
        assert!(passes >= 2, "expected several passes, got {passes}");
    }

    #[test]
    fn test_closed_observer_exits_immediately() {
        let observer = Observer::new();
        observer.close();
        let mut viewer = SoundViewer::new(RegisterFile::new(), FrameRecorder::new(), quiet_config());
        viewer.run(&observer);
        assert_eq!(viewer.passes(), 0);
    }
}
