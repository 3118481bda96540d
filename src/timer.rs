use crate::messages::TimerState;

/// Side effect announced by a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started,
    Paused,
    Completed,
}

/// What the tick schedule should do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSchedule {
    Keep,
    Begin,
    Cancel,
}

/// Result of feeding one input to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub event: Option<TimerEvent>,
    pub ticks: TickSchedule,
}

impl Transition {
    fn none() -> Self {
        Self {
            event: None,
            ticks: TickSchedule::Keep,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.event.is_none() && self.ticks == TickSchedule::Keep
    }
}

/// Countdown state machine
///
/// Holds the only copy of the timer state. Every method is a pure function of
/// the current state and its input: it mutates the state and reports what the
/// owner has to do (announce an event, start or cancel the tick schedule).
#[derive(Debug, Default)]
pub struct TimerMachine {
    state: TimerState,
}

impl TimerMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn start(&mut self, seconds: u64) -> Transition {
        if self.state.is_running {
            return Transition::none();
        }

        self.state = TimerState {
            is_running: true,
            time_remaining: seconds,
            total_time: seconds,
        };

        Transition {
            event: Some(TimerEvent::Started),
            ticks: TickSchedule::Begin,
        }
    }

    /// Pause the countdown. Only a stop with time left counts as a pause;
    /// completion goes through here with nothing remaining.
    pub fn stop(&mut self) -> Transition {
        if !self.state.is_running {
            return Transition::none();
        }

        self.state.is_running = false;

        Transition {
            event: (self.state.time_remaining > 0).then_some(TimerEvent::Paused),
            ticks: TickSchedule::Cancel,
        }
    }

    /// Stop (announcing a pause if one was running) and clear the countdown
    pub fn reset(&mut self) -> Transition {
        let stopped = self.stop();

        self.state.time_remaining = 0;
        self.state.total_time = 0;

        Transition {
            event: stopped.event,
            ticks: TickSchedule::Cancel,
        }
    }

    pub fn tick(&mut self) -> Transition {
        if !self.state.is_running {
            return Transition::none();
        }

        self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
        if self.state.time_remaining > 0 {
            return Transition::none();
        }

        let stopped = self.stop();
        debug_assert!(stopped.event.is_none());

        Transition {
            event: Some(TimerEvent::Completed),
            ticks: TickSchedule::Cancel,
        }
    }
}
