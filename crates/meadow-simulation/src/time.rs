use meadow_core::bus::{ControlAction, Mailbox, Message, MessageBus, TimeStatus, Topic};
use meadow_core::calendar::CalendarTime;

use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::system::System;

/// Turns real frame time into whole simulated seconds.
///
/// Each whole second advances the calendar and publishes one
/// [`Message::TimeSecondPassed`]. Fractions carry over between frames and
/// across pauses.
#[derive(Debug)]
pub struct TimeSystem {
    calendar: CalendarTime,
    speed: f32,
    paused: bool,
    buffer: f64,
    controls: Option<Mailbox>,
}

impl Default for TimeSystem {
    fn default() -> Self {
        Self {
            calendar: CalendarTime::default(),
            speed: 1.0,
            paused: false,
            buffer: 0.0,
            controls: None,
        }
    }
}

impl TimeSystem {
    /// A running clock at the given speed.
    pub fn new(speed: f32) -> SimResult<Self> {
        let mut time = Self::default();
        time.set_speed(speed)?;
        Ok(time)
    }

    /// Current calendar time.
    pub fn calendar(&self) -> CalendarTime {
        self.calendar
    }

    /// Jump to a calendar time, e.g. after loading a save.
    pub fn set_calendar(&mut self, calendar: CalendarTime) {
        self.calendar = calendar;
    }

    /// In-world seconds per real second.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Change the speed. Negative and non-finite values are rejected.
    pub fn set_speed(&mut self, speed: f32) -> SimResult<()> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(SimError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    /// Returns `true` while paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fraction of a second waiting to be emitted.
    pub fn buffered(&self) -> f64 {
        self.buffer
    }

    /// Stop the clock. Publishes nothing if already paused.
    pub fn pause(&mut self, bus: &MessageBus) {
        if !self.paused {
            self.paused = true;
            tracing::info!(calendar = %self.calendar, "time paused");
            bus.publish(Message::TimeStatusChanged(TimeStatus::Paused));
        }
    }

    /// Restart the clock. Publishes nothing if already running.
    pub fn resume(&mut self, bus: &MessageBus) {
        if self.paused {
            self.paused = false;
            tracing::info!(calendar = %self.calendar, "time resumed");
            bus.publish(Message::TimeStatusChanged(TimeStatus::Resumed));
        }
    }

    /// Flip between paused and running.
    pub fn toggle_pause(&mut self, bus: &MessageBus) {
        if self.paused {
            self.resume(bus);
        } else {
            self.pause(bus);
        }
    }

    /// Accumulate `dt` real seconds and emit every whole simulated second.
    ///
    /// Returns the number of seconds emitted.
    pub fn advance(&mut self, dt: f32, bus: &MessageBus) -> u32 {
        if self.paused || self.speed == 0.0 {
            return 0;
        }
        if !dt.is_finite() || dt < 0.0 {
            tracing::warn!(dt, "ignoring invalid frame delta");
            return 0;
        }

        let scaled = dt * self.speed;
        self.buffer += f64::from(dt) * f64::from(self.speed);

        let mut emitted = 0;
        while self.buffer >= 1.0 {
            self.buffer -= 1.0;
            self.calendar.advance_second();
            emitted += 1;
            bus.publish(Message::TimeSecondPassed {
                calendar_time: self.calendar,
                dt: scaled,
            });
        }
        if emitted > 0 {
            tracing::debug!(emitted, calendar = %self.calendar, "seconds passed");
        }
        emitted
    }
}

impl System for TimeSystem {
    fn name(&self) -> &str {
        "time"
    }

    fn init(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let (_, mailbox) = ctx.bus.mailbox(Topic::Control);
        self.controls = Some(mailbox);
        Ok(())
    }

    fn update(&mut self, dt: f32, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let toggles = self
            .controls
            .as_ref()
            .map(Mailbox::take)
            .unwrap_or_default()
            .into_iter()
            .filter(|m| matches!(m, Message::Control(ControlAction::TogglePause)))
            .count();
        for _ in 0..toggles {
            self.toggle_pause(ctx.bus);
        }

        self.advance(dt, ctx.bus);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
