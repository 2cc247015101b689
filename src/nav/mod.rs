use std::time::Duration;

use tracing::debug;

use crate::{config, content::Section, error::AppError};

#[derive(Clone, Debug, PartialEq)]
pub struct NavConfig {
    /// How long every transition locks out further ones.
    pub cooldown: Duration,
    /// Minimum gap between wheel/touch transitions, checked apart from the lock.
    pub min_interval: Duration,
    pub wheel_threshold: f32,
    pub touch_threshold: f32,
    /// Hyperspace jump played right after start-up.
    pub initial_jump: Duration,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(config::COOLDOWN_MS),
            min_interval: Duration::from_millis(config::MIN_INTERVAL_MS),
            wheel_threshold: config::WHEEL_THRESHOLD,
            touch_threshold: config::TOUCH_THRESHOLD,
            initial_jump: Duration::from_millis(config::INITIAL_JUMP_MS),
        }
    }
}

impl NavConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.wheel_threshold >= 0.0 && self.touch_threshold >= 0.0) {
            return Err(AppError::InvalidConfig(
                "navigation thresholds must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where a touch landed. Only touches on the content area navigate; the
/// header, the menu overlay and links keep their own tap handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchTarget {
    Content,
    Header,
    Menu,
    Link,
}

/// Section index plus the debounce state guarding it.
///
/// All timestamps are offsets from the same clock origin. The lock is a
/// deadline rather than a timer, so dropping the navigator leaves nothing
/// pending.
#[derive(Debug)]
pub struct Navigator {
    config: NavConfig,
    index: usize,
    locked_until: Option<Duration>,
    last_transition: Option<Duration>,
    initial_jump_until: Duration,
    touch_start_y: Option<f32>,
    menu_open: bool,
}

impl Navigator {
    pub fn new(config: NavConfig, now: Duration) -> Self {
        Self {
            initial_jump_until: now + config.initial_jump,
            config,
            index: 0,
            locked_until: None,
            last_transition: None,
            touch_start_y: None,
            menu_open: false,
        }
    }

    pub fn current(&self) -> usize {
        self.index
    }

    pub fn section(&self) -> Section {
        Section::ALL[self.index]
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < Section::ALL.len()
    }

    pub fn is_locked(&self, now: Duration) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// The signal the starfield turns into jump speed.
    pub fn is_urgent(&self, now: Duration) -> bool {
        self.is_locked(now) || now < self.initial_jump_until
    }

    /// Releases an expired lock. Returns true if it did.
    pub fn update(&mut self, now: Duration) -> bool {
        match self.locked_until {
            Some(until) if now >= until => {
                self.locked_until = None;
                debug!(section = ?self.section(), "navigation unlocked");
                true
            }
            _ => false,
        }
    }

    pub fn next(&mut self, now: Duration) -> bool {
        self.transition(self.index + 1, now)
    }

    pub fn previous(&mut self, now: Duration) -> bool {
        match self.index.checked_sub(1) {
            Some(target) => self.transition(target, now),
            None => false,
        }
    }

    /// Menu navigation. Also closes the overlay menu, even when the jump is
    /// dropped.
    pub fn go_to(&mut self, index: usize, now: Duration) -> bool {
        self.menu_open = false;
        self.transition(index, now)
    }

    pub fn wheel(&mut self, delta_y: f32, now: Duration) -> bool {
        if !delta_y.is_finite() || delta_y.abs() <= self.config.wheel_threshold {
            return false;
        }
        if self.too_soon(now) {
            return false;
        }
        self.step(delta_y > 0.0, now)
    }

    pub fn touch_start(&mut self, y: Option<f32>, target: TouchTarget) {
        if target != TouchTarget::Content {
            return;
        }
        if let Some(y) = y.filter(|y| y.is_finite()) {
            self.touch_start_y = Some(y);
        }
    }

    /// A drag upward (finger moving toward the top) advances.
    pub fn touch_move(&mut self, y: Option<f32>, target: TouchTarget, now: Duration) -> bool {
        if target != TouchTarget::Content || self.menu_open {
            return false;
        }
        let (Some(start), Some(y)) = (self.touch_start_y, y.filter(|y| y.is_finite())) else {
            return false;
        };
        if self.too_soon(now) {
            return false;
        }
        let delta = start - y;
        if delta.abs() <= self.config.touch_threshold {
            return false;
        }
        self.step(delta > 0.0, now)
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    pub fn close_menu(&mut self) {
        self.menu_open = false;
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    fn step(&mut self, forward: bool, now: Duration) -> bool {
        if forward {
            self.next(now)
        } else {
            self.previous(now)
        }
    }

    fn too_soon(&self, now: Duration) -> bool {
        self.last_transition
            .is_some_and(|last| now.saturating_sub(last) < self.config.min_interval)
    }

    fn transition(&mut self, target: usize, now: Duration) -> bool {
        if target >= Section::ALL.len() || target == self.index {
            return false;
        }
        if self.is_locked(now) {
            debug!(target, "transition dropped while locked");
            return false;
        }
        debug!(from = self.index, to = target, "section transition");
        self.index = target;
        self.locked_until = Some(now + self.config.cooldown);
        self.last_transition = Some(now);
        true
    }
}
