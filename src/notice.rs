use std::time::{Duration, Instant};

pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
struct ActiveNotice {
    message: String,
    kind: NoticeKind,
    expires_at: Instant,
}

/// Single-slot, self-clearing message. Showing a new message replaces the
/// current one and restarts the timer.
#[derive(Debug, Clone)]
pub struct Notice {
    duration: Duration,
    active: Option<ActiveNotice>,
}

impl Default for Notice {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_DURATION)
    }
}

impl Notice {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            active: None,
        }
    }

    pub fn show(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.show_at(kind, message, Instant::now());
    }

    pub fn show_at(&mut self, kind: NoticeKind, message: impl Into<String>, now: Instant) {
        self.active = Some(ActiveNotice {
            message: message.into(),
            kind,
            expires_at: now + self.duration,
        });
    }

    /// Clears the notice once its deadline has passed. Returns true when a
    /// notice was dismissed by this call.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.active {
            Some(active) if now >= active.expires_at => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.message.as_str())
    }

    pub fn kind(&self) -> Option<NoticeKind> {
        self.active.as_ref().map(|active| active.kind)
    }

    pub fn is_visible(&self) -> bool {
        self.active.is_some()
    }
}
