use crate::Event;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::time::Duration;

pub type EventFuture = BoxFuture<'static, Event>;

/// Why the dispatch loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    Requested,
    Failed(String),
}

/// Deferred work returned from an update. A task resolves to exactly one
/// event, which is fed back into the loop. Tasks own their inputs and never
/// touch the view tree.
pub enum Command {
    Task {
        label: &'static str,
        delay: Duration,
        future: EventFuture,
    },
    Quit(Exit),
}

impl Command {
    pub fn perform<F>(label: &'static str, future: F) -> Self
    where
        F: Future<Output = Event> + Send + 'static,
    {
        Self::delayed(label, Duration::ZERO, future)
    }

    pub fn delayed<F>(label: &'static str, delay: Duration, future: F) -> Self
    where
        F: Future<Output = Event> + Send + 'static,
    {
        Self::Task {
            label,
            delay,
            future: future.boxed(),
        }
    }

    /// Deliver `event` after `delay` without doing any other work.
    #[must_use]
    pub fn emit(label: &'static str, delay: Duration, event: Event) -> Self {
        Self::delayed(label, delay, async move { event })
    }

    #[must_use]
    pub fn quit() -> Self {
        Self::Quit(Exit::Requested)
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Quit(Exit::Failed(message.into()))
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Task { label, .. } => label,
            Self::Quit(_) => "quit",
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        match self {
            Self::Task { delay, .. } => *delay,
            Self::Quit(_) => Duration::ZERO,
        }
    }

    /// Wait out the delay and produce the task's event. Quit commands
    /// produce nothing.
    pub async fn run(self) -> Option<Event> {
        match self {
            Self::Task { delay, future, .. } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Some(future.await)
            }
            Self::Quit(_) => None,
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task { label, delay, .. } => f
                .debug_struct("Task")
                .field("label", label)
                .field("delay", delay)
                .finish_non_exhaustive(),
            Self::Quit(exit) => f.debug_tuple("Quit").field(exit).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_task_yields_its_event() {
        let command = Command::perform("tick", async { Event::Tick });
        assert_eq!(command.label(), "tick");
        assert_eq!(command.delay(), Duration::ZERO);
        assert!(matches!(command.run().await, Some(Event::Tick)));
    }

    #[tokio::test]
    async fn test_emit_waits_for_delay() {
        let command = Command::emit("later", Duration::from_millis(20), Event::Tick);
        assert_eq!(command.delay(), Duration::from_millis(20));

        let started = std::time::Instant::now();
        assert!(command.run().await.is_some());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_quit_produces_no_event() {
        assert!(Command::quit().run().await.is_none());
        let failed = Command::fail("boom");
        assert!(matches!(&failed, Command::Quit(Exit::Failed(m)) if m == "boom"));
    }
}
