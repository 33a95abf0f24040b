use tokio::sync::watch;

use crate::stores::MessagingState;

type Projection<T> = Box<dyn Fn(&MessagingState) -> T + Send + Sync>;

/// A narrow, change-filtered view of the messaging state.
///
/// The selector re-runs its projection whenever the store commits, but only
/// reports a change when the projected value differs from the last one it
/// handed out. A view holding a `Selector<u32>` for the unread badge is
/// therefore not woken by typing indicators or history loads.
pub struct Selector<T> {
    rx: watch::Receiver<MessagingState>,
    project: Projection<T>,
    last: T,
}

impl<T: Clone + PartialEq> Selector<T> {
    pub fn new(
        mut rx: watch::Receiver<MessagingState>,
        project: impl Fn(&MessagingState) -> T + Send + Sync + 'static,
    ) -> Self {
        let last = project(&rx.borrow_and_update());
        Self {
            rx,
            project: Box::new(project),
            last,
        }
    }

    /// The value as of the last observed change.
    pub fn current(&self) -> &T {
        &self.last
    }

    /// Wait until the projected value changes.
    ///
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            if let Some(value) = self.refresh() {
                return Some(value);
            }
        }
    }

    /// Re-project the latest state without waiting. `Some` if it changed.
    pub fn refresh(&mut self) -> Option<T> {
        let next = (self.project)(&self.rx.borrow_and_update());
        if next == self.last {
            return None;
        }
        self.last = next.clone();
        Some(next)
    }
}
