use crate::routes::Route;
use tokio::sync::watch;
use tracing::debug;

/// Moves the operator to another screen. Implementations must treat a
/// request for the current screen as a no-op, since teardown may ask for the
/// login screen several times at once.
pub trait Navigator: Send + Sync {
    fn navigate(&self, to: Route);
}

/// Watch-backed current location.
#[derive(Debug)]
pub struct NavigationState {
    current: watch::Sender<Route>,
}

impl NavigationState {
    #[must_use]
    pub fn new(initial: Route) -> Self {
        let (current, _) = watch::channel(initial);
        Self { current }
    }

    #[must_use]
    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }
}

impl Navigator for NavigationState {
    fn navigate(&self, to: Route) {
        self.current.send_if_modified(|current| {
            if *current == to {
                false
            } else {
                debug!(from = current.path(), to = to.path(), "navigating");
                *current = to;
                true
            }
        });
    }
}
