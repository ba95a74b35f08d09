//! # Observable
//!
//! A current-value cell UI shells can watch. Thin wrapper over
//! `tokio::sync::watch`: late subscribers immediately see the latest value,
//! intermediate values may be skipped under load (rendering only ever needs
//! the newest state).

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A shareable, watchable value.
#[derive(Debug, Clone)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// Creates an observable holding `initial`.
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Observable { tx }
    }

    /// The current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replaces the value and notifies watchers.
    pub fn set(&self, value: T) {
        // send_replace never fails; the sender keeps the channel alive.
        self.tx.send_replace(value);
    }

    /// Mutates the value in place and notifies watchers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// A stream of values, starting with the current one.
    pub fn stream(&self) -> BoxStream<'static, T> {
        WatchStream::new(self.tx.subscribe()).boxed()
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Observable::new(T::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_starts_with_current_value() {
        let obs = Observable::new(1);
        obs.set(2);

        let mut stream = obs.stream();
        assert_eq!(stream.next().await, Some(2));

        obs.set(3);
        assert_eq!(stream.next().await, Some(3));
    }

    #[test]
    fn test_update_in_place() {
        let obs = Observable::new(vec![1]);
        obs.update(|v| v.push(2));
        assert_eq!(obs.get(), vec![1, 2]);
    }
}
