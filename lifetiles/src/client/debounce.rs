//! Input coalescing.

use std::time::Duration;

use tokio::sync::mpsc;

/// Default coalescing window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Trailing-edge debouncer over an mpsc channel.
///
/// [`next`](Self::next) waits for an input, then keeps absorbing inputs
/// until none arrives for a full window, and yields only the latest one.
pub struct Debouncer<T> {
    rx: mpsc::Receiver<T>,
    window: Duration,
    closed: bool,
}

impl<T> Debouncer<T> {
    /// Debounce `rx` over `window`.
    pub fn new(rx: mpsc::Receiver<T>, window: Duration) -> Self {
        Self {
            rx,
            window,
            closed: false,
        }
    }

    /// Coalescing window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Next settled input, or `None` once the sender side is gone and
    /// nothing is pending.
    pub async fn next(&mut self) -> Option<T> {
        if self.closed {
            return None;
        }
        let mut latest = match self.rx.recv().await {
            Some(value) => value,
            None => {
                self.closed = true;
                return None;
            }
        };

        loop {
            tokio::select! {
                received = self.rx.recv() => match received {
                    Some(value) => latest = value,
                    None => {
                        self.closed = true;
                        return Some(latest);
                    }
                },
                _ = tokio::time::sleep(self.window) => return Some(latest),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_coalesced() {
        let (tx, rx) = mpsc::channel(16);
        let mut debouncer = Debouncer::new(rx, DEFAULT_DEBOUNCE);

        let start = Instant::now();
        tokio::spawn(async move {
            for i in 0..5 {
                tx.send(i).await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            // Keep the channel open past the window.
            tokio::time::sleep(Duration::from_secs(1)).await;
        });

        assert_eq!(debouncer.next().await, Some(4));
        // Last input at 80 ms, settled one window later.
        assert_eq!(start.elapsed(), Duration::from_millis(180));
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_inputs_pass_through() {
        let (tx, rx) = mpsc::channel(16);
        let mut debouncer = Debouncer::new(rx, DEFAULT_DEBOUNCE);

        tokio::spawn(async move {
            tx.send("a").await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            tx.send("b").await.unwrap();
        });

        assert_eq!(debouncer.next().await, Some("a"));
        assert_eq!(debouncer.next().await, Some("b"));
        assert_eq!(debouncer.next().await, None);
    }

    #[tokio::test]
    async fn test_closed_channel_flushes_latest() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        drop(tx);

        let mut debouncer = Debouncer::new(rx, DEFAULT_DEBOUNCE);
        assert_eq!(debouncer.next().await, Some(2));
        assert_eq!(debouncer.next().await, None);
    }
}
