//! Cancellation for in-flight location queries.
//!
//! A `CancelHandle` is kept by whoever started a query (e.g. the screen that asked for a sorted
//! drop-off list) and a `CancelToken` travels with the query. Dropping the handle without calling
//! `cancel` never cancels anything.

use tokio::sync::watch;

/// The caller's side: fires the cancellation.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// The query's side: observes the cancellation.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Creates a connected handle and token.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns another token connected to this handle.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once the token is cancelled. Never completes if the handle is dropped first.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let (handle, mut token) = cancel_pair();
        assert!(!token.is_cancelled());
        let waiter = tokio::spawn(async move {
            token.cancelled().await;
            true
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_never_does_not_fire() {
        let mut token = CancelToken::never();
        let fired = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(fired.is_err());
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_token_from_handle() {
        let (handle, _) = cancel_pair();
        let token = handle.token();
        handle.cancel();
        assert!(token.is_cancelled());
    }
}
