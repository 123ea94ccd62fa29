//! Cooperative interrupts and OS signal wiring.

use tokio::sync::watch;

/// Receiving side; cheap to clone. Once triggered it stays triggered.
#[derive(Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

/// Sending side, held by whoever watches for signals.
pub struct InterruptTrigger {
    tx: watch::Sender<bool>,
}

pub fn interrupt_pair() -> (InterruptTrigger, Interrupt) {
    let (tx, rx) = watch::channel(false);
    (InterruptTrigger { tx }, Interrupt { rx })
}

impl InterruptTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Interrupt {
    /// An interrupt that can never fire.
    pub fn never() -> Self {
        let (_, interrupt) = interrupt_pair();
        interrupt
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once triggered. Pending forever if the trigger is dropped unfired.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, interrupting");
}
