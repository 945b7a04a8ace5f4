//! # Cancellation Token
//!
//! One-way `NotCanceled -> Canceled` state plus the continuations waiting for
//! the transition.
//!
//! Two backends:
//! - **Local**: only [`CancellationToken::cancel`] flips the state.
//! - **Polled**: every read of [`CancellationToken::is_cancellation_requested`]
//!   asks a [`CancellationCheck`] until it first says yes; the answer is then
//!   cached for good, even if the remote record later disappears.

use parking_lot::Mutex;
use shared_types::RpcError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{trace, warn};

/// Predicate consulted by a polled token.
pub trait CancellationCheck: Send + Sync + 'static {
    fn is_canceled(&self) -> bool;
}

impl<F> CancellationCheck for F
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    fn is_canceled(&self) -> bool {
        self()
    }
}

type Callback = Box<dyn FnOnce() + Send + 'static>;

struct Listener {
    disposed: Arc<AtomicBool>,
    callback: Callback,
}

impl Listener {
    fn fire(self) {
        if !self.disposed.load(Ordering::Acquire) {
            (self.callback)();
        }
    }
}

enum TokenState {
    /// `disposed` stops new registrations until the token is cancelled.
    NotCanceled {
        listeners: Vec<Listener>,
        disposed: bool,
    },
    Canceled,
}

#[derive(Clone)]
enum TokenBackend {
    Local,
    Polled(Arc<dyn CancellationCheck>),
}

struct TokenInner {
    state: Mutex<TokenState>,
    backend: TokenBackend,
    /// Inert constants ignore `cancel` and `dispose`.
    sealed: bool,
}

/// Observable cancellation state of one call. Cheap to clone; clones share
/// state.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    fn build(backend: TokenBackend, canceled: bool, sealed: bool) -> Self {
        let state = if canceled {
            TokenState::Canceled
        } else {
            TokenState::NotCanceled {
                listeners: Vec::new(),
                disposed: false,
            }
        };
        Self {
            inner: Arc::new(TokenInner {
                state: Mutex::new(state),
                backend,
                sealed,
            }),
        }
    }

    pub(crate) fn local() -> Self {
        Self::build(TokenBackend::Local, false, false)
    }

    pub(crate) fn polled(check: Arc<dyn CancellationCheck>) -> Self {
        Self::build(TokenBackend::Polled(check), false, false)
    }

    /// A token that is never cancelled.
    #[must_use]
    pub fn none() -> Self {
        Self::build(TokenBackend::Local, false, true)
    }

    /// A token that is already cancelled.
    #[must_use]
    pub fn cancelled_token() -> Self {
        Self::build(TokenBackend::Local, true, true)
    }

    /// Whether cancellation has been requested.
    ///
    /// For a polled token this consults the check until it first returns
    /// true, firing the registered continuations on that transition.
    #[must_use]
    pub fn is_cancellation_requested(&self) -> bool {
        if matches!(*self.inner.state.lock(), TokenState::Canceled) {
            return true;
        }
        match &self.inner.backend {
            TokenBackend::Local => false,
            TokenBackend::Polled(check) => {
                if check.is_canceled() {
                    trace!("Polled token observed cancellation");
                    self.transition();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Fail with the reserved "request cancelled" error once cancellation has
    /// been requested.
    pub fn ensure_not_cancelled(&self) -> Result<(), RpcError> {
        if self.is_cancellation_requested() {
            Err(RpcError::request_cancelled())
        } else {
            Ok(())
        }
    }

    /// Register `callback` to run once when cancellation is requested.
    ///
    /// On an already-cancelled token the callback runs at the next scheduling
    /// opportunity, never before this call returns, even if the token was
    /// disposed. A disposed token that is not cancelled registers nothing.
    pub fn on_cancellation_requested<F>(&self, callback: F) -> CancellationSubscription
    where
        F: FnOnce() + Send + 'static,
    {
        let disposed = Arc::new(AtomicBool::new(false));
        let subscription = CancellationSubscription {
            disposed: Arc::clone(&disposed),
        };
        let listener = Listener {
            disposed,
            callback: Box::new(callback),
        };

        let mut state = self.inner.state.lock();
        match &mut *state {
            TokenState::NotCanceled { disposed: true, .. } => {}
            TokenState::NotCanceled { listeners, .. } => listeners.push(listener),
            TokenState::Canceled => {
                drop(state);
                defer(listener);
            }
        }
        subscription
    }

    /// Resolves once cancellation is observed. A polled token only observes it
    /// when something reads [`CancellationToken::is_cancellation_requested`].
    ///
    /// Never resolves for a token that can no longer be cancelled.
    pub async fn cancelled(&self) {
        let (tx, rx) = oneshot::channel();
        let _subscription = self.on_cancellation_requested(move || {
            let _ = tx.send(());
        });
        if rx.await.is_err() {
            futures::future::pending::<()>().await;
        }
    }

    /// Drop every registered continuation. Cached state is unaffected.
    pub fn dispose(&self) {
        if self.inner.sealed {
            return;
        }
        if let TokenState::NotCanceled {
            listeners,
            disposed,
        } = &mut *self.inner.state.lock()
        {
            *disposed = true;
            listeners.clear();
        }
    }

    pub(crate) fn cancel(&self) {
        if self.inner.sealed {
            return;
        }
        self.transition();
    }

    /// `NotCanceled -> Canceled`; fires the continuations on the first call
    /// only.
    fn transition(&self) {
        let listeners = {
            let mut state = self.inner.state.lock();
            match std::mem::replace(&mut *state, TokenState::Canceled) {
                TokenState::NotCanceled { listeners, .. } => listeners,
                TokenState::Canceled => return,
            }
        };
        for listener in listeners {
            listener.fire();
        }
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let canceled = matches!(*self.inner.state.lock(), TokenState::Canceled);
        let backend = match self.inner.backend {
            TokenBackend::Local => "local",
            TokenBackend::Polled(_) => "polled",
        };
        f.debug_struct("CancellationToken")
            .field("backend", &backend)
            .field("canceled", &canceled)
            .field("sealed", &self.inner.sealed)
            .finish()
    }
}

/// Run a continuation after the current call stack unwinds.
fn defer(listener: Listener) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::task::yield_now().await;
                listener.fire();
            });
        }
        Err(_) => {
            if let Err(e) = std::thread::Builder::new()
                .name("xc-cancel-callback".to_string())
                .spawn(move || listener.fire())
            {
                warn!(error = %e, "Could not schedule cancellation callback");
            }
        }
    }
}

/// Handle returned by [`CancellationToken::on_cancellation_requested`].
#[derive(Debug, Clone)]
pub struct CancellationSubscription {
    disposed: Arc<AtomicBool>,
}

impl CancellationSubscription {
    /// Prevent the callback from running if it has not run yet.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }
}
