//! Token sources: the controlling side of a [`CancellationToken`].

use crate::token::{CancellationCheck, CancellationToken};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Creates, cancels and disposes exactly one token.
///
/// The token is built lazily on first [`CancellationTokenSource::token`] and
/// memoized. Cancelling or disposing before that memoizes an inert token
/// instead.
pub struct CancellationTokenSource {
    token: Mutex<Option<CancellationToken>>,
    check: Option<Arc<dyn CancellationCheck>>,
}

impl CancellationTokenSource {
    /// Source of a locally triggered token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: Mutex::new(None),
            check: None,
        }
    }

    /// Source of a token that polls `check` until it reports cancellation.
    pub fn polled<C: CancellationCheck>(check: C) -> Self {
        Self {
            token: Mutex::new(None),
            check: Some(Arc::new(check)),
        }
    }

    pub fn token(&self) -> CancellationToken {
        let mut slot = self.token.lock();
        slot.get_or_insert_with(|| match &self.check {
            Some(check) => CancellationToken::polled(Arc::clone(check)),
            None => CancellationToken::local(),
        })
        .clone()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let token = {
            let mut slot = self.token.lock();
            match slot.as_ref() {
                Some(token) => token.clone(),
                None => {
                    *slot = Some(CancellationToken::cancelled_token());
                    return;
                }
            }
        };
        // Continuations run outside the slot lock
        token.cancel();
    }

    /// Release the token's continuations. An unread token becomes the inert
    /// never-cancelled token.
    pub fn dispose(&self) {
        let mut slot = self.token.lock();
        match slot.as_ref() {
            Some(token) => token.dispose(),
            None => *slot = Some(CancellationToken::none()),
        }
    }
}

impl Default for CancellationTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationTokenSource")
            .field("token", &*self.token.lock())
            .field("polled", &self.check.is_some())
            .finish()
    }
}
