use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};

/// A shared flag asking a render to stop.
///
/// Renders poll the token between rows.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A generation number and the token cancelling its work.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub generation: u64,
    pub token: CancelToken,
}

/// Hands out one [`Ticket`] per logical request.
///
/// Issuing a ticket cancels the previous one, so only the newest
/// request's results are current.
#[derive(Debug, Default)]
pub struct Generations {
    current: AtomicU64,
    token: Mutex<CancelToken>,
}

impl Generations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersedes the current generation.
    pub fn issue(&self) -> Ticket {
        let mut token = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        *token = CancelToken::new();
        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        Ticket {
            generation,
            token: token.clone(),
        }
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}
