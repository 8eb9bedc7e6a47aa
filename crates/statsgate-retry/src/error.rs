use thiserror::Error;

/// Errors the retrier itself can produce, distinct from the wrapped
/// operation's error.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },

    #[error("retries exhausted after {attempts} attempt(s): {source}")]
    Exhausted { attempts: u32, source: E },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Cancelled { attempts } | RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }
}
