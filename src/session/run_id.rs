//! Run identifiers for stores shared by several runs.

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::warn;

use crate::store::ResultStore;
use crate::{Error, Result};

/// Length of a generated run identifier.
pub const RUN_ID_LEN: usize = 8;

/// Candidate identifiers tried before giving up.
pub const MAX_RUN_ID_ATTEMPTS: usize = 64;

/// Generate a random `[A-Za-z0-9]` identifier of [`RUN_ID_LEN`] characters.
pub fn generate_run_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..RUN_ID_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

/// Pick an identifier the store has no result under.
///
/// # Errors
///
/// Returns `IdentifierExhausted` after [`MAX_RUN_ID_ATTEMPTS`] collisions,
/// or any error the store reports while being queried.
pub fn assign_run_id<S, R>(store: &S, rng: &mut R) -> Result<String>
where
    S: ResultStore + ?Sized,
    R: Rng + ?Sized,
{
    for attempt in 1..=MAX_RUN_ID_ATTEMPTS {
        let run_id = generate_run_id(rng);
        if !store.exists(&run_id)? {
            return Ok(run_id);
        }
        warn!(run_id = %run_id, attempt, "run identifier already in use, retrying");
    }

    Err(Error::IdentifierExhausted {
        attempts: MAX_RUN_ID_ATTEMPTS,
    })
}
