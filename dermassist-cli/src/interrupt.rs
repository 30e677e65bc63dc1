//! Running the CLI until it finishes or the user interrupts it
//!
//! Terminal prompts read stdin on blocking threads that cannot be
//! cancelled. The runtime is therefore shut down with a short grace period
//! instead of waiting for those threads to return.

use std::future::Future;
use std::io;
use std::time::Duration;
use tracing::{debug, warn};

/// Exit status after Ctrl-C (128 + SIGINT)
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

/// How long shutdown waits for blocking tasks before abandoning them
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Runs `work` on a fresh multi-threaded runtime until it completes or
/// `interrupt` fires
///
/// Returns `None` when interrupted. Either way the runtime is shut down
/// within [`SHUTDOWN_GRACE`], even if a blocking prompt is still waiting
/// for input.
///
/// # Errors
///
/// Returns an error if the runtime cannot be built.
///
/// # Examples
///
/// ```rust
/// use dermassist_cli_lib::interrupt::run_until_interrupted;
///
/// let outcome = run_until_interrupted(async { 42 }, std::future::pending()).unwrap();
/// assert_eq!(outcome, Some(42));
/// ```
pub fn run_until_interrupted<T, W, I>(work: W, interrupt: I) -> io::Result<Option<T>>
where
    W: Future<Output = T>,
    I: Future<Output = io::Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let outcome = runtime.block_on(async {
        tokio::pin!(work);
        tokio::select! {
            output = &mut work => Some(output),
            signal = interrupt => match signal {
                Ok(()) => {
                    warn!("Interrupted");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "Cannot listen for Ctrl-C; running to completion");
                    Some(work.await)
                }
            },
        }
    });

    debug!(grace_ms = SHUTDOWN_GRACE.as_millis(), "Shutting down runtime");
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(outcome)
}
