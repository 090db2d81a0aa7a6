//! Two-phase command/query runner.
//!
//! Every service call is a `validate` future that loads and checks
//! whatever the operation depends on, followed by an `execute` step that
//! receives the checked value and performs the work. A validation failure
//! returns before anything is written.

use std::future::Future;

/// Await `validate`, then hand its output to `execute`.
pub async fn run<C, T, E, V, X, XFut>(validate: V, execute: X) -> Result<T, E>
where
    V: Future<Output = Result<C, E>>,
    X: FnOnce(C) -> XFut,
    XFut: Future<Output = Result<T, E>>,
{
    let checked = validate.await?;
    execute(checked).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::error::CoreError;

    async fn positive(n: i64) -> Result<i64, CoreError> {
        if n > 0 {
            Ok(n)
        } else {
            Err(CoreError::Validation("must be positive".to_string()))
        }
    }

    #[tokio::test]
    async fn execute_receives_checked_value() {
        let out = run(positive(4), |n| async move { Ok::<_, CoreError>(n * 2) }).await;
        assert_eq!(out.unwrap(), 8);
    }

    #[tokio::test]
    async fn validation_failure_skips_execute() {
        let executed = AtomicBool::new(false);
        let out = run(positive(-1), |_| async {
            executed.store(true, Ordering::SeqCst);
            Ok::<_, CoreError>(())
        })
        .await;
        assert!(out.is_err());
        assert!(!executed.load(Ordering::SeqCst));
    }
}
