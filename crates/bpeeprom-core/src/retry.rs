//! Bounded retry
//!
//! Used for the one place the protocol tolerates retries: getting the
//! adapter into bridge mode, where the first few resets are typically eaten
//! by whatever state the text terminal was in.

use core::ops::ControlFlow;

/// A fixed number of attempts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryBudget {
    attempts: u32,
}

impl RetryBudget {
    /// Allow up to `attempts` tries (at least one)
    pub const fn new(attempts: u32) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
        }
    }

    /// Number of tries this budget allows
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run `attempt` until it breaks with a value or the budget runs out
    ///
    /// `attempt` receives the 1-based attempt number. Returning
    /// `ControlFlow::Continue(())` asks for another try; errors abort
    /// immediately. `Ok(None)` means the budget was spent.
    pub fn run<R, E, F>(&self, mut attempt: F) -> Result<Option<R>, E>
    where
        F: FnMut(u32) -> Result<ControlFlow<R>, E>,
    {
        for n in 1..=self.attempts {
            if let ControlFlow::Break(value) = attempt(n)? {
                return Ok(Some(value));
            }
            log::trace!("attempt {}/{} did not succeed", n, self.attempts);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeds_within_budget() {
        let mut calls = 0;
        let result: Result<Option<u32>, ()> = RetryBudget::new(5).run(|n| {
            calls += 1;
            Ok(if n == 3 {
                ControlFlow::Break(n)
            } else {
                ControlFlow::Continue(())
            })
        });
        assert_eq!(result, Ok(Some(3)));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_budget_exhausted() {
        let mut calls = 0;
        let result: Result<Option<()>, ()> = RetryBudget::new(20).run(|_| {
            calls += 1;
            Ok(ControlFlow::Continue(()))
        });
        assert_eq!(result, Ok(None));
        assert_eq!(calls, 20);
    }

    #[test]
    fn test_error_aborts() {
        let mut calls = 0;
        let result: Result<Option<()>, &str> = RetryBudget::new(4).run(|_| {
            calls += 1;
            Err("broken pipe")
        });
        assert_eq!(result, Err("broken pipe"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_zero_budget_still_tries_once() {
        assert_eq!(RetryBudget::new(0).attempts(), 1);
    }
}
