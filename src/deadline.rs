//! Wall-clock deadline support.
//!
//! The engine never cancels work through handles or channels; long running
//! stages instead poll a deadline at coarse boundaries and degrade to
//! partial results once it has passed.  A deadline of `None` means no time
//! limit.

use std::time::{Duration, Instant};

/// An optional point in time after which long running stages give up.
pub type Deadline = Option<Instant>;

/// Checks if a deadline was exceeded.
pub fn deadline_exceeded(deadline: Deadline) -> bool {
    match deadline {
        Some(deadline) => Instant::now() > deadline,
        None => false,
    }
}

/// Converts a duration into a deadline measured from now.
pub fn duration_to_deadline(add: Duration) -> Deadline {
    Instant::now().checked_add(add)
}

/// Converts a millisecond budget into a deadline.
///
/// A budget of `0` means no limit.
pub fn millis_to_deadline(ms: u64) -> Deadline {
    if ms == 0 {
        None
    } else {
        duration_to_deadline(Duration::from_millis(ms))
    }
}

#[test]
fn test_zero_budget_is_infinite() {
    assert!(millis_to_deadline(0).is_none());
    assert!(!deadline_exceeded(None));
}

#[test]
fn test_elapsed_deadline_is_exceeded() {
    let deadline = Some(Instant::now() - Duration::from_millis(10));
    assert!(deadline_exceeded(deadline));
}
