//! Status transition rule driving the ticket handling timestamps.
//!
//! The rule is a pure function of the previous and next status descriptions,
//! the current handling window and the update instant:
//!
//! - to-do to in-progress with no start recorded sets the start;
//! - entering done from any other status sets the end;
//! - leaving done clears the end;
//! - anything else leaves the window untouched.
//!
//! Statuses are compared by description, so the rule holds regardless of how
//! the catalogue identifies its records.

use chrono::{DateTime, Utc};

use super::{STATUS_DONE, STATUS_IN_PROGRESS, STATUS_TODO};

/// When handling of a ticket started and finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlingWindow {
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl HandlingWindow {
    /// A window with neither timestamp recorded.
    pub const fn unset() -> Self {
        Self {
            started_at: None,
            ended_at: None,
        }
    }
}

/// Apply the status transition rule.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use helpdesk::domain::{HandlingWindow, apply_status_transition};
///
/// let now = Utc::now();
/// let window = apply_status_transition("To Do", "In Progress", HandlingWindow::unset(), now);
/// assert_eq!(window.started_at, Some(now));
/// assert_eq!(window.ended_at, None);
/// ```
pub fn apply_status_transition(
    previous: &str,
    next: &str,
    window: HandlingWindow,
    now: DateTime<Utc>,
) -> HandlingWindow {
    let mut updated = window;

    if previous == STATUS_TODO && next == STATUS_IN_PROGRESS && window.started_at.is_none() {
        updated.started_at = Some(now);
    }

    if next == STATUS_DONE && previous != STATUS_DONE {
        updated.ended_at = Some(now);
    } else if previous == STATUS_DONE && next != STATUS_DONE {
        updated.ended_at = None;
    }

    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0)
            .single()
            .expect("valid instant")
    }

    fn earlier(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(3)
    }

    #[rstest]
    fn todo_to_in_progress_starts_handling(now: DateTime<Utc>) {
        let window =
            apply_status_transition(STATUS_TODO, STATUS_IN_PROGRESS, HandlingWindow::unset(), now);
        assert_eq!(window.started_at, Some(now));
        assert_eq!(window.ended_at, None);
    }

    #[rstest]
    fn existing_start_is_kept(now: DateTime<Utc>) {
        let started = earlier(now);
        let window = HandlingWindow {
            started_at: Some(started),
            ended_at: None,
        };
        let next = apply_status_transition(STATUS_TODO, STATUS_IN_PROGRESS, window, now);
        assert_eq!(next.started_at, Some(started));
    }

    #[rstest]
    #[case(STATUS_TODO)]
    #[case(STATUS_IN_PROGRESS)]
    #[case("Waiting")]
    fn entering_done_sets_end(#[case] previous: &str, now: DateTime<Utc>) {
        let window = apply_status_transition(previous, STATUS_DONE, HandlingWindow::unset(), now);
        assert_eq!(window.ended_at, Some(now));
    }

    #[rstest]
    fn staying_done_keeps_end(now: DateTime<Utc>) {
        let ended = earlier(now);
        let window = HandlingWindow {
            started_at: None,
            ended_at: Some(ended),
        };
        let next = apply_status_transition(STATUS_DONE, STATUS_DONE, window, now);
        assert_eq!(next.ended_at, Some(ended));
    }

    #[rstest]
    #[case(STATUS_IN_PROGRESS)]
    #[case(STATUS_TODO)]
    #[case("Waiting")]
    fn leaving_done_clears_end(#[case] next: &str, now: DateTime<Utc>) {
        let started = earlier(now);
        let window = HandlingWindow {
            started_at: Some(started),
            ended_at: Some(now - Duration::minutes(5)),
        };
        let updated = apply_status_transition(STATUS_DONE, next, window, now);
        assert_eq!(updated.ended_at, None);
        assert_eq!(updated.started_at, Some(started));
    }

    #[rstest]
    #[case("Waiting", STATUS_IN_PROGRESS)]
    #[case(STATUS_IN_PROGRESS, "Waiting")]
    #[case(STATUS_TODO, STATUS_TODO)]
    fn unrelated_transitions_leave_window_unchanged(
        #[case] previous: &str,
        #[case] next: &str,
        now: DateTime<Utc>,
    ) {
        let window = HandlingWindow::unset();
        assert_eq!(apply_status_transition(previous, next, window, now), window);
    }

    #[rstest]
    fn descriptions_are_case_sensitive(now: DateTime<Utc>) {
        let window = apply_status_transition("to do", "in progress", HandlingWindow::unset(), now);
        assert_eq!(window, HandlingWindow::unset());
    }

    #[rstest]
    fn reopen_and_resolve_again_keeps_original_start(now: DateTime<Utc>) {
        let t1 = now;
        let t2 = t1 + Duration::hours(1);
        let t3 = t2 + Duration::hours(1);
        let t4 = t3 + Duration::hours(1);

        let window =
            apply_status_transition(STATUS_TODO, STATUS_IN_PROGRESS, HandlingWindow::unset(), t1);
        let window = apply_status_transition(STATUS_IN_PROGRESS, STATUS_DONE, window, t2);
        assert_eq!((window.started_at, window.ended_at), (Some(t1), Some(t2)));

        let window = apply_status_transition(STATUS_DONE, STATUS_IN_PROGRESS, window, t3);
        assert_eq!((window.started_at, window.ended_at), (Some(t1), None));

        let window = apply_status_transition(STATUS_IN_PROGRESS, STATUS_DONE, window, t4);
        assert_eq!((window.started_at, window.ended_at), (Some(t1), Some(t4)));
    }
}
