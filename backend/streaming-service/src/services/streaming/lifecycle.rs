//! Stream status transitions
//!
//! Pure functions shared by the poller and the webhook handler. Neither path
//! writes anything unless one of these returns a transition.

use chrono::{DateTime, Utc};

use super::models::{LiveStream, ProviderState, StreamStatus, Transition};

/// Plan the transition that moves `stream` to `target` at time `at`.
///
/// Returns `None` when the stream already is in `target`, when `target` is
/// not a reachable state, or when the stream has ended.
pub fn plan_transition(
    stream: &LiveStream,
    target: StreamStatus,
    at: DateTime<Utc>,
) -> Option<Transition> {
    if stream.status.is_terminal() || stream.status == target {
        return None;
    }

    match target {
        StreamStatus::Live => Some(Transition::GoLive { started_at: at }),
        StreamStatus::Ended => {
            let duration_minutes = match (stream.status, stream.started_at) {
                (StreamStatus::Live, Some(started_at)) => Some(duration_minutes(started_at, at)),
                (StreamStatus::Live, None) => Some(0),
                _ => None,
            };
            Some(Transition::End {
                ended_at: at,
                duration_minutes,
            })
        }
        StreamStatus::Scheduled | StreamStatus::Waiting => None,
    }
}

/// Map what the provider reports onto a transition for `stream`.
///
/// `active` means live. `idle` only ends a stream that is currently live:
/// the provider reports `idle` before the first broadcast as well.
pub fn reconcile_provider_state(
    stream: &LiveStream,
    state: &ProviderState,
    now: DateTime<Utc>,
) -> Option<Transition> {
    match state {
        ProviderState::Active => plan_transition(stream, StreamStatus::Live, now),
        ProviderState::Idle if stream.status == StreamStatus::Live => {
            plan_transition(stream, StreamStatus::Ended, now)
        }
        _ => None,
    }
}

/// Whole minutes between `started_at` and `ended_at`, rounded up.
pub fn duration_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> i32 {
    let seconds = (ended_at - started_at).num_seconds().max(0);
    let minutes = (seconds + 59) / 60;
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

/// Return `stream` with `transition` applied, the way the repository writes it.
pub fn apply(stream: &LiveStream, transition: &Transition) -> LiveStream {
    let mut next = stream.clone();
    match *transition {
        Transition::GoLive { started_at } => {
            next.status = StreamStatus::Live;
            next.started_at = Some(started_at);
        }
        Transition::End {
            ended_at,
            duration_minutes,
        } => {
            next.status = StreamStatus::Ended;
            next.ended_at = Some(ended_at);
            if next.duration_minutes.is_none() {
                next.duration_minutes = duration_minutes;
            }
        }
    }
    next
}
