//! `GET /pi-stream`: one server-sent event per persisted precision level
//!
//! Each admitted connection gets its own [`FanOut`] task feeding the response
//! body through a bounded channel. The task owns the throttle slot, so the
//! slot is released exactly once however the task ends, panics and runtime
//! shutdown included.
//!
//! Lifecycle: admitting (throttle) -> subscribed -> streaming -> closing
//! (unsubscribe, release) -> closed.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, KeepAliveStream, Sse},
    },
};
use persistence::{StateStore, Subscription, WaitOutcome};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use types::numeric::FixedDecimal;
use types::state::PiSnapshot;

use crate::error::AppError;
use crate::handlers::snapshot::read_snapshot;
use crate::session::Session;
use crate::state::AppState;
use crate::throttle::ThrottleSlot;

type EventSender = mpsc::Sender<Result<Event, Infallible>>;
type EventStream = ReceiverStream<Result<Event, Infallible>>;

pub async fn pi_stream(State(state): State<AppState>, session: Session) -> Response {
    let result = open_stream(&state, &session).await;
    session.attach(result.into_response())
}

async fn open_stream(
    state: &AppState,
    session: &Session,
) -> Result<Sse<KeepAliveStream<EventStream>>, AppError> {
    let slot = state.throttle.try_acquire(&session.id).ok_or_else(|| {
        warn!(
            session = %session.id,
            limit = state.throttle.limit(),
            "Stream denied, connection limit reached"
        );
        AppError::RateLimitExceeded("Connection limit reached for this session.".to_string())
    })?;

    // Subscribe before the first read so no commit falls between the two.
    let mut subscription = state.store.subscribe().await?;
    let initial = match read_snapshot(state).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            subscription.close().await;
            return Err(err);
        }
    };

    let (events, receiver) = mpsc::channel(state.config.stream_buffer);
    // The channel is empty and holds at least one event.
    let _ = events.try_send(Ok(snapshot_event(&initial)));

    info!(
        session = %session.id,
        live = state.throttle.live_count(&session.id),
        "Stream opened"
    );

    let fan_out = FanOut {
        store: Arc::clone(&state.store),
        subscription,
        events,
        radius: state.config.radius.clone(),
        poll_timeout: state.config.poll_timeout,
        slot,
    };
    tokio::spawn(fan_out.run());

    Ok(Sse::new(ReceiverStream::new(receiver))
        .keep_alive(KeepAlive::new().interval(state.config.keep_alive)))
}

fn snapshot_event(snapshot: &PiSnapshot) -> Event {
    Event::default().data(snapshot.to_json())
}

/// Why a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    ClientGone,
    StoreLost,
}

/// Per-connection loop pushing a fresh snapshot after every notification.
struct FanOut {
    store: Arc<dyn StateStore>,
    subscription: Box<dyn Subscription>,
    events: EventSender,
    radius: FixedDecimal,
    poll_timeout: Duration,
    slot: ThrottleSlot,
}

impl FanOut {
    async fn run(mut self) {
        let reason = self.stream().await;
        self.subscription.close().await;
        info!(session = %self.slot.session(), ?reason, "Stream closed");
    }

    async fn stream(&mut self) -> CloseReason {
        loop {
            match self.subscription.wait(self.poll_timeout).await {
                Ok(WaitOutcome::Changed) => {
                    let snapshot = match self.store.load_state().await {
                        Ok(stored) => PiSnapshot::from_stored(stored.as_ref(), &self.radius),
                        Err(err) => {
                            warn!(session = %self.slot.session(), error = %err, "Snapshot read failed");
                            return CloseReason::StoreLost;
                        }
                    };
                    debug!(session = %self.slot.session(), pi = %snapshot.pi, "Pushing snapshot");
                    if self.events.send(Ok(snapshot_event(&snapshot))).await.is_err() {
                        return CloseReason::ClientGone;
                    }
                }
                Ok(WaitOutcome::TimedOut) => {
                    if self.events.is_closed() {
                        return CloseReason::ClientGone;
                    }
                }
                Err(err) => {
                    warn!(session = %self.slot.session(), error = %err, "Subscription failed");
                    return CloseReason::StoreLost;
                }
            }
        }
    }
}
