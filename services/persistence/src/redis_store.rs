//! Redis backend
//!
//! State keys are written with an atomic `MULTI`/`EXEC` pipeline that also
//! `PUBLISH`es the update marker, so readers never observe a mismatched
//! triple and a notification is only sent for a committed state.
//! Each subscription owns a dedicated pub/sub connection.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ErrorKind, RedisError};
use tokio::time::Instant;
use tracing::{debug, info};

use types::errors::StoreError;
use types::keys::{KeySpace, UPDATE_MARKER};
use types::state::PiState;

use crate::store::{assemble_state, parse_precision, StateStore, Subscription, WaitOutcome};

/// Classify a Redis error into the store taxonomy.
///
/// Connectivity problems and server states that clear on their own are
/// transient; everything else is a rejection.
pub fn map_redis_error(err: RedisError) -> StoreError {
    let transient = err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
        || matches!(
            err.kind(),
            ErrorKind::IoError
                | ErrorKind::BusyLoadingError
                | ErrorKind::TryAgain
                | ErrorKind::ClusterDown
                | ErrorKind::MasterDown
        );

    if transient {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Rejected(err.to_string())
    }
}

pub struct RedisStore {
    client: Client,
    connection: ConnectionManager,
    keys: KeySpace,
}

impl RedisStore {
    /// Open a managed connection and verify it with a `PING`.
    ///
    /// An unparseable URL is a `Rejected` error; an unreachable server is
    /// `Unavailable`.
    pub async fn connect(url: &str, keys: KeySpace) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(map_redis_error)?;
        let connection = ConnectionManager::new(client.clone())
            .await
            .map_err(map_redis_error)?;

        let store = Self {
            client,
            connection,
            keys,
        };
        store.ping().await?;

        info!(url, channel = %store.keys.channel, "Connected to Redis");
        Ok(store)
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }
}

#[async_trait]
impl StateStore for RedisStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn load_precision(&self) -> Result<Option<u32>, StoreError> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn
            .get(self.keys.precision.as_str())
            .await
            .map_err(map_redis_error)?;

        raw.map(|value| parse_precision(&self.keys.precision, &value))
            .transpose()
    }

    async fn load_state(&self) -> Result<Option<PiState>, StoreError> {
        let mut conn = self.connection.clone();
        let (pi, precision, circumference): (Option<String>, Option<String>, Option<String>) =
            redis::cmd("MGET")
                .arg(self.keys.pi.as_str())
                .arg(self.keys.precision.as_str())
                .arg(self.keys.circumference.as_str())
                .query_async(&mut conn)
                .await
                .map_err(map_redis_error)?;

        assemble_state(&self.keys, pi, precision, circumference)
    }

    async fn commit(&self, state: &PiState) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .set(self.keys.pi.as_str(), state.pi.as_str())
            .ignore()
            .set(self.keys.precision.as_str(), state.precision)
            .ignore()
            .set(self.keys.circumference.as_str(), state.circumference.as_str())
            .ignore()
            .publish(self.keys.channel.as_str(), UPDATE_MARKER)
            .ignore();

        let _: () = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<Box<dyn Subscription>, StoreError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(map_redis_error)?;
        pubsub
            .subscribe(self.keys.channel.as_str())
            .await
            .map_err(map_redis_error)?;

        debug!(channel = %self.keys.channel, "Opened Redis subscription");
        Ok(Box::new(RedisSubscription {
            messages: Some(Box::pin(pubsub.into_on_message())),
        }))
    }
}

type MessageStream = Pin<Box<dyn Stream<Item = redis::Msg> + Send>>;

/// Dropping the message stream closes the pub/sub connection, which
/// unsubscribes server side.
pub struct RedisSubscription {
    messages: Option<MessageStream>,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome, StoreError> {
        let messages = self.messages.as_mut().ok_or(StoreError::SubscriptionClosed)?;
        let deadline = Instant::now() + timeout;

        loop {
            match tokio::time::timeout_at(deadline, messages.next()).await {
                Err(_) => return Ok(WaitOutcome::TimedOut),
                Ok(None) => return Err(StoreError::SubscriptionClosed),
                Ok(Some(message)) => {
                    let payload: String = message.get_payload().unwrap_or_default();
                    if payload == UPDATE_MARKER {
                        return Ok(WaitOutcome::Changed);
                    }
                    debug!(payload, "Ignoring unexpected notification payload");
                }
            }
        }
    }

    async fn close(&mut self) {
        self.messages = None;
    }
}
