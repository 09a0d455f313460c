//! A named connection slot with lazy, exactly-once initialization.

use crate::config::ChannelSpec;
use crate::connect::Connector;
use crate::error::{ChannelError, ChannelResult};
use crate::trace::QueryTracer;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// One named, independently configured database connection slot.
///
/// The underlying handle is created on first [`Channel::get`] and cached
/// for the life of the channel. The `OnceCell` gives single-flight
/// initialization: however many callers race, the connector runs once and
/// every caller, the initiator and all waiters alike, receives a clone of
/// the same outcome. A failed attempt is cached just like a successful
/// one and is never retried here; retry policy belongs to the caller.
pub struct Channel<C: Connector> {
    spec: ChannelSpec,
    tracer: QueryTracer,
    connector: Arc<C>,
    state: OnceCell<Result<C::Handle, ChannelError>>,
}

impl<C: Connector> std::fmt::Debug for Channel<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.spec.name)
            .field("driver", &self.spec.driver())
            .field("initialized", &self.state.initialized())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Channel<C> {
    pub fn new(spec: ChannelSpec, connector: Arc<C>) -> Self {
        let tracer = QueryTracer::new(&spec.name, spec.driver());
        Self {
            spec,
            tracer,
            connector,
            state: OnceCell::new(),
        }
    }

    pub fn spec(&self) -> &ChannelSpec {
        &self.spec
    }

    /// The statement observer scoped to this channel.
    pub fn tracer(&self) -> &QueryTracer {
        &self.tracer
    }

    /// Whether initialization has already run, successfully or not.
    pub fn is_initialized(&self) -> bool {
        self.state.initialized()
    }

    /// Get the connection handle, opening it on first call.
    ///
    /// Callers arriving while initialization is in flight wait for it to
    /// finish and observe the same outcome.
    pub async fn get(&self) -> ChannelResult<C::Handle> {
        self.state
            .get_or_init(|| async {
                let outcome = self
                    .connector
                    .connect(&self.spec, self.tracer.clone())
                    .await;
                match &outcome {
                    Ok(_) => info!(
                        channel = %self.spec.name,
                        driver = %self.spec.driver(),
                        "channel connected"
                    ),
                    Err(err) => error!(
                        channel = %self.spec.name,
                        driver = %self.spec.driver(),
                        error = %err,
                        "channel initialization failed"
                    ),
                }
                outcome
            })
            .await
            .clone()
    }
}
