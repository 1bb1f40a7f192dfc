//! The restartable unit the supervisor manages.

use std::future::Future;

use crate::error::ServerResult;

/// A long-running service with an explicit start/stop lifecycle.
///
/// Both calls complete fully before returning. `stop` must succeed on an
/// instance whose `start` never ran or failed.
pub trait Service: Send {
    /// Starts serving.
    fn start(&mut self) -> impl Future<Output = ServerResult<()>> + Send;

    /// Stops serving and releases the service's resources.
    fn stop(&mut self) -> impl Future<Output = ServerResult<()>> + Send;
}

/// Builds fresh service instances, one per start or restart.
pub trait ServiceFactory {
    type Service: Service;

    /// Constructs a new, not yet started instance.
    fn create(&mut self) -> Self::Service;
}

impl<F, S> ServiceFactory for F
where
    F: FnMut() -> S,
    S: Service,
{
    type Service = S;

    fn create(&mut self) -> S {
        self()
    }
}
