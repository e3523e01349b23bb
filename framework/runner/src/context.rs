use crate::config::TargetConfig;
use gust_client::prelude::Method;
use gust_client::{Dispatcher, Payload};
use gust_core::prelude::{Clock, ShutdownHandle, ShutdownListener, ShutdownSignalError};
use gust_instruments::{Reporter, RequestOutcome};
use std::future::Future;
use std::sync::Arc;

/// State shared across one run: the runtime, the dispatcher, the reporter and the stop
/// signal. Created by [crate::run::run] and handed to every VU through its [VuContext].
pub struct RunnerContext {
    runtime: tokio::runtime::Runtime,
    shutdown: ShutdownHandle,
    dispatcher: Dispatcher,
    reporter: Arc<Reporter>,
    clock: Arc<dyn Clock>,
    config: TargetConfig,
}

impl RunnerContext {
    pub(crate) fn new(
        runtime: tokio::runtime::Runtime,
        shutdown: ShutdownHandle,
        dispatcher: Dispatcher,
        reporter: Arc<Reporter>,
        clock: Arc<dyn Clock>,
        config: TargetConfig,
    ) -> Self {
        Self {
            runtime,
            shutdown,
            dispatcher,
            reporter,
            clock,
            config,
        }
    }

    pub fn shutdown_handle(&self) -> &ShutdownHandle {
        &self.shutdown
    }

    pub fn reporter(&self) -> &Arc<Reporter> {
        &self.reporter
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run async code in place, blocking until it completes or the run shuts down.
    ///
    /// Cancellation by the stop signal surfaces as [ShutdownSignalError], which the VU loop
    /// treats as a clean stop rather than a failure.
    pub fn execute_in_place<T>(
        &self,
        shutdown_listener: &mut ShutdownListener,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        self.runtime.block_on(async move {
            tokio::select! {
                result = fut => result,
                _ = shutdown_listener.wait_for_shutdown() => {
                    Err(anyhow::anyhow!(ShutdownSignalError::default()))
                },
            }
        })
    }

    /// Submit async code to run in the background of the runtime.
    pub fn spawn(&self, fut: impl Future<Output = ()> + Send + 'static) {
        self.runtime.spawn(fut);
    }
}

/// A VU's view of the engine for the duration of that VU's life.
pub struct VuContext {
    vu_id: String,
    scenario_name: String,
    runner: Arc<RunnerContext>,
    shutdown_listener: ShutdownListener,
}

impl VuContext {
    pub(crate) fn new(
        vu_id: String,
        scenario_name: String,
        runner: Arc<RunnerContext>,
        shutdown_listener: ShutdownListener,
    ) -> Self {
        Self {
            vu_id,
            scenario_name,
            runner,
            shutdown_listener,
        }
    }

    pub fn vu_id(&self) -> &str {
        &self.vu_id
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    pub fn runner(&self) -> &Arc<RunnerContext> {
        &self.runner
    }

    /// Dispatch one request against the target and wait for its outcome.
    ///
    /// This is the natural body of a behaviour function. Dispatch failures come back as
    /// outcomes with the sentinel status `0`; an `Err` here only means the run is shutting
    /// down mid-request.
    pub fn dispatch(
        &mut self,
        method: Method,
        path: &str,
        payload: Payload,
    ) -> anyhow::Result<RequestOutcome> {
        let dispatcher = self.runner.dispatcher().clone();
        let path = path.to_string();
        let runner = Arc::clone(&self.runner);
        runner.execute_in_place(&mut self.shutdown_listener, async move {
            Ok(dispatcher.dispatch(method, &path, payload).await)
        })
    }
}
