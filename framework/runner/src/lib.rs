mod cli;
mod config;
mod context;
mod executor;
mod monitor;
mod progress;
mod run;
mod scenario;
mod scheduler;
mod types;
mod vu;

pub mod prelude {
    pub use crate::cli::{init, GustCli, ReporterOpt};
    pub use crate::config::TargetConfig;
    pub use crate::context::{RunnerContext, VuContext};
    pub use crate::executor::{Executor, Stage};
    pub use crate::run::run;
    pub use crate::scenario::{Scenario, TestPlanBuilder, VuBehaviour};
    pub use crate::types::GustResult;
    pub use gust_client::prelude::*;
    pub use gust_core::prelude::*;
    pub use gust_instruments::RequestOutcome;
}
