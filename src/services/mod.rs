pub mod boundary;
pub mod channels;
pub mod context;
pub mod dispatch;
pub mod relay;
pub mod worker;

pub use boundary::TaskBoundary;
pub use channels::{install_channels, ChannelKind, ChannelSet};
pub use context::{AppContext, UiTarget};
pub use dispatch::Dispatcher;
pub use relay::{load_channels, TaskRelay};
pub use worker::{LocalWorkerAgent, RunOutcome, ShellTaskRunner, TaskRunner, WorkerAgent};
