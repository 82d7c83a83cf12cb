pub mod dispatcher;
pub mod inbound;
pub mod store;
pub mod transport;

pub use dispatcher::{AgentDispatcher, DispatchKind, DispatchRequest};
pub use inbound::InboundHandler;
pub use store::SnapshotStore;
pub use transport::Transport;
