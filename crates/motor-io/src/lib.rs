pub mod metrics;
pub mod protocol;
pub mod publish;

pub use metrics::{init_metrics, serve_metrics};
pub use protocol::{ProtocolVersion, StateMsg};
pub use publish::{channel, spawn_listener, ChannelPublisher, ListenerStats, SetpointListener};
