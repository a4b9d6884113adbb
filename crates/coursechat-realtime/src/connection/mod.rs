//! Transport connections: handles, the open-connection pool, identity
//! bindings, and keepalive.

pub mod handle;
pub mod heartbeat;
pub mod pool;
pub mod registry;

pub use handle::ConnectionHandle;
pub use pool::ConnectionPool;
pub use registry::{BindOutcome, ConnectionRegistry};
