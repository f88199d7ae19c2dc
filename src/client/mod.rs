pub mod api;
pub mod session;
pub mod store;

pub use api::{ApiClient, ClientError};
pub use session::{decode_unverified, GateView, SessionGate, SessionStatus};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
