pub mod debounce;
pub mod http;
pub mod session;

pub use session::{connect, SendError, SessionConfig, SessionHandle, SessionState};
