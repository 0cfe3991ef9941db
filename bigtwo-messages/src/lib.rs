pub mod action;
pub mod event;

pub use action::ClientAction;
pub use event::ServerEvent;
