pub mod command;
pub mod controller;
pub mod messages;
pub mod session;
pub mod subscriptions;
pub mod view;

pub use controller::{CommandCompletion, ControllerError, ControllerEvent, OverlayController};
pub use session::{CompletionMismatch, DispatchError, OverlaySession, PendingCommand};
pub use subscriptions::EventSubscriptions;
pub use view::OverlayView;

#[cfg(test)]
mod tests;
