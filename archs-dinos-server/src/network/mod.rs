//! Network Layer
//!
//! Request surface and outbound notifications. Sockets are left to the
//! embedding transport: it registers one [`EventSink`] per connected player
//! and feeds decoded requests to [`GameService::handle`].

pub mod broadcast;
pub mod protocol;
pub mod service;
pub mod session;

pub use broadcast::{BroadcastReport, DeliveryError, EventBroadcaster, EventSink};
pub use protocol::{ClientRequest, ErrorCode, ResponsePayload, ServerMessage, ServerResponse};
pub use service::GameService;
pub use session::SessionRegistry;
