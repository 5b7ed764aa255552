//! Wire format shared by both directions of a connection.
//!
//! Every frame is a JSON text message. Right after a connection opens the
//! receiving side sends one [`ExportsAnnouncement`]; after that every frame
//! in either direction is a [`CallMessage`].

pub mod messages;

pub use messages::{CallMessage, ExportsAnnouncement};
