//! Process-spanning state synchronization.
//!
//! The [`Hub`] owns the canonical store in the coordinating process and
//! fans every non-local envelope out to all connected [`Channel`]s. A
//! [`Replica`] wraps a channel on the dependent side, keeping a read
//! replica that converges with the canonical state. The [`Correlator`]
//! layers request/response on top of the one-way broadcast.

pub mod channel;
pub mod correlator;
pub mod hub;
pub mod replica;

pub use channel::{Channel, ChannelId, HubHandle};
pub use correlator::{Correlator, Responders};
pub use hub::Hub;
pub use replica::Replica;
