pub mod channel;
pub mod codec;
pub mod messages;
pub mod server;
