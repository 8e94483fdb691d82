pub mod channel;
pub mod interface;
