pub mod emote;
pub mod message;
pub mod user;
