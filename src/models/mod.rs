pub mod chat;
pub mod dataset;
