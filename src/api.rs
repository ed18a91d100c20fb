pub mod client;
pub mod foxess;
pub mod pse;
pub mod solcast;
