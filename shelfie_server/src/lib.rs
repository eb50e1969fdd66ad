mod config;
mod connection;
mod error;
mod lobby;
mod server;
mod session;
mod transport;
pub use config::*;
pub use error::*;
pub use lobby::*;
pub use server::*;
pub use session::*;
pub use transport::*;
