//! # Ricochet Arena
//!
//! A server-authoritative two-player arena game. Clients connect over
//! WebSocket, create or join a room, ready up, and send paddle positions;
//! the server runs the simulation at 60 Hz and pushes every frame back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ricochet::RicochetServer;
//!
//! # async fn run() -> Result<(), ricochet::RicochetError> {
//! let server = RicochetServer::builder()
//!     .bind("0.0.0.0:3001")
//!     .base_url("http://localhost:3001")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::RicochetError;
pub use server::{RicochetServer, RicochetServerBuilder};

pub mod prelude {
    pub use crate::{RicochetError, RicochetServer, RicochetServerBuilder, ServerConfig};
    pub use ricochet_protocol::{ClientEvent, ServerEvent};
    pub use ricochet_room::{RoomConfig, RoomOptions};
}
