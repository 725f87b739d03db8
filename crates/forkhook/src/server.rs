//! `Server` builder and accept loop.
//!
//! This ties the layers together: transport → protocol → rooms. One
//! handler task per connection; rooms run as their own actors.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use forkhook_protocol::{Codec, JsonCodec};
use forkhook_room::{GameLogic, RoomManager};
use forkhook_transport::WsTransport;
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::ForkhookError;

/// The current protocol version. Clients must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<G: GameLogic, C: Codec> {
    pub(crate) rooms: Mutex<RoomManager<G>>,
    pub(crate) codec: C,
    /// Guest identities: a connection is a player, numbered on arrival.
    pub(crate) next_player_id: AtomicU64,
    /// Maps the wire-level deck-count option to the game's room config.
    pub(crate) config_for: Box<dyn Fn(u8) -> G::Config + Send + Sync>,
}

/// Builder for configuring and starting a Forkhook server.
///
/// # Example
///
/// ```rust,ignore
/// use forkhook::prelude::*;
///
/// let server = ServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build::<ForkGame>(|deck_count| GameConfig { deck_count, seed: None })
///     .await?;
/// server.run().await
/// ```
pub struct ServerBuilder {
    bind_addr: String,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// `config_for` maps the deck-count option of a `CreateRoom` request
    /// to the game's per-room config. Uses `JsonCodec`.
    pub async fn build<G: GameLogic>(
        self,
        config_for: impl Fn(u8) -> G::Config + Send + Sync + 'static,
    ) -> Result<Server<G, JsonCodec>, ForkhookError> {
        let transport = WsTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new()),
            codec: JsonCodec,
            next_player_id: AtomicU64::new(1),
            config_for: Box::new(config_for),
        });

        Ok(Server { transport, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Forkhook server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server<G: GameLogic, C: Codec> {
    transport: WsTransport,
    state: Arc<ServerState<G, C>>,
}

impl<G, C> Server<G, C>
where
    G: GameLogic,
    C: Codec + Clone,
{
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections, performs the handshake, and spawns
    /// a handler task for each connected player. Runs until the process
    /// is terminated.
    pub async fn run(mut self) -> Result<(), ForkhookError> {
        tracing::info!("Forkhook server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection::<G, C>(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
