// src/commands/server.rs

//! `mspm serve`

use anyhow::Result;
use mspm::config::MspmConfig;
use std::path::PathBuf;

/// Run the catalog server in the foreground
#[cfg(feature = "server")]
pub fn cmd_serve(
    config: &MspmConfig,
    listen: Option<String>,
    playground: Option<PathBuf>,
    store: Option<PathBuf>,
) -> Result<()> {
    use mspm::server::{run_server, ServerConfig};

    let mut server_config = ServerConfig::from_config(config)?;
    if let Some(listen) = listen {
        server_config.bind_addr = listen
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address '{}': {}", listen, e))?;
    }
    if let Some(playground) = playground {
        server_config.playground = playground;
    }
    if let Some(store) = store {
        server_config.store = store;
    }
    if server_config.playground == server_config.store {
        anyhow::bail!("Playground and store must be different directories");
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_server(server_config))
}

#[cfg(not(feature = "server"))]
pub fn cmd_serve(
    _config: &MspmConfig,
    _listen: Option<String>,
    _playground: Option<PathBuf>,
    _store: Option<PathBuf>,
) -> Result<()> {
    anyhow::bail!("mspm was built without the server feature")
}
