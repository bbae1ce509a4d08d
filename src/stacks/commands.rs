//! Namespace command handler

use log::{debug, info};
use std::io::{self, IsTerminal, Write};

use crate::context::{CommandEnv, Streams};
use crate::error::{CtxError, Result};
use crate::ui::{create_spinner, finish_spinner, finish_spinner_with_message};

use super::namespaces::UserVisibleNamespaceLister;
use super::NamespaceLister;

/// List the namespaces visible through the active engine endpoint
pub async fn run_namespaces_command(env: &CommandEnv) -> Result<()> {
    let endpoint = env.docker_endpoint()?;
    debug!("Listing namespaces through {}", endpoint.meta.host);
    let lister = UserVisibleNamespaceLister::new(endpoint.client()?);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut err = io::stderr();
    let quiet = !err.is_terminal();
    let mut streams = Streams {
        out: &mut out,
        err: &mut err,
    };
    list_namespaces(&lister, &endpoint.meta.host, quiet, &mut streams).await
}

async fn list_namespaces<L: NamespaceLister>(
    lister: &L,
    host: &str,
    quiet: bool,
    io: &mut Streams<'_>,
) -> Result<()> {
    let spinner = create_spinner(&format!("Fetching namespaces from {}...", host), quiet);
    let result = lister.list().await;
    match &result {
        Ok(_) => finish_spinner(spinner),
        Err(_) => finish_spinner_with_message(spinner, "Failed"),
    }

    let write_err = |e: io::Error| CtxError::io("Failed to write output", e);
    match result? {
        Some(namespaces) => {
            info!("{} namespaces visible on {}", namespaces.len(), host);
            for namespace in namespaces {
                writeln!(io.out, "{}", namespace).map_err(write_err)?;
            }
        }
        None => {
            writeln!(io.err, "Namespace listing is not available on {}", host)
                .map_err(write_err)?;
        }
    }
    Ok(())
}
