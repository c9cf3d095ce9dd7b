use crate::config::Config;
use crate::error::{ContentError, Result};
use crate::generation::GeminiClient;
use crate::server::{self, AppState};
use crate::ui;
use std::sync::Arc;
use tracing::info;

/// Run the serve command
pub async fn run_serve(config: &Config, bind: Option<String>) -> Result<()> {
    if let Err(errors) = config.validate() {
        for error in &errors {
            ui::print_error(error);
        }
        return Err(ContentError::ConfigInvalid(errors.join("; ")));
    }

    let address = bind.unwrap_or_else(|| config.server.socket_address());
    let client = GeminiClient::new(&config.upstream)?;
    info!(endpoint = client.endpoint(), "Using upstream endpoint");

    ui::print_info(&format!("Serving on http://{}", address));
    server::serve(&address, AppState::new(Arc::new(client))).await
}
