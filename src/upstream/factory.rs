// FormRelay - Forwarder factory

use super::{http::HTTPTransport, Forwarder};
use crate::config::Config;
use std::sync::Arc;
use std::time::Duration;

/// Create a forwarder from the loaded config.
///
/// Validates the config first: a missing API key or a bad catalog is a fatal
/// startup error, never a per-request one.
pub fn create_forwarder(cfg: &Config) -> anyhow::Result<Forwarder> {
    cfg.validate()?;
    let catalog = Arc::new(cfg.build_catalog()?);

    tracing::info!(
        api_base = %cfg.upstream.api_base,
        workflows = catalog.len(),
        enforce_required_fields = cfg.workflows.enforce_required_fields,
        "Creating workflow forwarder"
    );

    let transport = HTTPTransport::new(
        Duration::from_secs(cfg.upstream.connect_timeout_secs),
        cfg.upstream.request_timeout_secs.map(Duration::from_secs),
    )?;

    let forwarder = Forwarder::new(
        catalog,
        Arc::new(transport),
        cfg.upstream.api_base.clone(),
        cfg.upstream.api_key.clone(),
    )
    .enforce_required_fields(cfg.workflows.enforce_required_fields);

    Ok(forwarder)
}
