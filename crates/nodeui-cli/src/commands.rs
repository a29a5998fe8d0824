use anyhow::{Context, Result, bail};
use nodeui_core::{ConnectionArgs, CoreError, NodeConnectionConfig, validate_watch_list};
use nodeui_ui::{Exit, Setup};
use tracing::info;

/// Resolve the connection, validate the watch list and run the dashboard.
/// Without a connection the dashboard starts in installer mode.
pub async fn dashboard(args: ConnectionArgs, watch_list: &[String]) -> Result<Exit> {
    let connection =
        NodeConnectionConfig::resolve(&args).context("Failed to resolve node connection")?;

    let addresses = match validate_watch_list(watch_list) {
        Ok(addresses) => addresses,
        Err(CoreError::InvalidWatchList(failures)) => {
            let details: Vec<String> = failures.iter().map(|e| format!("  {e}")).collect();
            bail!("Invalid watch list:\n{}", details.join("\n"));
        }
        Err(e) => return Err(e.into()),
    };

    match &connection {
        Some(config) => info!(
            url = %config.rest_url,
            watched = addresses.len(),
            "Starting dashboard"
        ),
        None => info!("No node configured, starting installer"),
    }

    let setup = Setup::new(connection.as_ref(), addresses).context("Failed to create node client")?;
    let exit = nodeui_ui::run(setup).await?;
    Ok(exit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_watch_list_reports_every_entry() {
        let list = vec!["not-an-address".to_string(), "also bad".to_string()];
        let err = dashboard(ConnectionArgs::default(), &list).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Invalid watch list:"));
        assert_eq!(message.lines().count(), 3);
    }
}
