use anyhow::{Context, Result};

use super::{RequestCommand, write_output};
use crate::domain::pins::PinRequest;
use crate::infrastructure::client::PinClient;

pub async fn run(command: RequestCommand) -> Result<()> {
    let mut request = match &command.payload {
        Some(path) => {
            let contents = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<PinRequest>(&contents)
                .with_context(|| format!("invalid payload in {}", path.display()))?
        }
        None => PinRequest::default(),
    };
    command.pin.apply_to(&mut request).await?;

    let client = PinClient::from_base_url(&command.url, command.render_key)?;
    let bytes = client.render(&request).await?;
    write_output(&command.output, &bytes, command.open).await
}
