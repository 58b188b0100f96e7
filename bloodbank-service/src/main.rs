use bloodbank_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config);

    Server::new(config).run().await?;

    Ok(())
}
