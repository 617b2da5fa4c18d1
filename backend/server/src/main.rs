#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cafe::start_server().await?;

    Ok(())
}
