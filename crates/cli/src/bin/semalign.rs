use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    semalign_cli::main_entry().await
}
