#[cfg(feature = "server")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docmint::server::run().await
}
