#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mrupdate_lib::main().await
}
