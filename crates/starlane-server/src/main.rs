#[tokio::main]
async fn main() -> std::io::Result<()> {
    starlane_server::run_with_config().await
}
