#[tokio::main(flavor = "current_thread")]
async fn main() -> neont_rs::Result<()> {
    neont_rs::cli::main().await
}
