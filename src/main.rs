#[tokio::main(basic_scheduler)]
async fn main() -> anyhow::Result<()> {
    sense::client().await
}
