mod allocator;

use addrmint::app::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    App::init()?.execute().await
}
