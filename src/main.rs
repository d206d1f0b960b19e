#[tokio::main]
async fn main() {
    eatbit::start_server().await;
}
