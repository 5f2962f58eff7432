#[tokio::main]
async fn main() {
    let code = streamtick::app::startup::startup().await;
    std::process::exit(code);
}
