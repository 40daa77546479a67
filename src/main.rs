#[tokio::main]
async fn main() {
    if let Err(err) = listing_studio::run().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}
