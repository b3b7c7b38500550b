#[tokio::main]
async fn main() {
    if let Err(e) = finsight_lib::run().await {
        eprintln!("finsight: {e}");
        std::process::exit(1);
    }
}
