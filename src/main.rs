use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    karoo::run().await
}
