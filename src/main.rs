use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    match nanopub_query_broker::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "Nanopub query broker failed");
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
