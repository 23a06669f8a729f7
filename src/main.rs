use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match activity_tracker::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("activity-tracker: {error}");
            ExitCode::FAILURE
        }
    }
}
