use repoconf::presentation::cli::CliApp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = CliApp::new();
    app.init_logging();

    // Run the CLI application
    app.run().await
}
