use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = mailsched::cli::Cli::parse();
    mailsched::logging::init(cli.verbose);

    if let Err(err) = mailsched::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
