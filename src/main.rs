use clap::Parser;
use user_registry::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Migrate(args) => cli::migrate::run(args).await,
        Command::Create(args) => cli::user::create(args).await,
        Command::Update(args) => cli::user::update(args).await,
        Command::Delete(args) => cli::user::delete(args).await,
        Command::Get(args) => cli::user::get(args).await,
    }
}
