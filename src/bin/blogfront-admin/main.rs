use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use spdlog::{Level, LevelFilter};

use blogfront::api::ApiClient;
use blogfront::session::{FileTokenStore, Session};

use crate::bootstrap::bootstrap_cmd;

mod bootstrap;
mod commands;
mod decompress;

#[derive(Parser, Debug)]
#[command(version, about = "Manage the blog from the terminal", long_about = None)]
struct Cli {
    /// Base URL of the blog API
    #[arg(long, global = true, default_value = "http://localhost:5000")]
    api_url: String,

    /// File holding the session token. Defaults to the user config dir
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Print library logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Logs in and stores the session token
    Login(LoginArgs),
    /// Forgets the stored session token
    Logout,
    /// Checks the stored session against the server
    Status,
    /// Lists published blogs
    List(ListArgs),
    /// Shows the dashboard counters
    Stats,
    /// Creates a blog
    Create(BlogArgs),
    /// Updates a blog
    Update(UpdateArgs),
    /// Deletes a blog
    Delete(IdArgs),
    /// Unpacks templates and a sample configuration for a new site
    Bootstrap(BootstrapArgs),
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(short, long)]
    email: String,

    #[arg(short, long)]
    password: String,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Category name or slug
    #[arg(short, long, conflicts_with = "search")]
    category: Option<String>,

    /// Search query
    #[arg(short, long)]
    search: Option<String>,
}

#[derive(Args, Debug, Default)]
struct BlogArgs {
    #[arg(short, long)]
    title: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    /// Markdown (.md) or HTML (.html) file with the article body
    #[arg(long)]
    content_file: Option<PathBuf>,

    #[arg(short, long)]
    category: Option<String>,

    #[arg(long)]
    price: Option<String>,

    /// Affiliate link
    #[arg(long)]
    link: Option<String>,

    /// Tag to add. Can be repeated
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Tag to remove. Can be repeated
    #[arg(long = "remove-tag")]
    remove_tags: Vec<String>,

    /// Image file to upload
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    id: String,

    #[command(flatten)]
    blog: BlogArgs,
}

#[derive(Args, Debug)]
struct IdArgs {
    id: String,
}

#[derive(Args, Debug)]
struct BootstrapArgs {
    /// Directory where the new site will be generated
    #[arg(short, long)]
    out_dir: String,
}

fn open_session(session_file: Option<PathBuf>) -> Result<Session<FileTokenStore>> {
    let path = session_file
        .or_else(FileTokenStore::default_path)
        .ok_or_else(|| anyhow!("Could not find a place for the session file. Use --session-file"))?;
    Ok(Session::open(FileTokenStore::new(path)))
}

async fn run(command: Command, api_url: &str, session_file: Option<PathBuf>) -> Result<()> {
    let api = ApiClient::new(api_url)?;
    let mut session = open_session(session_file)?;

    match command {
        Command::Login(args) => commands::login(&api, &mut session, args).await,
        Command::Logout => commands::logout(&mut session),
        Command::Status => commands::status(&api, &mut session).await,
        Command::List(args) => commands::list(&api, args).await,
        Command::Stats => commands::stats(&api, &mut session).await,
        Command::Create(args) => commands::create(&api, &mut session, args).await,
        Command::Update(args) => commands::update(&api, &mut session, args).await,
        Command::Delete(args) => commands::delete(&api, &mut session, args).await,
        Command::Bootstrap(args) => bootstrap_cmd(args),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::All } else { LevelFilter::MoreSevereEqual(Level::Error) };
    spdlog::default_logger().set_level_filter(level);

    match cli.command {
        Command::Bootstrap(args) => bootstrap_cmd(args),
        command => run(command, &cli.api_url, cli.session_file).await,
    }
}
