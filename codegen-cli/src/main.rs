use anyhow::Context;
use log::info;
use std::path::PathBuf;
use structopt::StructOpt;
use tg_bot_codegen::{Config, BOT_API_DOCS_URL};

#[derive(StructOpt)]
#[structopt(about = "Generate Rust client bindings from the Telegram Bot API documentation")]
struct Opt {
    /// Root directory for generated sources
    #[structopt(long, default_value = "generated")]
    out_dir: PathBuf,
    /// Dotted module path for the emitted declarations
    #[structopt(long, default_value = "telegram.bindings")]
    package: String,
    /// Dotted module path of the HTTP client type
    #[structopt(long, default_value = "crate.client")]
    client_package: String,
    /// Documentation page to scrape
    #[structopt(long)]
    url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let opt = Opt::from_args();
    let url = opt.url.as_deref().unwrap_or(BOT_API_DOCS_URL);

    let html = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .with_context(|| format!("failed to fetch {}", url))?
        .text()?;

    let config = Config {
        package: opt.package,
        client_package: opt.client_package,
    };
    let rendered = tg_bot_codegen::generate(&html, &config)?;
    let (data_path, methods_path) = rendered
        .write_to(&opt.out_dir)
        .context("failed to write generated sources")?;

    info!(
        "wrote {} and {}",
        data_path.display(),
        methods_path.display()
    );

    Ok(())
}
