use adgallery::gallery::{generate_share_token, share_url};
use adgallery::masonry::{pack, LayoutItem, DEFAULT_GUTTER};
use adgallery::renderer::{CreativeRef, HttpFetcher, MemorySurfaceFactory, RenderState, Renderer};
use adgallery::RendererConfig;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "adgallery", version, about = "Ad gallery layout and preview tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bucket ad cards into masonry columns
    Layout {
        /// Container width in pixels
        #[arg(long)]
        width: i64,
        #[arg(long, default_value_t = DEFAULT_GUTTER)]
        gutter: u32,
        /// Items as `id=WxH`
        items: Vec<String>,
    },
    /// Fetch a creative and print the content its surface would show
    Preview {
        address: String,
        #[arg(long, default_value = "300x250")]
        size: String,
        /// URL of the embedding page
        #[arg(long, default_value = "http://localhost/")]
        origin: String,
        #[arg(long, default_value_t = 30000)]
        timeout_ms: u64,
    },
    /// Print a campaign share link
    ShareLink {
        #[arg(long)]
        origin: String,
        /// Existing token; a new one is generated when omitted
        #[arg(long)]
        token: Option<String>,
    },
}

fn parse_item(arg: &str) -> LayoutItem {
    match arg.split_once('=') {
        Some((id, size)) => LayoutItem::new(id, size),
        None => LayoutItem::new(arg, arg),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Layout { width, gutter, items } => {
            let items: Vec<LayoutItem> = items.iter().map(|a| parse_item(a)).collect();
            let layout = pack(&items, width, gutter);
            for column in &layout.columns {
                let ids: Vec<&str> = column.items.iter().map(|i| i.id.as_str()).collect();
                println!("column {} (height {}): {}", column.key, column.height, ids.join(" "));
            }
        }
        Command::Preview {
            address,
            size,
            origin,
            timeout_ms,
        } => {
            let config = RendererConfig {
                host_origin: origin,
                timeout_ms,
                ..Default::default()
            };
            let fetcher = Arc::new(HttpFetcher::new(&config)?);
            let renderer = Renderer::new(config, fetcher, Arc::new(MemorySurfaceFactory::new()))?;
            let state = renderer.mount(CreativeRef::new(address.clone(), size)).await;
            match (state, renderer.content()) {
                (Some(RenderState::Ready), Some(content)) => println!("{}", content),
                _ => anyhow::bail!("creative {} failed to load", address),
            }
        }
        Command::ShareLink { origin, token } => {
            let token = token.unwrap_or_else(generate_share_token);
            println!("{}", share_url(&origin, &token));
        }
    }

    Ok(())
}
