use audiolist::api::{ApiClient, ApiFetcher, AudioData, History, Playlist};
use audiolist::config::Config;
use audiolist::logging::init_logging;
use audiolist::{CollectionKey, PagedCacheList};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "audiolist")]
#[command(about = "Page through audio API collections")]
#[command(version)]
struct Args {
  /// Collection to load (favorite, histories, uploads-by-profile, playlist, ...)
  collection: String,

  /// Entity id for per-profile collections (uploads, public-playlist)
  #[arg(long)]
  id: Option<String>,

  /// Pages to load after the first
  #[arg(short, long, default_value_t = 0)]
  pages: u32,

  /// Refresh from page 0 after paging
  #[arg(long)]
  refresh: bool,

  /// Path to config file (default: $XDG_CONFIG_HOME/audiolist/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Enable debug logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_logging(args.verbose)?;

  let config = Config::load(args.config.as_deref())?;
  let bindings = config.bindings();
  let binding = bindings
    .get(&args.collection)
    .ok_or_else(|| eyre!("Unknown collection '{}'", args.collection))?;

  let key = match &args.id {
    Some(id) => CollectionKey::with_secondary(args.collection.as_str(), id.as_str()),
    None => CollectionKey::new(args.collection.as_str()),
  };
  let client = ApiClient::new(&config.api)?;

  // The response field tells which item type the endpoint lists
  match binding.field.as_str() {
    "histories" => {
      let list = configure(
        PagedCacheList::new(ApiFetcher::<History>::new(client, bindings.clone())),
        &config,
      )
      .with_grouped_merge();
      browse(&list, &key, &args).await
    }
    "playlist" => {
      let list = configure(
        PagedCacheList::new(ApiFetcher::<Playlist>::new(client, bindings.clone())),
        &config,
      );
      browse(&list, &key, &args).await
    }
    _ => {
      let list = configure(
        PagedCacheList::new(ApiFetcher::<AudioData>::new(client, bindings.clone())),
        &config,
      );
      browse(&list, &key, &args).await
    }
  }
}

fn configure<T>(
  list: PagedCacheList<T, ApiFetcher<T>>,
  config: &Config,
) -> PagedCacheList<T, ApiFetcher<T>>
where
  T: Clone + Send + Sync + DeserializeOwned + 'static,
{
  match config.stale_time() {
    Some(stale_time) => list.with_stale_time(stale_time),
    None => list,
  }
}

/// Load the first page and `--pages` more, then print items as JSON lines.
async fn browse<T>(
  list: &PagedCacheList<T, ApiFetcher<T>>,
  key: &CollectionKey,
  args: &Args,
) -> Result<()>
where
  T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
  list.initial_load(key).await?;

  for _ in 0..args.pages {
    if !list.load_more(key).await?.is_applied() {
      break;
    }
  }

  if args.refresh {
    list.refresh(key).await?;
  }

  let collection = list.get(key).unwrap_or_default();
  let mut stdout = std::io::stdout().lock();
  for item in &collection.items {
    writeln!(stdout, "{}", serde_json::to_string(item)?)?;
  }

  info!(
    key = %key,
    items = collection.len(),
    page = collection.page,
    has_more = collection.has_more,
    "collection loaded"
  );
  Ok(())
}
