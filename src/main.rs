use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use virtual_tourist::application::{
    DeletePhotoUseCase, DeletePinUseCase, DropPinUseCase, FetchOutcome, ImageFetchedEvent,
    NewCollectionUseCase, PageSelector, PhotoImageFetcher, SearchOutcome, TaskSlot,
};
use virtual_tourist::domain::entities::{GeoPoint, MapRegion, Pin, PinId};
use virtual_tourist::domain::errors::AlbumError;
use virtual_tourist::domain::ports::{HttpTransport, PinStorePort};
use virtual_tourist::infrastructure::{
    AppConfig, CliArgs, Command, DiskImageCache, FlickrClient, JsonPinStore, ReqwestTransport,
    StorageManager,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

/// Every service the commands need, wired once at startup.
struct Services {
    config: AppConfig,
    store: Arc<JsonPinStore>,
    cache: Arc<DiskImageCache>,
    fetcher: Arc<PhotoImageFetcher>,
    drop_pin: DropPinUseCase,
    new_collection: NewCollectionUseCase,
    delete_photo: DeletePhotoUseCase,
    delete_pin: DeletePinUseCase,
}

impl Services {
    async fn build(
        config: AppConfig,
        event_tx: mpsc::UnboundedSender<ImageFetchedEvent>,
    ) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(
            ReqwestTransport::new(config.search.timeout())
                .wrap_err("Failed to create HTTP client")?,
        );

        let cache = Arc::new(
            DiskImageCache::new(config.effective_cache_dir(), config.cache.max_size_bytes())
                .await
                .wrap_err("Failed to open image cache")?,
        );
        let store = Arc::new(JsonPinStore::new(config.pins_path()));

        let search = Arc::new(
            FlickrClient::new(transport.clone(), config.api_key.clone().unwrap_or_default())
                .with_base_url(config.search.api_base_url.clone())
                .with_safe_search(config.search.safe_search),
        );
        let selector = Arc::new(PageSelector::new(
            search.clone(),
            config.search.per_page,
            config.search.max_page,
        ));

        let new_collection =
            NewCollectionUseCase::new(selector, search, cache.clone(), store.clone())
                .with_box_size(config.search.half_width, config.search.half_height);
        let drop_pin = DropPinUseCase::new(store.clone(), new_collection.clone());
        let delete_photo = DeletePhotoUseCase::new(cache.clone(), store.clone());
        let delete_pin = DeletePinUseCase::new(cache.clone(), store.clone());

        let fetcher = Arc::new(
            PhotoImageFetcher::new(transport, cache.clone())
                .with_max_concurrent(config.cache.max_concurrent_downloads)
                .with_events(event_tx),
        );

        Ok(Self {
            config,
            store,
            cache,
            fetcher,
            drop_pin,
            new_collection,
            delete_photo,
            delete_pin,
        })
    }

    fn require_api_key(&self) -> Result<()> {
        if self.config.api_key.as_deref().is_none_or(str::is_empty) {
            bail!("no API key configured; set FLICKR_API_KEY or pass --api-key");
        }
        Ok(())
    }

    async fn find_pin(&self, id: PinId) -> Result<Arc<Pin>> {
        self.store
            .load_all()
            .await
            .wrap_err("Failed to load pins")?
            .into_iter()
            .find(|pin| pin.id() == id)
            .ok_or_else(|| eyre!("no pin with id {id}"))
    }

    /// Downloads the pin's missing images, cancelling on Ctrl-C.
    async fn prefetch(&self, pin: &Pin) -> Result<()> {
        if pin.photo_count() == 0 {
            return Ok(());
        }

        let slot = TaskSlot::new();
        let handle = self.fetcher.prefetch(pin);
        slot.replace(&handle);

        tokio::select! {
            joined = handle => {
                let fetched = joined.wrap_err("Prefetch task failed")?;
                debug!(pin_id = %pin.id(), fetched = fetched, "Prefetch complete");
            }
            _ = tokio::signal::ctrl_c() => {
                slot.cancel();
                warn!(pin_id = %pin.id(), "Prefetch interrupted");
            }
        }
        Ok(())
    }

    async fn print_album(&self, pin: &Pin) {
        println!(
            "Pin {} at {} ({} photos)",
            pin.id(),
            pin.coordinate(),
            pin.photo_count()
        );
        for record in pin.photos() {
            let status = match self.fetcher.cached_image(&record).await {
                Some(img) => format!("{}x{}", img.width(), img.height()),
                None => "not cached".to_string(),
            };
            println!(
                "  {:<14} {:<10} {}",
                record.id(),
                status,
                record.title().unwrap_or(record.remote_url())
            );
        }
    }
}

fn report_album(result: &Result<SearchOutcome, AlbumError>) {
    match result {
        Ok(SearchOutcome::Populated { photos, page }) => {
            println!("Loaded {photos} photos from result page {page}");
        }
        Ok(SearchOutcome::InProgress) => println!("A search for this pin is already running"),
        Err(e) if e.is_user_facing() => println!("{e}"),
        Err(AlbumError::Search(e)) if e.is_recoverable() => {
            eprintln!("Photo search failed: {e}; run `refresh` to try again");
        }
        Err(e) => eprintln!("Photo search failed: {e}"),
    }
}

fn parse_point(lat: f64, lon: f64) -> Result<GeoPoint> {
    GeoPoint::new(lat, lon).ok_or_else(|| {
        eyre!("invalid coordinate ({lat}, {lon}); latitude must be within ±90 and longitude within ±180")
    })
}

/// Applies image completion events on a single task.
async fn consume_events(mut rx: mpsc::UnboundedReceiver<ImageFetchedEvent>) -> (usize, usize) {
    let mut fetched = 0;
    let mut failed = 0;
    while let Some(event) = rx.recv().await {
        match event.result {
            Ok(FetchOutcome::Fetched { bytes }) => {
                fetched += 1;
                println!("  downloaded {} ({bytes} bytes)", event.photo_id);
            }
            Ok(_) => {}
            Err(e) => {
                failed += 1;
                println!("  failed {}: {e}", event.photo_id);
            }
        }
    }
    (fetched, failed)
}

async fn run(command: Command, services: &Services, storage: &StorageManager) -> Result<()> {
    match command {
        Command::Drop { lat, lon } => {
            services.require_api_key()?;
            let point = parse_point(lat, lon)?;
            let dropped = services
                .drop_pin
                .execute(point)
                .await
                .wrap_err("Failed to save pin")?;

            println!("Dropped pin {} at {point}", dropped.pin.id());
            report_album(&dropped.album);
            storage
                .remember_pin(dropped.pin.id())
                .wrap_err("Failed to save state")?;
            services.prefetch(&dropped.pin).await?;
        }
        Command::Pins => {
            let pins = services.store.load_all().await.wrap_err("Failed to load pins")?;
            if pins.is_empty() {
                println!("No pins yet");
            }
            let last_pin = storage.load_state().wrap_err("Failed to load state")?.last_pin;
            for pin in pins {
                let marker = if last_pin == Some(pin.id()) { "*" } else { " " };
                println!(
                    "{marker} {} {:>10.5} {:>11.5} {:>3} photos  {}",
                    pin.id(),
                    pin.latitude(),
                    pin.longitude(),
                    pin.photo_count(),
                    pin.created_at().format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Album { pin } => {
            let pin = services.find_pin(pin).await?;
            storage.remember_pin(pin.id()).wrap_err("Failed to save state")?;
            services.prefetch(&pin).await?;
            services.print_album(&pin).await;
        }
        Command::Refresh { pin } => {
            services.require_api_key()?;
            let pin = services.find_pin(pin).await?;
            let result = services.new_collection.execute(&pin).await;
            report_album(&result);
            if result.is_ok() {
                services.prefetch(&pin).await?;
            }
        }
        Command::Move { pin, lat, lon } => {
            services.require_api_key()?;
            let point = parse_point(lat, lon)?;
            let pin = services.find_pin(pin).await?;
            let result = services.drop_pin.relocate(&pin, point).await;
            println!("Moved pin {} to {point}", pin.id());
            report_album(&result);
            if result.is_ok() {
                services.prefetch(&pin).await?;
            }
        }
        Command::DeletePhoto { pin, photo } => {
            let pin = services.find_pin(pin).await?;
            services
                .delete_photo
                .execute(&pin, &photo)
                .await
                .wrap_err_with(|| format!("Failed to delete photo {photo}"))?;
            println!("Deleted photo {photo}; {} left", pin.photo_count());
        }
        Command::DeletePin { pin } => {
            let pin = services.find_pin(pin).await?;
            let removed = services
                .delete_pin
                .execute(&pin)
                .await
                .wrap_err("Failed to delete pin")?;
            storage.forget_pin(pin.id()).wrap_err("Failed to save state")?;
            println!("Deleted pin {} and {removed} photos", pin.id());
        }
        Command::Map { lat, lon, span } => {
            if let (Some(lat), Some(lon)) = (lat, lon) {
                let center = parse_point(lat, lon)?;
                let region = MapRegion::around(center, span)
                    .ok_or_else(|| eyre!("invalid map span {span}"))?;
                storage
                    .save_map_region(region)
                    .wrap_err("Failed to save map region")?;
            }
            let region = storage.map_region().wrap_err("Failed to load state")?;
            match region.center() {
                Some(center) => println!(
                    "Map centered on {center} spanning {}° x {}°",
                    region.latitude_delta, region.longitude_delta
                ),
                None => println!("Saved map region is invalid; showing the whole world"),
            }
        }
        Command::CacheStats => {
            services.cache.cleanup_if_needed().await;
            println!("Cache directory: {}", services.cache.dir().display());
            println!("Entries:         {}", services.cache.len());
            println!(
                "Size:            {:.1} MiB of {} MiB",
                services.cache.current_size() as f64 / (1024.0 * 1024.0),
                services.config.cache.max_size_mb
            );
        }
        Command::CacheClear => {
            let entries = services.cache.len();
            services
                .cache
                .clear()
                .await
                .wrap_err("Failed to clear image cache")?;
            println!("Removed {entries} cached images");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    let storage = StorageManager::new(args.config.clone())?;
    let mut config = storage.load_config()?;
    config.merge_with_args(&args);
    config.sanitize();

    init_logging(&config)?;
    info!(version = virtual_tourist::VERSION, "Starting Virtual Tourist");

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let consumer = tokio::spawn(consume_events(event_rx));

    let services = Services::build(config, event_tx).await?;
    let result = run(args.command, &services, &storage).await;

    drop(services);
    let (fetched, failed) = consumer.await.wrap_err("Event consumer failed")?;
    if fetched + failed > 0 {
        info!(fetched = fetched, failed = failed, "Image downloads finished");
    }

    result
}
