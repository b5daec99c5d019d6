use std::process::ExitCode;

use futures::future::join_all;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pharmacy_server::cache::{CacheStore, DiskCache, RotationSchedule};
use pharmacy_server::directory::{DirectoryClient, DirectoryConfig};
use pharmacy_server::resolver::{ResolveError, Resolver};

/// Where the cache snapshot lives unless CACHE_SNAPSHOT_PATH overrides it.
const DEFAULT_SNAPSHOT_PATH: &str = "caches/cache.json";

/// Cache warm / regeneration entry point.
///
/// Prefetches the canonical place lists and the full duty list, builds the
/// lookup indices and counts, and persists the cache snapshot so the
/// serving process starts warm. Run it after the rotation boundary, or any
/// time the snapshot needs rebuilding.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let base_url = match std::env::var("DUTY_API_URL") {
        Ok(url) => url,
        Err(_) => {
            error!("DUTY_API_URL not set");
            return ExitCode::FAILURE;
        }
    };
    let api_key = std::env::var("DUTY_API_KEY").unwrap_or_else(|_| {
        warn!("DUTY_API_KEY not set; directory calls will be unauthorized");
        String::new()
    });
    let snapshot_path = std::env::var("CACHE_SNAPSHOT_PATH")
        .unwrap_or_else(|_| DEFAULT_SNAPSHOT_PATH.to_string());

    let client = match DirectoryClient::new(DirectoryConfig::new(base_url, api_key)) {
        Ok(client) => client,
        Err(err) => {
            error!("failed to create directory client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let store = CacheStore::new();
    let disk = DiskCache::new(&snapshot_path);
    let restored = disk.hydrate(&store).await;
    if restored > 0 {
        info!(restored, path = %snapshot_path, "hydrated cache snapshot");
    }

    let resolver = Resolver::new(client, store, RotationSchedule::default());

    if let Err(err) = warm(&resolver).await {
        error!("cache warm failed: {err}");
        return ExitCode::FAILURE;
    }

    match disk.persist(resolver.cache()) {
        Ok(written) => {
            info!(written, path = %snapshot_path, "cache snapshot persisted");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("failed to persist snapshot: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn warm(resolver: &Resolver<DirectoryClient>) -> Result<(), ResolveError> {
    let cities = resolver.cities().await?;
    info!(cities = cities.len(), "canonical city list loaded");

    // District lists for every city; the client's semaphore bounds the fan-out.
    let results = join_all(cities.iter().map(|city| resolver.districts(city))).await;
    let failed = results.iter().filter(|result| result.is_err()).count();
    if failed > 0 {
        warn!(failed, "some district lists could not be prefetched");
    }

    let by_city = resolver.all_pharmacies_by_city().await?;
    info!(
        cities = by_city.len(),
        pharmacies = by_city.total_records(),
        "full duty list indexed"
    );

    resolver.all_pharmacies_by_district().await?;

    let counts = resolver.pharmacy_counts().await?;
    info!(entries = counts.len(), "per-city counts cached");

    Ok(())
}
