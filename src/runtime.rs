use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const MIN_WORKERS: usize = 1;
const MAX_WORKERS: usize = 6;

// Get worker count from env var or detect CPUs, clamped to 1-6
pub fn worker_count() -> usize {
    resolve_workers(env::var("WORKER_COUNT").ok().as_deref(), num_cpus::get())
}

fn resolve_workers(configured: Option<&str>, cpus: usize) -> usize {
    configured
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(cpus)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

// Initialize Rayon global thread pool (only once per Lambda container)
pub fn init_thread_pool(workers: usize) {
    INIT.call_once(|| {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build_global()
        {
            tracing::warn!(error = %e, "rayon pool already initialised");
        }
    });
}
