use serde::Serialize;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("stats task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuStats {
    pub manufacturer: String,
    pub brand: String,
    pub cores: usize,
    /// GHz
    pub speed: f64,
    /// Percent, rounded.
    pub load: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub available: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
}

/// Sample CPU and memory usage. CPU load needs two refreshes spaced by
/// `MINIMUM_CPU_UPDATE_INTERVAL`, so this blocks a worker thread briefly.
pub async fn snapshot() -> Result<SystemStats, SystemError> {
    let stats = tokio::task::spawn_blocking(|| {
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();
        collect(&sys)
    })
    .await?;

    Ok(stats)
}

fn collect(sys: &System) -> SystemStats {
    let first = sys.cpus().first();
    let logical = sys.cpus().len();

    SystemStats {
        cpu: CpuStats {
            manufacturer: first.map(|c| c.vendor_id().to_string()).unwrap_or_default(),
            brand: first.map(|c| c.brand().trim().to_string()).unwrap_or_default(),
            cores: sys.physical_core_count().unwrap_or(logical),
            speed: first.map(|c| c.frequency() as f64 / 1000.0).unwrap_or(0.0),
            load: sys.global_cpu_usage().round().clamp(0.0, 100.0) as u32,
        },
        memory: MemoryStats {
            total: sys.total_memory(),
            free: sys.free_memory(),
            used: sys.used_memory(),
            available: sys.available_memory(),
        },
    }
}
