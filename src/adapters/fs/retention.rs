//! Limpieza periódica de subidas y resultados antiguos.
//!
//! Desactivada salvo que se configure `RETENTION_HOURS`: sin ella los ficheros
//! se acumulan indefinidamente.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tokio::time::interval;
use tracing::{debug, error, info, warn};

pub struct RetentionSweeper {
    dirs: Vec<PathBuf>,
    max_age: Duration,
    every: Duration,
}

impl RetentionSweeper {
    pub fn new(dirs: Vec<PathBuf>, max_age: Duration, every: Duration) -> Self {
        Self { dirs, max_age, every }
    }

    /// Bucle infinito; lanzarlo con `tokio::spawn`.
    pub async fn run(self) {
        info!(
            "Retención activa: borrando ficheros con más de {:?} (cada {:?})",
            self.max_age, self.every
        );
        let mut ticker = interval(self.every);
        loop {
            ticker.tick().await;
            match self.sweep_once().await {
                Ok(0) => {}
                Ok(n) => info!(removed = n, "retención: ficheros antiguos eliminados"),
                Err(e) => error!("Error en barrido de retención: {e:#}"),
            }
        }
    }

    /// Un barrido sobre todas las carpetas. Devuelve cuántos ficheros se borraron.
    pub async fn sweep_once(&self) -> anyhow::Result<usize> {
        let now = SystemTime::now();
        let mut removed = 0;

        for dir in &self.dirs {
            let mut entries = match tokio::fs::read_dir(dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let meta = entry.metadata().await?;
                if !meta.is_file() {
                    continue;
                }
                let age = meta
                    .modified()
                    .ok()
                    .and_then(|m| now.duration_since(m).ok())
                    .unwrap_or_default();
                if age <= self.max_age {
                    continue;
                }
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => {
                        debug!(path = %entry.path().display(), "eliminado por retención");
                        removed += 1;
                    }
                    Err(e) => warn!("No se pudo borrar {}: {e}", entry.path().display()),
                }
            }
        }
        Ok(removed)
    }
}
