// ===============================
// src/recorder.rs
// ===============================
//
// JSONL recorder untuk hasil cycle:
// - Tulis setiap Event (Done / Failed) ke file .jsonl (append).
// - Otomatis membuat parent directory jika belum ada.
// - Flush setelah tiap event (volume kecil: satu baris per cycle).
// - Jika tulis gagal, coba reopen file sekali lalu lanjut; recorder tidak
//   pernah menghentikan pipeline.
//
// ENV: set `RECORD_FILE=/path/to/cycles.jsonl` agar aktif (lihat main.rs).
//
use std::path::{Path, PathBuf};

use tokio::{
    fs::{self, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
};
use tracing::{error, info};

use crate::domain::Event;

async fn open_writer(path: &Path) -> std::io::Result<BufWriter<fs::File>> {
    // Pastikan parent directory ada (kalau ada)
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent).await {
                error!(?e, path = %path.display(), "recorder: create_dir_all failed");
            }
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path).await?;
    Ok(BufWriter::new(file))
}

pub struct Recorder {
    path: PathBuf,
    writer: BufWriter<fs::File>,
}

impl Recorder {
    pub async fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let writer = open_writer(&path).await?;
        info!(path = %path.display(), "recorder: started");
        Ok(Self { path, writer })
    }

    async fn write_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(line).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Append one event. Errors are logged, never returned.
    pub async fn record(&mut self, ev: &Event) {
        let line = match serde_json::to_string(ev) {
            Ok(s) => s,
            Err(e) => {
                error!(?e, "recorder: serialize error, skip event");
                return;
            }
        };

        if let Err(e) = self.write_line(line.as_bytes()).await {
            error!(?e, "recorder: write failed, attempting reopen");
            match open_writer(&self.path).await {
                Ok(w) => {
                    self.writer = w;
                    // coba lagi sekali setelah reopen
                    if let Err(e2) = self.write_line(line.as_bytes()).await {
                        error!(?e2, "recorder: write failed again after reopen, drop event");
                    }
                }
                Err(e2) => error!(?e2, "recorder: reopen failed, drop event"),
            }
        }
    }
}
