// # Output Artifacts
//
// Plain-text files that other tooling reads.
//
// ## File Format
//
// One record per line, `{address}#{line_type}`, newline-terminated, UTF-8,
// no header:
//
// ```text
// 104.16.1.1#电信
// 104.16.2.2#联通
// ```
//
// - `{source}.txt` for every source that produced at least one record
// - `all_cf_ip.txt` for the merged, sorted list
//
// Writes go to a `.tmp` sibling first and are renamed into place, so readers
// never see a half-written file.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::model::IpRecord;

/// File name of the merged list
pub const MERGED_FILE_NAME: &str = "all_cf_ip.txt";

/// Writer for the per-source and merged record files
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    /// Create a writer rooted at `dir`. Nothing touches the disk until the
    /// first write.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file for a given source name
    pub fn source_path(&self, source: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", source))
    }

    /// Path of the merged file
    pub fn merged_path(&self) -> PathBuf {
        self.dir.join(MERGED_FILE_NAME)
    }

    /// Write the records extracted from one source
    pub async fn write_source(&self, source: &str, records: &[IpRecord]) -> Result<PathBuf, Error> {
        let path = self.source_path(source);
        self.write_records(&path, records).await?;
        Ok(path)
    }

    /// Write the merged list
    pub async fn write_merged(&self, records: &[IpRecord]) -> Result<PathBuf, Error> {
        let path = self.merged_path();
        self.write_records(&path, records).await?;
        Ok(path)
    }

    async fn write_records(&self, path: &Path, records: &[IpRecord]) -> Result<(), Error> {
        if !self.dir.as_os_str().is_empty() && !self.dir.exists() {
            fs::create_dir_all(&self.dir).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create output directory {}: {}",
                    self.dir.display(),
                    e
                ))
            })?;
        }

        let body = render(records);

        let temp_path = temp_path(path);
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(body.as_bytes()).await?;
            file.flush().await?;
        }

        fs::rename(&temp_path, path).await?;

        tracing::info!("Saved {} record(s) to {}", records.len(), path.display());
        Ok(())
    }
}

/// Render records in the on-disk format
pub fn render(records: &[IpRecord]) -> String {
    let mut body = String::with_capacity(records.len() * 24);
    for record in records {
        body.push_str(record.address());
        body.push('#');
        body.push_str(record.line_type().as_str());
        body.push('\n');
    }
    body
}

fn temp_path(path: &Path) -> PathBuf {
    let mut temp = path.to_path_buf();
    temp.set_extension("tmp");
    temp
}
