//! Hostname list input.
//!
//! One hostname per line. Blank lines and `#` comments are skipped, and a line
//! that is a URL (`https://host/path`) contributes only its host. Duplicates
//! are kept: every occurrence is checked.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Hostnames in input order, with the per-hostname occurrence table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostnameList {
    pub hostnames: Vec<String>,
    /// `(hostname, occurrences)`, most frequent first, then by name.
    pub counts: Vec<(String, usize)>,
}

impl HostnameList {
    /// Builds the list from already extracted hostnames.
    pub fn from_hostnames(hostnames: Vec<String>) -> Self {
        let mut table: HashMap<&str, usize> = HashMap::new();
        for hostname in &hostnames {
            *table.entry(hostname.as_str()).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = table
            .into_iter()
            .map(|(hostname, count)| (hostname.to_string(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self { hostnames, counts }
    }

    pub fn len(&self) -> usize {
        self.hostnames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hostnames.is_empty()
    }

    pub fn into_hostnames(self) -> Vec<String> {
        self.hostnames
    }
}

/// Reads hostnames from `path`, or from stdin when `path` is `-`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub async fn load_hostnames(path: &Path) -> Result<HostnameList> {
    let list = if path.as_os_str() == "-" {
        info!("Reading hostnames from stdin");
        read_hostnames(BufReader::new(tokio::io::stdin())).await?
    } else {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open hostname file {}", path.display()))?;
        read_hostnames(BufReader::new(file))
            .await
            .with_context(|| format!("Failed to read hostname file {}", path.display()))?
    };

    info!(
        "Loaded {} hostname(s), {} distinct",
        list.len(),
        list.counts.len()
    );
    Ok(list)
}

/// Reads hostnames line by line from `reader`.
pub async fn read_hostnames<R>(reader: R) -> Result<HostnameList>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut hostnames = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if let Some(hostname) = parse_hostname_line(&line) {
            hostnames.push(hostname);
        }
    }
    Ok(HostnameList::from_hostnames(hostnames))
}

/// Extracts the hostname from one input line, `None` for lines to skip.
pub fn parse_hostname_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    if !line.contains("://") {
        return Some(line.to_string());
    }
    match url::Url::parse(line) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => {
                debug!("Using host {host} of {line}");
                Some(host.to_string())
            }
            None => {
                warn!("Skipping URL without host: {line}");
                None
            }
        },
        Err(e) => {
            warn!("Skipping invalid URL {line}: {e}");
            None
        }
    }
}
