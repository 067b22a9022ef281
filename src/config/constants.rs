//! Configuration constants.
//!
//! Policy defaults for the certificate gathering run. All of them can be
//! overridden through [`Config`](super::Config).

use std::time::Duration;

/// Number of hostnames checked concurrently in one batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Connect and transfer timeout for a single host.
pub const TRANSFER_TIMEOUT: Duration = Duration::from_millis(3500);

/// Hard upper bound for a single host, covering everything the transfer
/// timeout does not (DNS resolution, writing the request).
pub const HARD_TIMEOUT: Duration = Duration::from_millis(4000);

/// Port every hostname is contacted on.
pub const HTTPS_PORT: u16 = 443;

/// User-Agent sent with the single request written after the handshake.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Object identifier of the basic constraints extension.
pub const OID_BASIC_CONSTRAINTS: &str = "2.5.29.19";

