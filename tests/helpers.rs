// Shared test helpers: a scripted chain source and rcgen-built certificates.
//
// Nothing here touches the network.

#![allow(dead_code)] // Not every test file uses every helper

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cert_census::error_handling::FetchError;
use cert_census::tls::ChainSource;
use cert_census::GatherConfig;
use futures::future::BoxFuture;
use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair};
use rustls::pki_types::CertificateDer;
use tokio::sync::Semaphore;

/// What the scripted source does for one hostname.
#[derive(Clone)]
pub enum Script {
    Chain(Vec<CertificateDer<'static>>),
    Fail(FetchError),
    /// Never answers; only the hard timeout ends the fetch.
    Hang,
}

/// In-memory `ChainSource` answering from a per-hostname script.
///
/// Unknown hostnames fail with a connection error. Every call is recorded.
/// Gated fetches (all of them, or only held hostnames) block until
/// [`ScriptedSource::release`] is called.
pub struct ScriptedSource {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
    gate: Arc<Semaphore>,
    gate_all: bool,
    held: HashSet<String>,
    tls: Result<(), String>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            gate: Arc::new(Semaphore::new(0)),
            gate_all: false,
            held: HashSet::new(),
            tls: Ok(()),
        }
    }

    pub fn with_script(mut self, hostname: &str, script: Script) -> Self {
        self.scripts.insert(hostname.to_string(), script);
        self
    }

    pub fn with_chain(self, hostname: &str, chain: Vec<CertificateDer<'static>>) -> Self {
        self.with_script(hostname, Script::Chain(chain))
    }

    /// Blocks every fetch until released.
    pub fn gated(mut self) -> Self {
        self.gate_all = true;
        self
    }

    /// Blocks fetches of `hostnames` until released.
    pub fn holding(mut self, hostnames: &[String]) -> Self {
        self.held.extend(hostnames.iter().cloned());
        self
    }

    pub fn without_tls(mut self, reason: &str) -> Self {
        self.tls = Err(reason.to_string());
        self
    }

    /// Lets every blocked and future fetch through.
    pub fn release(&self) {
        self.gate.add_permits(10_000);
    }

    /// Hostnames fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChainSource for ScriptedSource {
    fn fetch_chain<'a>(
        &'a self,
        hostname: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CertificateDer<'static>>, FetchError>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(hostname.to_string());
            if self.gate_all || self.held.contains(hostname) {
                let _permit = self.gate.acquire().await;
            }
            match self.scripts.get(hostname) {
                Some(Script::Chain(chain)) => Ok(chain.clone()),
                Some(Script::Fail(error)) => Err(error.clone()),
                Some(Script::Hang) => std::future::pending().await,
                None => Err(FetchError::Connect(format!("{hostname}: connection refused"))),
            }
        })
    }

    fn tls_available(&self) -> Result<(), String> {
        self.tls.clone()
    }
}

/// A self-signed CA able to issue leaf certificates.
pub struct TestCa {
    cert: rcgen::Certificate,
    key: KeyPair,
}

impl TestCa {
    /// Root with subject `C=NL, O=Census Test, CN=<common_name>`.
    pub fn new(common_name: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name = DistinguishedName::new();
        params.distinguished_name.push(DnType::CountryName, "NL");
        params.distinguished_name.push(DnType::OrganizationName, "Census Test");
        params.distinguished_name.push(DnType::CommonName, common_name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let cert = params.self_signed(&key).unwrap();
        Self { cert, key }
    }

    /// Flattened subject string of this root.
    pub fn subject(common_name: &str) -> String {
        format!("NL Census Test {common_name} ")
    }

    pub fn der(&self) -> CertificateDer<'static> {
        self.cert.der().clone()
    }

    /// Leaf for `hostname` (CN and one DNS SAN) signed by this CA.
    pub fn issue_leaf(&self, hostname: &str) -> CertificateDer<'static> {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec![hostname.to_string()]).unwrap();
        params.distinguished_name = DistinguishedName::new();
        params.distinguished_name.push(DnType::CommonName, hostname);
        params
            .signed_by(&key, &self.cert, &self.key)
            .unwrap()
            .der()
            .clone()
    }
}

pub fn hostnames(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// `count` hostnames `host-0.example`, `host-1.example`, ...
pub fn numbered_hostnames(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("host-{i}.example")).collect()
}

pub fn gather_config(batch_size: usize, hard_timeout_ms: u64) -> GatherConfig {
    GatherConfig {
        batch_size,
        hard_timeout: Duration::from_millis(hard_timeout_ms),
    }
}
