use anyhow::{Context, Result};
use reqwest::{Certificate, Client};
use std::path::Path;
use std::time::Duration;
use tokio::net::lookup_host;
use tokio::time::{sleep, Instant};

use crate::error::PipelineError;

/// Block until `probe_host` resolves, probing every `poll` for at most
/// `max_wait` in total. DNS resolution is the cheapest signal that the
/// machine is actually online (e.g. a laptop that just woke from sleep).
pub async fn wait_for_network(
    probe_host: &str,
    poll: Duration,
    max_wait: Duration,
) -> Result<(), PipelineError> {
    let started = Instant::now();

    loop {
        if lookup_host((probe_host, 443)).await.is_ok() {
            return Ok(());
        }
        // Give up once the next sleep would overshoot the bound.
        if started.elapsed() + poll > max_wait {
            return Err(PipelineError::NetworkUnavailable {
                waited_secs: started.elapsed().as_secs(),
            });
        }
        sleep(poll).await;
    }
}

/// Build an HTTP client for a collaborator. A custom CA bundle is injected
/// here, at construction, rather than patched into process-wide TLS state.
pub fn http_client(user_agent: &str, ca_bundle: Option<&Path>) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(user_agent.to_string());

    if let Some(pem_path) = ca_bundle {
        let pem = std::fs::read(pem_path)
            .with_context(|| format!("Failed to read CA bundle {}", pem_path.display()))?;
        let cert = Certificate::from_pem(&pem).context("Failed to parse CA bundle as PEM")?;
        builder = builder.add_root_certificate(cert);
    }

    builder.build().context("Failed to create HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn gives_up_within_the_configured_bound() {
        let poll = Duration::from_secs(2);
        let max_wait = Duration::from_secs(10);

        let err = wait_for_network("name-that-cannot-resolve.invalid", poll, max_wait)
            .await
            .unwrap_err();

        match err {
            PipelineError::NetworkUnavailable { waited_secs } => {
                // Bounded within one poll interval of tolerance.
                assert!(waited_secs <= max_wait.as_secs() + poll.as_secs());
            }
            other => panic!("expected NetworkUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolvable_host_passes_immediately() {
        wait_for_network("localhost", Duration::from_millis(10), Duration::from_secs(1))
            .await
            .unwrap();
    }

    #[test]
    fn client_builds_without_a_ca_bundle() {
        http_client("push-articles-test/0.1", None).unwrap();
    }
}
