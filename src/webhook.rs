//! Outbound webhook notifications for newly opened proposals.
//!
//! Delivery is sequential, in target-list order, one GET per target. The
//! request URL is the target's base URL with the proposal parameters
//! appended as a query string. The response status line is logged; the
//! body is neither parsed nor acted on, and a non-2xx status is not
//! treated as a delivery failure.
//!
//! Default delivery is best-effort: a failed target is logged and
//! recorded, and the remaining targets are still attempted. `fail_fast`
//! restores strict behavior where the first failure aborts the batch and
//! the pipeline step.

use crate::error::{WorkflowError, WorkflowResult};
use crate::ledger::RegistryAddress;
use tracing::{info, warn};

/// A single notification target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    pub base_url: String,
}

/// Parse a comma-separated target list, tolerating whitespace around the
/// separators. Empty entries are dropped.
pub fn parse_targets(list: &str) -> Vec<WebhookTarget> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| WebhookTarget {
            base_url: s.to_string(),
        })
        .collect()
}

/// Ordered query parameters describing an open proposal.
///
/// Receivers use `token` (the registry address) as a correlation token;
/// it is not cryptographically authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyParams {
    params: Vec<(&'static str, String)>,
}

impl NotifyParams {
    /// Parameters for an open version proposal.
    pub fn version(registry: &RegistryAddress, commit_hex: &str) -> Self {
        Self {
            params: vec![
                ("token", registry.to_string()),
                ("GIVEN_GIT_COMMIT", commit_hex.to_string()),
                ("VOTING_TYPE", "version".to_string()),
            ],
        }
    }

    /// Parameters for an open deployment proposal.
    pub fn deployment(
        registry: &RegistryAddress,
        target: &RegistryAddress,
        commit_hex: &str,
    ) -> Self {
        Self {
            params: vec![
                ("token", registry.to_string()),
                ("GIVEN_CONTRACT_ADDRESS", target.to_string()),
                ("GIVEN_GIT_COMMIT", commit_hex.to_string()),
                ("VOTING_TYPE", "deployment".to_string()),
            ],
        }
    }

    /// Build the request URL for one target.
    pub fn url_for(&self, target: &WebhookTarget) -> String {
        let query: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}?{}", target.base_url, query.join("&"))
    }
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub target: WebhookTarget,
    /// Response status line on success, error text on failure.
    pub status: Result<String, String>,
}

/// Delivers proposal notifications to an ordered target list.
pub struct WebhookNotifier {
    client: reqwest::Client,
    fail_fast: bool,
}

impl WebhookNotifier {
    pub fn new(fail_fast: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            fail_fast,
        }
    }

    /// Deliver `params` to every target, in order.
    ///
    /// Best-effort mode records failures and continues; fail-fast mode
    /// aborts the batch on the first failure.
    pub async fn notify(
        &self,
        targets: &[WebhookTarget],
        params: &NotifyParams,
    ) -> WorkflowResult<Vec<DeliveryOutcome>> {
        let mut outcomes = Vec::with_capacity(targets.len());

        for target in targets {
            let url = params.url_for(target);
            info!("Calling webhook URL: {}", url);

            match self.client.get(&url).send().await {
                Ok(response) => {
                    let status_line = response.status().to_string();
                    info!("{}", status_line);
                    outcomes.push(DeliveryOutcome {
                        target: target.clone(),
                        status: Ok(status_line),
                    });
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!("webhook delivery to {} failed: {}", target.base_url, message);
                    if self.fail_fast {
                        return Err(WorkflowError::WebhookDelivery(format!(
                            "{}: {}",
                            target.base_url, message
                        )));
                    }
                    outcomes.push(DeliveryOutcome {
                        target: target.clone(),
                        status: Err(message),
                    });
                }
            }
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn registry() -> RegistryAddress {
        RegistryAddress::parse("0xABCD00000000000000000000000000000000abcd").unwrap()
    }

    #[test]
    fn test_parse_targets_whitespace_and_order() {
        let targets = parse_targets("https://a.example/hook , https://b.example/hook,https://c.example/hook");
        assert_eq!(
            targets
                .iter()
                .map(|t| t.base_url.as_str())
                .collect::<Vec<_>>(),
            vec![
                "https://a.example/hook",
                "https://b.example/hook",
                "https://c.example/hook"
            ]
        );
    }

    #[test]
    fn test_parse_targets_drops_empty_entries() {
        let targets = parse_targets("https://a.example/hook,, ");
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn test_version_url_exact() {
        let registry = RegistryAddress::parse("0xabcd00000000000000000000000000000000abcd").unwrap();
        let params = NotifyParams::version(&registry, "deadbeef");
        let target = WebhookTarget {
            base_url: "https://ex.example/hook".to_string(),
        };
        let expected = "https://ex.example/hook?token=0xabcd00000000000000000000000000000000abcd&GIVEN_GIT_COMMIT=deadbeef&VOTING_TYPE=version";
        assert_eq!(params.url_for(&target), expected);
    }

    #[test]
    fn test_deployment_url_parameter_order() {
        let target_addr =
            RegistryAddress::parse("0x1111111111111111111111111111111111111111").unwrap();
        let params = NotifyParams::deployment(&registry(), &target_addr, "cafe");
        let target = WebhookTarget {
            base_url: "https://ex.example/hook".to_string(),
        };
        let url = params.url_for(&target);

        let token_pos = url.find("token=").unwrap();
        let addr_pos = url.find("GIVEN_CONTRACT_ADDRESS=").unwrap();
        let commit_pos = url.find("GIVEN_GIT_COMMIT=").unwrap();
        let type_pos = url.find("VOTING_TYPE=deployment").unwrap();
        assert!(token_pos < addr_pos && addr_pos < commit_pos && commit_pos < type_pos);
    }

    /// Minimal one-shot HTTP server that answers 200 OK.
    async fn spawn_ok_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
                    .await;
            }
        });
        format!("http://{}/hook", addr)
    }

    #[tokio::test]
    async fn test_best_effort_continues_past_failure() {
        let ok_url = spawn_ok_server().await;
        let targets = vec![
            WebhookTarget {
                // Reserved port on loopback, connection refused.
                base_url: "http://127.0.0.1:1/hook".to_string(),
            },
            WebhookTarget { base_url: ok_url },
        ];

        let notifier = WebhookNotifier::new(false);
        let params = NotifyParams::version(&registry(), "deadbeef");
        let outcomes = notifier.notify(&targets, &params).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].status.is_err());
        assert!(outcomes[1].status.is_ok());
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_batch() {
        let targets = vec![
            WebhookTarget {
                base_url: "http://127.0.0.1:1/hook".to_string(),
            },
            WebhookTarget {
                base_url: "http://127.0.0.1:1/other".to_string(),
            },
        ];

        let notifier = WebhookNotifier::new(true);
        let params = NotifyParams::version(&registry(), "deadbeef");
        let result = notifier.notify(&targets, &params).await;

        assert!(matches!(result, Err(WorkflowError::WebhookDelivery(_))));
    }

    #[tokio::test]
    async fn test_delivery_records_status_line() {
        let ok_url = spawn_ok_server().await;
        let targets = vec![WebhookTarget { base_url: ok_url }];

        let notifier = WebhookNotifier::new(false);
        let params = NotifyParams::version(&registry(), "deadbeef");
        let outcomes = notifier.notify(&targets, &params).await.unwrap();

        assert_eq!(outcomes[0].status.as_deref().unwrap(), "200 OK");
    }
}
