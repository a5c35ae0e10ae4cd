use super::config::GovGateConfig;
use super::{config_path, OperationArg};
use govgate::identity::FileIdentityResolver;
use govgate::ledger::{RegistryAddress, RpcLedgerClient};
use govgate::webhook::{parse_targets, WebhookNotifier};
use govgate::workflow::orchestrator::{cancel_channel, ProposalOrchestrator};
use govgate::workflow::PipelineContext;

/// Submit a governance proposal
///
/// Version flow: submits the proposal for the commit in `GIT_COMMIT`,
/// notifies the webhook targets, then blocks polling the ledger until the
/// proposal is accepted or rejected. Deployment flow: submits the
/// proposal for the address in `CONTRACT_ADDRESS`, notifies, and returns
/// without waiting for a decision.
///
/// Ctrl-C cancels a polling wait cleanly; the proposal stays open on the
/// ledger.
///
/// Exit codes: 0 accepted or submitted, 2 rejected, 3 cancelled.
pub async fn execute(
    operation: OperationArg,
    credential: String,
    config: Option<String>,
    registry: Option<String>,
    webhook_targets: Option<String>,
    poll_interval: Option<String>,
    deadline: Option<String>,
) -> Result<i32, Box<dyn std::error::Error>> {
    let config_path = config_path(config);
    let config = GovGateConfig::load(&config_path)?;

    let registry_str = registry
        .or(config.registry.address.clone())
        .ok_or("no registry address: pass --registry, or run `govgate deploy-registry`")?;
    let registry = RegistryAddress::parse(&registry_str)?;

    let targets = parse_targets(
        webhook_targets
            .as_deref()
            .unwrap_or(&config.webhooks.targets),
    );

    let mut poll = config.polling.settings()?;
    if let Some(interval) = poll_interval {
        poll.interval = humantime::parse_duration(&interval)
            .map_err(|e| format!("invalid --poll-interval '{}': {}", interval, e))?;
    }
    if let Some(deadline) = deadline {
        poll.deadline = Some(
            humantime::parse_duration(&deadline)
                .map_err(|e| format!("invalid --deadline '{}': {}", deadline, e))?,
        );
    }

    println!("Registry: {}", registry);
    println!("Credential: {}", credential);
    println!("Gateway: {}", config.node.gateway_url);

    let ledger = RpcLedgerClient::new(&config.node.gateway_url)?;
    let resolver = FileIdentityResolver::new(config.credentials.file.clone());
    let notifier = WebhookNotifier::new(config.webhooks.fail_fast);

    let orchestrator = ProposalOrchestrator::new(
        ledger, resolver, notifier, registry, &credential, targets, poll,
    )?;

    let ctx = PipelineContext::from_env();

    // Ctrl-C maps to the cancellation channel so an interrupted polling
    // wait still reports a distinct Cancelled outcome.
    let (cancel_tx, cancel_rx) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(());
        }
    });

    let outcome = orchestrator.run(operation.into(), &ctx, cancel_rx).await?;

    println!();
    println!("Outcome: {:?}", outcome);

    Ok(outcome.exit_code())
}
