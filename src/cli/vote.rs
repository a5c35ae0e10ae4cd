use super::config::GovGateConfig;
use super::{config_path, DecisionArg, OperationArg};
use govgate::identity::FileIdentityResolver;
use govgate::ledger::{RegistryAddress, RpcLedgerClient};
use govgate::workflow::{PipelineContext, VoteCaster};

/// Cast a vote on an open proposal
///
/// Single-shot: resolves the signing identity, reads the proposal
/// subject from `GIVEN_GIT_COMMIT` (version) or `GIVEN_CONTRACT_ADDRESS`
/// (deployment), and submits the vote. Repeated votes from the same
/// identity are the ledger's problem, not ours.
pub async fn execute(
    operation: OperationArg,
    credential: String,
    decision: DecisionArg,
    config: Option<String>,
    registry: Option<String>,
) -> Result<i32, Box<dyn std::error::Error>> {
    let config_path = config_path(config);
    let config = GovGateConfig::load(&config_path)?;

    let registry_str = registry
        .or(config.registry.address.clone())
        .ok_or("no registry address: pass --registry, or run `govgate deploy-registry`")?;
    let registry = RegistryAddress::parse(&registry_str)?;

    println!("Registry: {}", registry);
    println!("Credential: {}", credential);
    println!("Decision: {:?}", decision);

    let ledger = RpcLedgerClient::new(&config.node.gateway_url)?;
    let resolver = FileIdentityResolver::new(config.credentials.file.clone());

    let caster = VoteCaster::new(ledger, resolver, registry, &credential, decision.accept());

    let ctx = PipelineContext::from_env();
    let outcome = caster.run(operation.into(), &ctx).await?;

    println!();
    println!("Vote submitted");

    Ok(outcome.exit_code())
}
