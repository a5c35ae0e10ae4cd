use super::config::GovGateConfig;
use super::config_path;
use govgate::identity::{FileIdentityResolver, IdentityResolver};
use govgate::ledger::{LedgerClient, RegistryAddress, RpcLedgerClient};

/// Deploy a fresh governance registry
///
/// Validates the voter set and quorum percentages, deploys the registry
/// through the gateway, prints the new address, and (unless `--no-save`)
/// records it in the config file so later propose/vote runs pick it up
/// without `--registry`.
pub async fn execute(
    credential: String,
    voters: String,
    version_quorum: u8,
    role_binding_quorum: u8,
    config: Option<String>,
    no_save: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let config_path = config_path(config);
    let mut config = GovGateConfig::load(&config_path)?;

    validate_quorum("version quorum", version_quorum)?;
    validate_quorum("role-binding quorum", role_binding_quorum)?;

    let voters = parse_voters(&voters)?;

    println!("Gateway: {}", config.node.gateway_url);
    println!("Voters: {}", voters.len());
    println!(
        "Quorums: version {}%, role-binding {}%",
        version_quorum, role_binding_quorum
    );

    let ledger = RpcLedgerClient::new(&config.node.gateway_url)?;
    let resolver = FileIdentityResolver::new(config.credentials.file.clone());
    let identity = resolver.resolve(&credential)?;

    let address = ledger
        .deploy_registry(&identity, &voters, version_quorum, role_binding_quorum)
        .await?;

    println!();
    println!("Registry deployed: {}", address);

    if no_save {
        println!("Not saved (--no-save); pass --registry {} to later runs", address);
    } else {
        config.set_registry_address(&config_path, address.to_string())?;
        println!("Recorded in {}", config_path.display());
    }

    Ok(0)
}

fn validate_quorum(what: &str, percent: u8) -> Result<(), Box<dyn std::error::Error>> {
    if percent > 100 {
        return Err(format!("{} must be 0-100, got {}", what, percent).into());
    }
    Ok(())
}

/// Parse the comma-separated voter list, tolerating whitespace around
/// the separators. At least one voter is required.
fn parse_voters(list: &str) -> Result<Vec<RegistryAddress>, Box<dyn std::error::Error>> {
    let voters: Vec<RegistryAddress> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(RegistryAddress::parse)
        .collect::<Result<_, _>>()?;

    if voters.is_empty() {
        return Err("voter list is empty".into());
    }
    Ok(voters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_voters_whitespace() {
        let voters = parse_voters(
            "0x1111111111111111111111111111111111111111 , 0x2222222222222222222222222222222222222222",
        )
        .unwrap();
        assert_eq!(voters.len(), 2);
        assert_eq!(
            voters[1].as_str(),
            "0x2222222222222222222222222222222222222222"
        );
    }

    #[test]
    fn test_parse_voters_rejects_malformed_address() {
        assert!(parse_voters("0x1234").is_err());
    }

    #[test]
    fn test_parse_voters_rejects_empty_list() {
        assert!(parse_voters("").is_err());
        assert!(parse_voters(" , ").is_err());
    }

    #[test]
    fn test_validate_quorum_bounds() {
        assert!(validate_quorum("version quorum", 0).is_ok());
        assert!(validate_quorum("version quorum", 100).is_ok());
        assert!(validate_quorum("version quorum", 101).is_err());
    }
}
