//! The deployment order.

/// A constructor argument resolved at deploy time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstructorArg {
    /// The deploying account's address.
    Deployer,
    /// The address of a contract deployed earlier in the plan.
    Contract(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractSpec {
    /// Name in the address map.
    pub name: &'static str,
    /// Artifact to take bytecode from.
    pub artifact: &'static str,
    pub args: Vec<ConstructorArg>,
}

impl ContractSpec {
    fn standalone(name: &'static str) -> Self {
        Self {
            name,
            artifact: name,
            args: Vec::new(),
        }
    }

    fn with(name: &'static str, artifact: &'static str, args: Vec<ConstructorArg>) -> Self {
        Self { name, artifact, args }
    }
}

/// Contracts with no constructor arguments, deployed first.
pub const STANDALONE: &[&str] = &[
    "SimpleFactory",
    "AllowedCalldataEnforcer",
    "AllowedTargetsEnforcer",
    "AllowedMethodsEnforcer",
    "ArgsEqualityCheckEnforcer",
    "DeployedEnforcer",
    "TimestampEnforcer",
    "BlockNumberEnforcer",
    "LimitedCallsEnforcer",
    "ERC20BalanceGteEnforcer",
    "IdEnforcer",
    "ERC20TransferAmountEnforcer",
    "NonceEnforcer",
    "ValueLteEnforcer",
    "NativeTokenTransferAmountEnforcer",
    "NativeBalanceGteEnforcer",
    "RedeemerEnforcer",
];

/// Every framework contract, each after the contracts its constructor needs.
pub fn deployment_plan() -> Vec<ContractSpec> {
    use ConstructorArg::{Contract, Deployer};

    let mut plan: Vec<ContractSpec> = STANDALONE.iter().map(|&n| ContractSpec::standalone(n)).collect();
    plan.push(ContractSpec::with(
        "DelegationManager",
        "DelegationManager",
        vec![Deployer],
    ));
    plan.push(ContractSpec::with(
        "NativeTokenPaymentEnforcer",
        "NativeTokenPaymentEnforcer",
        vec![Contract("DelegationManager"), Contract("ArgsEqualityCheckEnforcer")],
    ));
    plan.push(ContractSpec::standalone("EntryPoint"));
    plan.push(ContractSpec::with(
        "HybridDeleGatorImpl",
        "HybridDeleGator",
        vec![Contract("DelegationManager"), Contract("EntryPoint")],
    ));
    plan.push(ContractSpec::with(
        "MultiSigDeleGatorImpl",
        "MultiSigDeleGator",
        vec![Contract("DelegationManager"), Contract("EntryPoint")],
    ));
    plan
}
