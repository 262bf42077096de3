use tracing::{debug, trace, warn};

use crate::{
    address::{ValidAddress, validate_address},
    core::IssuanceConfig,
    error::{BalanceError, IssueError},
    model::{IssueInstruction, TokenAmount, sum_amounts},
    script::TokenOrigin,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Token,
    Split,
    Fee,
    Change,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlannedOutput {
    Token {
        address: ValidAddress,
        amount: TokenAmount,
        metadata: Vec<u8>,
    },
    Split {
        address: ValidAddress,
    },
    Fee {
        address: ValidAddress,
    },
    /// Receives whatever the funding input has left. Dropped by the assembler
    /// when nothing is left.
    Change {
        address: ValidAddress,
    },
}

impl PlannedOutput {
    pub fn kind(&self) -> OutputKind {
        match self {
            PlannedOutput::Token { .. } => OutputKind::Token,
            PlannedOutput::Split { .. } => OutputKind::Split,
            PlannedOutput::Fee { .. } => OutputKind::Fee,
            PlannedOutput::Change { .. } => OutputKind::Change,
        }
    }

    pub fn address(&self) -> &ValidAddress {
        match self {
            PlannedOutput::Token { address, .. }
            | PlannedOutput::Split { address }
            | PlannedOutput::Fee { address }
            | PlannedOutput::Change { address } => address,
        }
    }
}

/// Output topology of one issuance transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuancePlan {
    pub origin: TokenOrigin,
    pub total: TokenAmount,
    pub outputs: Vec<PlannedOutput>,
    /// Whether `total` was checked against the units carried by the consumed
    /// output. The assembler holds token outputs to the consumed output's
    /// value only for checked plans.
    pub supply_checked: bool,
}

impl IssuancePlan {
    pub fn count(&self, kind: OutputKind) -> usize {
        self.outputs.iter().filter(|o| o.kind() == kind).count()
    }

    pub fn is_funded(&self) -> bool {
        self.count(OutputKind::Change) > 0
    }
}

pub struct PlanRequest<'a> {
    pub instructions: &'a [IssueInstruction],
    /// Token units carried by the consumed contract or issuance output.
    pub available: TokenAmount,
    pub origin: TokenOrigin,
    pub split: bool,
    pub fee_count: u32,
    /// Present only when a funding input is spent.
    pub change_address: Option<ValidAddress>,
}

/// Builds the output topology: token outputs in instruction order, then split
/// outputs, then fee outputs, then change.
pub fn build_plan(
    request: PlanRequest<'_>,
    config: &IssuanceConfig,
) -> Result<IssuancePlan, IssueError> {
    plan(request, config, true)
}

/// Same as [`build_plan`] without the supply equality check. Produces
/// transactions the ledger rejects; intended for exercising that rejection.
pub fn build_plan_unchecked(
    request: PlanRequest<'_>,
    config: &IssuanceConfig,
) -> Result<IssuancePlan, IssueError> {
    plan(request, config, false)
}

fn plan(
    request: PlanRequest<'_>,
    config: &IssuanceConfig,
    enforce_balance: bool,
) -> Result<IssuancePlan, IssueError> {
    let PlanRequest {
        instructions,
        available,
        origin,
        split,
        fee_count,
        change_address,
    } = request;

    let recipients = instructions
        .iter()
        .map(|instruction| validate_address(&instruction.recipient_address, config.network))
        .collect::<Result<Vec<_>, _>>()?;

    let total = sum_amounts(instructions)?;
    if enforce_balance && total != available {
        return Err(BalanceError {
            requested: total,
            available,
        }
        .into());
    }

    let mut outputs: Vec<PlannedOutput> = recipients
        .iter()
        .zip(instructions)
        .map(|(address, instruction)| PlannedOutput::Token {
            address: *address,
            amount: instruction.amount,
            metadata: instruction.metadata.clone(),
        })
        .collect();

    match change_address {
        Some(change_address) => {
            if split {
                outputs.extend(
                    recipients
                        .iter()
                        .map(|address| PlannedOutput::Split { address: *address }),
                );
            }
            if fee_count > 0 {
                let fee_address = validate_address(config.fee_address(), config.network)?;
                outputs.extend(
                    (0..fee_count).map(|_| PlannedOutput::Fee {
                        address: fee_address,
                    }),
                );
            }
            outputs.push(PlannedOutput::Change {
                address: change_address,
            });
        }
        None if split || fee_count > 0 => {
            warn!(split, fee_count, "No funding input, dropping split and fee outputs");
        }
        None => {}
    }

    let plan = IssuancePlan {
        origin,
        total,
        outputs,
        supply_checked: enforce_balance,
    };
    debug!(
        tokens = plan.count(OutputKind::Token),
        splits = plan.count(OutputKind::Split),
        fees = plan.count(OutputKind::Fee),
        total,
        available,
        "Built issuance plan"
    );
    for (index, output) in plan.outputs.iter().enumerate() {
        trace!(index, kind = ?output.kind(), address = %output.address(), "Planned output");
    }
    Ok(plan)
}
