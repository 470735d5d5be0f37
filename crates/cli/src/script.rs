//! Transaction scripts: a fixed admin, a contract table, and a list of calls.
//!
//! ```json
//! {
//!   "admin": "0xadad…",
//!   "contracts": [{ "address": "0xc0c0…", "accepts": false }],
//!   "calls": [
//!     { "caller": "0xadad…", "call": "mint" },
//!     { "caller": "0xadad…", "call": "transferFrom", "from": "0xadad…", "to": "0x0101…", "tokenId": 0 },
//!     { "call": "balanceOf", "owner": "0x0101…" }
//!   ]
//! }
//! ```

use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use nftledger_core::{Address, TokenId};
use nftledger_events::{EventEnvelope, InMemoryEventBus};
use nftledger_infra::{EventLog, InMemoryEventLog, LedgerService, ServiceError, StoredEvent};
use nftledger_token::{ContractRegistry, LedgerCommand};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Script {
    /// Falls back to `NFT_LEDGER_ADMIN` when absent.
    #[serde(default)]
    pub admin: Option<Address>,
    #[serde(default)]
    pub contracts: Vec<ContractSpec>,
    pub calls: Vec<Call>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContractSpec {
    pub address: Address,
    pub accepts: bool,
}

/// One line of a script. Queries take no caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Call {
    Mint {
        caller: Address,
    },
    TransferFrom {
        caller: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
    },
    SafeTransferFrom {
        caller: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
        /// `0x`-prefixed hex, passed to the recipient check.
        #[serde(default)]
        data: Option<String>,
    },
    Approve {
        caller: Address,
        to: Address,
        token_id: TokenId,
    },
    SetApprovalForAll {
        caller: Address,
        operator: Address,
        approved: bool,
    },
    BalanceOf {
        owner: Address,
    },
    OwnerOf {
        token_id: TokenId,
    },
    GetApproved {
        token_id: TokenId,
    },
    IsApprovedForAll {
        owner: Address,
        operator: Address,
    },
    Admin,
}

/// Printed result of one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Ok(JsonValue),
    Error { kind: String, reason: String },
}

type ScriptService = LedgerService<InMemoryEventLog, InMemoryEventBus<EventEnvelope<JsonValue>>, ContractRegistry>;

/// Result of running a whole script.
#[derive(Debug)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
    pub log: Vec<StoredEvent>,
}

impl Report {
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Error { .. }))
            .count()
    }
}

/// Run every call in order, writing one JSON line per outcome to `out`.
///
/// Ledger rejections are outcomes, not errors; infrastructure failures abort the run.
pub fn run(script: &Script, admin: Address, out: &mut impl Write) -> Result<Report> {
    let oracle = script
        .contracts
        .iter()
        .fold(ContractRegistry::new(), |registry, c| registry.with_contract(c.address, c.accepts));
    let service: ScriptService =
        LedgerService::new(admin, InMemoryEventLog::new(), InMemoryEventBus::new(), oracle)?;

    let mut outcomes = Vec::with_capacity(script.calls.len());
    for (idx, call) in script.calls.iter().enumerate() {
        let outcome = execute(&service, call).with_context(|| format!("call #{idx} failed"))?;
        serde_json::to_writer(&mut *out, &outcome)?;
        writeln!(out)?;
        outcomes.push(outcome);
    }

    tracing::debug!(calls = outcomes.len(), "script finished");
    let log = service.log().load_all()?;
    Ok(Report { outcomes, log })
}

fn execute(service: &ScriptService, call: &Call) -> Result<Outcome> {
    let result = match call {
        Call::Mint { caller } => submit(service, LedgerCommand::mint(*caller)),
        Call::TransferFrom {
            caller,
            from,
            to,
            token_id,
        } => submit(service, LedgerCommand::transfer_from(*caller, *from, *to, *token_id)),
        Call::SafeTransferFrom {
            caller,
            from,
            to,
            token_id,
            data,
        } => {
            let data = decode_data(data.as_deref())?;
            submit(
                service,
                LedgerCommand::safe_transfer_from(*caller, *from, *to, *token_id, data),
            )
        }
        Call::Approve {
            caller,
            to,
            token_id,
        } => submit(service, LedgerCommand::approve(*caller, *to, *token_id)),
        Call::SetApprovalForAll {
            caller,
            operator,
            approved,
        } => submit(
            service,
            LedgerCommand::set_approval_for_all(*caller, *operator, *approved),
        ),
        Call::BalanceOf { owner } => service.balance_of(*owner).map(|b| json!(b)),
        Call::OwnerOf { token_id } => service.owner_of(*token_id).map(|a| json!(a)),
        Call::GetApproved { token_id } => service
            .get_approved(*token_id)
            .map(|a| json!(a.unwrap_or(Address::ZERO))),
        Call::IsApprovedForAll { owner, operator } => {
            service.is_approved_for_all(*owner, *operator).map(|b| json!(b))
        }
        Call::Admin => service.admin().map(|a| json!(a)),
    };

    match result {
        Ok(value) => Ok(Outcome::Ok(value)),
        Err(ServiceError::Ledger(err)) => Ok(Outcome::Error {
            kind: err.kind().to_string(),
            reason: err.reason(),
        }),
        Err(other) => Err(other.into()),
    }
}

/// Committed event payloads, in order.
fn submit(service: &ScriptService, command: LedgerCommand) -> Result<JsonValue, ServiceError> {
    let committed = service.submit(command)?;
    Ok(JsonValue::Array(committed.into_iter().map(|e| e.payload).collect()))
}

fn decode_data(data: Option<&str>) -> Result<Vec<u8>> {
    let Some(data) = data else {
        return Ok(Vec::new());
    };
    let digits = data
        .strip_prefix("0x")
        .or_else(|| data.strip_prefix("0X"))
        .unwrap_or(data);
    hex::decode(digits).with_context(|| format!("data '{data}' is not hex"))
}
