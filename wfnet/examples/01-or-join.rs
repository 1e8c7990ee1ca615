//! Runs a small order process with an OR-split/OR-join pair and a cancellation region.
//!
//!   i ─► receive ─(OR)─► pay ──────────► paid ───┐
//!                  └───► pack ─► packed ─► ship ─┴─(OR)─► archive ─► o
//!
//! The router ships only some orders, the OR-join has to figure out on its own whether it should
//! wait for the shipping branch.
use std::sync::Arc;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wfnet::{
    error::{Result as WorkflowResult, WorkflowError},
    net::{JoinType, NetDefinitionBuilder, Place, SplitType, Transition},
    runner::{self, CaseState, Engine, FixedRouter, RouterRegistry, RunnerConfigBuilder},
};

#[tracing::instrument(level = "info")]
async fn run() -> WorkflowResult<()> {
    let shutdown_token = CancellationToken::new();
    let shutdown_token_clone = shutdown_token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Shutting down. Ctrl+C pressed (or corresponding signal sent).");
            shutdown_token_clone.cancel();
        }
    });

    let mut net = NetDefinitionBuilder::default();
    net.insert_place(Place::source("i"));
    for place in ["to-pay", "to-pack", "paid", "packed", "shipped"] {
        net.insert_place(Place::internal(place));
    }
    net.insert_place(Place::sink("o"));
    net.insert_transition(Transition::new("receive", JoinType::Xor, SplitType::Or));
    net.insert_transition(Transition::new("pay", JoinType::Xor, SplitType::And));
    net.insert_transition(Transition::new("pack", JoinType::Xor, SplitType::And));
    net.insert_transition(Transition::new("ship", JoinType::Xor, SplitType::And));
    net.insert_transition(Transition::new("archive", JoinType::Or, SplitType::And));
    net.flow_in("i", "receive")?;
    net.flow_out("receive", "to-pay")?;
    net.flow_out("receive", "to-pack")?;
    net.flow_in("to-pay", "pay")?;
    net.flow_out("pay", "paid")?;
    net.flow_in("to-pack", "pack")?;
    net.flow_out("pack", "packed")?;
    net.flow_in("packed", "ship")?;
    net.flow_out("ship", "shipped")?;
    net.flow_in("paid", "archive")?;
    net.flow_in("shipped", "archive")?;
    net.flow_out("archive", "o")?;
    // archiving withdraws anything still waiting to be packed
    net.insert_cancellation("archive", "to-pack")?;
    let net = Arc::new(net.build()?);

    let config = RunnerConfigBuilder::default().max_steps(100).build()?;
    let engine = Arc::new(Engine::new(config));
    let mut cases = Vec::new();
    for _ in 0..4 {
        cases.push(engine.launch_case(Arc::clone(&net)).await);
    }

    // odd cases are digital goods: nothing to pack
    for &case_id in cases.iter().filter(|c| c.0 % 2 == 1) {
        let receive = net
            .transition_id("receive")
            .ok_or_else(|| WorkflowError::NotFound("transition 'receive'".into()))?;
        let selection = wfnet::exec::OutputSelection::by_names(&net, &["to-pay"])?;
        engine.fire(case_id, receive, &selection).await?;
    }

    let mut routers = RouterRegistry::new();
    routers.register("receive", FixedRouter::new(["to-pay", "to-pack"]));
    let outcomes = runner::run(Arc::clone(&engine), cases, Arc::new(routers), shutdown_token).await?;
    for outcome in outcomes {
        match outcome.state {
            CaseState::Completed => info!(case = %outcome.case, steps = outcome.steps, "Done."),
            state => warn!(case = %outcome.case, ?state, stranded = ?outcome.stranded, "Not done."),
        }
    }

    info!("Bye.");
    Ok(())
}

#[tokio::main]
async fn main() -> WorkflowResult<()> {
    tracing_subscriber::fmt()
        .with_span_events(
            tracing_subscriber::fmt::format::FmtSpan::CLOSE
                | tracing_subscriber::fmt::format::FmtSpan::NEW,
        )
        .compact()
        .with_env_filter(EnvFilter::try_new("info,wfnet=debug").unwrap())
        .init();

    run().await
}
