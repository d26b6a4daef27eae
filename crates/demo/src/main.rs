//! Runs the three labs end-to-end against one sandbox while an admin SOC
//! feed tails the security event log.
//!
//! Lab results go to stdout as JSON lines; the SOC feed prints each event it
//! sees with a `soc` tag. Diagnostics go through `tracing` (see
//! `soclab-observability`).

mod scenarios;

use anyhow::Context;

use soclab_auth::Role;
use soclab_core::PrincipalId;
use soclab_infra::{FeedWorker, Sandbox, SandboxConfig};

fn main() -> anyhow::Result<()> {
    soclab_observability::init();

    let config = SandboxConfig::from_env().context("invalid sandbox configuration")?;
    let sandbox = Sandbox::new(config);

    let admin = PrincipalId::new("soc-admin")?;
    sandbox.register_user(admin.clone(), Role::Admin);

    let feed = sandbox.soc_feed(admin, 0).context("opening the SOC feed")?;
    let tail = FeedWorker::spawn("soc-tail", feed, |event| {
        serde_json::to_string(&event).map(|line| println!("soc {line}"))
    })
    .context("spawning the SOC feed worker")?;

    scenarios::brute_force(&sandbox)?;
    scenarios::idor(&sandbox)?;
    scenarios::stored_xss(&sandbox)?;

    let streamed = tail.shutdown();
    let stored = sandbox.log().len()?;
    tracing::info!(streamed, stored, "demo finished");

    scenarios::emit("attempt_state", &sandbox.limiter().snapshot())?;
    Ok(())
}
