use serde::Serialize;

use soclab_auth::Role;
use soclab_core::{EnforcementMode, PrincipalId, ResourceId, SystemClock};
use soclab_infra::{DEMO_IDENTITY, Sandbox};
use soclab_labs::Audited;

const GUESSES: [&str; 6] = ["123456", "password", "qwerty", "letmein", "admin", "Secret123"];
const XSS_PAYLOAD: &str = "<img src=x onerror=\"alert('xss')\">";

/// Print one JSON line for a lab step.
pub fn emit<T: Serialize>(step: &str, detail: &T) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct Wrapped<'a, D> {
        step: &'a str,
        detail: &'a D,
    }

    println!("{}", serde_json::to_string(&Wrapped { step, detail })?);
    Ok(())
}

/// Print a lab decision together with the id of the event that recorded it.
fn emit_audited<T: Serialize>(step: &str, result: &Audited<T>) -> anyhow::Result<()> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct WithEvent<'a, D> {
        step: &'a str,
        event_id: Option<u64>,
        detail: &'a D,
    }

    let event_id = match result.audit() {
        Ok(id) => Some(id.get()),
        Err(err) => {
            tracing::warn!(step, error = %err, "lab step was not recorded");
            None
        }
    };
    let line = WithEvent {
        step,
        event_id,
        detail: result.value(),
    };
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

/// Guess the demo identity's secret in both modes, then try the real one.
pub fn brute_force(sandbox: &Sandbox<SystemClock>) -> anyhow::Result<()> {
    let secret = sandbox.config().demo_secret.clone();

    for mode in [EnforcementMode::Permissive, EnforcementMode::Enforced] {
        for guess in GUESSES {
            let decision = sandbox.limiter().evaluate(DEMO_IDENTITY, guess, mode);
            emit_audited(&format!("brute_force.{mode}.guess"), &decision)?;
        }
        let decision = sandbox.limiter().evaluate(DEMO_IDENTITY, &secret, mode);
        emit_audited(&format!("brute_force.{mode}.real_secret"), &decision)?;
    }
    Ok(())
}

/// Alice asks for Bob's profile by id, and for one that does not exist.
pub fn idor(sandbox: &Sandbox<SystemClock>) -> anyhow::Result<()> {
    let alice = PrincipalId::new("alice")?;
    let bob = PrincipalId::new("bob")?;
    sandbox.register_user(alice.clone(), Role::User);
    let bobs_profile = sandbox.register_user(bob, Role::User);
    let missing = ResourceId::new("profile-does-not-exist")?;

    for mode in [EnforcementMode::Permissive, EnforcementMode::Enforced] {
        let decision = sandbox.access().decide_by_id(&alice, &bobs_profile, mode);
        emit_audited(&format!("idor.{mode}.other_profile"), &decision)?;
    }
    let decision = sandbox
        .access()
        .decide_by_id(&alice, &missing, EnforcementMode::Enforced);
    emit_audited("idor.missing_profile", &decision)?;
    Ok(())
}

/// Post the same script payload raw and escaped.
pub fn stored_xss(sandbox: &Sandbox<SystemClock>) -> anyhow::Result<()> {
    let alice = PrincipalId::new("alice")?;

    for mode in [EnforcementMode::Permissive, EnforcementMode::Enforced] {
        if let Some(comment) = sandbox.comments().post(Some(&alice), XSS_PAYLOAD, mode) {
            emit_audited(&format!("stored_xss.{mode}.post"), &comment)?;
        }
    }
    emit("stored_xss.board", &sandbox.comments().list())?;
    Ok(())
}
