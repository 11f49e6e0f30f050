use portscope::{
    error::TerminationError,
    terminate::{ProcessTerminator, TerminationGateway, TerminationOutcome},
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

enum Behaviour {
    Gone,
    Denied,
    Exits,
    Lingers,
    Broken,
}

struct FakeTerminator {
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
}

impl FakeTerminator {
    fn new(behaviour: Behaviour) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                behaviour,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl ProcessTerminator for FakeTerminator {
    fn send_terminate(&self, _pid: u32) -> Result<(), TerminationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Gone => Err(TerminationError::NotFound),
            Behaviour::Denied => Err(TerminationError::PermissionDenied),
            Behaviour::Broken => Err(TerminationError::Os(std::io::Error::other("boom"))),
            Behaviour::Exits | Behaviour::Lingers => Ok(()),
        }
    }

    fn wait_exit(&self, _pid: u32, _grace: Duration) -> bool {
        matches!(self.behaviour, Behaviour::Exits)
    }
}

fn gateway(behaviour: Behaviour) -> (TerminationGateway, Arc<AtomicUsize>) {
    let (fake, calls) = FakeTerminator::new(behaviour);
    (TerminationGateway::new(fake, Duration::from_millis(10)), calls)
}

#[test]
fn missing_process_is_success() {
    let (g, _) = gateway(Behaviour::Gone);
    let r = g.terminate(4242);
    assert_eq!(r.outcome, TerminationOutcome::NotFound);
    assert!(r.is_success());
}

#[test]
fn permission_denied_is_reported() {
    let (g, calls) = gateway(Behaviour::Denied);
    let r = g.terminate(4242);
    assert_eq!(r.outcome, TerminationOutcome::PermissionDenied);
    assert!(!r.is_success());
    assert!(r.describe().contains("permission denied"));
    assert_eq!(calls.load(Ordering::SeqCst), 1, "never retried");
}

#[test]
fn exit_within_grace_vs_still_running() {
    let (g, _) = gateway(Behaviour::Exits);
    assert_eq!(g.terminate(4242).outcome, TerminationOutcome::Exited);

    let (g, _) = gateway(Behaviour::Lingers);
    let r = g.terminate(4242);
    assert_eq!(r.outcome, TerminationOutcome::Signalled);
    assert!(r.is_success());
}

#[test]
fn other_os_errors_carry_the_reason() {
    let (g, _) = gateway(Behaviour::Broken);
    match g.terminate(4242).outcome {
        TerminationOutcome::Failed(reason) => assert!(reason.contains("boom")),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn pid_zero_and_self_are_refused_without_os_call() {
    let (g, calls) = gateway(Behaviour::Exits);
    assert!(matches!(g.terminate(0).outcome, TerminationOutcome::Failed(_)));
    assert!(matches!(
        g.terminate(std::process::id()).outcome,
        TerminationOutcome::Failed(_)
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[cfg(unix)]
#[test]
fn system_terminate_of_absent_pid_is_not_found() {
    let g = TerminationGateway::system(&Default::default());
    let r = g.terminate(i32::MAX as u32);
    assert_eq!(r.outcome, TerminationOutcome::NotFound);
    assert!(r.is_success());
}

#[cfg(unix)]
#[test]
fn system_refuses_pids_outside_pid_t() {
    let g = TerminationGateway::system(&Default::default());
    let r = g.terminate(u32::MAX);
    assert!(matches!(r.outcome, TerminationOutcome::Failed(_)));
}

#[cfg(unix)]
#[test]
fn system_terminates_a_child() {
    let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
    let pid = child.id();
    // Reap concurrently so the exited child does not linger as a zombie
    let reaper = std::thread::spawn(move || child.wait());

    let g = TerminationGateway::new(
        portscope::terminate::SystemTerminator,
        Duration::from_secs(3),
    );
    let r = g.terminate(pid);
    assert!(r.is_success(), "{:?}", r);
    assert!(reaper.join().unwrap().is_ok());
}

#[cfg(target_os = "linux")]
#[test]
fn system_wait_treats_unreaped_child_as_exited() {
    use portscope::terminate::SystemTerminator;
    use std::time::Instant;

    // Exits at once and stays a zombie until waited on below
    let mut child = std::process::Command::new("true").spawn().unwrap();
    let started = Instant::now();
    assert!(SystemTerminator.wait_exit(child.id(), Duration::from_secs(10)));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(child.wait().unwrap().success());
}
