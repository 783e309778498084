//! Loom models for the allocator lock
//!
//! Explores every interleaving of concurrent `Banker` calls and checks that
//! each one leaves a safe state that conserves units.
//!
//! ```bash
//! cargo test --package banker --features loom -- --test-threads=1 loom
//! ```

#[cfg(all(test, feature = "loom"))]
mod tests {
    use banker_core::{check_conservation, Decision, ProcessId, SystemState};
    use loom::sync::Arc;
    use loom::thread;

    use crate::{Banker, BankerConfig};

    /// Two processes competing for three units; each may eventually hold two.
    fn contested() -> SystemState {
        SystemState::new(2, 1, vec![vec![0], vec![0]], vec![vec![2], vec![2]], vec![3]).unwrap()
    }

    fn banker() -> Arc<Banker> {
        Arc::new(Banker::with_config(
            contested(),
            BankerConfig {
                check_invariants: true,
                ..BankerConfig::default()
            },
        ))
    }

    #[test]
    fn loom_concurrent_requests_grant_exactly_one() {
        loom::model(|| {
            let banker = banker();

            let handles: Vec<_> = (0..2)
                .map(|i| {
                    let banker = banker.clone();
                    thread::spawn(move || banker.request(ProcessId(i), &[2]).unwrap())
                })
                .collect();

            let decisions: Vec<Decision> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let grants = decisions.iter().filter(|d| d.is_grant()).count();
            assert_eq!(grants, 1);
            assert!(decisions
                .iter()
                .any(|d| matches!(d, Decision::Wait(_))));

            let state = banker.snapshot();
            assert_eq!(state.available(), &[1]);
            assert!(check_conservation(&contested(), &state).is_empty());
            assert!(banker.safety().safe);
            assert_eq!(banker.version(), 1);
        });
    }

    #[test]
    fn loom_request_and_release_interleave() {
        loom::model(|| {
            let start = contested()
                .with_tentative_grant(ProcessId(0), &[1])
                .unwrap();
            let banker = Arc::new(Banker::new(start.clone()));

            let releaser = {
                let banker = banker.clone();
                thread::spawn(move || banker.release(ProcessId(0), &[1]).unwrap())
            };
            let requester = {
                let banker = banker.clone();
                thread::spawn(move || banker.request(ProcessId(1), &[2]).unwrap())
            };

            releaser.join().unwrap();
            let decision = requester.join().unwrap();
            assert!(decision.is_grant());

            let state = banker.snapshot();
            assert!(check_conservation(&start, &state).is_empty());
            assert_eq!(state.available(), &[1]);
            assert!(banker.verify_integrity());
        });
    }
}
