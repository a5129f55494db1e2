use outbreak::{
    DaySnapshot, EpidemicEngine, HealthStatus, OverflowPolicy, Parameters, RunSummary,
    SimulationClock, StopReason,
};
use std::collections::HashMap;

fn run(parameters: Parameters, seed: u64) -> (RunSummary, Vec<DaySnapshot>, SimulationClock) {
    let engine = EpidemicEngine::new(parameters, seed).unwrap();
    let mut clock = SimulationClock::new(engine);
    let mut snapshots = Vec::new();
    let summary = clock
        .run(|snapshot| {
            snapshots.push(snapshot.clone());
            Ok(())
        })
        .unwrap();
    (summary, snapshots, clock)
}

#[test]
fn counters_are_monotone_and_reconcile() {
    let (summary, snapshots, _) = run(Parameters::covid19(), 1);
    assert_eq!(summary.stop_reason, StopReason::Settled);

    for pair in snapshots.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        assert_eq!(after.day, before.day + 1);
        assert!(after.counters.total_ever_infected >= before.counters.total_ever_infected);
        assert!(after.counters.recovered >= before.counters.recovered);
        assert!(after.counters.dead >= before.counters.dead);
        assert!(after.exposed_count >= before.exposed_count);
    }
    for snapshot in &snapshots {
        assert!(snapshot.counters.reconciles());
        assert!(snapshot.counters.total_ever_infected <= snapshot.exposed_count);
        assert!(snapshot.exposed_count <= 4500);
    }
}

#[test]
fn daily_deltas_add_up_to_counters() {
    let (summary, snapshots, _) = run(Parameters::covid19(), 2);
    let infected: usize = snapshots.iter().map(|s| s.newly_infected.len()).sum();
    let recovered: usize = snapshots.iter().map(|s| s.recovered_today.len()).sum();
    let died: usize = snapshots.iter().map(|s| s.died_today.len()).sum();
    assert_eq!(infected, summary.counters.total_ever_infected);
    assert_eq!(recovered, summary.counters.recovered);
    assert_eq!(died, summary.counters.dead);
}

#[test]
fn every_infection_ends_in_exactly_one_terminal_event() {
    let (summary, snapshots, clock) = run(Parameters::covid19(), 3);

    let mut infected_on = HashMap::new();
    let mut resolved_on = HashMap::new();
    for snapshot in &snapshots {
        for point in &snapshot.newly_infected {
            assert!(
                infected_on.insert(point.index, snapshot.day).is_none(),
                "person {} infected twice",
                point.index
            );
            let position = clock.engine().layout().position(point.index);
            assert_eq!((point.theta, point.r), (position.theta, position.r));
        }
        for &person in snapshot.recovered_today.iter().chain(&snapshot.died_today) {
            assert!(
                resolved_on.insert(person, snapshot.day).is_none(),
                "person {person} resolved twice"
            );
        }
    }

    assert_eq!(infected_on.len(), resolved_on.len());
    let mild_min = Parameters::covid19().mild_window().min;
    let earliest = mild_min.min(Parameters::covid19().severe_death_window().min);
    for (person, resolved) in &resolved_on {
        let infected = infected_on[person];
        assert!(resolved - infected >= earliest);
    }

    let engine = clock.engine();
    assert_eq!(
        engine.count_status(HealthStatus::Recovered),
        summary.counters.recovered
    );
    assert_eq!(engine.count_status(HealthStatus::Dead), summary.counters.dead);
    for status in [
        HealthStatus::Infected,
        HealthStatus::Mild,
        HealthStatus::SevereRecovering,
        HealthStatus::SevereDying,
    ] {
        assert_eq!(engine.count_status(status), 0);
    }
}

#[test]
fn same_seed_reproduces_run() {
    let (first_summary, first, _) = run(Parameters::covid19(), 99);
    let (second_summary, second, _) = run(Parameters::covid19(), 99);
    assert_eq!(first_summary, second_summary);
    assert_eq!(first, second);

    let (_, other, _) = run(Parameters::covid19(), 100);
    assert_ne!(first, other);
}

#[test]
fn clamped_horizon_keeps_events_inside() {
    let parameters = Parameters {
        horizon_days: Some(40),
        schedule_overflow: OverflowPolicy::Clamp,
        ..Parameters::covid19()
    };
    let (summary, snapshots, _) = run(parameters, 5);
    assert_eq!(summary.stop_reason, StopReason::Horizon);
    assert_eq!(summary.days_simulated, 40);
    assert_eq!(snapshots.last().map(|s| s.day), Some(39));
    // Nothing is left infected once the last schedulable day has been resolved.
    assert_eq!(summary.counters.currently_infected, 0);
}

#[test]
fn small_population_saturates() {
    let parameters = Parameters {
        population_size: 50,
        r0: 4.0,
        ..Parameters::covid19()
    };
    let (summary, _, clock) = run(parameters, 8);
    assert_eq!(summary.stop_reason, StopReason::Settled);
    assert_eq!(summary.exposed_count, 50);
    assert!(clock.engine().is_pool_exhausted());
    assert!(summary.counters.total_ever_infected <= 50);
}
