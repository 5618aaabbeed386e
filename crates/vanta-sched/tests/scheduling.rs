//! End-to-end scheduling tests.

use serde_json::json;
use vanta_ir::{Block, ClbitId, Instruction, QubitId, StandardGate};
use vanta_sched::{
    HeuristicKind, ResourceFactory, ResourceManager, SchedError, SchedulerOptions, build_ddg,
    schedule_alap, schedule_asap,
};

fn options() -> SchedulerOptions {
    SchedulerOptions::default()
}

#[test]
fn chain_with_durations() {
    // Three dependent operations on one qubit with durations 2, 3, 1;
    // each must wait for the previous one to finish.
    let mut block = Block::with_size("chain", 1, 0);
    block
        .push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)).with_duration(2))
        .unwrap();
    block
        .push(Instruction::single_qubit_gate(StandardGate::I, QubitId(0)).with_duration(3))
        .unwrap();
    block
        .push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)).with_duration(1))
        .unwrap();

    let schedule = schedule_asap(&block, None, &options()).unwrap();
    assert_eq!(schedule.cycles(), &[0, 2, 5]);
    assert_eq!(schedule.length(), 6);
}

#[test]
fn commuting_rotations_share_a_cycle() {
    // Two Rz rotations on the same qubit commute and start together;
    // the Hadamard waits for both.
    let mut block = Block::with_size("rz", 1, 0);
    block.rz(0.25, QubitId(0)).unwrap();
    block.rz(0.5, QubitId(0)).unwrap();
    block.h(QubitId(0)).unwrap();

    let schedule = schedule_asap(&block, None, &options()).unwrap();
    assert_eq!(schedule.cycles(), &[0, 0, 1]);
    assert_eq!(schedule.length(), 2);

    // Without single-qubit commutation they serialize.
    let opts = SchedulerOptions {
        commute_single_qubit: false,
        ..options()
    };
    let schedule = schedule_asap(&block, None, &opts).unwrap();
    assert_eq!(schedule.cycles(), &[0, 1, 2]);
}

#[test]
fn independent_gates_run_in_parallel() {
    let mut block = Block::with_size("par", 3, 0);
    block.h(QubitId(0)).unwrap();
    block.h(QubitId(1)).unwrap();
    block.h(QubitId(2)).unwrap();

    let schedule = schedule_asap(&block, None, &options()).unwrap();
    assert_eq!(schedule.cycles(), &[0, 0, 0]);
    assert_eq!(schedule.length(), 1);
    assert_eq!(schedule.bundles(), vec![(0, vec![0, 1, 2])]);
}

#[test]
fn single_slot_instrument_serializes() {
    // Four independent gates, but only one can run at a time.
    let mut block = Block::with_size("serial", 4, 0);
    for q in 0..4 {
        block.h(QubitId(q)).unwrap();
    }
    let mut resources = ResourceManager::default();
    resources
        .add_resource("instrument", Some("shared"), json!({ "count": 1 }))
        .unwrap();

    let schedule = schedule_asap(&block, Some(&resources), &options()).unwrap();
    assert_eq!(schedule.cycles(), &[0, 1, 2, 3]);
    assert_eq!(schedule.length(), 4);
}

#[test]
fn alap_delays_independent_work() {
    // Three Hadamards on q0 form the critical path; the X on q1 is
    // only needed right before the final CZ. ASAP starts it at 0, ALAP
    // pushes it to cycle 2.
    let mut block = Block::with_size("alap", 2, 0);
    block.h(QubitId(0)).unwrap();
    block.h(QubitId(0)).unwrap();
    block.h(QubitId(0)).unwrap();
    block.x(QubitId(1)).unwrap();
    block.cz(QubitId(0), QubitId(1)).unwrap();

    let asap = schedule_asap(&block, None, &options()).unwrap();
    assert_eq!(asap.cycles(), &[0, 1, 2, 0, 3]);
    assert_eq!(asap.length(), 4);

    let alap = schedule_alap(&block, None, &options()).unwrap();
    assert_eq!(alap.cycles(), &[0, 1, 2, 2, 3]);
    assert_eq!(alap.length(), 4);
}

#[test]
fn qubit_resource_matches_dependencies() {
    // With a qubit occupancy resource the result is the same as with
    // dependencies alone for a simple circuit.
    let mut block = Block::with_size("bell", 2, 2);
    block.h(QubitId(0)).unwrap();
    block.cx(QubitId(0), QubitId(1)).unwrap();
    block.measure(QubitId(0), ClbitId(0)).unwrap();
    block.measure(QubitId(1), ClbitId(1)).unwrap();

    let mut resources = ResourceManager::default();
    resources
        .add_resource("qubit", None, json!({ "num_qubits": 2 }))
        .unwrap();

    let unconstrained = schedule_asap(&block, None, &options()).unwrap();
    let constrained = schedule_asap(&block, Some(&resources), &options()).unwrap();
    assert_eq!(unconstrained, constrained);
    assert_eq!(constrained.cycles(), &[0, 1, 2, 2]);
}

#[test]
fn measurement_unit_limits_parallel_readout() {
    // Two-slot readout for three simultaneous measurements; gates are
    // unaffected by the instrument.
    let mut block = Block::with_size("readout", 3, 3);
    block.h(QubitId(0)).unwrap();
    for q in 0..3 {
        block
            .push(Instruction::measure(QubitId(q), ClbitId(q)).with_duration(2))
            .unwrap();
    }
    let mut resources = ResourceManager::default();
    resources
        .add_resource(
            "instrument",
            Some("readout"),
            json!({ "count": 2, "instructions": ["measure"] }),
        )
        .unwrap();

    let schedule = schedule_asap(&block, Some(&resources), &options()).unwrap();
    // q1 and q2 measure immediately, q0 first waits for its Hadamard;
    // it can start at cycle 2 when the first slot frees up.
    assert_eq!(schedule.cycle(0), Some(0));
    let mut starts = vec![
        schedule.cycle(1).unwrap(),
        schedule.cycle(2).unwrap(),
        schedule.cycle(3).unwrap(),
    ];
    starts.sort_unstable();
    assert_eq!(starts, vec![0, 0, 2]);
}

#[test]
fn alap_under_resource_constraints() {
    let mut block = Block::with_size("serial", 4, 0);
    for q in 0..4 {
        block.h(QubitId(q)).unwrap();
    }
    let mut resources = ResourceManager::default();
    resources
        .add_resource("instrument", Some("shared"), json!({ "count": 1 }))
        .unwrap();

    let schedule = schedule_alap(&block, Some(&resources), &options()).unwrap();
    assert_eq!(schedule.cycles(), &[0, 1, 2, 3]);
    assert_eq!(schedule.length(), 4);
}

#[test]
fn scheduling_is_deterministic() {
    let mut block = Block::with_size("det", 3, 1);
    block.h(QubitId(0)).unwrap();
    block.cx(QubitId(0), QubitId(1)).unwrap();
    block.rz(0.1, QubitId(2)).unwrap();
    block.cz(QubitId(1), QubitId(2)).unwrap();
    block.measure(QubitId(0), ClbitId(0)).unwrap();

    let first = schedule_asap(&block, None, &options()).unwrap();
    let second = schedule_asap(&block, None, &options()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn trivial_heuristic_keeps_program_order() {
    let mut block = Block::with_size("order", 2, 0);
    block.h(QubitId(1)).unwrap();
    block.h(QubitId(0)).unwrap();
    let opts = SchedulerOptions {
        heuristic: HeuristicKind::Trivial,
        ..options()
    };
    let schedule = schedule_asap(&block, None, &opts).unwrap();
    assert_eq!(schedule.bundles(), vec![(0, vec![0, 1])]);
}

#[test]
fn barrier_separates_cycles() {
    let mut block = Block::with_size("bar", 2, 0);
    block.h(QubitId(0)).unwrap();
    block.barrier([]).unwrap();
    block.h(QubitId(1)).unwrap();

    let schedule = schedule_asap(&block, None, &options()).unwrap();
    // The barrier itself takes no time but orders the gates.
    assert_eq!(schedule.cycles(), &[0, 1, 1]);
    assert_eq!(schedule.length(), 2);
}

#[test]
fn empty_block_schedules_to_nothing() {
    let block = Block::with_size("empty", 2, 0);
    let schedule = schedule_asap(&block, None, &options()).unwrap();
    assert!(schedule.cycles().is_empty());
    assert_eq!(schedule.length(), 0);

    let schedule = schedule_alap(&block, None, &options()).unwrap();
    assert_eq!(schedule.length(), 0);
}

#[test]
fn blocked_resources_report_infeasible() {
    use vanta_sched::{GateRequest, Resource};

    // A resource that never accepts Hadamards.
    #[derive(Debug, Clone)]
    struct NoHadamards;

    impl Resource for NoHadamards {
        fn gate(&mut self, _cycle: i64, request: &GateRequest<'_>, _commit: bool) -> bool {
            request.name != "h"
        }

        fn clone_box(&self) -> Box<dyn Resource> {
            Box::new(self.clone())
        }
    }

    let mut factory = ResourceFactory::default();
    factory.register("no-h", |_context| Ok(Box::new(NoHadamards) as _));
    let mut resources = ResourceManager::new(factory);
    resources.add_resource("no-h", None, json!({})).unwrap();

    let mut block = Block::with_size("stuck", 1, 0);
    block.h(QubitId(0)).unwrap();

    let opts = SchedulerOptions {
        max_resource_wait: 10,
        ..options()
    };
    let err = schedule_asap(&block, Some(&resources), &opts).unwrap_err();
    match err {
        SchedError::Infeasible { name, waited, .. } => {
            assert_eq!(name, "h");
            assert_eq!(waited, 11);
        }
        other => panic!("expected Infeasible, got {other}"),
    }
}

#[test]
fn ddg_is_consistent_for_mixed_blocks() {
    let mut block = Block::with_size("mixed", 3, 2);
    block.h(QubitId(0)).unwrap();
    block.cx(QubitId(0), QubitId(1)).unwrap();
    block.barrier([QubitId(1), QubitId(2)]).unwrap();
    block.measure(QubitId(1), ClbitId(0)).unwrap();
    block
        .push(
            Instruction::single_qubit_gate(StandardGate::X, QubitId(2))
                .with_condition([ClbitId(0)]),
        )
        .unwrap();
    block.reset(QubitId(0)).unwrap();

    let mut ddg = build_ddg(&block, true, true);
    ddg.check_consistency().unwrap();
    ddg.reverse();
    ddg.check_consistency().unwrap();
    ddg.add_remaining();
    ddg.reverse();
    ddg.check_consistency().unwrap();
}
