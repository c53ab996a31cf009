//! Generator Unit Tests.
//!
//! Verifies that every strategy stays within its bounds, that generated
//! programs are valid on the reference model, and the deepening order.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use rvdiff_core::common::HarnessError;
use rvdiff_core::config::MemoryConfig;
use rvdiff_core::isa::abi::parse_register;
use rvdiff_core::program::{AddressSet, Bounds, InstructionSequence};
use rvdiff_core::search::instr::{Instr, MAX_GEN_REG, sequence_of};
use rvdiff_core::search::{
    DataWindow, Deepening, PropertySearch, RandomSearch, SearchStrategy, sequence_strategy,
};
use rvdiff_core::sim::TrialVerdict;

fn window() -> DataWindow {
    DataWindow::from_memory(&MemoryConfig::default())
}

fn bounds(min: usize, max: usize, max_registers: usize) -> Bounds {
    Bounds {
        min_instructions: min,
        max_instructions: max,
        min_registers: 1,
        max_registers,
    }
}

fn registers_of(seq: &InstructionSequence) -> BTreeSet<usize> {
    seq.lines()
        .iter()
        .flat_map(|line| line.split(|c: char| c.is_whitespace() || matches!(c, ',' | '(' | ')')))
        .filter(|token| token.starts_with('x'))
        .filter_map(parse_register)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sequences_respect_bounds((seq, addrs) in sequence_strategy(bounds(3, 12, 4), window())) {
        prop_assert!((3..=12).contains(&seq.len()));
        let regs = registers_of(&seq);
        let generated: BTreeSet<_> = regs.iter().copied().filter(|&r| r != 0).collect();
        prop_assert!(generated.len() <= 4, "{:?}", generated);
        prop_assert!(regs.iter().all(|&r| r <= MAX_GEN_REG));
        prop_assert!(addrs.iter().all(|a| window().contains(a, 1)));
    }
}

#[test]
fn instructions_render_as_assembler_text() {
    let instrs = [
        Instr::Reg {
            op: "mulhu",
            rd: 1,
            rs1: 2,
            rs2: 3,
        },
        Instr::Imm {
            op: "addi",
            rd: 4,
            rs1: 4,
            imm: -5,
        },
        Instr::Lui { rd: 5, imm: 0x80000 },
        Instr::Load {
            op: "lh",
            rd: 6,
            offset: 6,
            size: 2,
        },
        Instr::Store {
            op: "sw",
            rs2: 7,
            offset: 8,
            size: 4,
        },
    ];
    let (seq, addrs) = sequence_of(&instrs);
    assert_eq!(
        seq.lines(),
        [
            "mulhu x1, x2, x3",
            "addi x4, x4, -5",
            "lui x5, 0x80000",
            "lh x6, 6(x0)",
            "sw x7, 8(x0)",
        ]
    );
    assert_eq!(addrs.iter().collect::<Vec<_>>(), vec![6, 7, 8, 9, 10, 11]);
}

#[test]
fn seeded_random_search_is_reproducible() {
    let a: Vec<_> = RandomSearch::new(bounds(2, 10, 8), window(), Some(7)).take(5).collect();
    let b: Vec<_> = RandomSearch::new(bounds(2, 10, 8), window(), Some(7)).take(5).collect();
    assert_eq!(a, b);
    assert!(a.iter().any(|(seq, _)| seq != &a[0].0));
}

#[test]
fn deepening_enumerates_shortest_first() {
    let mut search = Deepening::new(bounds(1, 2, 4), window());
    let breadth = search.breadth();
    assert!(breadth > 30);

    let depth_one: Vec<_> = search.by_ref().take(breadth).collect();
    assert!(depth_one.iter().all(|(seq, _)| seq.len() == 1));
    assert_eq!(depth_one[0].0.lines(), ["lui x1, 0x1"]);
    assert_eq!(search.depth(), 2);

    let rest: Vec<_> = search.by_ref().collect();
    assert_eq!(rest.len(), breadth * breadth);
    assert!(rest.iter().all(|(seq, _)| seq.len() == 2));
    assert_eq!(search.next(), None);
}

#[test]
fn deepening_chains_registers() {
    let (seq, _) = Deepening::new(bounds(3, 3, 4), window())
        .find(|(seq, _)| seq.lines().iter().all(|l| l.starts_with("add ")))
        .unwrap();
    assert_eq!(seq.lines(), ["add x1, x0, x0", "add x2, x1, x1", "add x3, x2, x1"]);
}

#[test]
fn deepening_restarts_from_the_beginning() {
    let mut search = Deepening::new(bounds(1, 1, 4), window());
    let first: Vec<_> = search.by_ref().collect();
    assert_eq!(search.next(), None);

    search.restart();
    let again: Vec<_> = search.collect();
    assert_eq!(first, again);
}

#[test]
fn deepening_memory_steps_stay_in_the_window() {
    let all: Vec<_> = Deepening::new(bounds(1, 1, 4), window()).collect();
    let touched: AddressSet = all.iter().flat_map(|(_, a)| a.iter()).collect();
    assert!(!touched.is_empty());
    assert!(touched.iter().all(|a| window().contains(a, 1)));
}

#[test]
fn property_search_shrinks_to_a_minimal_failure() {
    let search = PropertySearch::new(bounds(1, 20, 8), window(), 256, Some(3));
    let outcome = search
        .run(|seq, _| {
            let has_mul = seq.lines().iter().any(|l| l.starts_with("mul"));
            Ok(if has_mul {
                TrialVerdict::Timeout { cycles: 1 }
            } else {
                TrialVerdict::Pass
            })
        })
        .unwrap();

    let first = outcome.first_failure.unwrap();
    assert!(first <= outcome.invocations);
    let minimal = outcome.minimal.unwrap();
    assert_eq!(minimal.sequence.len(), 1);
    assert!(minimal.sequence.lines()[0].starts_with("mul"));
    assert_eq!(minimal.verdict, TrialVerdict::Timeout { cycles: 1 });
}

#[test]
fn property_search_without_failures_runs_every_case() {
    let search = PropertySearch::new(bounds(1, 4, 4), window(), 32, Some(1));
    let outcome = search.run(|_, _| Ok(TrialVerdict::Pass)).unwrap();
    assert_eq!(outcome.invocations, 32);
    assert_eq!(outcome.first_failure, None);
    assert_eq!(outcome.minimal, None);
    assert!(outcome.last.is_some());
}

#[test]
fn property_search_propagates_hard_errors() {
    let search = PropertySearch::new(bounds(1, 4, 4), window(), 32, Some(1));
    let mut calls = 0;
    let result = search.run(|_, _| {
        calls += 1;
        Err(HarnessError::ProtocolViolation {
            addr: 0x3000_0000,
            cycle: 9,
        })
    });
    assert!(matches!(
        result,
        Err(HarnessError::ProtocolViolation { addr: 0x3000_0000, cycle: 9 })
    ));
    assert_eq!(calls, 1);
}

#[rstest]
#[case(SearchStrategy::CompleteRandom, "complete_random", "CRT")]
#[case(SearchStrategy::IterativeDeepening, "iterative_deepening", "IDT")]
#[case(SearchStrategy::PropertyBased, "property_based", "PBT")]
fn strategy_names(#[case] strategy: SearchStrategy, #[case] name: &str, #[case] tag: &str) {
    assert_eq!(strategy.name(), name);
    assert_eq!(strategy.tag(), tag);
    assert_eq!(name.parse::<SearchStrategy>(), Ok(strategy));
}
