//! End-to-end exercise of the vocabulary/lattice/N-best/constraint stack
//! against the canonical transfer-timetable fixture: five
//! stations connected by six candidate trips, each with its own entries
//! and connection costs, whose best and next-best paths are known values.

use viterbi_lattice::{Constraint, Entry, Lattice, NBestIterator, Node, PatternElement, Vocabulary, ANY_STEP};

fn sample_vocabulary() -> Vocabulary<&'static str> {
    let entries = vec![
        (
            b"[HakataTosu][TosuOmuta][OmutaKumamoto]".to_vec(),
            vec![
                Entry::new(b"Hakata-Tosu-Omuta-Kumamoto".to_vec(), "mizuho", 3670),
                Entry::new(b"Hakata-Tosu-Omuta-Kumamoto".to_vec(), "sakura", 2620),
                Entry::new(b"Hakata-Tosu-Omuta-Kumamoto".to_vec(), "tsubame", 2390),
            ],
        ),
        (
            b"[HakataTosu][TosuOmuta]".to_vec(),
            vec![
                Entry::new(b"Hakata-Tosu-Omuta".to_vec(), "ariake", 2150),
                Entry::new(b"Hakata-Tosu-Omuta".to_vec(), "rapid811", 1310),
            ],
        ),
        (
            b"[HakataTosu]".to_vec(),
            vec![
                Entry::new(b"Hakata-Tosu".to_vec(), "kamome", 840),
                Entry::new(b"Hakata-Tosu".to_vec(), "local415", 570),
            ],
        ),
        (b"[TosuOmuta]".to_vec(), vec![Entry::new(b"Tosu-Omuta".to_vec(), "local813", 860)]),
        (
            b"[TosuOmuta][OmutaKumamoto]".to_vec(),
            vec![Entry::new(b"Tosu-Omuta-Kumamoto".to_vec(), "local815", 1680)],
        ),
        (
            b"[OmutaKumamoto]".to_vec(),
            vec![Entry::new(b"Omuta-Kumamoto".to_vec(), "local817", 950)],
        ),
    ];

    let connections = vec![
        ((Vec::new(), b"Hakata-Tosu-Omuta-Kumamoto".to_vec()), 600),
        ((Vec::new(), b"Hakata-Tosu-Omuta".to_vec()), 700),
        ((Vec::new(), b"Hakata-Tosu".to_vec()), 800),
        ((Vec::new(), Vec::new()), 8000),
        ((b"Hakata-Tosu".to_vec(), b"Tosu-Omuta-Kumamoto".to_vec()), 500),
        ((b"Hakata-Tosu".to_vec(), b"Tosu-Omuta".to_vec()), 600),
        ((b"Hakata-Tosu".to_vec(), Vec::new()), 6000),
        ((b"Hakata-Tosu-Omuta".to_vec(), b"Omuta-Kumamoto".to_vec()), 200),
        ((b"Hakata-Tosu-Omuta".to_vec(), Vec::new()), 2000),
        ((b"Tosu-Omuta".to_vec(), b"Omuta-Kumamoto".to_vec()), 300),
        ((b"Tosu-Omuta".to_vec(), Vec::new()), 3000),
        ((b"Hakata-Tosu-Omuta-Kumamoto".to_vec(), Vec::new()), 400),
        ((b"Tosu-Omuta-Kumamoto".to_vec(), Vec::new()), 500),
        ((b"Omuta-Kumamoto".to_vec(), Vec::new()), 600),
    ];

    Vocabulary::new(entries, connections).unwrap()
}

fn built_lattice() -> Lattice<&'static str> {
    let mut lattice = Lattice::new(sample_vocabulary());
    lattice.push_back(b"[HakataTosu]").unwrap();
    lattice.push_back(b"[HakataTosu][TosuOmuta]").unwrap();
    lattice.push_back(b"[HakataTosu][TosuOmuta][OmutaKumamoto]").unwrap();
    lattice.push_back(b"[TosuOmuta]").unwrap();
    lattice.push_back(b"[TosuOmuta][OmutaKumamoto]").unwrap();
    lattice.push_back(b"[OmutaKumamoto]").unwrap();
    lattice
}

#[test]
fn the_best_path_costs_3390() {
    let lattice = built_lattice();
    let (eos, _) = lattice.settle().unwrap();
    assert_eq!(eos.path_cost, 3390);
}

#[test]
fn the_first_nine_paths_have_the_documented_costs_in_order() {
    let lattice = built_lattice();
    let (eos, _) = lattice.settle().unwrap();
    let iter = NBestIterator::new(&lattice, eos, None);

    let costs: Vec<i32> = iter.take(9).map(|r| r.unwrap().last().unwrap().path_cost).collect();
    assert_eq!(costs, vec![3390, 3620, 3760, 4050, 4320, 4600, 4670, 4680, 4950]);
}

#[test]
fn costs_never_decrease_across_the_whole_enumeration() {
    let lattice = built_lattice();
    let (eos, _) = lattice.settle().unwrap();
    let iter = NBestIterator::new(&lattice, eos, None);

    let costs: Vec<i32> = iter.map(|r| r.unwrap().last().unwrap().path_cost).collect();
    assert!(costs.windows(2).all(|w| w[0] <= w[1]));
    assert!(!costs.is_empty());
}

#[test]
fn every_enumerated_path_starts_at_bos_and_ends_at_eos() {
    let lattice = built_lattice();
    let (eos, _) = lattice.settle().unwrap();
    let iter = NBestIterator::new(&lattice, eos, None);

    for path in iter.take(5) {
        let path = path.unwrap();
        assert!(path.first().unwrap().is_bos());
        assert!(path.last().unwrap().is_eos());
    }
}

#[test]
fn a_wildcard_constraint_pinning_tsubame_only_admits_matching_paths() {
    let lattice = built_lattice();
    let (eos, _) = lattice.settle().unwrap();

    let tsubame_pin = Node::pin(b"Hakata-Tosu-Omuta-Kumamoto".to_vec(), Some("tsubame"));
    let constraint = Constraint::new(vec![PatternElement::Wildcard(ANY_STEP), PatternElement::NodePin(tsubame_pin), PatternElement::Wildcard(ANY_STEP)]);

    let iter = NBestIterator::new(&lattice, eos, Some(constraint));
    let mut found_any = false;
    for path in iter.take(20) {
        let path = path.unwrap();
        found_any = true;
        assert!(path.iter().any(|n| n.key == b"Hakata-Tosu-Omuta-Kumamoto" && n.value == Some("tsubame")));
        assert!(!path.iter().any(|n| n.key == b"Hakata-Tosu-Omuta-Kumamoto" && n.value == Some("mizuho")));
        assert!(!path.iter().any(|n| n.key == b"Hakata-Tosu-Omuta-Kumamoto" && n.value == Some("sakura")));
    }
    assert!(found_any);
}

#[test]
fn an_empty_vocabulary_still_settles_to_an_unreachable_eos() {
    let vocabulary: Vocabulary<()> = Vocabulary::new(Vec::new(), Vec::new()).unwrap();
    let mut lattice = Lattice::new(vocabulary);
    assert!(lattice.push_back(b"anything").is_err());

    let (eos, _) = lattice.settle().unwrap();
    assert_eq!(eos.path_cost, viterbi_lattice::UNREACHABLE_COST);
}
