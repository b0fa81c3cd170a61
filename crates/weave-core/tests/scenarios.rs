// SPDX-License-Identifier: Apache-2.0
//! Concrete merge and mutation scenarios, one per documented behavior.

use weave_core::{AtomId, AtomType, Weave};

fn value_at(weave: &Weave<String>, id: AtomId) -> Option<&str> {
    weave.atom_for_id(id).map(|a| a.value.as_str())
}

#[test]
fn init_seeds_start_and_end() {
    let weave: Weave<String> = Weave::new(1);
    assert_eq!(weave.weave().len(), 2);
    assert_eq!(weave.weave()[0].id, AtomId::START);
    assert_eq!(weave.weave()[1].id, AtomId::END);
    assert_eq!(weave.complete_weft().get(0), Some(1));
}

#[test]
fn single_insert_lands_between_start_and_end() {
    let mut weave: Weave<String> = Weave::new(1);
    let id = weave
        .add_atom("a".to_owned(), AtomId::START, 5)
        .expect("start is a valid cause");
    assert_eq!(id, AtomId { site: 1, index: 0 });
    let ids: Vec<_> = weave.weave().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![AtomId::START, id, AtomId::END]);
    assert_eq!(value_at(&weave, id), Some("a"));
    assert_eq!(weave.complete_weft().get(1), Some(0));
}

#[test]
fn sibling_inserts_converge_regardless_of_merge_direction() {
    let mut site1: Weave<String> = Weave::new(1);
    let mut site2: Weave<String> = Weave::new(2);
    let a = site1
        .add_atom("from-1".to_owned(), AtomId::START, 1)
        .expect("valid cause");
    let b = site2
        .add_atom("from-2".to_owned(), AtomId::START, 1)
        .expect("valid cause");

    let mut merged_1_into_2 = site2.clone();
    merged_1_into_2.integrate(&site1).expect("valid merge");

    let mut merged_2_into_1 = site1.clone();
    merged_2_into_1.integrate(&site2).expect("valid merge");

    let order_a: Vec<_> = merged_1_into_2.weave().iter().map(|atom| atom.id).collect();
    let order_b: Vec<_> = merged_2_into_1.weave().iter().map(|atom| atom.id).collect();
    assert_eq!(order_a, order_b);
    assert!(order_a.contains(&a));
    assert!(order_a.contains(&b));
    merged_1_into_2.validate().expect("converged weave is valid");
}

#[test]
fn delete_appends_a_tombstone() {
    let mut weave: Weave<String> = Weave::new(1);
    let a = weave
        .add_atom("a".to_owned(), AtomId::START, 5)
        .expect("valid cause");
    let tombstone = weave.delete_atom(a, 7).expect("a is live");
    assert_eq!(tombstone, AtomId { site: 1, index: 1 });
    assert_eq!(weave.atom_for_id(tombstone).unwrap().ty, AtomType::Delete);
    assert_eq!(weave.atom_for_id(tombstone).unwrap().cause, a);

    // A second delete of the same target is refused: it is no longer `none`.
    assert!(weave.delete_atom(a, 8).is_none());
}

#[test]
fn add_atom_synthesizes_a_commit_for_a_known_sibling_site() {
    let mut site1: Weave<String> = Weave::new(1);
    let mut site2: Weave<String> = Weave::new(2);
    site2
        .add_atom("from-2".to_owned(), AtomId::START, 1)
        .expect("valid cause");
    site1.integrate(&site2).expect("valid merge");

    // site1 now sees a sibling of `start` from site 2; adding another child
    // under `start` should emit a commit referencing site 2's yarn tail
    // somewhere in the unparented region.
    site1
        .add_atom("from-1".to_owned(), AtomId::START, 2)
        .expect("valid cause");

    let commit = site1
        .weave()
        .iter()
        .find(|atom| atom.ty == AtomType::Commit && atom.id.site == 1);
    assert!(commit.is_some(), "expected a synthesized commit atom");
    site1.validate().expect("weave with commit is valid");
}

#[test]
fn three_way_merge_is_associative() {
    let mut a: Weave<String> = Weave::new(1);
    let mut b: Weave<String> = Weave::new(2);
    let mut c: Weave<String> = Weave::new(3);
    a.add_atom("a".to_owned(), AtomId::START, 1).expect("valid cause");
    b.add_atom("b".to_owned(), AtomId::START, 1).expect("valid cause");
    c.add_atom("c".to_owned(), AtomId::START, 1).expect("valid cause");

    let mut left = a.clone();
    left.integrate(&b).expect("a<-b");
    left.integrate(&c).expect("(a<-b)<-c");

    let mut right_bc = b.clone();
    right_bc.integrate(&c).expect("b<-c");
    let mut right = a;
    right.integrate(&right_bc).expect("a<-(b<-c)");

    let left_ids: Vec<_> = left.weave().iter().map(|atom| atom.id).collect();
    let right_ids: Vec<_> = right.weave().iter().map(|atom| atom.id).collect();
    assert_eq!(left_ids, right_ids);
}
