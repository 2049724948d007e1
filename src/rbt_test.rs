use rand::prelude::random;
use rand::seq::SliceRandom;
use rand::{rngs::SmallRng, SeedableRng};

use crate::error::IndexError;
use crate::rbt::Rbt;

#[test]
fn test_id() {
    let rbt: Rbt<i64, i64> = Rbt::new("test-rbt");
    assert_eq!(rbt.id(), "test-rbt".to_string());
}

#[test]
fn test_len() {
    let rbt: Rbt<i64, i64> = Rbt::new("test-rbt");
    assert_eq!(rbt.len(), 0);
    assert!(rbt.is_empty());
}

#[test]
fn test_get_missing() {
    let rbt: Rbt<String, i64> = Rbt::new("test-rbt");
    assert_eq!(rbt.get("missing"), Err(IndexError::KeyNotFound));
    assert!(!rbt.contains("missing"));
}

#[test]
fn test_set() {
    let mut rbt: Rbt<i64, i64> = Rbt::new("test-rbt");
    let mut refns = RefNodes::new(10);

    for key in [2, 1, 3, 6, 5, 4, 8, 0, 9, 7].iter() {
        assert!(rbt.set(*key, 10).is_none());
        refns.set(*key, 10);
    }

    assert_eq!(rbt.len(), 10);
    assert!(rbt.validate().is_ok());

    // test get
    for i in 0..10 {
        assert_eq!(rbt.get(&i).ok(), refns.get(i));
        assert!(rbt.contains(&i));
    }
    // test sorted order
    assert_eq!(rbt.sorted_keys(), refns.sorted_keys());
}

#[test]
fn test_set_overwrite() {
    let mut rbt: Rbt<i64, i64> = Rbt::new("test-rbt");

    assert!(rbt.set(10, 100).is_none());
    assert!(rbt.set(5, 50).is_none());
    assert_eq!(rbt.len(), 2);

    let (rotations, recolors) = (rbt.rotations(), rbt.recolors());
    assert_eq!(rbt.set(10, 200), Some(100));
    assert_eq!(rbt.len(), 2);
    assert_eq!(rbt.get(&10), Ok(200));
    // overwrite must not restructure or recolor.
    assert_eq!(rbt.rotations(), rotations);
    assert_eq!(rbt.recolors(), recolors);
    assert!(rbt.validate().is_ok());
}

#[test]
fn test_delete() {
    let mut rbt: Rbt<i64, i64> = Rbt::new("test-rbt");
    let mut refns = RefNodes::new(11);

    for key in [2, 1, 3, 6, 5, 4, 8, 0, 9, 7].iter() {
        assert!(rbt.set(*key, 100).is_none());
        refns.set(*key, 100);
    }

    // delete a missing node.
    assert!(rbt.delete(&10).is_none());
    assert!(refns.delete(10).is_none());
    assert_eq!(rbt.len(), 10);
    assert_eq!(rbt.sorted_keys(), refns.sorted_keys());
    assert!(rbt.validate().is_ok());

    // delete all entries.
    for i in 0..10 {
        assert_eq!(rbt.delete(&i), refns.delete(i));
        assert!(rbt.validate().is_ok());
    }
    assert_eq!(rbt.len(), 0);
    assert!(rbt.is_empty());
    assert!(rbt.sorted_keys().is_empty());
}

#[test]
fn test_delete_random_order() {
    let mut rbt: Rbt<i64, i64> = Rbt::new("test-rbt");
    let mut rng = SmallRng::from_seed(make_seed().to_le_bytes());

    let mut keys: Vec<i64> = (0..1000).collect();
    keys.shuffle(&mut rng);
    for key in keys.iter() {
        rbt.set(*key, key * 10);
    }
    assert_eq!(rbt.len(), 1000);

    keys.shuffle(&mut rng);
    for key in keys.iter() {
        assert_eq!(rbt.delete(key), Some(key * 10));
        assert!(rbt.validate().is_ok());
    }
    assert_eq!(rbt.len(), 0);
    assert!(rbt.is_empty());
    assert!(rbt.sorted_keys().is_empty());
}

// already balanced after ("b", "a", "c"), only the first root recolor
// is recorded.
#[test]
fn test_no_rotation() {
    let mut rbt: Rbt<String, i64> = Rbt::new("test-rbt");

    rbt.set("b".to_string(), 2);
    rbt.set("a".to_string(), 1);
    rbt.set("c".to_string(), 3);

    assert_eq!(rbt.rotations(), 0);
    assert_eq!(rbt.recolors(), 1);
    assert_eq!(rbt.comparisons(), 3);
    assert_eq!(rbt.root_key(), Some("b".to_string()));
    assert_eq!(rbt.sorted_keys(), vec!["a", "b", "c"]);
    assert!(rbt.validate().is_ok());
}

// ascending inserts: the third one finds a straight RED line with a
// BLACK (sentinel) uncle, one left rotation at the grandparent and
// two recolors resolve it. "b" ends up as the BLACK root.
#[test]
fn test_single_left_rotation() {
    let mut rbt: Rbt<String, i64> = Rbt::new("test-rbt");

    rbt.set("a".to_string(), 1);
    rbt.set("b".to_string(), 2);
    rbt.set("c".to_string(), 3);

    assert_eq!(rbt.rotations(), 1);
    assert_eq!(rbt.recolors(), 3);
    assert_eq!(rbt.comparisons(), 6);
    assert_eq!(rbt.root_key(), Some("b".to_string()));
    assert_eq!(rbt.sorted_keys(), vec!["a", "b", "c"]);
    // validate() rejects a RED root, so this also pins property 2.
    assert!(rbt.validate().is_ok());
}

// left descent costs one comparison, right or equal descent costs two.
#[test]
fn test_comparison_convention() {
    let mut rbt: Rbt<String, i64> = Rbt::new("test-rbt");

    rbt.set("m".to_string(), 0);
    assert_eq!(rbt.comparisons(), 0);

    assert_eq!(rbt.get("a"), Err(IndexError::KeyNotFound));
    assert_eq!(rbt.comparisons(), 1);
    assert_eq!(rbt.get("z"), Err(IndexError::KeyNotFound));
    assert_eq!(rbt.comparisons(), 3);
    assert_eq!(rbt.get("m"), Ok(0));
    assert_eq!(rbt.comparisons(), 5);

    assert_eq!(rbt.collisions(), 0);
}

#[test]
fn test_clear() {
    let mut rbt: Rbt<i64, i64> = Rbt::new("test-rbt");

    for key in 0..100 {
        rbt.set(key, key);
    }
    assert!(rbt.rotations() > 0);
    assert!(rbt.recolors() > 0);

    rbt.clear();
    assert_eq!(rbt.len(), 0);
    assert!(rbt.is_empty());
    assert_eq!(rbt.comparisons(), 0);
    assert_eq!(rbt.rotations(), 0);
    assert_eq!(rbt.recolors(), 0);
    assert_eq!(rbt.get(&1), Err(IndexError::KeyNotFound));

    // the arena is reusable after clear.
    rbt.set(42, 420);
    assert_eq!(rbt.get(&42), Ok(420));
    assert!(rbt.validate().is_ok());
}

#[test]
fn test_random() {
    let mut rbt: Rbt<i64, i64> = Rbt::new("test-rbt");
    let mut rng = SmallRng::from_seed(make_seed().to_le_bytes());

    assert_eq!(rbt.random(&mut rng), None);

    rbt.set(0, 0);
    assert_eq!(rbt.random(&mut rng), Some((0, 0)));

    for key in 1..10_000 {
        assert!(rbt.set(key, key * 10).is_none());
    }
    for _i in 0..20_000 {
        let (key, value) = rbt.random(&mut rng).unwrap();
        assert!(key >= 0 && key < 10_000);
        assert_eq!(value, key * 10);
    }
}

#[test]
fn test_crud() {
    let size = 1000;
    let mut rbt: Rbt<i64, i64> = Rbt::new("test-rbt");
    let mut refns = RefNodes::new(size);

    for _ in 0..10_000 {
        let key: i64 = (random::<i64>() % (size as i64)).abs();
        let value: i64 = random();
        match (random::<i64>() % 3).abs() {
            0 => {
                assert_eq!(rbt.set(key, value), refns.set(key, value));
            }
            1 => {
                assert_eq!(rbt.delete(&key), refns.delete(key));
            }
            2 => {
                assert_eq!(rbt.get(&key).ok(), refns.get(key));
            }
            op => panic!("unreachable {}", op),
        };

        assert_eq!(rbt.len(), refns.len());
        assert!(rbt.validate().is_ok());
    }

    assert_eq!(rbt.sorted_keys(), refns.sorted_keys());
}

include!("./ref_test.rs");
