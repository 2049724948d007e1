use rand::prelude::random;

use crate::dict::{Dictionary, Index};
use crate::error::IndexError;

#[test]
fn test_engine_ids() {
    let avl: Index<i64, i64> = Index::avl("frequency-avl");
    let rbt: Index<i64, i64> = Index::rbt("frequency-rbt");
    assert_eq!(avl.id(), "frequency-avl".to_string());
    assert_eq!(rbt.id(), "frequency-rbt".to_string());
}

#[test]
fn test_not_found() {
    for index in [Index::avl("empty-avl"), Index::rbt("empty-rbt")].iter() {
        let index: &Index<String, i64> = index;
        assert_eq!(index.get(&"missing".to_string()), Err(IndexError::KeyNotFound));
        assert!(!index.contains(&"missing".to_string()));
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
        assert!(index.sorted_keys().is_empty());
    }
}

// both engines must agree on everything the contract promises, only
// the counters are engine-specific.
#[test]
fn test_engines_agree() {
    let mut avl: Index<i64, i64> = Index::avl("agree-avl");
    let mut rbt: Index<i64, i64> = Index::rbt("agree-rbt");

    for _ in 0..10_000 {
        let key: i64 = (random::<i64>() % 500).abs();
        let value: i64 = random();
        match (random::<i64>() % 3).abs() {
            0 => {
                assert_eq!(avl.set(key, value), rbt.set(key, value));
            }
            1 => {
                assert_eq!(avl.delete(&key), rbt.delete(&key));
            }
            2 => {
                assert_eq!(avl.get(&key), rbt.get(&key));
            }
            op => panic!("unreachable {}", op),
        };

        assert_eq!(avl.len(), rbt.len());
        assert_eq!(avl.is_empty(), rbt.is_empty());
    }

    assert_eq!(avl.sorted_keys(), rbt.sorted_keys());
    assert!(avl.validate().is_ok());
    assert!(rbt.validate().is_ok());
}

// a token-counting caller only ever needs the contract.
#[test]
fn test_frequency_table() {
    let tokens = ["the", "quick", "brown", "fox", "the", "lazy", "fox", "the"];

    for mut index in vec![
        Index::avl("freq-avl"),
        Index::rbt("freq-rbt"),
    ]
    .into_iter()
    {
        for token in tokens.iter() {
            let token = token.to_string();
            match index.get(&token) {
                Ok(count) => {
                    index.set(token, count + 1);
                }
                Err(IndexError::KeyNotFound) => {
                    index.set(token, 1);
                }
                Err(err) => panic!("unexpected {:?}", err),
            }
        }

        assert_eq!(index.len(), 5);
        assert_eq!(
            index.sorted_keys(),
            vec!["brown", "fox", "lazy", "quick", "the"]
        );
        assert_eq!(index.get(&"the".to_string()), Ok(3));
        assert_eq!(index.get(&"fox".to_string()), Ok(2));
        assert_eq!(index.get(&"lazy".to_string()), Ok(1));
    }
}

#[test]
fn test_metrics() {
    let mut index: Index<i64, i64> = Index::avl("metrics-avl");
    for key in 0..100 {
        index.set(key, key);
    }
    let metrics = index.metrics();
    assert_eq!(metrics.comparisons(), index.comparisons());
    assert_eq!(metrics.rotations(), index.rotations());
    assert_eq!(metrics.recolors(), 0);
    assert_eq!(metrics.collisions(), 0);

    let mut index: Index<i64, i64> = Index::rbt("metrics-rbt");
    for key in 0..100 {
        index.set(key, key);
    }
    let metrics = index.metrics();
    assert_eq!(metrics.comparisons(), index.comparisons());
    assert_eq!(metrics.rotations(), index.rotations());
    assert_eq!(metrics.recolors(), index.recolors());
    assert!(metrics.recolors() > 0);
    assert_eq!(metrics.collisions(), 0);
}

#[test]
fn test_clear() {
    let mut index: Index<i64, i64> = Index::rbt("clear-rbt");
    for key in 0..100 {
        index.set(key, key);
    }
    index.clear();
    assert!(index.is_empty());
    assert_eq!(index.metrics(), Default::default());
}
