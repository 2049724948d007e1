mod avl;
mod depth;
mod dict;
mod error;
mod rbt;

pub use crate::avl::Avl;
pub use crate::depth::Depth;
pub use crate::dict::{Dictionary, Index, Metrics, Stats};
pub use crate::error::IndexError;
pub use crate::rbt::Rbt;

#[cfg(test)]
mod dict_test;
#[cfg(test)]
mod rbt_test;
