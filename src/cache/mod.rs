//! Cache front ends.
//!
//! | Type                 | Threading        | Budget                     |
//! |----------------------|------------------|----------------------------|
//! | `FrequencyCache`     | `&mut self`      | any [`EvictionPolicy`]     |
//! | `ByteBudgetCache`    | `Mutex`, `&self` | summed value weight        |
//! | `FileCache`          | `Mutex`, `&self` | summed file length         |
//!
//! [`EvictionPolicy`]: crate::traits::EvictionPolicy

pub mod byte_budget;
pub mod file;
pub mod frequency;
