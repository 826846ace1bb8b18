//! Address and range model.
//!
//! - [`NetAddr`]: family, address bytes and port
//! - [`NetRange`]: inclusive `[lb, ub]` range with containment predicates

mod addr;
mod range;

pub use addr::{Family, NetAddr};
pub use range::NetRange;
