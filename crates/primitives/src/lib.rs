//! Collection of generic internal data types that are used widely.

pub mod buf;
pub mod hash;
pub mod uint;

pub use buf::{Buf20, Buf32};
pub use uint::U256;
