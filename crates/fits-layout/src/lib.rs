#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod ascii;
pub mod block;
pub mod data;
pub mod error;
pub mod hdu;
pub mod header;
pub mod io;
pub mod order;
pub mod raw;

pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
pub use data::{Binding, Payload, Segment};
pub use error::{Error, Result};
pub use order::{HeaderOrder, KeywordToken};
