//! Little-endian wire formats shared with external collaborators.
//!
//! These byte layouts are binding: the indexer, downstream consumers of
//! result streams, and the CLI all agree on them. Nothing here is
//! self-describing; lengths travel out of band.

pub mod codec;

use bytemuck::{Pod, Zeroable};

/// One ranked hit on a result stream: 8 bytes, score then pmid.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ResultEntry {
    pub score: f32,
    pub pmid: u32,
}
