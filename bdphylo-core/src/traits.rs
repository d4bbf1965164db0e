/// Marker trait for lineage keys.
///
/// The tree containers are generic over the key identifying a
/// lineage; any cloneable, hashable, equatable type qualifies.
/// Implemented automatically.
pub trait Lineage: Clone + Eq + std::hash::Hash + std::fmt::Debug {}

impl<T> Lineage for T where T: Clone + Eq + std::hash::Hash + std::fmt::Debug {}

/// Marker trait for per-lineage payloads.
///
/// Payloads are carried through tree reduction and phylogeny
/// construction but never inspected. Implemented automatically.
pub trait Payload: Clone {}

impl<T> Payload for T where T: Clone {}
