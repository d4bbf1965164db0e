use thiserror::Error;

/// Primary error type.
///
/// Some members of this enum implement ``From``
/// in order to redirect other error types.
#[derive(Error, Debug, PartialEq)]
pub enum BdPhyloError {
    /// A redirection of a [``crate::SimulationError``]
    #[error("{value:?}")]
    SimulationError {
        /// The redirected error
        #[from]
        value: crate::SimulationError,
    },
    /// A redirection of a [``bdphylo_trees::LineageTreeError``]
    #[error("{value:?}")]
    LineageTreeError {
        /// The redirected error
        #[from]
        value: bdphylo_trees::LineageTreeError,
    },
    /// A redirection of a [``bdphylo_trees::PhylogenyError``]
    #[error("{value:?}")]
    PhylogenyError {
        /// The redirected error
        #[from]
        value: bdphylo_trees::PhylogenyError,
    },
}
