//! Claim authorization: the ordered eligibility pipeline and the
//! collaborator traits it talks to.

pub mod decision;
pub mod host;
pub mod pipeline;

pub use decision::{ClaimDenial, ClaimGrant, ClaimMode, DenialClass};
pub use host::{ClaimVeto, InventoryHost, PermissionRegistry, PlayerHost, RegisteredPermissions};
pub use pipeline::{ClaimPipeline, ClaimRequest, ClaimState, ClaimTarget};
