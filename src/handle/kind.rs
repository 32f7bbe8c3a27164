/*!
 * Resource Kinds
 *
 * Capability interface selecting construction, configuration, and
 * kind-specific destroy for each supported resource kind.
 */

use crate::core::errors::HandleResult;
use crate::core::types::ResourceId;
use crate::runtime::{ExternalRuntime, RuntimeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime-visible identity of a resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindTag {
    DistributedMatrix,
    Unsupported,
}

impl KindTag {
    #[inline]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

pub(super) mod sealed {
    pub trait Sealed {}
}

/// Capability interface implemented by every resource kind
///
/// The set of kinds is closed; `Unsupported<T>` stands in for everything
/// without a specialization and is rejected at construction.
pub trait ResourceKind: sealed::Sealed + Sized + Send + 'static {
    /// Arguments for the kind's one-time configuration step
    type Settings;

    /// Kind-specific state carried by each handle
    type State: Clone + Default + fmt::Debug + Send;

    const TAG: KindTag;

    /// Name reported to the runtime and in logs
    fn name() -> &'static str;

    /// Gate run before any runtime call
    fn check_supported() -> HandleResult<()> {
        Ok(())
    }

    /// Apply the kind's required configuration to a freshly allocated object
    fn configure(
        runtime: &dyn ExternalRuntime,
        id: ResourceId,
        settings: Self::Settings,
    ) -> HandleResult<Self::State>;

    /// Release kind-specific runtime state ahead of the free
    fn kind_specific_destroy(runtime: &dyn ExternalRuntime, id: ResourceId) -> RuntimeResult<()>;
}
