/*!
 * Unsupported Kind Fallback
 *
 * Stands in for any resource type without a specialization. Every
 * construction path fails with `UnsupportedKind` before touching the runtime.
 */

use super::kind::{sealed, KindTag, ResourceKind};
use crate::core::errors::{HandleError, HandleResult};
use crate::core::types::ResourceId;
use crate::runtime::{ExternalRuntime, RuntimeResult};
use std::marker::PhantomData;
use tracing::warn;

/// Resource kind for a type `T` with no specialization
pub struct Unsupported<T: 'static>(PhantomData<fn() -> T>);

impl<T: 'static> sealed::Sealed for Unsupported<T> {}

impl<T: 'static> ResourceKind for Unsupported<T> {
    type Settings = ();
    type State = ();

    const TAG: KindTag = KindTag::Unsupported;

    fn name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn check_supported() -> HandleResult<()> {
        warn!(kind = Self::name(), "Rejected handle for unsupported resource kind");
        Err(HandleError::UnsupportedKind { kind: Self::name() })
    }

    fn configure(
        _runtime: &dyn ExternalRuntime,
        _id: ResourceId,
        _settings: (),
    ) -> HandleResult<()> {
        Err(HandleError::UnsupportedKind { kind: Self::name() })
    }

    fn kind_specific_destroy(_runtime: &dyn ExternalRuntime, _id: ResourceId) -> RuntimeResult<()> {
        Ok(())
    }
}
