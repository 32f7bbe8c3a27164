/*!
 * Distributed Matrix Kind
 *
 * A matrix must have its storage format selected exactly once, right after
 * allocation, before the handle is usable.
 */

use super::base::Handle;
use super::kind::{sealed, KindTag, ResourceKind};
use crate::core::config::HandleConfig;
use crate::core::errors::{HandleError, HandleResult};
use crate::core::types::{ResourceId, Scope};
use crate::runtime::{ExternalRuntime, RuntimeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Storage format of a distributed matrix, as named by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixFormat {
    Dense,
    #[default]
    Aij,
    Baij,
    Sbaij,
    MpiDense,
    MpiAij,
}

impl MatrixFormat {
    pub const ALL: [MatrixFormat; 6] = [
        Self::Dense,
        Self::Aij,
        Self::Baij,
        Self::Sbaij,
        Self::MpiDense,
        Self::MpiAij,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Aij => "aij",
            Self::Baij => "baij",
            Self::Sbaij => "sbaij",
            Self::MpiDense => "mpidense",
            Self::MpiAij => "mpiaij",
        }
    }
}

impl fmt::Display for MatrixFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatrixFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| format!("unknown matrix format '{}'", s))
    }
}

/// Distributed matrix resource kind
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributedMatrix;

/// Handle to a distributed matrix
pub type MatrixHandle = Handle<DistributedMatrix>;

impl sealed::Sealed for DistributedMatrix {}

impl ResourceKind for DistributedMatrix {
    type Settings = MatrixFormat;
    type State = Option<MatrixFormat>;

    const TAG: KindTag = KindTag::DistributedMatrix;

    fn name() -> &'static str {
        "distributed_matrix"
    }

    fn configure(
        runtime: &dyn ExternalRuntime,
        id: ResourceId,
        format: MatrixFormat,
    ) -> HandleResult<Self::State> {
        runtime
            .set_type(id, format.as_str())
            .map_err(|e| HandleError::runtime(Some(id), e))?;
        debug!(resource_id = %id, %format, "Matrix format selected");
        Ok(Some(format))
    }

    fn kind_specific_destroy(runtime: &dyn ExternalRuntime, id: ResourceId) -> RuntimeResult<()> {
        runtime.destroy_internal(id)
    }
}

impl Handle<DistributedMatrix> {
    /// Create a matrix on `scope` with the given storage format
    pub fn create(
        runtime: Arc<dyn ExternalRuntime>,
        scope: Scope,
        format: MatrixFormat,
    ) -> HandleResult<Self> {
        Self::new(runtime, scope, format)
    }

    /// Create a matrix using the configured default format
    pub fn create_default(
        runtime: Arc<dyn ExternalRuntime>,
        scope: Scope,
        config: HandleConfig,
    ) -> HandleResult<Self> {
        Ok(Self::new(runtime, scope, config.default_matrix_format)?.with_config(config))
    }

    /// Storage format, known when this process configured the matrix
    #[inline]
    pub fn format(&self) -> Option<MatrixFormat> {
        self.state
    }
}
