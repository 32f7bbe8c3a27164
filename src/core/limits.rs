/*!
 * Limits and Constants
 *
 * Centralized location for handle-wide limits, thresholds, and environment keys.
 */

use std::time::Duration;

// =============================================================================
// REFERENCE COUNTING
// =============================================================================

/// Highest reference count the local runtime accepts before refusing a reference
pub const MAX_REFCOUNT: u32 = u32::MAX - 1;

/// Reference count of a freshly allocated object
pub const INITIAL_REFCOUNT: u32 = 1;

// =============================================================================
// LOCAL RUNTIME
// =============================================================================

/// Default number of live objects the local runtime will hold (64K)
pub const DEFAULT_OBJECT_CAPACITY: usize = 64 * 1024;

/// Default mailbox depth per communication scope
pub const DEFAULT_MAILBOX_DEPTH: usize = 1024;

// =============================================================================
// CONFIGURATION KEYS
// =============================================================================

/// Selects `abort` or `panic` for fatal teardown conditions
pub const ENV_FATAL_POLICY: &str = "DHANDLE_FATAL_POLICY";

/// Selects `self_only` or `resource` as the teardown probe scope
pub const ENV_PROBE_SCOPE: &str = "DHANDLE_PROBE_SCOPE";

/// Default matrix storage format for `create_default`
pub const ENV_MATRIX_FORMAT: &str = "DHANDLE_MATRIX_FORMAT";

/// Enables JSON log output when set to `1` or `true`
pub const ENV_TRACE_JSON: &str = "DHANDLE_TRACE_JSON";

// =============================================================================
// MONITORING
// =============================================================================

/// Operations slower than this are logged at warn level
pub const SLOW_OPERATION_THRESHOLD: Duration = Duration::from_millis(100);
