/*!
 * Mocked Runtime Tests
 * Verifies exactly which foreign calls the teardown protocol makes
 */

use distributed_handle::runtime::{
    MessageProbe, ObjectAllocator, ObjectConfigure, ObjectRefcount, RuntimeResult,
};
use distributed_handle::*;
use mockall::mock;
use mockall::predicate::eq;
use mockall::Sequence;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

mock! {
    pub Runtime {}

    impl ObjectRefcount for Runtime {
        fn reference(&self, id: ResourceId) -> RuntimeResult<()>;
        fn dereference(&self, id: ResourceId) -> RuntimeResult<Refcount>;
        fn reference_count(&self, id: ResourceId) -> RuntimeResult<Refcount>;
    }

    impl ObjectAllocator for Runtime {
        fn allocate(&self, kind: &'static str, scope: Scope) -> RuntimeResult<ResourceId>;
        fn free(&self, slot: &mut Option<ResourceId>) -> RuntimeResult<()>;
    }

    impl ObjectConfigure for Runtime {
        fn set_type(&self, id: ResourceId, type_name: &str) -> RuntimeResult<()>;
        fn destroy_internal(&self, id: ResourceId) -> RuntimeResult<()>;
    }

    impl MessageProbe for Runtime {
        fn probe_pending(&self, scope: Scope) -> bool;
    }
}

const ID: ResourceId = ResourceId(7);

fn constructible() -> MockRuntime {
    let mut rt = MockRuntime::new();
    rt.expect_allocate()
        .withf(|kind, scope| kind.to_string() == "distributed_matrix" && *scope == Scope::World)
        .times(1)
        .returning(|_, _| Ok(ID));
    rt.expect_set_type()
        .withf(|id, type_name| *id == ID && type_name.to_string() == "dense")
        .times(1)
        .returning(|_, _| Ok(()));
    rt
}

#[test]
fn test_pending_probe_never_frees() {
    let mut rt = constructible();
    rt.expect_probe_pending()
        .with(eq(Scope::SelfOnly))
        .times(1)
        .return_const(true);
    rt.expect_dereference().never();
    rt.expect_destroy_internal().never();
    rt.expect_free().never();

    let rt: Arc<MockRuntime> = Arc::new(rt);
    let h = MatrixHandle::create(rt.clone(), Scope::World, MatrixFormat::Dense)
        .unwrap()
        .with_config(HandleConfig::default().with_fatal_policy(FatalPolicy::Panic));

    let payload = catch_unwind(AssertUnwindSafe(move || drop(h))).unwrap_err();
    let report = payload
        .downcast::<FatalTeardown>()
        .unwrap_or_else(|_| panic!("unexpected panic payload"));

    assert_eq!(report.kind, ErrorKind::PendingSignal);
    assert_eq!(report.resource.map(|r| r.id), Some(ID));
}

#[test]
fn test_last_release_call_order() {
    let mut rt = constructible();
    let mut seq = Sequence::new();

    rt.expect_probe_pending()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(false);
    rt.expect_dereference()
        .with(eq(ID))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(0));
    rt.expect_reference_count()
        .with(eq(ID))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(0));
    rt.expect_destroy_internal()
        .with(eq(ID))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    rt.expect_free()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|slot| {
            *slot = None;
            Ok(())
        });

    let h = MatrixHandle::create(Arc::new(rt), Scope::World, MatrixFormat::Dense).unwrap();
    drop(h);
}

#[test]
fn test_shared_release_skips_free() {
    let mut rt = constructible();
    rt.expect_probe_pending().return_const(false);
    rt.expect_dereference().times(1).returning(|_| Ok(1));
    rt.expect_reference_count().times(1).returning(|_| Ok(1));
    rt.expect_reference().never();
    rt.expect_destroy_internal().never();
    rt.expect_free().never();

    let h = MatrixHandle::create(Arc::new(rt), Scope::World, MatrixFormat::Dense).unwrap();
    drop(h);
}

#[test]
fn test_free_clearing_reference_on_error_is_wrong_state() {
    let mut rt = constructible();
    rt.expect_probe_pending().times(1).return_const(false);
    rt.expect_dereference().times(1).returning(|_| Ok(0));
    rt.expect_reference_count().times(1).returning(|_| Ok(0));
    rt.expect_destroy_internal().times(1).returning(|_| Ok(()));
    rt.expect_free().times(1).returning(|slot| {
        *slot = None;
        Err(RuntimeError::Failed("partial free".into()))
    });

    let h = MatrixHandle::create(Arc::new(rt), Scope::World, MatrixFormat::Dense)
        .unwrap()
        .with_config(HandleConfig::default().with_fatal_policy(FatalPolicy::Panic));

    let payload = catch_unwind(AssertUnwindSafe(move || {
        h.release();
    }))
    .unwrap_err();
    let report = payload
        .downcast::<FatalTeardown>()
        .unwrap_or_else(|_| panic!("unexpected panic payload"));

    assert_eq!(report.kind, ErrorKind::WrongState);
    assert!(matches!(report.error, HandleError::WrongState { .. }));
}
