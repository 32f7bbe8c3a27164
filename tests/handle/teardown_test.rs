/*!
 * Teardown Protocol Tests
 * Probe, decrement, conditional free, and fatal stops
 */

use distributed_handle::runtime::{FaultPoint, ObjectRefcount};
use distributed_handle::*;
use pretty_assertions::assert_eq;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

fn panicking() -> HandleConfig {
    HandleConfig::default().with_fatal_policy(FatalPolicy::Panic)
}

fn expect_fatal<F: FnOnce()>(f: F) -> FatalTeardown {
    let payload = catch_unwind(AssertUnwindSafe(f)).expect_err("teardown should have stopped");
    match payload.downcast::<FatalTeardown>() {
        Ok(report) => *report,
        Err(_) => panic!("unwound with something other than a FatalTeardown"),
    }
}

#[test]
fn test_pending_message_blocks_release() {
    let rt = Arc::new(LocalRuntime::new());
    let h = MatrixHandle::create(rt.clone(), Scope::World, MatrixFormat::Dense)
        .unwrap()
        .with_config(panicking());
    let id = h.id().unwrap();

    rt.post(Scope::SelfOnly, 11, b"still reducing".to_vec()).unwrap();
    let report = expect_fatal(move || drop(h));

    assert_eq!(report.kind, ErrorKind::PendingSignal);
    assert_eq!(report.resource.map(|r| r.id), Some(id));
    assert!(matches!(report.error, HandleError::PendingSignal { .. }));

    // Nothing was released
    assert!(rt.is_live(id));
    assert_eq!(rt.reference_count(id).unwrap(), 1);
    assert_eq!(rt.stats().frees, 0);
    assert_eq!(rt.stats().dereferences, 0);
}

#[test]
fn test_pending_message_on_copy_release() {
    let rt = Arc::new(LocalRuntime::new());
    let a = MatrixHandle::create(rt.clone(), Scope::World, MatrixFormat::Aij)
        .unwrap()
        .with_config(panicking());
    let b = a.try_clone().unwrap();
    let id = a.id().unwrap();

    rt.post(Scope::SelfOnly, 3, Vec::new()).unwrap();
    let report = expect_fatal(move || drop(a));
    assert_eq!(report.kind, ErrorKind::PendingSignal);
    assert_eq!(rt.reference_count(id).unwrap(), 2);

    // Once the peer traffic is consumed the surviving copy releases normally
    rt.drain(Scope::SelfOnly);
    // The stopped copy never gave its reference back; drop it on the runtime's side
    assert_eq!(rt.external_release(id).unwrap(), 1);
    drop(b);
    assert!(!rt.is_live(id));
}

#[test]
fn test_default_probe_ignores_other_scopes() {
    let rt = Arc::new(LocalRuntime::new());
    let h = MatrixHandle::create(rt.clone(), Scope::Group(4), MatrixFormat::Aij)
        .unwrap()
        .with_config(panicking());
    let id = h.id().unwrap();

    rt.post(Scope::Group(4), 1, Vec::new()).unwrap();
    drop(h);

    assert!(!rt.is_live(id));
}

#[test]
fn test_resource_probe_scope() {
    let rt = Arc::new(LocalRuntime::new());
    let config = panicking().with_probe_scope(ProbeScope::Resource);
    let h = MatrixHandle::create(rt.clone(), Scope::Group(4), MatrixFormat::Aij)
        .unwrap()
        .with_config(config);
    let id = h.id().unwrap();

    rt.post(Scope::Group(4), 1, Vec::new()).unwrap();
    let report = expect_fatal(move || drop(h));

    assert_eq!(report.kind, ErrorKind::PendingSignal);
    assert!(rt.is_live(id));
}

#[test]
fn test_runtime_held_reference_keeps_resource() {
    let rt = Arc::new(LocalRuntime::new());
    let h = MatrixHandle::create(rt.clone(), Scope::World, MatrixFormat::Aij).unwrap();
    let id = h.id().unwrap();

    rt.external_reference(id).unwrap();
    drop(h);

    assert!(rt.is_live(id));
    assert_eq!(rt.reference_count(id).unwrap(), 1);
    assert!(rt.object(id).unwrap().has_internal_state);
}

#[test]
fn test_release_runs_kind_specific_destroy_once() {
    let rt = Arc::new(LocalRuntime::new());
    let a = MatrixHandle::create(rt.clone(), Scope::World, MatrixFormat::Aij).unwrap();
    let b = a.try_clone().unwrap();
    let id = a.id().unwrap();

    assert_eq!(a.release(), ErrorKind::Ok);
    assert!(rt.object(id).unwrap().has_internal_state);

    assert_eq!(b.release(), ErrorKind::Ok);
    assert!(rt.object(id).is_none());
}

#[test]
fn test_dropping_one_of_two_copies() {
    let rt = Arc::new(LocalRuntime::new());
    let a = MatrixHandle::create(rt.clone(), Scope::World, MatrixFormat::Aij).unwrap();
    let b = a.try_clone().unwrap();
    let before = b.refcount().unwrap();

    drop(a);
    assert_eq!(b.refcount().unwrap(), before - 1);
    assert!(b.get().is_some());
    assert_eq!(b.get_error(), ErrorKind::Ok);
}

#[test]
fn test_explicit_release_with_pending_message() {
    let rt = Arc::new(LocalRuntime::new());
    let h = MatrixHandle::create(rt.clone(), Scope::World, MatrixFormat::Aij)
        .unwrap()
        .with_config(panicking());
    let id = h.id().unwrap();

    rt.post(Scope::SelfOnly, 5, Vec::new()).unwrap();
    let report = expect_fatal(move || {
        h.release();
    });

    assert_eq!(report.kind, ErrorKind::PendingSignal);
    assert_eq!(rt.reference_count(id).unwrap(), 1);
    assert_eq!(rt.stats().dereferences, 0);
    assert_eq!(rt.stats().probes, 1);
}

#[test]
fn test_explicit_release_with_failed_free() {
    let rt = Arc::new(LocalRuntime::new());
    let h = MatrixHandle::create(rt.clone(), Scope::World, MatrixFormat::Aij)
        .unwrap()
        .with_config(panicking());
    let id = h.id().unwrap();

    rt.inject_fault(FaultPoint::Free);
    let report = expect_fatal(move || {
        h.release();
    });

    assert_eq!(report.kind, ErrorKind::ExternalRuntime);
    assert_eq!(report.resource.map(|r| r.id), Some(id));

    // One pass only: a single decrement, the object left in place
    assert_eq!(rt.stats().dereferences, 1);
    assert_eq!(rt.reference_count(id).unwrap(), 0);
    assert_eq!(rt.stats().frees, 0);
    assert!(rt.is_live(id));
}

#[test]
fn test_failed_dereference_is_fatal() {
    let rt = Arc::new(LocalRuntime::new());
    let h = MatrixHandle::create(rt.clone(), Scope::World, MatrixFormat::Aij)
        .unwrap()
        .with_config(panicking());
    let id = h.id().unwrap();

    rt.inject_fault(FaultPoint::Dereference);
    let report = expect_fatal(move || drop(h));

    assert_eq!(report.kind, ErrorKind::ExternalRuntime);
    assert_eq!(rt.reference_count(id).unwrap(), 1);
    assert!(rt.object(id).unwrap().has_internal_state);
}

#[test]
fn test_failed_kind_destroy_is_fatal() {
    let rt = Arc::new(LocalRuntime::new());
    let h = MatrixHandle::create(rt.clone(), Scope::World, MatrixFormat::Aij)
        .unwrap()
        .with_config(panicking());
    let id = h.id().unwrap();

    rt.inject_fault(FaultPoint::DestroyInternal);
    let report = expect_fatal(move || drop(h));

    assert_eq!(report.kind, ErrorKind::ExternalRuntime);
    assert!(rt.is_live(id));
    assert!(rt.object(id).unwrap().has_internal_state);
    assert_eq!(rt.stats().frees, 0);
}
