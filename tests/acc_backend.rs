//! Accelerator backend integration tests
//!
//! Skipped gracefully when no adapter is available, following the
//! same pattern as the backend's own unit tests. Inputs are pushed to
//! device formats first so the dispatcher's format match prefers the
//! accelerator algorithms.

#![cfg(feature = "wgpu")]

use graphr::backend::acc;
use graphr::block::{MatrixFormat, VectorFormat};
use graphr::container::{Matrix, Scalar, Vector};
use graphr::descriptor::Descriptor;
use graphr::op;
use graphr::prelude::*;

fn adapter_or_skip() -> bool {
    if acc::is_available() {
        true
    } else {
        println!("No accelerator adapter available, skipping test");
        false
    }
}

#[test]
fn test_acc_vxm_matches_host() {
    if !adapter_or_skip() {
        return;
    }

    let build = || {
        let m = Matrix::<f32>::new(4, 4);
        m.build(
            &[0, 0, 1, 2, 3],
            &[1, 2, 3, 3, 0],
            &[1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        let v = Vector::<f32>::new(4);
        v.build(&[0, 1, 2, 3], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        (m, v)
    };

    // host result
    let (m, v) = build();
    let mask = Vector::<f32>::new(4);
    let host_r = Vector::<f32>::new(4);
    exec_vxm_masked(
        &host_r,
        &mask,
        &v,
        &m,
        op::times(),
        op::plus(),
        op::always_true(),
        &Scalar::from_value(0.0),
        Descriptor::default(),
    )
    .unwrap();

    // device-resident inputs dispatch onto the accelerator
    let (m, v) = build();
    v.set_format(VectorFormat::AccDense).unwrap();
    m.set_format(MatrixFormat::AccCsr).unwrap();
    let mask = Vector::<f32>::new(4);
    let acc_r = Vector::<f32>::new(4);
    exec_vxm_masked(
        &acc_r,
        &mask,
        &v,
        &m,
        op::times(),
        op::plus(),
        op::always_true(),
        &Scalar::from_value(0.0),
        Descriptor::default(),
    )
    .unwrap();

    // reading the result downloads the device block
    for i in 0..4 {
        assert_eq!(
            host_r.get_float(i).unwrap(),
            acc_r.get_float(i).unwrap(),
            "divergence at column {i}"
        );
    }
}

#[test]
fn test_acc_upload_preserves_content() {
    if !adapter_or_skip() {
        return;
    }

    let v = Vector::<f32>::new(64);
    v.build(&[0, 13, 63], &[1.5, -2.5, 4.0]).unwrap();
    v.set_format(VectorFormat::AccDense).unwrap();

    assert!(v.is_valid(VectorFormat::AccDense).unwrap());
    assert_eq!(v.get_float(13).unwrap(), -2.5);
    assert_eq!(v.get_float(0).unwrap(), 1.5);
    assert_eq!(v.get_float(1).unwrap(), 0.0);
}

#[test]
fn test_acc_reduce_matches_host() {
    if !adapter_or_skip() {
        return;
    }

    let n = 1000u32;
    let keys: Vec<u32> = (0..n).collect();
    let vals: Vec<i32> = (0..n).map(|i| (i % 7) as i32).collect();

    let v = Vector::<i32>::new(n);
    v.build(&keys, &vals).unwrap();

    let host_total = Scalar::new();
    exec_v_reduce(&host_total, &Scalar::from_value(0), &v, op::plus()).unwrap();

    let v2 = Vector::<i32>::new(n);
    v2.build(&keys, &vals).unwrap();
    v2.set_format(VectorFormat::AccDense).unwrap();

    let acc_total = Scalar::new();
    exec_v_reduce(&acc_total, &Scalar::from_value(0), &v2, op::plus()).unwrap();

    assert_eq!(host_total.get_value(), acc_total.get_value());
}

#[test]
fn test_acc_assign_masked() {
    if !adapter_or_skip() {
        return;
    }

    let r = Vector::<i32>::new(16);
    r.set_format(VectorFormat::AccDense).unwrap();

    let mask = Vector::<i32>::new(16);
    mask.build(&[3, 7, 11], &[1, 1, 1]).unwrap();
    mask.set_format(VectorFormat::AccCoo).unwrap();

    exec_v_assign_masked(&r, &mask, &Scalar::from_value(9), op::second(), op::nonzero())
        .unwrap();

    assert_eq!(r.get_int(3).unwrap(), 9);
    assert_eq!(r.get_int(7).unwrap(), 9);
    assert_eq!(r.get_int(0).unwrap(), 0);
}

#[test]
fn test_acc_map_matches_host() {
    if !adapter_or_skip() {
        return;
    }

    let n = 128u32;
    let keys: Vec<u32> = (0..n).collect();
    let vals: Vec<f32> = (0..n).map(|i| (i + 1) as f32).collect();

    let v = Vector::<f32>::new(n);
    v.build(&keys, &vals).unwrap();
    v.set_format(VectorFormat::AccDense).unwrap();

    let r = Vector::<f32>::new(n);
    exec_v_map(&r, &v, op::reciprocal()).unwrap();

    assert_eq!(r.get_float(0).unwrap(), 1.0);
    assert_eq!(r.get_float(3).unwrap(), 0.25);
}
