//! Integration tests for the dispatched vector operations

use graphr::container::{Matrix, Scalar, Vector};
use graphr::descriptor::Descriptor;
use graphr::op;
use graphr::prelude::*;

#[test]
fn test_masked_ewise_add_reads_dense() {
    // a = {0: 5, 2: 7}, b = {1: 3, 2: 4}, mask selects {1, 2}
    let a = Vector::<i32>::new(6);
    a.build(&[0, 2], &[5, 7]).unwrap();
    let b = Vector::<i32>::new(6);
    b.build(&[1, 2], &[3, 4]).unwrap();
    let mask = Vector::<i32>::new(6);
    mask.build(&[1, 2], &[1, 1]).unwrap();

    let r = Vector::<i32>::new(6);
    exec_v_ewise_add_masked(&r, Some(&mask), &a, &b, op::plus(), op::nonzero()).unwrap();

    // dense view: fill everywhere the mask did not select
    assert_eq!(r.get_int(0).unwrap(), 0);
    assert_eq!(r.get_int(1).unwrap(), 3);
    assert_eq!(r.get_int(2).unwrap(), 11);
    assert_eq!(r.get_int(3).unwrap(), 0);
    assert_eq!(r.get_int(5).unwrap(), 0);
}

#[test]
fn test_vxm_over_min_plus_semiring() {
    // weighted edges 0->1 (2.0), 0->2 (5.0), 1->2 (1.0)
    let m = Matrix::<f32>::new(3, 3);
    m.build(&[0, 0, 1], &[1, 2, 2], &[2.0, 5.0, 1.0]).unwrap();

    let v = Vector::<f32>::new(3);
    v.set_fill_value(f32::INFINITY).unwrap();
    v.build(&[0, 1], &[0.0, 2.0]).unwrap();

    let mask = Vector::<f32>::new(3);
    let r = Vector::<f32>::new(3);
    r.set_fill_value(f32::INFINITY).unwrap();

    exec_vxm_masked(
        &r,
        &mask,
        &v,
        &m,
        op::plus(),
        op::min(),
        op::always_true(),
        &Scalar::from_value(f32::INFINITY),
        Descriptor::default(),
    )
    .unwrap();

    // r[2] = min(0 + 5, 2 + 1)
    assert_eq!(r.get_float(1).unwrap(), 2.0);
    assert_eq!(r.get_float(2).unwrap(), 3.0);
    assert!(r.get_float(0).unwrap().is_infinite());
}

#[test]
fn test_vxm_early_exit_keeps_first_touch() {
    let m = Matrix::<i32>::new(2, 2);
    m.build(&[0, 1], &[1, 1], &[1, 1]).unwrap();

    let v = Vector::<i32>::new(2);
    v.build(&[0, 1], &[1, 1]).unwrap();

    let mask = Vector::<i32>::new(2);
    let r = Vector::<i32>::new(2);

    exec_vxm_masked(
        &r,
        &mask,
        &v,
        &m,
        op::land(),
        op::lor(),
        op::always_true(),
        &Scalar::from_value(0),
        Descriptor::new().with_early_exit(),
    )
    .unwrap();

    assert_eq!(r.get_int(1).unwrap(), 1);
    assert_eq!(r.get_int(0).unwrap(), 0);
}

#[test]
fn test_assign_then_reduce() {
    let r = Vector::<i32>::new(8);
    let mask = Vector::<i32>::new(8);
    mask.build(&[2, 4, 6], &[1, 1, 1]).unwrap();

    exec_v_assign_masked(&r, &mask, &Scalar::from_value(3), op::second(), op::nonzero())
        .unwrap();

    let total = Scalar::new();
    exec_v_reduce(&total, &Scalar::from_value(0), &r, op::plus()).unwrap();
    assert_eq!(total.get_value(), 9);
}

#[test]
fn test_map_composes_with_mult() {
    let v = Vector::<f32>::new(4);
    v.build(&[0, 1, 2, 3], &[1.0, 2.0, 4.0, 8.0]).unwrap();

    let inv = Vector::<f32>::new(4);
    exec_v_map(&inv, &v, op::reciprocal()).unwrap();

    let unit = Vector::<f32>::new(4);
    exec_v_ewise_mult_masked(&unit, None, &v, &inv, op::times(), op::always_true()).unwrap();

    for i in 0..4 {
        assert_eq!(unit.get_float(i).unwrap(), 1.0);
    }
}

#[test]
fn test_transpose_then_vxm_gives_row_sums() {
    let m = Matrix::<f32>::new(3, 3);
    m.build(&[0, 0, 2], &[1, 2, 0], &[1.0, 2.0, 4.0]).unwrap();

    let mt = Matrix::<f32>::new(3, 3);
    exec_m_transpose(&mt, &m).unwrap();

    let ones = Vector::<f32>::new(3);
    ones.build(&[0, 1, 2], &[1.0, 1.0, 1.0]).unwrap();

    let mask = Vector::<f32>::new(3);
    let sums = Vector::<f32>::new(3);
    exec_vxm_masked(
        &sums,
        &mask,
        &ones,
        &mt,
        op::times(),
        op::plus(),
        op::always_true(),
        &Scalar::from_value(0.0),
        Descriptor::default(),
    )
    .unwrap();

    assert_eq!(sums.get_float(0).unwrap(), 3.0);
    assert_eq!(sums.get_float(1).unwrap(), 0.0);
    assert_eq!(sums.get_float(2).unwrap(), 4.0);
}

#[test]
fn test_vxm_bit_identical_across_repeats() {
    let m = Matrix::<f32>::new(4, 4);
    m.build(
        &[0, 0, 1, 2, 3, 3],
        &[1, 3, 2, 3, 0, 1],
        &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
    )
    .unwrap();
    let v = Vector::<f32>::new(4);
    v.build(&[0, 1, 2, 3], &[1.5, 2.5, 3.5, 4.5]).unwrap();
    let mask = Vector::<f32>::new(4);

    let collect = || {
        let r = Vector::<f32>::new(4);
        exec_vxm_masked(
            &r,
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
        (0..4)
            .map(|i| r.get_float(i).unwrap().to_bits())
            .collect::<Vec<_>>()
    };

    let first = collect();
    for _ in 0..5 {
        assert_eq!(collect(), first);
    }
}

#[test]
fn test_using_output_as_input_is_rejected() {
    let m = Matrix::<i32>::new(2, 2);
    m.build(&[0], &[1], &[1]).unwrap();
    let v = Vector::<i32>::new(2);
    v.build(&[0], &[1]).unwrap();
    let mask = Vector::<i32>::new(2);

    // r aliases v: the engine must refuse rather than corrupt state
    let status = exec_vxm_masked(
        &v,
        &mask,
        &v,
        &m,
        op::times(),
        op::plus(),
        op::always_true(),
        &Scalar::from_value(0),
        Descriptor::default(),
    );
    assert!(matches!(status, Err(Error::InvalidState(_))));
}
