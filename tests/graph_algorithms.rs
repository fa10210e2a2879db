//! Integration tests for the graph algorithms

use graphr::algorithm::{bfs, pr, sssp};
use graphr::algorithm::BFS_UNREACHED;
use graphr::container::{Matrix, Vector};
use graphr::descriptor::Descriptor;

#[test]
fn test_bfs_small_graph() {
    // edges (0,1) (0,2) (1,3) (2,3) (3,4) (4,5)
    let a = Matrix::<i32>::new(6, 6);
    a.build(
        &[0, 0, 1, 2, 3, 4],
        &[1, 2, 3, 3, 4, 5],
        &[1, 1, 1, 1, 1, 1],
    )
    .unwrap();

    let v = Vector::<i32>::new(6);
    bfs(&v, &a, 0, &Descriptor::default()).unwrap();

    let depths: Vec<i32> = (0..6).map(|i| v.get_int(i).unwrap()).collect();
    assert_eq!(depths, vec![0, 1, 1, 2, 3, 4]);
}

#[test]
fn test_bfs_unreachable_vertex() {
    // same graph plus an isolated vertex 6
    let a = Matrix::<i32>::new(7, 7);
    a.build(
        &[0, 0, 1, 2, 3, 4],
        &[1, 2, 3, 3, 4, 5],
        &[1, 1, 1, 1, 1, 1],
    )
    .unwrap();

    let v = Vector::<i32>::new(7);
    bfs(&v, &a, 0, &Descriptor::default()).unwrap();

    assert_eq!(v.get_int(5).unwrap(), 4);
    assert_eq!(v.get_int(6).unwrap(), BFS_UNREACHED);
}

#[test]
fn test_bfs_with_early_exit_descriptor() {
    let a = Matrix::<i32>::new(4, 4);
    a.build(&[0, 1, 2], &[1, 2, 3], &[1, 1, 1]).unwrap();

    let v = Vector::<i32>::new(4);
    bfs(&v, &a, 1, &Descriptor::new().with_early_exit()).unwrap();

    assert_eq!(v.get_int(1).unwrap(), 0);
    assert_eq!(v.get_int(3).unwrap(), 2);
    assert_eq!(v.get_int(0).unwrap(), BFS_UNREACHED);
}

#[test]
fn test_sssp_line_graph() {
    // 5-vertex line, weights 1, 2, 3, 4
    let a = Matrix::<f32>::new(5, 5);
    a.build(&[0, 1, 2, 3], &[1, 2, 3, 4], &[1.0, 2.0, 3.0, 4.0])
        .unwrap();

    let v = Vector::<f32>::new(5);
    sssp(&v, &a, 0, &Descriptor::default()).unwrap();

    let dist: Vec<f32> = (0..5).map(|i| v.get_float(i).unwrap()).collect();
    assert_eq!(dist, vec![0.0, 1.0, 3.0, 6.0, 10.0]);
}

#[test]
fn test_sssp_respects_iteration_cap() {
    let a = Matrix::<f32>::new(3, 3);
    a.build(&[0, 1], &[1, 2], &[1.0, 1.0]).unwrap();

    let v = Vector::<f32>::new(3);
    sssp(&v, &a, 0, &Descriptor::new().with_max_iterations(1)).unwrap();

    // one relaxation round reaches vertex 1 only
    assert_eq!(v.get_float(1).unwrap(), 1.0);
    assert!(v.get_float(2).unwrap().is_infinite());
}

#[test]
fn test_pagerank_symmetric_cycle() {
    // undirected 3-cycle
    let a = Matrix::<f32>::new(3, 3);
    a.build(
        &[0, 1, 1, 2, 2, 0],
        &[1, 0, 2, 1, 0, 2],
        &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
    )
    .unwrap();

    let p = Vector::<f32>::new(3);
    pr(&p, &a, 0.85, 1e-6, &Descriptor::default()).unwrap();

    let third = 1.0 / 3.0;
    for i in 0..3 {
        assert!(
            (p.get_float(i).unwrap() - third).abs() < 1e-4,
            "rank {i} diverged from the symmetric fixed point"
        );
    }
}

#[test]
fn test_pagerank_sums_to_one_without_dangling() {
    // strongly connected 4-cycle
    let a = Matrix::<f32>::new(4, 4);
    a.build(&[0, 1, 2, 3], &[1, 2, 3, 0], &[1.0; 4]).unwrap();

    let p = Vector::<f32>::new(4);
    pr(&p, &a, 0.85, 1e-6, &Descriptor::default()).unwrap();

    let total: f32 = (0..4).map(|i| p.get_float(i).unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-3);
}
