//! PageRank

use crate::container::{Matrix, Scalar, Vector};
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::exec::{
    exec_m_transpose, exec_v_ewise_add_masked, exec_v_ewise_mult_masked, exec_v_map,
    exec_v_reduce, exec_vxm_masked,
};
use crate::op::{self, OpUnary};

/// Damped PageRank over the adjacency matrix `a`
///
/// `alpha` is the damping factor in `(0, 1)`, `eps` the L1 stopping
/// tolerance. The caller supplies `p` initialised to the uniform
/// distribution (an empty `p` is seeded automatically). Row
/// normalisation is folded into the iteration: ranks are scaled by
/// precomputed inverse out-degrees before each (plus, times) vxm, then
/// damped and shifted by the teleport term. Vertices without outgoing
/// edges contribute no rank mass.
pub fn pr(
    p: &Vector<f32>,
    a: &Matrix<f32>,
    alpha: f32,
    eps: f32,
    desc: &Descriptor,
) -> Result<()> {
    let n = a.n_rows();
    if a.n_cols() != n {
        return Err(Error::invalid_argument("a", "adjacency matrix must be square"));
    }
    if p.n_rows() != n {
        return Err(Error::invalid_argument(
            "p",
            "rank vector length must match the vertex count",
        ));
    }
    if !(0.0..=1.0).contains(&alpha) || alpha == 0.0 || alpha == 1.0 {
        return Err(Error::invalid_argument("alpha", "damping must lie in (0, 1)"));
    }
    if eps <= 0.0 {
        return Err(Error::invalid_argument("eps", "tolerance must be positive"));
    }
    if n == 0 {
        return Ok(());
    }

    let uniform = 1.0 / n as f32;
    if p.nvals()? == 0 {
        let keys: Vec<u32> = (0..n).collect();
        p.build(&keys, &vec![uniform; n as usize])?;
    }

    // inverse out-degrees: row sums of `a` via its transpose
    let at = Matrix::<f32>::new(n, n);
    exec_m_transpose(&at, a)?;

    let ones = Vector::<f32>::new(n);
    let keys: Vec<u32> = (0..n).collect();
    ones.build(&keys, &vec![1.0; n as usize])?;

    let mask = Vector::<f32>::new(n);
    let zero = Scalar::from_value(0.0);

    let deg = Vector::<f32>::new(n);
    exec_vxm_masked(
        &deg,
        &mask,
        &ones,
        &at,
        op::times(),
        op::plus(),
        op::always_true(),
        &zero,
        Descriptor::default(),
    )?;

    let inv_deg = Vector::<f32>::new(n);
    exec_v_map(&inv_deg, &deg, op::reciprocal())?;

    let teleport = (1.0 - alpha) / n as f32;
    let damp = OpUnary::new(
        "damped_rank_step",
        format!("return TYPE({alpha:?}) * x + TYPE({teleport:?});"),
        move |x: f32| alpha * x + teleport,
    );

    let cur = Vector::<f32>::new(n);
    exec_v_map(&cur, p, op::identity())?;

    let max_iter = match desc.max_iterations {
        0 => 100,
        cap => cap,
    };

    for _ in 0..max_iter {
        let scaled = Vector::<f32>::new(n);
        exec_v_ewise_mult_masked(&scaled, None, &cur, &inv_deg, op::times(), op::always_true())?;

        let spread = Vector::<f32>::new(n);
        exec_vxm_masked(
            &spread,
            &mask,
            &scaled,
            a,
            op::times(),
            op::plus(),
            op::always_true(),
            &zero,
            Descriptor::default(),
        )?;

        let next = Vector::<f32>::new(n);
        exec_v_map(&next, &spread, damp.clone())?;

        let diff = Vector::<f32>::new(n);
        exec_v_ewise_add_masked(&diff, None, &next, &cur, op::absdiff(), op::always_true())?;
        let err = Scalar::new();
        exec_v_reduce(&err, &zero, &diff, op::plus())?;

        exec_v_map(&cur, &next, op::identity())?;

        if err.get_value() < eps {
            break;
        }
    }

    exec_v_map(p, &cur, op::identity())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pr_rejects_bad_parameters() {
        let a = Matrix::<f32>::new(2, 2);
        let p = Vector::<f32>::new(2);
        assert!(pr(&p, &a, 0.0, 1e-6, &Descriptor::default()).is_err());
        assert!(pr(&p, &a, 1.0, 1e-6, &Descriptor::default()).is_err());
        assert!(pr(&p, &a, 0.85, 0.0, &Descriptor::default()).is_err());
    }

    #[test]
    fn test_pr_star_concentrates_rank() {
        // all vertices point at 0
        let a = Matrix::<f32>::new(4, 4);
        a.build(&[1, 2, 3], &[0, 0, 0], &[1.0, 1.0, 1.0]).unwrap();

        let p = Vector::<f32>::new(4);
        pr(&p, &a, 0.85, 1e-6, &Descriptor::default()).unwrap();

        let hub = p.get_float(0).unwrap();
        for leaf in 1..4 {
            assert!(hub > p.get_float(leaf).unwrap());
        }
    }
}
