//! WGSL generation from operator source snippets
//!
//! Each kernel family has a template specialised per element type and
//! operator set. Substitution is textual: the `TYPE` identifier inside
//! an operator's source body becomes the concrete WGSL type, and the
//! bodies are spliced into `op_*` functions the template calls. Output
//! cells that concurrent threads combine into are 32-bit and accessed
//! through `atomic<u32>` with bitcasts, so the compare-exchange equality
//! test is bitwise (floats with NaN payloads terminate correctly).

use crate::dtype::DType;
use crate::error::{Error, Result};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// WGSL scalar type for a dtype
pub fn wgsl_type(dtype: DType) -> Result<&'static str> {
    match dtype {
        DType::I32 => Ok("i32"),
        DType::U32 => Ok("u32"),
        DType::F32 => Ok("f32"),
        DType::Void => Err(Error::UnsupportedDType {
            dtype,
            op: "accelerator kernel",
        }),
    }
}

/// Expression converting a `TYPE` value `v` to its u32 bit pattern
fn to_bits_expr(dtype: DType) -> &'static str {
    match dtype {
        DType::U32 => "v",
        _ => "bitcast<u32>(v)",
    }
}

/// Expression converting a u32 bit pattern `b` back to `TYPE`
fn from_bits_expr(dtype: DType) -> Result<&'static str> {
    match dtype {
        DType::I32 => Ok("bitcast<i32>(b)"),
        DType::U32 => Ok("b"),
        DType::F32 => Ok("bitcast<f32>(b)"),
        DType::Void => Err(Error::UnsupportedDType {
            dtype,
            op: "accelerator kernel",
        }),
    }
}

/// Substitute the `TYPE` identifier in an operator body
fn specialise(body: &str, t: &str) -> String {
    body.replace("TYPE", t)
}

/// Cache key for a specialised kernel: family, type, operator sources
pub fn specialisation_key(family: &str, dtype: DType, sources: &[&str]) -> String {
    let mut hasher = DefaultHasher::new();
    for s in sources {
        s.hash(&mut hasher);
    }
    format!("{family}_{dtype}_{:016x}", hasher.finish())
}

/// Masked vector-matrix product over a CSR matrix
///
/// Entry points: `vxm_prepare` (seed the output with the initial
/// value), `vxm_atomic_scalar` (one thread per active row), and
/// `vxm_atomic_vector` (one workgroup per row, lanes splitting the row).
pub fn generate_vxm_shader(
    dtype: DType,
    op_mul: &str,
    op_add: &str,
    op_select: &str,
) -> Result<String> {
    let t = wgsl_type(dtype)?;
    let to_bits = to_bits_expr(dtype);
    let from_bits = from_bits_expr(dtype)?;
    let mul_body = specialise(op_mul, t);
    let add_body = specialise(op_add, t);
    let select_body = specialise(op_select, t);

    Ok(format!(
        r#"// masked vxm over CSR, specialised for {t}

struct VxmParams {{
    n_rows: u32,
    n_cols: u32,
    early_exit: u32,
    init_bits: u32,
    fill_v_bits: u32,
    pad0: u32,
    pad1: u32,
    pad2: u32,
}}

@group(0) @binding(0) var<storage, read_write> vv: array<{t}>;
@group(0) @binding(1) var<storage, read_write> ap: array<u32>;
@group(0) @binding(2) var<storage, read_write> aj: array<u32>;
@group(0) @binding(3) var<storage, read_write> ax: array<{t}>;
@group(0) @binding(4) var<storage, read_write> mask: array<{t}>;
@group(0) @binding(5) var<storage, read_write> rr: array<atomic<u32>>;
@group(0) @binding(6) var<uniform> params: VxmParams;

fn op_mul(a: {t}, b: {t}) -> {t} {{ {mul_body} }}
fn op_add(a: {t}, b: {t}) -> {t} {{ {add_body} }}
fn op_select(x: {t}) -> bool {{ {select_body} }}
fn to_bits(v: {t}) -> u32 {{ return {to_bits}; }}
fn from_bits(b: u32) -> {t} {{ return {from_bits}; }}

fn atomic_combine(j: u32, val: {t}) {{
    loop {{
        let old_bits = atomicLoad(&rr[j]);
        if (params.early_exit != 0u && old_bits != params.init_bits) {{
            return;
        }}
        let merged = op_add(from_bits(old_bits), val);
        let new_bits = to_bits(merged);
        if (new_bits == old_bits) {{
            return;
        }}
        let res = atomicCompareExchangeWeak(&rr[j], old_bits, new_bits);
        if (res.exchanged) {{
            return;
        }}
    }}
}}

@compute @workgroup_size(256)
fn vxm_prepare(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) nwg: vec3<u32>
) {{
    let stride = nwg.x * 256u;
    var j = gid.x;
    while (j < params.n_cols) {{
        atomicStore(&rr[j], params.init_bits);
        j = j + stride;
    }}
}}

@compute @workgroup_size(256)
fn vxm_atomic_scalar(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) nwg: vec3<u32>
) {{
    let stride = nwg.x * 256u;
    var i = gid.x;
    while (i < params.n_rows) {{
        let vi = vv[i];
        if (to_bits(vi) != params.fill_v_bits) {{
            for (var e = ap[i]; e < ap[i + 1u]; e = e + 1u) {{
                let j = aj[e];
                if (op_select(mask[j])) {{
                    atomic_combine(j, op_mul(vi, ax[e]));
                }}
            }}
        }}
        i = i + stride;
    }}
}}

@compute @workgroup_size(64)
fn vxm_atomic_vector(
    @builtin(workgroup_id) wid: vec3<u32>,
    @builtin(local_invocation_id) lid: vec3<u32>,
    @builtin(num_workgroups) nwg: vec3<u32>
) {{
    var i = wid.x;
    while (i < params.n_rows) {{
        let vi = vv[i];
        if (to_bits(vi) != params.fill_v_bits) {{
            let row_end = ap[i + 1u];
            var e = ap[i] + lid.x;
            while (e < row_end) {{
                let j = aj[e];
                if (op_select(mask[j])) {{
                    atomic_combine(j, op_mul(vi, ax[e]));
                }}
                e = e + 64u;
            }}
        }}
        i = i + nwg.x;
    }}
}}
"#
    ))
}

/// Masked scalar assignment
///
/// Entry points: `assign_sparse` (iterate the mask's stored pairs) and
/// `assign_dense` (sweep every index).
pub fn generate_assign_shader(dtype: DType, op_assign: &str, op_select: &str) -> Result<String> {
    let t = wgsl_type(dtype)?;
    let from_bits = from_bits_expr(dtype)?;
    let assign_body = specialise(op_assign, t);
    let select_body = specialise(op_select, t);

    Ok(format!(
        r#"// masked assignment, specialised for {t}

struct AssignParams {{
    n: u32,
    value_bits: u32,
    pad0: u32,
    pad1: u32,
}}

@group(0) @binding(0) var<storage, read_write> mask_keys: array<u32>;
@group(0) @binding(1) var<storage, read_write> mask_vals: array<{t}>;
@group(0) @binding(2) var<storage, read_write> rr: array<{t}>;
@group(0) @binding(3) var<uniform> params: AssignParams;

fn op_assign(a: {t}, b: {t}) -> {t} {{ {assign_body} }}
fn op_select(x: {t}) -> bool {{ {select_body} }}
fn value() -> {t} {{
    let b = params.value_bits;
    return {from_bits};
}}

@compute @workgroup_size(256)
fn assign_sparse(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) nwg: vec3<u32>
) {{
    let stride = nwg.x * 256u;
    var k = gid.x;
    while (k < params.n) {{
        if (op_select(mask_vals[k])) {{
            let i = mask_keys[k];
            rr[i] = op_assign(rr[i], value());
        }}
        k = k + stride;
    }}
}}

@compute @workgroup_size(256)
fn assign_dense(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) nwg: vec3<u32>
) {{
    let stride = nwg.x * 256u;
    var i = gid.x;
    while (i < params.n) {{
        if (op_select(mask_vals[i])) {{
            rr[i] = op_assign(rr[i], value());
        }}
        i = i + stride;
    }}
}}
"#
    ))
}

/// Tree reduction of a dense buffer
///
/// One launch folds each 256-wide segment into one partial in
/// workgroup memory; the host relaunches over the partials until one
/// value remains. No identity element is needed: lanes past the live
/// range never join the tree.
pub fn generate_reduce_shader(dtype: DType, op_reduce: &str) -> Result<String> {
    let t = wgsl_type(dtype)?;
    let reduce_body = specialise(op_reduce, t);

    Ok(format!(
        r#"// block-wise tree reduction, specialised for {t}

struct ReduceParams {{
    n: u32,
    pad0: u32,
    pad1: u32,
    pad2: u32,
}}

@group(0) @binding(0) var<storage, read_write> src: array<{t}>;
@group(0) @binding(1) var<storage, read_write> dst: array<{t}>;
@group(0) @binding(2) var<uniform> params: ReduceParams;

var<workgroup> scratch: array<{t}, 256>;

fn op_reduce(a: {t}, b: {t}) -> {t} {{ {reduce_body} }}

@compute @workgroup_size(256)
fn reduce_partial(
    @builtin(workgroup_id) wid: vec3<u32>,
    @builtin(local_invocation_id) lid: vec3<u32>
) {{
    let base = wid.x * 256u;
    let live = min(params.n - min(base, params.n), 256u);
    if (lid.x < live) {{
        scratch[lid.x] = src[base + lid.x];
    }}
    workgroupBarrier();

    var stride = 128u;
    while (stride > 0u) {{
        if (lid.x < stride && lid.x + stride < live) {{
            scratch[lid.x] = op_reduce(scratch[lid.x], scratch[lid.x + stride]);
        }}
        workgroupBarrier();
        stride = stride / 2u;
    }}

    if (lid.x == 0u && live > 0u) {{
        dst[wid.x] = scratch[0];
    }}
}}
"#
    ))
}

/// Element-wise unary map over a dense buffer
pub fn generate_map_shader(dtype: DType, op: &str) -> Result<String> {
    let t = wgsl_type(dtype)?;
    let op_body = specialise(op, t);

    Ok(format!(
        r#"// element-wise map, specialised for {t}

struct MapParams {{
    n: u32,
    pad0: u32,
    pad1: u32,
    pad2: u32,
}}

@group(0) @binding(0) var<storage, read_write> src: array<{t}>;
@group(0) @binding(1) var<storage, read_write> dst: array<{t}>;
@group(0) @binding(2) var<uniform> params: MapParams;

fn op_map(x: {t}) -> {t} {{ {op_body} }}

@compute @workgroup_size(256)
fn map_apply(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) nwg: vec3<u32>
) {{
    let stride = nwg.x * 256u;
    var i = gid.x;
    while (i < params.n) {{
        dst[i] = op_map(src[i]);
        i = i + stride;
    }}
}}
"#
    ))
}

/// Masked element-wise combine of two dense buffers
pub fn generate_ewise_shader(dtype: DType, op: &str, op_select: &str) -> Result<String> {
    let t = wgsl_type(dtype)?;
    let from_bits = from_bits_expr(dtype)?;
    let op_body = specialise(op, t);
    let select_body = specialise(op_select, t);

    Ok(format!(
        r#"// masked dense element-wise combine, specialised for {t}

struct EwiseParams {{
    n: u32,
    has_mask: u32,
    fill_bits: u32,
    pad0: u32,
}}

@group(0) @binding(0) var<storage, read_write> aa: array<{t}>;
@group(0) @binding(1) var<storage, read_write> bb: array<{t}>;
@group(0) @binding(2) var<storage, read_write> mask: array<{t}>;
@group(0) @binding(3) var<storage, read_write> rr: array<{t}>;
@group(0) @binding(4) var<uniform> params: EwiseParams;

fn op_combine(a: {t}, b: {t}) -> {t} {{ {op_body} }}
fn op_select(x: {t}) -> bool {{ {select_body} }}
fn fill() -> {t} {{
    let b = params.fill_bits;
    return {from_bits};
}}

@compute @workgroup_size(256)
fn ewise_apply(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) nwg: vec3<u32>
) {{
    let stride = nwg.x * 256u;
    var i = gid.x;
    while (i < params.n) {{
        var selected = true;
        if (params.has_mask != 0u) {{
            selected = op_select(mask[i]);
        }}
        if (selected) {{
            rr[i] = op_combine(aa[i], bb[i]);
        }} else {{
            rr[i] = fill();
        }}
        i = i + stride;
    }}
}}
"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_specialisation() {
        let shader = generate_vxm_shader(
            DType::F32,
            "return a * b;",
            "return a + b;",
            "return x != TYPE(0);",
        )
        .unwrap();
        assert!(shader.contains("return x != f32(0);"));
        assert!(shader.contains("bitcast<f32>(b)"));
        assert!(!shader.contains("TYPE"));
    }

    #[test]
    fn test_u32_bits_are_identity() {
        let shader = generate_map_shader(DType::U32, "return x;").unwrap();
        assert!(!shader.contains("bitcast<u32>(b)"));
    }

    #[test]
    fn test_void_rejected() {
        assert!(generate_reduce_shader(DType::Void, "return a + b;").is_err());
    }

    #[test]
    fn test_specialisation_key_tracks_sources() {
        let k1 = specialisation_key("vxm", DType::I32, &["return a + b;"]);
        let k2 = specialisation_key("vxm", DType::I32, &["return min(a, b);"]);
        assert_ne!(k1, k2);
        let k3 = specialisation_key("vxm", DType::I32, &["return a + b;"]);
        assert_eq!(k1, k3);
    }
}
