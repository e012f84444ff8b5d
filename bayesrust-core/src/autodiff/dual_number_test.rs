use super::*;
use crate::tensor::ones;
use approx::assert_relative_eq;

fn leaf(id: usize, data: Vec<f64>, shape: Vec<usize>) -> DualNumber {
    DualNumber::with_respect_to_self(VertexId(id), Tensor::new(data, shape).unwrap())
}

#[test]
fn test_with_respect_to_self_is_identity() {
    let a = leaf(0, vec![1.0, 2.0], vec![2]);
    let partial = a.partial(VertexId(0)).unwrap();
    assert_eq!(partial.shape(), &[2, 2]);
    assert_eq!(partial.data(), &[1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_mul_uses_other_operand() {
    let a = leaf(0, vec![2.0], vec![]);
    let b = leaf(1, vec![5.0], vec![]);
    let z = a.mul(&b).unwrap();
    assert_eq!(z.value().scalar_value().unwrap(), 10.0);
    assert_eq!(z.partial(VertexId(0)).unwrap().scalar_value().unwrap(), 5.0);
    assert_eq!(z.partial(VertexId(1)).unwrap().scalar_value().unwrap(), 2.0);
}

#[test]
fn test_broadcast_scalar_partial() {
    // z = a * v with scalar a and vector v: dz/da has shape [3] ++ [].
    let a = leaf(0, vec![2.0], vec![]);
    let v = DualNumber::constant(Tensor::new(vec![1.0, 2.0, 3.0], vec![3]).unwrap());
    let z = a.mul(&v).unwrap();
    let dz_da = z.partial(VertexId(0)).unwrap();
    assert_eq!(dz_da.shape(), &[3]);
    assert_eq!(dz_da.data(), &[1.0, 2.0, 3.0]);
}

#[test]
fn test_shared_ancestor_is_summed() {
    // z = a * a + a  =>  dz/da = 2a + 1
    let a = leaf(0, vec![3.0], vec![]);
    let z = a.mul(&a).unwrap().add(&a).unwrap();
    assert_eq!(z.partial(VertexId(0)).unwrap().scalar_value().unwrap(), 7.0);
}

#[test]
fn test_div_and_pow() {
    let a = leaf(0, vec![3.0], vec![]);
    let b = leaf(1, vec![2.0], vec![]);
    let q = a.div(&b).unwrap();
    assert_relative_eq!(q.partial(VertexId(0)).unwrap().scalar_value().unwrap(), 0.5);
    assert_relative_eq!(q.partial(VertexId(1)).unwrap().scalar_value().unwrap(), -0.75);

    let p = a.pow(&b).unwrap();
    assert_relative_eq!(p.value().scalar_value().unwrap(), 9.0);
    assert_relative_eq!(p.partial(VertexId(0)).unwrap().scalar_value().unwrap(), 6.0);
    assert_relative_eq!(
        p.partial(VertexId(1)).unwrap().scalar_value().unwrap(),
        9.0 * 3.0f64.ln(),
        max_relative = 1e-12
    );
}

#[test]
fn test_unary_rules() {
    let a = leaf(0, vec![2.0], vec![]);
    assert_eq!(a.neg().unwrap().partial(VertexId(0)).unwrap().scalar_value().unwrap(), -1.0);
    assert_relative_eq!(
        a.exp().unwrap().partial(VertexId(0)).unwrap().scalar_value().unwrap(),
        2.0f64.exp()
    );
    assert_relative_eq!(a.ln().unwrap().partial(VertexId(0)).unwrap().scalar_value().unwrap(), 0.5);
}

#[test]
fn test_sum_reduces_of_axes() {
    let c = leaf(0, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
    let total = c.sum(None).unwrap();
    let partial = total.partial(VertexId(0)).unwrap();
    assert_eq!(partial.shape(), &[2, 3]);
    assert!(partial.all_close(&ones(&[2, 3]), 1e-12));

    let rows = c.sum(Some(&[1])).unwrap();
    let partial = rows.partial(VertexId(0)).unwrap();
    assert_eq!(partial.shape(), &[2, 2, 3]);
    assert_eq!(partial.data(), &[1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
}

#[test]
fn test_reshape_and_pluck() {
    let a = leaf(0, vec![1.0, 2.0, 3.0, 4.0], vec![4]);
    let r = a.reshape(vec![2, 2]).unwrap();
    assert_eq!(r.partial(VertexId(0)).unwrap().shape(), &[2, 2, 4]);

    let p = r.pluck(&[1, 0]).unwrap();
    assert_eq!(p.value().scalar_value().unwrap(), 3.0);
    assert_eq!(p.partial(VertexId(0)).unwrap().data(), &[0.0, 0.0, 1.0, 0.0]);
}

#[test]
fn test_concat_fills_missing_partials() {
    let a = leaf(0, vec![1.0, 2.0], vec![2]);
    let b = DualNumber::constant(Tensor::new(vec![3.0], vec![1]).unwrap());
    let z = DualNumber::concat(&[&a, &b], 0).unwrap();
    assert_eq!(z.value().data(), &[1.0, 2.0, 3.0]);
    let partial = z.partial(VertexId(0)).unwrap();
    assert_eq!(partial.shape(), &[3, 2]);
    assert_eq!(partial.data(), &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn test_if_then_else_masks_partials() {
    let mask = crate::tensor::from_bools(&[true, false], vec![2]).unwrap();
    let t = leaf(0, vec![1.0], vec![]);
    let e = leaf(1, vec![2.0], vec![]);
    let z = DualNumber::if_then_else(&mask, &t, &e).unwrap();
    assert_eq!(z.value().data(), &[1.0, 2.0]);
    assert_eq!(z.partial(VertexId(0)).unwrap().data(), &[1.0, 0.0]);
    assert_eq!(z.partial(VertexId(1)).unwrap().data(), &[0.0, 1.0]);
}
