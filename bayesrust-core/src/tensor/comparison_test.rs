use crate::tensor::{from_bools, scalar, Tensor};
use crate::types::DType;

#[test]
fn test_comparisons_produce_bool_masks() {
    let a = Tensor::new(vec![1.0, 2.0, 3.0], vec![3]).unwrap();
    let m = a.lt(&scalar(2.0)).unwrap();
    assert_eq!(m.dtype(), DType::Bool);
    assert_eq!(m.data(), &[1.0, 0.0, 0.0]);
    assert_eq!(a.ge(&scalar(2.0)).unwrap().data(), &[0.0, 1.0, 1.0]);
    assert_eq!(a.eq_elem(&scalar(3.0)).unwrap().data(), &[0.0, 0.0, 1.0]);
}

#[test]
fn test_logical_ops() {
    let a = from_bools(&[true, true, false], vec![3]).unwrap();
    let b = from_bools(&[true, false, false], vec![3]).unwrap();
    assert_eq!(a.logical_and(&b).unwrap().data(), &[1.0, 0.0, 0.0]);
    assert_eq!(a.logical_or(&b).unwrap().data(), &[1.0, 1.0, 0.0]);
    assert_eq!(a.logical_not().data(), &[0.0, 0.0, 1.0]);
}

#[test]
fn test_where_mask_broadcasts() {
    let mask = from_bools(&[true, false], vec![2]).unwrap();
    let out = Tensor::where_mask(&mask, &scalar(0.9), &scalar(0.1)).unwrap();
    assert_eq!(out.shape(), &[2]);
    assert_eq!(out.data(), &[0.9, 0.1]);
}

#[test]
fn test_masked_fill() {
    let a = Tensor::new(vec![1.0, 2.0, 3.0], vec![3]).unwrap();
    let mask = a.gt(&scalar(1.5)).unwrap();
    let out = a.masked_fill(&mask, f64::NEG_INFINITY).unwrap();
    assert_eq!(out.data()[0], 1.0);
    assert!(out.data()[1..].iter().all(|v| *v == f64::NEG_INFINITY));
}
