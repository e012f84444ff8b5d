use crate::error::BayesRustError;
use crate::tensor::Tensor;

#[test]
fn test_reshape() {
    let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![4]).unwrap();
    let r = t.reshape(vec![2, 2]).unwrap();
    assert_eq!(r.shape(), &[2, 2]);
    assert_eq!(r.get(&[1, 0]).unwrap(), 3.0);
    assert!(matches!(
        t.reshape(vec![3]),
        Err(BayesRustError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_concat_axis_zero() {
    let a = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
    let b = Tensor::new(vec![3.0, 4.0, 5.0, 6.0], vec![2, 2]).unwrap();
    let c = Tensor::concat(&[&a, &b], 0).unwrap();
    assert_eq!(c.shape(), &[3, 2]);
    assert_eq!(c.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_concat_axis_one() {
    let a = Tensor::new(vec![1.0, 2.0], vec![2, 1]).unwrap();
    let b = Tensor::new(vec![3.0, 4.0, 5.0, 6.0], vec![2, 2]).unwrap();
    let c = Tensor::concat(&[&a, &b], 1).unwrap();
    assert_eq!(c.shape(), &[2, 3]);
    assert_eq!(c.data(), &[1.0, 3.0, 4.0, 2.0, 5.0, 6.0]);
}

#[test]
fn test_concat_mismatch() {
    let a = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
    let b = Tensor::new(vec![1.0, 2.0, 3.0], vec![1, 3]).unwrap();
    assert!(matches!(
        Tensor::concat(&[&a, &b], 0),
        Err(BayesRustError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_select() {
    let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
    assert_eq!(t.select(0, 1).unwrap().data(), &[4.0, 5.0, 6.0]);
    let col = t.select(1, 2).unwrap();
    assert_eq!(col.shape(), &[2]);
    assert_eq!(col.data(), &[3.0, 6.0]);
    assert!(t.select(1, 3).is_err());
}
