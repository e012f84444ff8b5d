use super::*;

#[test]
fn test_new_rejects_wrong_length() {
    let err = Tensor::new(vec![1.0, 2.0, 3.0], vec![2, 2]).unwrap_err();
    assert_eq!(
        err,
        BayesRustError::TensorCreationError {
            data_len: 3,
            shape: vec![2, 2]
        }
    );
}

#[test]
fn test_dtype_coercion_on_creation() {
    let t = Tensor::new_with_dtype(vec![1.7, -2.2], vec![2], DType::I64).unwrap();
    assert_eq!(t.data(), &[1.0, -2.0]);
    let b = Tensor::new_with_dtype(vec![0.0, 3.0], vec![2], DType::Bool).unwrap();
    assert_eq!(b.data(), &[0.0, 1.0]);
}

#[test]
fn test_get_and_flat_get() {
    let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
    assert_eq!(t.get(&[1, 2]).unwrap(), 6.0);
    assert_eq!(t.flat_get(4).unwrap(), 5.0);
    assert!(t.get(&[2, 0]).is_err());
    assert!(t.flat_get(6).is_err());
}

#[test]
fn test_scalar_value_requires_single_element() {
    let t = Tensor::new(vec![1.0, 2.0], vec![2]).unwrap();
    assert!(matches!(
        t.scalar_value(),
        Err(BayesRustError::ShapeMismatch { .. })
    ));
    let one = Tensor::new(vec![7.0], vec![1, 1]).unwrap();
    assert_eq!(one.scalar_value().unwrap(), 7.0);
}

#[test]
fn test_equality_and_clone_share_buffer() {
    let a = Tensor::new(vec![1.0, 2.0], vec![2]).unwrap();
    let b = a.clone();
    assert!(Arc::ptr_eq(&a.data, &b.data));
    assert_eq!(a, b);
    let c = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
    assert_ne!(a, c);
    assert_ne!(a, a.cast(DType::I64));
}

#[test]
fn test_is_integral_and_all_close() {
    let t = Tensor::new(vec![1.0, 2.0], vec![2]).unwrap();
    assert!(t.is_integral());
    assert!(!t.add_scalar(0.5).is_integral());
    assert!(t.all_close(&t.add_scalar(1e-12), 1e-9));
    assert!(!t.all_close(&t.add_scalar(1e-3), 1e-9));
}
