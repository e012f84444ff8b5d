use super::*;

#[test]
fn test_calculate_strides() {
    assert_eq!(calculate_strides(&[2, 3]), vec![3, 1]);
    assert_eq!(calculate_strides(&[2, 2, 2]), vec![4, 2, 1]);
    assert!(calculate_strides(&[]).is_empty());
}

#[test]
fn test_broadcast_shapes_compatible() {
    assert_eq!(broadcast_shapes(&[2, 3], &[3]).unwrap(), vec![2, 3]);
    assert_eq!(broadcast_shapes(&[2, 1], &[1, 4]).unwrap(), vec![2, 4]);
    assert_eq!(broadcast_shapes(&[], &[5]).unwrap(), vec![5]);
    assert_eq!(broadcast_shapes(&[], &[]).unwrap(), Vec::<usize>::new());
}

#[test]
fn test_broadcast_shapes_incompatible() {
    let err = broadcast_shapes(&[2, 3], &[4]).unwrap_err();
    assert_eq!(
        err,
        BayesRustError::BroadcastError {
            shape1: vec![2, 3],
            shape2: vec![4]
        }
    );
}

#[test]
fn test_broadcast_all_shapes() {
    let shapes: [&[usize]; 3] = [&[], &[3, 1], &[4]];
    assert_eq!(broadcast_all_shapes(&shapes).unwrap(), vec![3, 4]);
}

#[test]
fn test_index_coord_round_trip() {
    let shape = [2, 3, 4];
    let strides = calculate_strides(&shape);
    let coord = index_to_coord(17, &strides, &shape);
    assert_eq!(coord, vec![1, 1, 1]);
    assert_eq!(ravel_index(&coord, &shape).unwrap(), 17);
}

#[test]
fn test_coord_to_index_broadcasted() {
    // original [3] broadcast into [2, 3]
    assert_eq!(coord_to_index_broadcasted(&[1, 2], &[3], &[1]), 2);
    // original [2, 1] broadcast into [2, 3]
    assert_eq!(coord_to_index_broadcasted(&[1, 2], &[2, 1], &[1, 1]), 1);
}

#[test]
fn test_ravel_index_out_of_bounds() {
    assert!(matches!(
        ravel_index(&[2, 0], &[2, 2]),
        Err(BayesRustError::IndexOutOfBounds { .. })
    ));
}
