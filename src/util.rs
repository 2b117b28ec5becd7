pub fn indicies_to_flags(indicies: &[usize], len: usize) -> Vec<bool> {
  let mut flags = vec![false; len];
  indicies.iter().for_each(|&i| flags[i] = true);
  flags
}

pub fn sparse_to_dense_data<T>(sparse: Vec<(usize, T)>, len: usize) -> Vec<Option<T>> {
  let mut dense = Vec::from_iter((0..len).map(|_| None));
  sparse.into_iter().for_each(|(i, t)| dense[i] = Some(t));
  dense
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
  let (sum, count) = values
    .into_iter()
    .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
  (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn flags() {
    let flags = indicies_to_flags(&[3, 0, 3], 5);
    assert_eq!(flags, vec![true, false, false, true, false]);
  }

  #[test]
  fn dense_data() {
    let dense = sparse_to_dense_data(vec![(2, 'a'), (0, 'b'), (2, 'c')], 3);
    assert_eq!(dense, vec![Some('b'), None, Some('c')]);
  }

  #[test]
  fn mean_of_empty() {
    assert_eq!(mean([]), None);
    assert_eq!(mean([1.0, 2.0, 6.0]), Some(3.0));
  }
}
