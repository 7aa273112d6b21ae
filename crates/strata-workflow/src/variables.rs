use strata_task::DataMap;

/// Key/value store shared by all tasks of a graph.
///
/// Only the scheduler's merge step writes to it; tasks receive a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
  values: DataMap,
}

impl VariableStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
    self.values.get(key)
  }

  pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
    self.values.insert(key.into(), value);
  }

  pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
    self.values.remove(key)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn clear(&mut self) {
    self.values.clear();
  }

  pub fn as_map(&self) -> &DataMap {
    &self.values
  }

  pub fn snapshot(&self) -> DataMap {
    self.values.clone()
  }
}

impl From<DataMap> for VariableStore {
  fn from(values: DataMap) -> Self {
    Self { values }
  }
}

impl Extend<(String, serde_json::Value)> for VariableStore {
  fn extend<T: IntoIterator<Item = (String, serde_json::Value)>>(&mut self, iter: T) {
    self.values.extend(iter);
  }
}
