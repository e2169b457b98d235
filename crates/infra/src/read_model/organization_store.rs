use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use coachboard_core::OrganizationId;

/// Organization-isolated key/value store.
///
/// Every operation takes the organization id; nothing can be read or written
/// across the boundary.
pub trait OrganizationStore<K, V>: Send + Sync {
    fn get(&self, organization_id: OrganizationId, key: &K) -> Option<V>;
    fn upsert(&self, organization_id: OrganizationId, key: K, value: V);
    fn remove(&self, organization_id: OrganizationId, key: &K) -> Option<V>;
    /// Apply `apply` to the stored value under a single write lock and return
    /// the result. `None` if the key is absent, in which case nothing is written.
    fn modify(
        &self,
        organization_id: OrganizationId,
        key: &K,
        apply: &mut dyn FnMut(&mut V),
    ) -> Option<V>;
    /// All values of one organization, ordered by key.
    fn list(&self, organization_id: OrganizationId) -> Vec<V>;
}

impl<K, V, S> OrganizationStore<K, V> for Arc<S>
where
    S: OrganizationStore<K, V> + ?Sized,
{
    fn get(&self, organization_id: OrganizationId, key: &K) -> Option<V> {
        (**self).get(organization_id, key)
    }

    fn upsert(&self, organization_id: OrganizationId, key: K, value: V) {
        (**self).upsert(organization_id, key, value)
    }

    fn remove(&self, organization_id: OrganizationId, key: &K) -> Option<V> {
        (**self).remove(organization_id, key)
    }

    fn modify(
        &self,
        organization_id: OrganizationId,
        key: &K,
        apply: &mut dyn FnMut(&mut V),
    ) -> Option<V> {
        (**self).modify(organization_id, key, apply)
    }

    fn list(&self, organization_id: OrganizationId) -> Vec<V> {
        (**self).list(organization_id)
    }
}

/// In-memory organization-isolated store.
#[derive(Debug)]
pub struct InMemoryOrganizationStore<K, V> {
    inner: RwLock<BTreeMap<(OrganizationId, K), V>>,
}

impl<K, V> InMemoryOrganizationStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryOrganizationStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> OrganizationStore<K, V> for InMemoryOrganizationStore<K, V>
where
    K: Clone + Ord + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, organization_id: OrganizationId, key: &K) -> Option<V> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&(organization_id, key.clone())).cloned()
    }

    fn upsert(&self, organization_id: OrganizationId, key: K, value: V) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert((organization_id, key), value);
    }

    fn remove(&self, organization_id: OrganizationId, key: &K) -> Option<V> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(&(organization_id, key.clone()))
    }

    fn modify(
        &self,
        organization_id: OrganizationId,
        key: &K,
        apply: &mut dyn FnMut(&mut V),
    ) -> Option<V> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let value = map.get_mut(&(organization_id, key.clone()))?;
        apply(value);
        Some(value.clone())
    }

    fn list(&self, organization_id: OrganizationId) -> Vec<V> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.iter()
            .filter_map(|((o, _k), v)| if *o == organization_id { Some(v.clone()) } else { None })
            .collect()
    }
}
