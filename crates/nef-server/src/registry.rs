//! Per-AF subscription bookkeeping shared by the exposure APIs.
//!
//! Each AF gets an [`AppFunctionContext`] behind its own async `RwLock`.
//! Callers take that lock for the whole of a multi-step operation, so all
//! subscription changes for one AF are serialized while different AFs
//! proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use nef_core::generate_id;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("subscription {subscription_id} not found for AF {af_id}")]
    NotFound {
        af_id: String,
        subscription_id: String,
    },
}

pub type SharedAppFunction<S> = Arc<RwLock<AppFunctionContext<S>>>;

#[derive(Debug)]
pub struct AppFunctionContext<S> {
    af_id: String,
    base_path: String,
    subscriptions: HashMap<String, S>,
    // Not used for id generation; counts issued subscriptions.
    last_id: u64,
}

impl<S> AppFunctionContext<S> {
    pub fn new(af_id: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            af_id: af_id.into(),
            base_path: base_path.into(),
            subscriptions: HashMap::new(),
            last_id: 0,
        }
    }

    pub fn af_id(&self) -> &str {
        &self.af_id
    }

    pub fn issued(&self) -> u64 {
        self.last_id
    }

    pub fn location_for(&self, subscription_id: &str) -> String {
        format!(
            "{}/{}/subscriptions/{}",
            self.base_path, self.af_id, subscription_id
        )
    }

    /// Allocates a fresh subscription id and stores what `build` makes of
    /// it. `build` gets the id and its location URI; returning `None`
    /// leaves the context untouched.
    pub fn insert_with<F>(&mut self, build: F) -> Option<&mut S>
    where
        F: FnOnce(&str, String) -> Option<S>,
    {
        let subscription_id = generate_id();
        if self.subscriptions.contains_key(&subscription_id) {
            return None;
        }
        let location = self.location_for(&subscription_id);
        let subscription = build(&subscription_id, location)?;
        self.last_id += 1;
        Some(
            self.subscriptions
                .entry(subscription_id)
                .or_insert(subscription),
        )
    }

    pub fn subscription(&self, subscription_id: &str) -> Option<&S> {
        self.subscriptions.get(subscription_id)
    }

    pub fn subscription_mut(&mut self, subscription_id: &str) -> Option<&mut S> {
        self.subscriptions.get_mut(subscription_id)
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &S> {
        self.subscriptions.values()
    }

    pub fn subscriptions_mut(&mut self) -> impl Iterator<Item = &mut S> {
        self.subscriptions.values_mut()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn delete_subscription(&mut self, subscription_id: &str) -> Result<S, RegistryError> {
        self.subscriptions
            .remove(subscription_id)
            .ok_or_else(|| RegistryError::NotFound {
                af_id: self.af_id.clone(),
                subscription_id: subscription_id.to_string(),
            })
    }
}

/// AF identifier to context map. Owned by the service using it.
#[derive(Debug)]
pub struct AppFunctionRegistry<S> {
    base_path: String,
    afs: DashMap<String, SharedAppFunction<S>>,
}

impl<S> AppFunctionRegistry<S> {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            afs: DashMap::new(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn get_af(&self, af_id: &str) -> Option<SharedAppFunction<S>> {
        self.afs.get(af_id).map(|af| Arc::clone(af.value()))
    }

    /// Inserts a new context; `None` if the AF is already known.
    pub fn add_af(&self, af_id: &str) -> Option<SharedAppFunction<S>> {
        match self.afs.entry(af_id.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let af = Arc::new(RwLock::new(AppFunctionContext::new(
                    af_id,
                    self.base_path.clone(),
                )));
                slot.insert(Arc::clone(&af));
                Some(af)
            }
        }
    }

    pub fn get_or_add_af(&self, af_id: &str) -> SharedAppFunction<S> {
        if let Some(af) = self.get_af(af_id) {
            return af;
        }
        let af = self.afs.entry(af_id.to_string()).or_insert_with(|| {
            Arc::new(RwLock::new(AppFunctionContext::new(
                af_id,
                self.base_path.clone(),
            )))
        });
        Arc::clone(af.value())
    }

    pub fn af_ids(&self) -> Vec<String> {
        self.afs.iter().map(|af| af.key().clone()).collect()
    }

    pub fn all(&self) -> Vec<SharedAppFunction<S>> {
        self.afs.iter().map(|af| Arc::clone(af.value())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    #[derive(Debug, PartialEq)]
    struct Sub {
        id: String,
        location: String,
    }

    fn build(id: &str, location: String) -> Option<Sub> {
        Some(Sub {
            id: id.to_string(),
            location,
        })
    }

    #[test]
    fn add_af_does_not_overwrite() {
        let registry: AppFunctionRegistry<Sub> = AppFunctionRegistry::new("/api/v1");
        assert!(registry.get_af("af-1").is_none());
        assert!(registry.add_af("af-1").is_some());
        assert!(registry.add_af("af-1").is_none());
        let a = registry.get_or_add_af("af-1");
        let b = registry.get_af("af-1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.af_ids(), vec!["af-1".to_string()]);
    }

    #[tokio::test]
    async fn insert_assigns_location_and_unique_ids() {
        let registry: AppFunctionRegistry<Sub> = AppFunctionRegistry::new("/api/v1");
        let af = registry.get_or_add_af("af-1");
        let mut af = af.write().await;

        let first = af.insert_with(build).map(|s| (s.id.clone(), s.location.clone())).unwrap();
        let second = af.insert_with(build).map(|s| s.id.clone()).unwrap();

        assert_ne!(first.0, second);
        assert_eq!(first.1, format!("/api/v1/af-1/subscriptions/{}", first.0));
        assert_eq!(af.subscription(&first.0).unwrap().location, first.1);
        assert_eq!(af.len(), 2);
        assert_eq!(af.issued(), 2);
    }

    #[tokio::test]
    async fn rejected_build_stores_nothing() {
        let registry: AppFunctionRegistry<Sub> = AppFunctionRegistry::new("/api/v1");
        let af = registry.get_or_add_af("af-1");
        let mut af = af.write().await;
        assert!(af.insert_with(|_, _| None).is_none());
        assert!(af.is_empty());
        assert_eq!(af.issued(), 0);
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let registry: AppFunctionRegistry<Sub> = AppFunctionRegistry::new("/api/v1");
        let af = registry.get_or_add_af("af-1");
        let mut af = af.write().await;
        let id = af.insert_with(build).map(|s| s.id.clone()).unwrap();

        assert_eq!(
            af.delete_subscription("nope"),
            Err(RegistryError::NotFound {
                af_id: "af-1".into(),
                subscription_id: "nope".into()
            })
        );
        assert!(af.delete_subscription(&id).is_ok());
        assert!(af.subscription(&id).is_none());
        assert!(af.delete_subscription(&id).is_err());
    }

    #[test]
    fn afs_keep_separate_subscriptions() {
        let registry: AppFunctionRegistry<Sub> = AppFunctionRegistry::new("/api/v1");
        block_on(async {
            let a = registry.get_or_add_af("af-a");
            let b = registry.get_or_add_af("af-b");
            let id = a.write().await.insert_with(build).map(|s| s.id.clone()).unwrap();

            assert!(b.read().await.subscription(&id).is_none());
            assert_eq!(
                a.read().await.subscription(&id).unwrap().location,
                format!("/api/v1/af-a/subscriptions/{id}")
            );
            assert!(b.write().await.delete_subscription(&id).is_err());
            assert_eq!(a.read().await.len(), 1);
        });
        let mut ids = registry.af_ids();
        ids.sort();
        assert_eq!(ids, vec!["af-a".to_string(), "af-b".to_string()]);
    }
}
