//! Published testimonials, readable by anyone and curated by admins

use portal_common::{Caller, Result, Testimonial};
use std::sync::Arc;
use tracing::{debug, info};

use crate::access::AccessGate;
use crate::storage::Storage;

#[derive(Clone)]
pub struct TestimonialCatalog {
    storage: Arc<dyn Storage>,
    gate: AccessGate,
}

impl TestimonialCatalog {
    pub fn new(storage: Arc<dyn Storage>, gate: AccessGate) -> Self {
        Self { storage, gate }
    }

    pub async fn list(&self) -> Result<Vec<Testimonial>> {
        self.storage.list_testimonials().await
    }

    /// Add a testimonial, replacing one with the same name in place
    pub async fn add(&self, caller: &Caller, testimonial: Testimonial) -> Result<()> {
        let admin = self.gate.require_admin(caller, "add testimonials").await?;
        testimonial.validate()?;

        self.storage.upsert_testimonial(&testimonial).await?;
        info!("{} published testimonial: {}", admin, testimonial.name);
        Ok(())
    }

    /// Remove by name. Removing an absent name succeeds.
    pub async fn remove(&self, caller: &Caller, name: &str) -> Result<()> {
        let admin = self.gate.require_admin(caller, "remove testimonials").await?;

        if self.storage.remove_testimonial(name).await? {
            info!("{} removed testimonial: {}", admin, name);
        } else {
            debug!("No testimonial named {}", name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityResolver;
    use crate::storage::MemoryStorage;
    use portal_common::{ErrorKind, Principal};

    fn testimonial(name: &str, quote: &str) -> Testimonial {
        Testimonial {
            name: name.to_string(),
            title: "Grand prize winner".to_string(),
            quote: quote.to_string(),
            income: "$250,000".to_string(),
            image: format!("https://blobs.example/{}.jpg", name),
        }
    }

    async fn catalog() -> TestimonialCatalog {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let identity = Arc::new(IdentityResolver::new(storage.clone()));
        identity
            .bootstrap_admins(&[Principal::new("root").unwrap()])
            .await
            .unwrap();
        TestimonialCatalog::new(storage, AccessGate::new(identity))
    }

    #[tokio::test]
    async fn test_admin_curates_public_reads() {
        let catalog = catalog().await;
        let root = Caller::from(Principal::new("root").unwrap());
        let alice = Caller::from(Principal::new("alice").unwrap());

        let err = catalog
            .add(&alice, testimonial("Ann", "Life changing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = catalog
            .add(&Caller::Anonymous, testimonial("Ann", "Life changing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        catalog.add(&root, testimonial("Ann", "Life changing")).await.unwrap();
        catalog.add(&root, testimonial("Ben", "Unreal")).await.unwrap();
        catalog.add(&root, testimonial("Ann", "Still unreal")).await.unwrap();

        let list = catalog.list().await.unwrap();
        let names: Vec<&str> = list.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Ben"]);
        assert_eq!(list[0].quote, "Still unreal");

        let err = catalog.add(&root, testimonial("  ", "nameless")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let catalog = catalog().await;
        let root = Caller::from(Principal::new("root").unwrap());

        catalog.add(&root, testimonial("Ann", "Hi")).await.unwrap();
        catalog.remove(&root, "Ann").await.unwrap();
        catalog.remove(&root, "Ann").await.unwrap();
        assert!(catalog.list().await.unwrap().is_empty());

        let err = catalog
            .remove(&Caller::from(Principal::new("alice").unwrap()), "Ann")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
