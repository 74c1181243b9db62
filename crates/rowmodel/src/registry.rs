use indexmap::IndexMap;
use rowmodel_core::{Domain, Entity, Error, Result};
use std::rc::Rc;
use tracing::info;

/// The domains known to an application, keyed by domain id.
///
/// Populate it during startup and pass it to whatever creates or deserializes
/// entities.
#[derive(Debug, Default)]
pub struct Registry {
    domains: IndexMap<String, Rc<Domain>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Freezes `domain` and registers it under its id.
    pub fn register(&mut self, domain: Domain) -> Result<Rc<Domain>> {
        if self.domains.contains_key(domain.id()) {
            return Err(Error::invalid_definition(format!(
                "domain `{}` has already been registered",
                domain.id()
            )));
        }

        info!(
            target: "rowmodel::registry",
            domain = domain.id(),
            entities = domain.definitions().len(),
            "domain registered"
        );

        let domain = Rc::new(domain);
        self.domains
            .insert(domain.id().to_string(), Rc::clone(&domain));
        Ok(domain)
    }

    pub fn get(&self, domain_id: &str) -> Result<Rc<Domain>> {
        self.domains
            .get(domain_id)
            .cloned()
            .ok_or_else(|| Error::unknown_domain(domain_id))
    }

    /// Creates an empty entity of type `entity_id` in domain `domain_id`.
    pub fn entity(&self, domain_id: &str, entity_id: &str) -> Result<Entity> {
        self.get(domain_id)?.entity(entity_id)
    }

    /// Removes the domain `domain_id`. Entities created from it keep it alive.
    pub fn unregister(&mut self, domain_id: &str) -> Option<Rc<Domain>> {
        let domain = self.domains.shift_remove(domain_id)?;
        info!(target: "rowmodel::registry", domain = domain_id, "domain unregistered");
        Some(domain)
    }

    pub fn contains(&self, domain_id: &str) -> bool {
        self.domains.contains_key(domain_id)
    }

    pub fn domains(&self) -> impl ExactSizeIterator<Item = &Rc<Domain>> + '_ {
        self.domains.values()
    }

    pub fn clear(&mut self) {
        info!(target: "rowmodel::registry", domains = self.domains.len(), "registry cleared");
        self.domains.clear();
    }
}
