use std::collections::HashMap;
use std::sync::Arc;

use slotmap::{SlotMap, new_key_type};

use crate::domain::cycle::Cycle;
use crate::domain::utils::id::AcceleratorName;
use crate::error::{Error, Result};

new_key_type! {
    pub struct CycleKey;
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    id: String,
    cycle: Arc<Cycle>,
}

/// Arena of every cycle known to the facility.
///
/// Cycles are addressed by accelerator plus catalog id. The id usually equals the
/// cycle name but may differ, e.g. `MTE (2 injections)` for the PS cycle `MTE`.
#[derive(Debug, Default, Clone)]
pub struct CycleCatalog {
    cycles: SlotMap<CycleKey, CatalogEntry>,
    order: Vec<CycleKey>,
    index: HashMap<AcceleratorName, HashMap<String, CycleKey>>,
}

impl CycleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `cycle` under `id`. Ids must be unique per accelerator.
    pub fn add(&mut self, id: impl Into<String>, cycle: Arc<Cycle>) -> Result<CycleKey> {
        let id = id.into();
        let accelerator_index = self.index.entry(cycle.accelerator().clone()).or_default();

        if accelerator_index.contains_key(&id) {
            return Err(Error::ModelConstructionError(format!("cycle id '{}' is defined twice on {}", id, cycle.accelerator())));
        }

        let key = self.cycles.insert(CatalogEntry { id: id.clone(), cycle });
        accelerator_index.insert(id, key);
        self.order.push(key);
        Ok(key)
    }

    pub fn get(&self, key: CycleKey) -> Option<&Arc<Cycle>> {
        self.cycles.get(key).map(|entry| &entry.cycle)
    }

    pub fn key_of(&self, accelerator: &str, id: &str) -> Option<CycleKey> {
        self.index.get(accelerator).and_then(|ids| ids.get(id)).copied()
    }

    /// Looks a cycle up by accelerator and catalog id.
    pub fn lookup(&self, accelerator: &str, id: &str) -> Result<&Arc<Cycle>> {
        self.key_of(accelerator, id)
            .and_then(|key| self.get(key))
            .ok_or_else(|| Error::UnknownCycle { accelerator: accelerator.to_string(), cycle: id.to_string() })
    }

    /// Catalog entries of one accelerator in registration order.
    pub fn cycles_of<'a>(&'a self, accelerator: &'a str) -> impl Iterator<Item = (&'a str, &'a Arc<Cycle>)> + 'a {
        self.order
            .iter()
            .filter_map(|key| self.cycles.get(*key))
            .filter(move |entry| entry.cycle.accelerator().as_str() == accelerator)
            .map(|entry| (entry.id.as_str(), &entry.cycle))
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_accelerator_and_id() {
        let mut catalog = CycleCatalog::new();
        let mte = Arc::new(Cycle::new("PS", "MTE", 2, 1.2).unwrap());
        let key = catalog.add("MTE (2 injections)", mte.clone()).unwrap();

        assert!(Arc::ptr_eq(catalog.get(key).unwrap(), &mte));
        assert!(Arc::ptr_eq(catalog.lookup("PS", "MTE (2 injections)").unwrap(), &mte));
        assert!(matches!(catalog.lookup("PS", "MTE"), Err(Error::UnknownCycle { .. })));
        assert!(matches!(catalog.lookup("SPS", "MTE (2 injections)"), Err(Error::UnknownCycle { .. })));
    }

    #[test]
    fn test_same_id_on_different_accelerators() {
        let mut catalog = CycleCatalog::new();
        catalog.add("AD", Arc::new(Cycle::new("PSB", "AD", 1, 1.2).unwrap())).unwrap();
        catalog.add("AD", Arc::new(Cycle::new("PS", "AD", 2, 1.2).unwrap())).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("PS", "AD").unwrap().bps(), 2);
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut catalog = CycleCatalog::new();
        catalog.add("TOF", Arc::new(Cycle::new("PS", "TOF", 1, 1.2).unwrap())).unwrap();
        let result = catalog.add("TOF", Arc::new(Cycle::new("PS", "TOF", 1, 1.2).unwrap()));
        assert!(matches!(result, Err(Error::ModelConstructionError(_))));
    }

    #[test]
    fn test_cycles_of_keeps_registration_order() {
        let mut catalog = CycleCatalog::new();
        for (id, accelerator) in [("AWAKE", "SPS"), ("AD", "PS"), ("HiRadMat", "SPS"), ("Zero", "SPS")] {
            catalog.add(id, Arc::new(Cycle::new(accelerator, id, 1, 1.2).unwrap())).unwrap();
        }

        let ids: Vec<&str> = catalog.cycles_of("SPS").map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["AWAKE", "HiRadMat", "Zero"]);
    }
}
