//! Tag → property bundle table

use std::collections::BTreeMap;

use super::states::{ParticleCollection, PropertyBundle, Tag};

/// Mapping from tag to contact coefficients.
///
/// Applying the table copies each bundle into the particles carrying the tag
/// at that moment; later edits to the table do not reach them.
#[derive(Debug, Clone, Default)]
pub struct PropertyTable {
    entries: BTreeMap<Tag, PropertyBundle>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-entry table
    pub fn single(tag: Tag, bundle: PropertyBundle) -> Self {
        Self::new().with(tag, bundle)
    }

    pub fn with(mut self, tag: Tag, bundle: PropertyBundle) -> Self {
        self.set(tag, bundle);
        self
    }

    /// Insert or replace the bundle of `tag`
    pub fn set(&mut self, tag: Tag, bundle: PropertyBundle) {
        self.entries.insert(tag, bundle);
    }

    pub fn apply(&self, particles: &mut ParticleCollection) -> usize {
        let mut touched = 0;
        for p in particles.iter_mut() {
            if let Some(bundle) = self.entries.get(&p.tag) {
                p.props = *bundle;
                touched += 1;
            }
        }
        touched
    }
}
