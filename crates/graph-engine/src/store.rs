//! In-memory program store with tag search
//!
//! Programs are plain host-owned values; hosts that want to keep a
//! collection of them and search it by classification tags and return
//! type register them here. Handles are indices into the store and stay
//! valid for its lifetime (programs are never removed, matching the
//! registry-for-life model of the engine).

use std::collections::HashSet;

use crate::program::Program;
use crate::value::TypeTag;

/// A searchable collection of assembled programs.
#[derive(Default)]
pub struct ProgramStore {
    programs: Vec<Program>,
}

impl ProgramStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a program, returning its handle.
    pub fn insert(&mut self, program: Program) -> usize {
        self.programs.push(program);
        self.programs.len() - 1
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn get(&self, handle: usize) -> Option<&Program> {
        self.programs.get(handle)
    }

    pub fn get_mut(&mut self, handle: usize) -> Option<&mut Program> {
        self.programs.get_mut(handle)
    }

    /// Handles of programs carrying every required tag, optionally
    /// filtered by declared return type.
    ///
    /// Tag matching is independent of the return type; pass `None` to
    /// search across all signatures.
    pub fn search(&self, return_type: Option<&TypeTag>, tags: &HashSet<i32>) -> Vec<usize> {
        self.programs
            .iter()
            .enumerate()
            .filter(|(_, p)| p.has_tags(tags))
            .filter(|(_, p)| match return_type {
                Some(ty) => p.return_type() == Some(ty),
                None => true,
            })
            .map(|(handle, _)| handle)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    fn tagged_program(registry: &Registry, return_type: Option<TypeTag>, tags: &[i32]) -> Program {
        let mut program = registry.new_program(return_type, vec![]);
        for &tag in tags {
            program.add_tag(tag);
        }
        program
    }

    #[test]
    fn test_search_by_tags() {
        let registry = Registry::new();
        let mut store = ProgramStore::new();
        let a = store.insert(tagged_program(&registry, None, &[1, 2]));
        let b = store.insert(tagged_program(&registry, None, &[2]));

        assert_eq!(store.search(None, &HashSet::from([2])), vec![a, b]);
        assert_eq!(store.search(None, &HashSet::from([1])), vec![a]);
        assert!(store.search(None, &HashSet::from([3])).is_empty());
        // The empty tag set matches everything.
        assert_eq!(store.search(None, &HashSet::new()).len(), 2);
    }

    #[test]
    fn test_search_by_return_type() {
        let registry = Registry::new();
        let mut store = ProgramStore::new();
        let a = store.insert(tagged_program(&registry, Some(TypeTag::I32), &[5]));
        let _b = store.insert(tagged_program(&registry, Some(TypeTag::Bool), &[5]));
        let _c = store.insert(tagged_program(&registry, None, &[5]));

        assert_eq!(
            store.search(Some(&TypeTag::I32), &HashSet::from([5])),
            vec![a]
        );
    }

    #[test]
    fn test_get_mut() {
        let registry = Registry::new();
        let mut store = ProgramStore::new();
        let handle = store.insert(tagged_program(&registry, None, &[]));
        store.get_mut(handle).unwrap().add_tag(9);
        assert!(store.get(handle).unwrap().has_tag(9));
    }
}
