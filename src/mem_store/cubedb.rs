use std::collections::HashMap;

use crate::ingest::row::InsertRow;
use crate::mem_store::cube::Cube;

/// The top-level mapping of cube name -> [`Cube`]. Logically a process-wide
/// singleton owned by the reactor and mutated only from its thread.
#[derive(Debug, Default)]
pub struct Cubedb {
    cubes: HashMap<String, Cube>,
}

impl Cubedb {
    pub fn new() -> Cubedb {
        Cubedb::default()
    }

    pub fn find_cube(&self, name: &str) -> Option<&Cube> {
        self.cubes.get(name)
    }

    pub fn find_cube_mut(&mut self, name: &str) -> Option<&mut Cube> {
        self.cubes.get_mut(name)
    }

    /// Creates an empty cube named `name`. Returns `false` if it already exists.
    pub fn add_cube(&mut self, name: &str) -> bool {
        if self.cubes.contains_key(name) {
            return false;
        }
        self.cubes.insert(name.to_string(), Cube::new());
        true
    }

    /// Drops the cube named `name`. Returns `false` if it did not exist.
    pub fn del_cube(&mut self, name: &str) -> bool {
        self.cubes.remove(name).is_some()
    }

    pub fn cube_names(&self) -> Vec<String> {
        self.cubes.keys().cloned().collect()
    }

    pub fn for_each_cube(&self, mut visitor: impl FnMut(&str, &Cube)) {
        for (name, cube) in &self.cubes {
            visitor(name, cube);
        }
    }

    /// Inserts `row`, auto-creating its cube (and, within the cube, its
    /// partition) if this is their first row.
    pub fn insert(&mut self, row: &InsertRow) -> bool {
        self.cubes
            .entry(row.cube.clone())
            .or_insert_with(Cube::new)
            .insert(row)
    }
}
