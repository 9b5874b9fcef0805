use crate::models::Table;
use crate::models::reading::ReadingTable;
use crate::models::user::UserTable;

pub struct SchemaManager {
    tables: Vec<Box<dyn Table>>,
}

impl SchemaManager {
    pub fn new(tables: Vec<Box<dyn Table>>) -> Self {
        Self {
            tables: Self::order_by_dependencies(tables),
        }
    }

    fn order_by_dependencies(mut pending: Vec<Box<dyn Table>>) -> Vec<Box<dyn Table>> {
        let mut ordered: Vec<Box<dyn Table>> = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let index = pending
                .iter()
                .position(|table| {
                    table
                        .dependencies()
                        .iter()
                        .all(|dep| ordered.iter().any(|done| done.name() == *dep))
                })
                .expect("Circular dependency detected or unresolved dependencies exist.");

            ordered.push(pending.remove(index));
        }

        ordered
    }

    pub fn create_schema(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.create()).collect()
    }

    pub fn dispose_schema(&self) -> Vec<String> {
        self.tables.iter().rev().map(|table| table.dispose()).collect()
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        SchemaManager::new(vec![Box::new(UserTable), Box::new(ReadingTable)])
    }
}
