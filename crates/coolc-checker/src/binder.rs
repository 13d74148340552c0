//! Class discovery and member collection
//!
//! The first four passes over a program. They populate the class table:
//! every class registered, parents linked, the hierarchy proven acyclic,
//! attributes and methods declared, and inheritance flattened. Expression
//! bodies are not looked at here.

use crate::error::CheckError;
use coolc_ast::{Feature, Program};
use coolc_types::{ClassId, ClassTable, DeclRef, Param};
use tracing::debug;

/// Builds the class table from class declarations
pub struct Binder<'a> {
    table: &'a mut ClassTable,
}

impl<'a> Binder<'a> {
    /// Create a binder over a table that holds only built-ins
    pub fn new(table: &'a mut ClassTable) -> Self {
        Binder { table }
    }

    /// Run passes 1 through 4.
    pub fn bind_program(mut self, program: &Program) -> Result<(), CheckError> {
        self.discover_classes(program)?;
        self.resolve_parents(program)?;
        check_hierarchy(self.table)?;
        self.collect_members(program)?;
        self.table.inherit_all();
        Ok(())
    }

    /// Pass 1: register every class name.
    fn discover_classes(&mut self, program: &Program) -> Result<(), CheckError> {
        for (index, class) in program.classes.iter().enumerate() {
            if class.name.is_empty() {
                return Err(CheckError::MalformedTree {
                    reason: format!("class declaration {} has no name", index),
                });
            }
            self.table.add_class(&class.name, Some(index))?;
        }
        debug!(classes = program.classes.len(), "discovered classes");
        Ok(())
    }

    /// Pass 2: link each class to its declared parent, or the root.
    fn resolve_parents(&mut self, program: &Program) -> Result<(), CheckError> {
        for class in &program.classes {
            let id = self.table.resolve(&class.name)?;
            let parent = match &class.parent {
                Some(parent_name) => {
                    let parent = self.table.resolve(parent_name)?;
                    if self.table.class(parent).sealed {
                        return Err(CheckError::ProhibitedInheritance {
                            class: class.name.clone(),
                            parent: parent_name.clone(),
                        });
                    }
                    parent
                }
                None => ClassId::OBJECT,
            };
            debug!(class = %class.name, parent = self.table.name(parent), "resolved parent");
            self.table.set_parent(id, parent);
        }
        Ok(())
    }

    /// Pass 4: declare attributes and methods.
    ///
    /// Classes are visited parents first so that override checks see every
    /// inherited method.
    fn collect_members(&mut self, program: &Program) -> Result<(), CheckError> {
        let mut order: Vec<ClassId> = self
            .table
            .classes()
            .filter(|c| !c.builtin)
            .map(|c| c.id)
            .collect();
        order.sort_by_key(|&id| self.table.depth(id));

        for id in order {
            let Some(class_index) = self.table.class(id).decl else {
                continue;
            };
            let class = &program.classes[class_index];

            for (feature_index, feature) in class.features.iter().enumerate() {
                let decl = DeclRef {
                    class: class_index,
                    feature: feature_index,
                };
                match feature {
                    Feature::Attribute { name, ty, .. } => {
                        let ty = self.table.resolve(ty)?;
                        self.table.add_attribute(id, name, ty, Some(decl))?;
                    }
                    Feature::Method {
                        name,
                        formals,
                        return_type,
                        ..
                    } => {
                        let params = formals
                            .iter()
                            .map(|f| Ok(Param::new(&f.name, self.table.resolve(&f.ty)?)))
                            .collect::<Result<Vec<_>, CheckError>>()?;
                        let return_type = self.table.resolve(return_type)?;
                        self.table.add_method(id, name, params, return_type, decl)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Pass 3: verify every class reaches the root.
///
/// Three-color walk from each class; classes already proven to reach the
/// root are not walked again.
pub fn check_hierarchy(table: &ClassTable) -> Result<(), CheckError> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        InProgress,
        Finished,
    }

    let mut marks = vec![Mark::Unvisited; table.len()];
    marks[ClassId::OBJECT.index()] = Mark::Finished;

    for start in table.class_ids() {
        let mut path = Vec::new();
        let mut current = start;
        loop {
            match marks[current.index()] {
                Mark::Finished => break,
                Mark::InProgress => {
                    return Err(CheckError::InheritanceCycle {
                        class: table.name(current).to_string(),
                    })
                }
                Mark::Unvisited => {
                    marks[current.index()] = Mark::InProgress;
                    path.push(current);
                    current = table.parent(current);
                }
            }
        }
        for id in path {
            marks[id.index()] = Mark::Finished;
        }
    }

    debug!("class hierarchy contains no cycles");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_parent_is_a_cycle() {
        let mut table = ClassTable::new();
        let a = table.add_class("A", None).unwrap();
        table.set_parent(a, a);
        assert!(matches!(
            check_hierarchy(&table),
            Err(CheckError::InheritanceCycle { .. })
        ));
    }

    #[test]
    fn test_long_cycle_behind_valid_prefix() {
        let mut table = ClassTable::new();
        let a = table.add_class("A", None).unwrap();
        let b = table.add_class("B", None).unwrap();
        let c = table.add_class("C", None).unwrap();
        let d = table.add_class("D", None).unwrap();
        table.set_parent(d, a);
        table.set_parent(a, b);
        table.set_parent(b, c);
        table.set_parent(c, a);
        assert!(matches!(
            check_hierarchy(&table),
            Err(CheckError::InheritanceCycle { .. })
        ));
    }

    #[test]
    fn test_tree_passes() {
        let mut table = ClassTable::new();
        let a = table.add_class("A", None).unwrap();
        let b = table.add_class("B", None).unwrap();
        table.set_parent(b, a);
        assert!(check_hierarchy(&table).is_ok());
    }
}
