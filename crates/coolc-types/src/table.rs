//! The class table
//!
//! Owns every class, method and attribute descriptor. Descriptors refer to
//! each other by id, so the table can be handed from the checker to the code
//! generator after the tree walk that built it is gone.

use crate::builtins;
use crate::class::*;
use crate::error::EnvError;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// Arena of class, method and attribute descriptors
#[derive(Debug, Clone)]
pub struct ClassTable {
    classes: Vec<ClassDescriptor>,
    methods: Vec<MethodDescriptor>,
    attributes: Vec<AttributeDescriptor>,
    by_name: FxHashMap<String, ClassId>,
}

impl ClassTable {
    /// Create a table holding only the built-in classes
    pub fn new() -> Self {
        let mut table = ClassTable {
            classes: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            by_name: FxHashMap::default(),
        };
        builtins::install(&mut table);
        table
    }

    pub(crate) fn push_class(&mut self, class: ClassDescriptor) -> ClassId {
        let id = class.id;
        self.by_name.insert(class.name.clone(), id);
        self.classes.push(class);
        id
    }

    pub(crate) fn push_method(
        &mut self,
        owner: ClassId,
        name: &str,
        params: Vec<Param>,
        return_type: ClassId,
        body: MethodBody,
    ) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(MethodDescriptor {
            id,
            name: name.to_string(),
            params,
            return_type,
            owner,
            slot: None,
            body,
        });
        let class = &mut self.classes[owner.index()];
        class.methods.insert(name.to_string(), id);
        class.method_order.push(id);
        id
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    /// Register a new class. Its parent is the root until [`Self::set_parent`].
    pub fn add_class(&mut self, name: &str, decl: Option<usize>) -> Result<ClassId, EnvError> {
        if self.by_name.contains_key(name) {
            return Err(EnvError::DuplicateClass {
                name: name.to_string(),
            });
        }
        let id = ClassId(self.classes.len() as u32);
        debug!(class = name, "registered class");
        Ok(self.push_class(ClassDescriptor::new(id, name, decl)))
    }

    /// Link a class to its parent. No validation; see the checker's cycle pass.
    pub fn set_parent(&mut self, class: ClassId, parent: ClassId) {
        self.classes[class.index()].parent = parent;
    }

    /// Look up a class by name
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Look up a class by name, failing with `UnknownClass`
    pub fn resolve(&self, name: &str) -> Result<ClassId, EnvError> {
        self.class_id(name).ok_or_else(|| EnvError::UnknownClass {
            name: name.to_string(),
        })
    }

    /// Get a class descriptor
    pub fn class(&self, id: ClassId) -> &ClassDescriptor {
        &self.classes[id.index()]
    }

    /// Name of a class
    pub fn name(&self, id: ClassId) -> &str {
        &self.classes[id.index()].name
    }

    /// Parent of a class (the root returns itself)
    pub fn parent(&self, id: ClassId) -> ClassId {
        self.classes[id.index()].parent
    }

    /// All classes in registration order: built-ins first, then user classes
    /// in source order
    pub fn classes(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.iter()
    }

    /// Class ids in registration order
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.classes.iter().map(|c| c.id)
    }

    /// Number of classes, built-ins included
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false: the built-ins are present from construction
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Get a method descriptor
    pub fn method(&self, id: MethodId) -> &MethodDescriptor {
        &self.methods[id.index()]
    }

    /// Get an attribute descriptor
    pub fn attribute(&self, id: AttributeId) -> &AttributeDescriptor {
        &self.attributes[id.index()]
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    /// Declare an attribute on `class`.
    ///
    /// Attribute names are unique along the whole ancestor chain.
    pub fn add_attribute(
        &mut self,
        class: ClassId,
        name: &str,
        ty: ClassId,
        decl: Option<DeclRef>,
    ) -> Result<AttributeId, EnvError> {
        if name == "self" {
            return Err(EnvError::ReservedName {
                class: self.name(class).to_string(),
                member: name.to_string(),
                what: "an attribute",
            });
        }
        if let Some(existing) = self.lookup_attribute(class, name) {
            let owner = self.attribute(existing).owner;
            return Err(EnvError::DuplicateAttribute {
                class: self.name(class).to_string(),
                name: name.to_string(),
                declared_in: self.name(owner).to_string(),
            });
        }

        let id = AttributeId(self.attributes.len() as u32);
        let local_index = self.classes[class.index()].attribute_order.len();
        self.attributes.push(AttributeDescriptor {
            id,
            name: name.to_string(),
            ty,
            owner: class,
            local_index,
            decl,
        });
        let descriptor = &mut self.classes[class.index()];
        descriptor.attributes.insert(name.to_string(), id);
        descriptor.attribute_order.push(id);
        trace!(class = %descriptor.name, attribute = name, "added attribute");
        Ok(id)
    }

    /// Declare a method on `class`.
    ///
    /// Overriding an inherited method requires the same arity, the same
    /// parameter types in order, and the same return type.
    pub fn add_method(
        &mut self,
        class: ClassId,
        name: &str,
        params: Vec<Param>,
        return_type: ClassId,
        decl: DeclRef,
    ) -> Result<MethodId, EnvError> {
        let class_name = self.name(class).to_string();

        if let Some(param) = params.iter().find(|p| p.name == "self") {
            return Err(EnvError::ReservedName {
                class: class_name,
                member: format!("{}({})", name, param.name),
                what: "a parameter",
            });
        }
        if self.class(class).methods.contains_key(name) {
            return Err(EnvError::DuplicateMethod {
                class: class_name,
                name: name.to_string(),
            });
        }

        let parent = self.parent(class);
        if parent != class {
            if let Some(base) = self.lookup_method(parent, name) {
                self.check_override(&class_name, base, &params, return_type)?;
            }
        }

        let id = self.push_method(class, name, params, return_type, MethodBody::User(decl));
        trace!(class = %class_name, method = name, "added method");
        Ok(id)
    }

    fn check_override(
        &self,
        class_name: &str,
        base: MethodId,
        params: &[Param],
        return_type: ClassId,
    ) -> Result<(), EnvError> {
        let base = self.method(base);
        let incompatible = |reason: String| EnvError::IncompatibleOverride {
            class: class_name.to_string(),
            method: base.name.clone(),
            base: self.name(base.owner).to_string(),
            reason,
        };

        if base.params.len() != params.len() {
            return Err(incompatible(format!(
                "expected {} parameter(s), found {}",
                base.params.len(),
                params.len()
            )));
        }
        for (index, (expected, found)) in base.params.iter().zip(params).enumerate() {
            if expected.ty != found.ty {
                return Err(incompatible(format!(
                    "parameter {} has type {}, expected {}",
                    index + 1,
                    self.name(found.ty),
                    self.name(expected.ty)
                )));
            }
        }
        if base.return_type != return_type {
            return Err(incompatible(format!(
                "return type {} differs from {}",
                self.name(return_type),
                self.name(base.return_type)
            )));
        }
        Ok(())
    }

    /// Find the method dispatch would reach from `class`, walking ancestors
    pub fn lookup_method(&self, class: ClassId, name: &str) -> Option<MethodId> {
        self.ancestors(class)
            .find_map(|c| self.class(c).methods.get(name).copied())
    }

    /// Find an attribute visible in `class`, walking ancestors
    pub fn lookup_attribute(&self, class: ClassId, name: &str) -> Option<AttributeId> {
        self.ancestors(class)
            .find_map(|c| self.class(c).attributes.get(name).copied())
    }

    // ------------------------------------------------------------------
    // Inheritance
    // ------------------------------------------------------------------

    /// Compute flattened attributes and dispatch lists for every class.
    ///
    /// Parents are flattened before children; a class already flattened is
    /// left alone.
    pub fn inherit_all(&mut self) {
        for index in 0..self.classes.len() {
            self.inherit(ClassId(index as u32));
        }
    }

    fn inherit(&mut self, id: ClassId) {
        if self.classes[id.index()].inheritance_done {
            return;
        }

        let parent = self.parent(id);
        let (mut attributes, mut dispatch) = if parent == id {
            (Vec::new(), Vec::new())
        } else {
            self.inherit(parent);
            let parent = self.class(parent);
            (parent.flattened_attributes.clone(), parent.dispatch.clone())
        };

        let class = &self.classes[id.index()];
        attributes.extend(class.attribute_order.iter().copied());

        for &method in &class.method_order {
            let name = &self.methods[method.index()].name;
            let inherited = dispatch
                .iter()
                .position(|&m: &MethodId| self.methods[m.index()].name == *name);
            match inherited {
                Some(slot) => dispatch[slot] = method,
                None => dispatch.push(method),
            }
        }

        for (slot, &method) in dispatch.iter().enumerate() {
            let descriptor = &mut self.methods[method.index()];
            if descriptor.owner == id {
                descriptor.slot = Some(slot);
            }
        }

        let class = &mut self.classes[id.index()];
        debug!(
            class = %class.name,
            attributes = attributes.len(),
            slots = dispatch.len(),
            "flattened class"
        );
        class.flattened_attributes = attributes;
        class.dispatch = dispatch;
        class.inheritance_done = true;
    }

    /// Position of `attr` in the flattened layout of `class`
    pub fn attribute_index(&self, class: ClassId, attr: AttributeId) -> Option<usize> {
        self.class(class)
            .flattened_attributes
            .iter()
            .position(|&a| a == attr)
    }

    /// Vtable slot of the method named `name` as seen from `class`
    pub fn method_slot(&self, class: ClassId, name: &str) -> Option<usize> {
        self.class(class)
            .dispatch
            .iter()
            .position(|&m| self.method(m).name == name)
    }
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(feature: usize) -> DeclRef {
        DeclRef { class: 0, feature }
    }

    #[test]
    fn test_duplicate_class_including_builtins() {
        let mut table = ClassTable::new();
        table.add_class("A", Some(0)).unwrap();
        assert!(matches!(
            table.add_class("A", Some(1)),
            Err(EnvError::DuplicateClass { .. })
        ));
        assert!(matches!(
            table.add_class("Int", Some(2)),
            Err(EnvError::DuplicateClass { .. })
        ));
    }

    #[test]
    fn test_attribute_redeclared_in_subclass() {
        let mut table = ClassTable::new();
        let a = table.add_class("A", Some(0)).unwrap();
        let b = table.add_class("B", Some(1)).unwrap();
        table.set_parent(b, a);

        table.add_attribute(a, "x", ClassId::INT, None).unwrap();
        let err = table.add_attribute(b, "x", ClassId::STRING, None).unwrap_err();
        match err {
            EnvError::DuplicateAttribute { declared_in, .. } => assert_eq!(declared_in, "A"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_self_parameter_is_reserved() {
        let mut table = ClassTable::new();
        let a = table.add_class("A", Some(0)).unwrap();
        let err = table
            .add_method(a, "f", vec![Param::new("self", ClassId::INT)], ClassId::INT, decl(0))
            .unwrap_err();
        assert!(matches!(err, EnvError::ReservedName { .. }));
    }

    #[test]
    fn test_override_must_match_signature() {
        let mut table = ClassTable::new();
        let a = table.add_class("A", Some(0)).unwrap();
        let b = table.add_class("B", Some(1)).unwrap();
        table.set_parent(b, a);
        table
            .add_method(a, "f", vec![Param::new("x", ClassId::INT)], ClassId::INT, decl(0))
            .unwrap();

        let arity = table.add_method(b, "f", vec![], ClassId::INT, decl(0));
        assert!(matches!(arity, Err(EnvError::IncompatibleOverride { .. })));

        let param = table.add_method(
            b,
            "f",
            vec![Param::new("x", ClassId::STRING)],
            ClassId::INT,
            decl(0),
        );
        assert!(matches!(param, Err(EnvError::IncompatibleOverride { .. })));

        let ret = table.add_method(
            b,
            "f",
            vec![Param::new("x", ClassId::INT)],
            ClassId::OBJECT,
            decl(0),
        );
        assert!(matches!(ret, Err(EnvError::IncompatibleOverride { .. })));

        table
            .add_method(b, "f", vec![Param::new("y", ClassId::INT)], ClassId::INT, decl(0))
            .expect("same signature with a renamed parameter is a valid override");
    }

    #[test]
    fn test_override_reuses_base_slot() {
        let mut table = ClassTable::new();
        let a = table.add_class("A", Some(0)).unwrap();
        let b = table.add_class("B", Some(1)).unwrap();
        table.set_parent(b, a);
        let f_a = table.add_method(a, "f", vec![], ClassId::INT, decl(0)).unwrap();
        let g_a = table.add_method(a, "g", vec![], ClassId::INT, decl(1)).unwrap();
        let h_b = table.add_method(b, "h", vec![], ClassId::INT, decl(0)).unwrap();
        let f_b = table.add_method(b, "f", vec![], ClassId::INT, decl(1)).unwrap();
        table.inherit_all();

        let object_slots = table.class(ClassId::OBJECT).dispatch.len();
        let base_slot = table.method(f_a).slot.unwrap();
        assert_eq!(base_slot, object_slots);
        assert_eq!(table.method(f_b).slot, Some(base_slot));
        assert_eq!(table.method(g_a).slot, Some(object_slots + 1));
        assert_eq!(table.method(h_b).slot, Some(object_slots + 2));

        let dispatch = &table.class(b).dispatch;
        assert_eq!(dispatch[base_slot], f_b);
        assert_eq!(dispatch.len(), object_slots + 3);
        assert_eq!(table.class(a).dispatch[base_slot], f_a);
    }

    #[test]
    fn test_flattened_attributes_are_root_to_leaf() {
        let mut table = ClassTable::new();
        let a = table.add_class("A", Some(0)).unwrap();
        let b = table.add_class("B", Some(1)).unwrap();
        table.set_parent(b, a);
        let y = table.add_attribute(b, "y", ClassId::INT, None).unwrap();
        let x = table.add_attribute(a, "x", ClassId::INT, None).unwrap();
        table.inherit_all();

        assert_eq!(table.class(b).flattened_attributes, vec![x, y]);
        assert_eq!(table.attribute_index(b, y), Some(1));
        assert_eq!(table.attribute_index(a, y), None);
    }

    #[test]
    fn test_inherit_all_runs_once() {
        let mut table = ClassTable::new();
        let a = table.add_class("A", Some(0)).unwrap();
        table.add_method(a, "f", vec![], ClassId::INT, decl(0)).unwrap();
        table.inherit_all();
        let before = table.class(a).dispatch.clone();
        table.inherit_all();
        assert_eq!(table.class(a).dispatch, before);
        assert!(table.class(a).is_flattened());
    }
}
