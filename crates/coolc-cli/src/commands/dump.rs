//! `coolc dump-classes` - print the checked class table as JSON.
//!
//! One entry per class with its instance field layout and vtable slots,
//! using the same field and symbol numbering as the generated IR.

use crate::load_program;
use anyhow::Context;
use coolc_compiler::lower::layout;
use coolc_types::ClassTable;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ClassDump {
    pub name: String,
    pub parent: String,
    pub builtin: bool,
    pub sealed: bool,
    pub attributes: Vec<AttributeDump>,
    pub slots: Vec<SlotDump>,
}

#[derive(Debug, Serialize)]
pub struct AttributeDump {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub declared_in: String,
    /// Field index in `%__instance_C`
    pub field: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SlotDump {
    pub slot: usize,
    pub method: String,
    /// Implementing function
    pub symbol: String,
}

/// Describe every class in registration order
pub fn class_dump(table: &ClassTable) -> Vec<ClassDump> {
    table
        .classes()
        .map(|class| ClassDump {
            name: class.name.clone(),
            parent: table.name(class.parent).to_string(),
            builtin: class.builtin,
            sealed: class.sealed,
            attributes: class
                .flattened_attributes
                .iter()
                .map(|&attr| {
                    let descriptor = table.attribute(attr);
                    AttributeDump {
                        name: descriptor.name.clone(),
                        ty: table.name(descriptor.ty).to_string(),
                        declared_in: table.name(descriptor.owner).to_string(),
                        field: layout::attribute_field(table, class.id, attr),
                    }
                })
                .collect(),
            slots: class
                .dispatch
                .iter()
                .enumerate()
                .map(|(slot, &method)| {
                    let descriptor = table.method(method);
                    SlotDump {
                        slot,
                        method: descriptor.name.clone(),
                        symbol: layout::method_symbol(table.name(descriptor.owner), &descriptor.name),
                    }
                })
                .collect(),
        })
        .collect()
}

pub fn execute(file: &Path) -> anyhow::Result<()> {
    let program = load_program(file)?;
    let (table, _) = coolc_checker::check(&program)
        .with_context(|| format!("{} failed to type-check", file.display()))?;
    let json = serde_json::to_string_pretty(&class_dump(&table))?;
    println!("{}", json);
    Ok(())
}
