//! Parse-object type derivation.

use pacgen_bytecode::{ObjectType, Slot, SlotId};
use pacgen_core::Grammar;
use pacgen_core::naming::param_slot;

use crate::{Error, Result};

/// Record type of `grammar`'s parse object.
///
/// Slots come in three runs: one per distinct production name in definition
/// order, then the auxiliary variables, then one hidden slot per parameter.
/// When several productions share a name, the first one fixes the slot type.
pub fn object_type(grammar: &Grammar) -> Result<ObjectType> {
    let mut slots: Vec<Slot> = Vec::new();

    for production in grammar.productions() {
        let Some(name) = &production.name else {
            continue;
        };
        if slots.iter().any(|s| &s.name == name) {
            continue;
        }
        slots.push(Slot {
            name: name.clone(),
            ty: production.value_type(),
            init: None,
        });
    }

    for var in grammar.variables() {
        if let Some(slot) = slots.iter_mut().find(|s| s.name == var.name) {
            slot.init = var.default.clone();
            continue;
        }
        slots.push(Slot {
            name: var.name.clone(),
            ty: var.ty.clone(),
            init: var.default.clone(),
        });
    }

    let mut params = Vec::with_capacity(grammar.params().len());
    for param in grammar.params() {
        let slot = u16::try_from(slots.len()).map_err(|_| Error::Overflow("slots"))?;
        params.push(SlotId(slot));
        slots.push(Slot {
            name: param_slot(&param.name),
            ty: param.ty.clone(),
            init: None,
        });
    }

    if slots.len() > usize::from(u16::MAX) + 1 {
        return Err(Error::Overflow("slots"));
    }
    Ok(ObjectType {
        name: grammar.name().to_owned(),
        slots,
        params,
    })
}
