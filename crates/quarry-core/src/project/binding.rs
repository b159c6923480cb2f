use crate::{
    error::QueryError,
    expr::ExprType,
    project::{
        MappingError, Record, ResultRow, RowHeader, TargetDescriptor,
        descriptor::{Convention, Strategy},
    },
    query::Select,
};
use convert_case::{Case, Casing};
use std::{fmt, sync::Arc};

///
/// RowBinding
///
/// A descriptor resolved against one result header. Every projection has a
/// slot (named strategies) or a parameter (constructor), and every type
/// pairing has been checked, so per-row mapping only converts values.
///

pub struct RowBinding<T> {
    descriptor: Arc<TargetDescriptor<T>>,
    // Slot index per projection; empty for constructor binding.
    slots: Vec<usize>,
    labels: Vec<String>,
}

impl<T: 'static> RowBinding<T> {
    pub fn resolve(descriptor: TargetDescriptor<T>, header: &RowHeader) -> Result<Self, MappingError> {
        let target = descriptor.target;
        let labels: Vec<String> = (0..header.len()).map(|i| header.display_label(i)).collect();

        let slots = match &descriptor.strategy {
            Strategy::Named {
                convention, slots, ..
            } => {
                let mut resolved = Vec::with_capacity(header.len());
                for (index, display) in labels.iter().enumerate() {
                    let Some(label) = header.label(index) else {
                        return Err(unbound(target, display));
                    };
                    let key = match convention {
                        Convention::Field => label.to_string(),
                        Convention::Setter => format!("set_{}", label.to_case(Case::Snake)),
                    };
                    let slot = slots
                        .iter()
                        .position(|slot| slot.name == key)
                        .ok_or_else(|| unbound(target, label))?;

                    check_type(target, header, index, slots[slot].ty)?;
                    resolved.push(slot);
                }
                resolved
            }
            Strategy::Constructor {
                params,
                stray_slots,
                ..
            } => {
                if let Some(name) = stray_slots.first() {
                    return Err(MappingError::Descriptor {
                        target: target.to_string(),
                        reason: format!("constructor binding cannot take named slot '{name}'"),
                    });
                }
                if params.len() != header.len() {
                    return Err(MappingError::Arity {
                        target: target.to_string(),
                        expected: params.len(),
                        found: header.len(),
                    });
                }
                for (index, ty) in params.iter().enumerate() {
                    check_type(target, header, index, *ty)?;
                }
                Vec::new()
            }
        };

        Ok(Self {
            descriptor: Arc::new(descriptor),
            slots,
            labels,
        })
    }

    #[must_use]
    pub fn target(&self) -> &'static str {
        self.descriptor.target
    }

    /// Bind one row.
    pub fn map_row(&self, row: ResultRow) -> Result<T, MappingError> {
        if row.len() != self.labels.len() {
            return Err(MappingError::RowWidth {
                expected: self.labels.len(),
                found: row.len(),
            });
        }

        let target = self.descriptor.target;
        match &self.descriptor.strategy {
            Strategy::Named { init, slots, .. } => {
                let mut out = init();
                for (index, value) in row.into_values().into_iter().enumerate() {
                    let slot = &slots[self.slots[index]];
                    (slot.assign)(&mut out, value)
                        .map_err(|err| value_error(target, &self.labels[index], &err))?;
                }
                Ok(out)
            }
            Strategy::Constructor { construct, .. } => {
                construct(row.into_values()).map_err(|(index, err)| {
                    let column = self.labels.get(index).map_or("?", String::as_str);
                    value_error(target, column, &err)
                })
            }
        }
    }
}

impl<T> Clone for RowBinding<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            slots: self.slots.clone(),
            labels: self.labels.clone(),
        }
    }
}

impl<T> fmt::Debug for RowBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowBinding")
            .field("descriptor", &self.descriptor)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

/// Bind one row through a resolved binding.
pub fn map_row<T: 'static>(row: ResultRow, binding: &RowBinding<T>) -> Result<T, MappingError> {
    binding.map_row(row)
}

fn unbound(target: &str, column: &str) -> MappingError {
    MappingError::Unbound {
        target: target.to_string(),
        column: column.to_string(),
    }
}

fn value_error(target: &str, column: &str, err: &impl ToString) -> MappingError {
    MappingError::Value {
        target: target.to_string(),
        column: column.to_string(),
        reason: err.to_string(),
    }
}

fn check_type(
    target: &str,
    header: &RowHeader,
    index: usize,
    expected: ExprType,
) -> Result<(), MappingError> {
    let Some(found) = header.expr_type(index) else {
        return Ok(());
    };
    if found.is_compatible(expected) {
        return Ok(());
    }

    Err(MappingError::Type {
        target: target.to_string(),
        column: header.display_label(index),
        expected,
        found,
    })
}

///
/// TypedSelect
///
/// A select whose rows bind to `T`. The binding is resolved when this is
/// built, so arity and type mismatches never reach execution.
///

pub struct TypedSelect<T> {
    select: Select,
    binding: RowBinding<T>,
}

impl<T> Clone for TypedSelect<T> {
    fn clone(&self) -> Self {
        Self {
            select: self.select.clone(),
            binding: self.binding.clone(),
        }
    }
}

impl<T> fmt::Debug for TypedSelect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSelect")
            .field("select", &self.select)
            .field("binding", &self.binding)
            .finish()
    }
}

impl<T: 'static> TypedSelect<T> {
    pub fn new(select: Select, descriptor: TargetDescriptor<T>) -> Result<Self, QueryError> {
        let header = RowHeader::from_select(&select);
        let binding = RowBinding::resolve(descriptor, &header).inspect_err(|err| {
            log::debug!(target: "quarry::project", "binding rejected: {err}");
        })?;

        Ok(Self { select, binding })
    }

    #[must_use]
    pub const fn select(&self) -> &Select {
        &self.select
    }

    #[must_use]
    pub const fn binding(&self) -> &RowBinding<T> {
        &self.binding
    }
}

impl Select {
    /// Bind this select to a `Record` type.
    pub fn into_typed<T: Record>(self) -> Result<TypedSelect<T>, QueryError> {
        TypedSelect::new(self, T::descriptor())
    }

    /// Bind this select through an explicit descriptor.
    pub fn bind<T: 'static>(
        self,
        descriptor: TargetDescriptor<T>,
    ) -> Result<TypedSelect<T>, QueryError> {
        TypedSelect::new(self, descriptor)
    }
}
