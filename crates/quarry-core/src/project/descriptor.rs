use crate::{
    expr::ExprType,
    project::{ConstructorArgs, FromValue, ValueMismatch},
    value::Value,
};
use std::fmt;

pub(super) type Assign<T> = Box<dyn Fn(&mut T, Value) -> Result<(), ValueMismatch> + Send + Sync>;
pub(super) type Construct<T> =
    Box<dyn Fn(Vec<Value>) -> Result<T, (usize, ValueMismatch)> + Send + Sync>;

///
/// Slot
/// One named binding target: a field or a setter.
///

pub(super) struct Slot<T> {
    pub(super) name: String,
    pub(super) ty: ExprType,
    pub(super) assign: Assign<T>,
}

///
/// Convention
/// How a projection label finds its slot.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Convention {
    /// Slot name equals the label.
    Field,
    /// Slot name is `set_<snake_case(label)>`.
    Setter,
}

pub(super) enum Strategy<T> {
    Named {
        convention: Convention,
        init: fn() -> T,
        slots: Vec<Slot<T>>,
    },
    Constructor {
        params: Vec<ExprType>,
        construct: Construct<T>,
        stray_slots: Vec<String>,
    },
}

///
/// TargetDescriptor
///
/// Explicit description of how result rows become a `T`. Built once per
/// target type, usually inside `Record::descriptor`.
///

pub struct TargetDescriptor<T> {
    pub(super) target: &'static str,
    pub(super) strategy: Strategy<T>,
}

impl<T: 'static> TargetDescriptor<T> {
    /// Bind by field name: a projection labeled `age` goes to the slot
    /// registered as `age`.
    #[must_use]
    pub fn fields(target: &'static str, init: fn() -> T) -> Self {
        Self::named(target, Convention::Field, init)
    }

    /// Bind through mutators: a projection labeled `userName` goes to the
    /// slot registered as `set_user_name`. Alias a projection to steer it.
    #[must_use]
    pub fn setters(target: &'static str, init: fn() -> T) -> Self {
        Self::named(target, Convention::Setter, init)
    }

    /// Bind positionally through a constructor taking a tuple of arguments.
    ///
    /// Parameter types are checked against the projection when the binding
    /// is built, at the granularity of `ExprType`. Integer and float
    /// parameters are both `Numeric`, so an integer parameter over a float
    /// projection such as `avg()` binds, and each row then fails with
    /// `MappingError::Value`. Take `f64` for averages.
    #[must_use]
    pub fn constructor<A, F>(target: &'static str, construct: F) -> Self
    where
        A: ConstructorArgs + 'static,
        F: Fn(A) -> T + Send + Sync + 'static,
    {
        Self {
            target,
            strategy: Strategy::Constructor {
                params: A::param_types(),
                construct: Box::new(move |values| A::from_values(values).map(&construct)),
                stray_slots: Vec::new(),
            },
        }
    }

    /// Register a field slot.
    #[must_use]
    pub fn field<V, F>(self, name: &str, assign: F) -> Self
    where
        V: FromValue + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.slot(name, assign)
    }

    /// Register a setter slot under its method name, e.g. `set_username`.
    #[must_use]
    pub fn setter<V, F>(self, name: &str, assign: F) -> Self
    where
        V: FromValue + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.slot(name, assign)
    }

    #[must_use]
    pub const fn target(&self) -> &'static str {
        self.target
    }

    const fn named(target: &'static str, convention: Convention, init: fn() -> T) -> Self {
        Self {
            target,
            strategy: Strategy::Named {
                convention,
                init,
                slots: Vec::new(),
            },
        }
    }

    fn slot<V, F>(mut self, name: &str, assign: F) -> Self
    where
        V: FromValue + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        match &mut self.strategy {
            Strategy::Named { slots, .. } => slots.push(Slot {
                name: name.to_string(),
                ty: V::EXPR_TYPE,
                assign: Box::new(move |target, value| {
                    assign(target, V::from_value(value)?);
                    Ok(())
                }),
            }),
            // Reported when the descriptor is resolved.
            Strategy::Constructor { stray_slots, .. } => stray_slots.push(name.to_string()),
        }
        self
    }
}

impl<T> fmt::Debug for TargetDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("TargetDescriptor");
        out.field("target", &self.target);
        match &self.strategy {
            Strategy::Named {
                convention, slots, ..
            } => out
                .field("convention", convention)
                .field("slots", &slots.iter().map(|s| &s.name).collect::<Vec<_>>()),
            Strategy::Constructor { params, .. } => out.field("params", params),
        };
        out.finish()
    }
}

///
/// Record
///
/// Registration point for a target type's descriptor.
///

pub trait Record: Sized + 'static {
    fn descriptor() -> TargetDescriptor<Self>;
}
