//! Mapping from Rust types to wire schemas.
//!
//! Tools declare their parameters with [`Param::of`], which reads the schema
//! off the Rust type through [`ParamType`]:
//!
//! ```rust,ignore
//! let params = vec![
//!     Param::of::<String>("query", "The search query"),
//!     Param::of::<Option<i64>>("limit", "Maximum results"),
//!     Param::of::<Vec<String>>("include_domains", "Domains to search").with_default(),
//! ];
//! ```

use serde_json::{Map, Value};

use crate::schema::{
    InputParameter, OutputMode, OutputValue, ToolOutputSchema, ValueSchema, WireType,
};

/// A Rust type that can appear as a tool parameter or return value.
pub trait ParamType {
    fn value_schema() -> ValueSchema;

    /// `Option<T>` parameters are not required and may return null.
    fn is_optional() -> bool {
        false
    }
}

macro_rules! impl_param_type {
    ($wire:expr => $($ty:ty),+) => {
        $(
            impl ParamType for $ty {
                fn value_schema() -> ValueSchema {
                    ValueSchema::new($wire)
                }
            }
        )+
    };
}

impl_param_type!(WireType::String => String);
impl_param_type!(WireType::Boolean => bool);
impl_param_type!(WireType::Integer => i32, i64, u32, u64, usize);
impl_param_type!(WireType::Number => f32, f64);
impl_param_type!(WireType::Json => Value, Map<String, Value>);

impl<T: ParamType> ParamType for Vec<T> {
    fn value_schema() -> ValueSchema {
        let inner = T::value_schema();
        ValueSchema {
            val_type: WireType::Array,
            inner_val_type: Some(inner.val_type),
            enum_values: inner.enum_values,
        }
    }
}

impl<T: ParamType> ParamType for Option<T> {
    fn value_schema() -> ValueSchema {
        T::value_schema()
    }

    fn is_optional() -> bool {
        true
    }
}

/// Entry point for declaring parameters.
pub struct Param;

impl Param {
    /// A documented parameter whose schema comes from `T`.
    pub fn of<T: ParamType>(name: impl Into<String>, description: impl Into<String>) -> InputParameter {
        let description = description.into();
        InputParameter {
            name: name.into(),
            required: !T::is_optional(),
            description: (!description.trim().is_empty()).then_some(description),
            value_schema: T::value_schema(),
            inferrable: true,
        }
    }

    /// A parameter with no description.
    pub fn undocumented<T: ParamType>(name: impl Into<String>) -> InputParameter {
        Self::of::<T>(name, "")
    }
}

impl InputParameter {
    /// The tool supplies its own default, so callers may omit the value.
    pub fn with_default(mut self) -> Self {
        self.required = false;
        self
    }

    /// The value must come from the caller, never from a model's guess.
    pub fn not_inferrable(mut self) -> Self {
        self.inferrable = false;
        self
    }

    /// Restrict a string parameter to a fixed set of values.
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_schema = self.value_schema.with_enum(values);
        self
    }
}

impl ToolOutputSchema {
    /// Output of a tool returning `T`.
    pub fn returns<T: ParamType>(description: impl Into<String>) -> Self {
        let description = description.into();
        let mut available_modes = vec![OutputMode::Value, OutputMode::Error];
        if T::is_optional() {
            available_modes.push(OutputMode::Null);
        }
        Self {
            available_modes,
            value: Some(OutputValue {
                description: (!description.trim().is_empty()).then_some(description),
                value_schema: T::value_schema(),
            }),
        }
    }

    /// Output of a tool that returns nothing.
    pub fn nothing() -> Self {
        Self {
            available_modes: vec![OutputMode::Null, OutputMode::Error],
            value: None,
        }
    }
}
